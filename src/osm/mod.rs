//! OpenStreetMap data model: elements, their geometry and tag editing.

mod element;
mod geometry;
mod tags;

pub use element::{Element, ElementType};
pub use geometry::ElementGeometry;
pub use tags::{TagChange, Tags};
