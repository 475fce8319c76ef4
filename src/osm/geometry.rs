use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, LatLon};
use crate::surface::{Feature, FeatureGeometry, Properties};

/// Geometry of an OSM element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementGeometry {
    Point {
        center: LatLon,
    },
    Polylines {
        polylines: Vec<Vec<LatLon>>,
        center: LatLon,
    },
    Polygons {
        polygons: Vec<Vec<LatLon>>,
        center: LatLon,
    },
}

impl ElementGeometry {
    pub fn center(&self) -> LatLon {
        match self {
            ElementGeometry::Point { center }
            | ElementGeometry::Polylines { center, .. }
            | ElementGeometry::Polygons { center, .. } => *center,
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        let center = self.center();
        let rings = match self {
            ElementGeometry::Point { .. } => return BoundingBox::new(center, center),
            ElementGeometry::Polylines { polylines, .. } => polylines,
            ElementGeometry::Polygons { polygons, .. } => polygons,
        };
        BoundingBox::enclosing(rings.iter().flatten())
            .unwrap_or_else(|| BoundingBox::new(center, center))
    }

    /// Features to draw this geometry on a data layer
    pub fn to_features(&self) -> Vec<Feature> {
        let properties = |kind: &str| Properties::from([("type".to_string(), kind.to_string())]);
        match self {
            ElementGeometry::Point { center } => {
                vec![Feature::point(*center, properties("point"))]
            }
            ElementGeometry::Polylines { polylines, .. } => polylines
                .iter()
                .map(|line| Feature {
                    geometry: FeatureGeometry::Polyline(line.clone()),
                    properties: properties("line"),
                })
                .collect(),
            ElementGeometry::Polygons { polygons, .. } => vec![Feature {
                geometry: FeatureGeometry::Polygon(polygons.clone()),
                properties: properties("poly"),
            }],
        }
    }
}
