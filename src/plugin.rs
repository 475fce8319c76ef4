//! Bevy integration of the quests map.
//!
//! Other plugins drive the map through request messages and receive the
//! outcome of taps as messages. The map itself lives in the
//! [`QuestsMap`] resource; a surface is attached to it with
//! [`QuestsMap::on_map_ready`] once one is available.

use std::marker::PhantomData;

use bevy::prelude::*;

use crate::geo::LatLon;
use crate::quest::{Quest, QuestKey};
use crate::quests_map::{PickOutbox, PickOutcome, QuestsMap};
use crate::surface::{MarkerIcon, RenderSurface, ViewportInsets};

/// The quests map resource as registered by [`QuestMapPlugin`]
pub type MessageQuestsMap<S> = QuestsMap<S, PickOutbox>;

/// Message to focus a quest, keeping it clear of UI covering `offset`
#[derive(Message)]
pub struct FocusQuestRequest {
    pub quest: Quest,
    pub offset: ViewportInsets,
}

/// Message to remove the focus highlighting without moving the camera back
#[derive(Message)]
pub struct ClearFocusRequest;

/// Message to end the focus and move the camera back
#[derive(Message)]
pub struct EndFocusRequest;

/// Message for a confirmed single tap on the map at a screen position
#[derive(Message)]
pub struct MapTapRequest {
    pub screen: Vec2,
}

/// Message sent when a tap picked a quest
#[derive(Message, Debug, Clone, PartialEq)]
pub struct QuestClicked {
    pub key: QuestKey,
}

/// Message sent when a tap hit no quest
#[derive(Message, Debug, Clone, PartialEq)]
pub struct MapClicked {
    pub position: LatLon,
    pub radius_m: f64,
}

fn focus_quest_system<S: RenderSurface + Send + Sync + 'static>(
    mut events: MessageReader<FocusQuestRequest>,
    mut map: ResMut<MessageQuestsMap<S>>,
) {
    for event in events.read() {
        map.start_focus_quest(&event.quest, event.offset);
    }
}

fn clear_focus_system<S: RenderSurface + Send + Sync + 'static>(
    mut events: MessageReader<ClearFocusRequest>,
    mut map: ResMut<MessageQuestsMap<S>>,
) {
    for _ in events.read() {
        map.clear_focus_quest();
    }
}

fn end_focus_system<S: RenderSurface + Send + Sync + 'static>(
    mut events: MessageReader<EndFocusRequest>,
    mut map: ResMut<MessageQuestsMap<S>>,
) {
    for _ in events.read() {
        map.end_focus_quest();
    }
}

fn map_tap_system<S: RenderSurface + Send + Sync + 'static>(
    mut events: MessageReader<MapTapRequest>,
    mut map: ResMut<MessageQuestsMap<S>>,
) {
    for event in events.read() {
        if !map.on_single_tap_confirmed(event.screen) {
            debug!("Ignoring tap at {:?}, map not ready", event.screen);
        }
    }
}

/// Advance camera animations by the frame time
fn advance_camera_system<S: RenderSurface + Send + Sync + 'static>(
    time: Res<Time>,
    mut map: ResMut<MessageQuestsMap<S>>,
) {
    map.advance(time.delta());
}

/// Poll pending taps once per frame and send out what they resolved to
fn poll_picks_system<S: RenderSurface + Send + Sync + 'static>(
    mut map: ResMut<MessageQuestsMap<S>>,
    mut quest_clicked: MessageWriter<QuestClicked>,
    mut map_clicked: MessageWriter<MapClicked>,
) {
    if map.pending_picks() == 0 {
        return;
    }
    map.poll_picks();
    for outcome in map.listener_mut().drain() {
        match outcome {
            PickOutcome::QuestPicked(key) => {
                quest_clicked.write(QuestClicked { key });
            }
            PickOutcome::MapClicked { position, radius_m } => {
                map_clicked.write(MapClicked { position, radius_m });
            }
        }
    }
}

pub struct QuestMapPlugin<S> {
    selection_ring: MarkerIcon,
    _surface: PhantomData<fn() -> S>,
}

impl<S> QuestMapPlugin<S> {
    pub fn new(selection_ring: MarkerIcon) -> Self {
        Self {
            selection_ring,
            _surface: PhantomData,
        }
    }
}

impl<S: RenderSurface + Send + Sync + 'static> Plugin for QuestMapPlugin<S> {
    fn build(&self, app: &mut App) {
        app.insert_resource(MessageQuestsMap::<S>::new(
            PickOutbox::default(),
            self.selection_ring.clone(),
        ))
        .add_message::<FocusQuestRequest>()
        .add_message::<ClearFocusRequest>()
        .add_message::<EndFocusRequest>()
        .add_message::<MapTapRequest>()
        .add_message::<QuestClicked>()
        .add_message::<MapClicked>()
        .add_systems(
            Update,
            (
                focus_quest_system::<S>.run_if(on_message::<FocusQuestRequest>),
                clear_focus_system::<S>.run_if(on_message::<ClearFocusRequest>),
                end_focus_system::<S>.run_if(on_message::<EndFocusRequest>),
                map_tap_system::<S>.run_if(on_message::<MapTapRequest>),
                advance_camera_system::<S>,
                poll_picks_system::<S>,
            )
                .chain(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraPose;
    use crate::surface::SceneSurface;

    const CENTER: LatLon = LatLon::new(47.0, 8.0);

    #[derive(Resource, Default)]
    struct Received {
        quests: Vec<QuestKey>,
        clicks: Vec<MapClicked>,
    }

    fn collect(
        mut quests: MessageReader<QuestClicked>,
        mut clicks: MessageReader<MapClicked>,
        mut received: ResMut<Received>,
    ) {
        for q in quests.read() {
            received.quests.push(q.key.clone());
        }
        for c in clicks.read() {
            received.clicks.push(c.clone());
        }
    }

    fn ring() -> MarkerIcon {
        MarkerIcon {
            name: "quest_selection_ring".to_string(),
            width_px: 48,
            height_px: 48,
        }
    }

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(QuestMapPlugin::<SceneSurface>::new(ring()))
            .init_resource::<Received>()
            .add_systems(PostUpdate, collect);
        let surface = SceneSurface::new(
            Vec2::new(640.0, 480.0),
            1.0,
            CameraPose::new(CENTER, 15.0),
        );
        app.world_mut()
            .resource_mut::<MessageQuestsMap<SceneSurface>>()
            .on_map_ready(surface);
        app
    }

    fn map(app: &App) -> &MessageQuestsMap<SceneSurface> {
        app.world().resource::<MessageQuestsMap<SceneSurface>>()
    }

    #[test]
    fn test_focus_and_end_through_messages() {
        let mut app = app();
        let quest = Quest::for_note(1, LatLon::new(47.05, 8.05));
        app.world_mut().write_message(FocusQuestRequest {
            quest: quest.clone(),
            offset: ViewportInsets::default(),
        });
        app.update();

        assert_eq!(map(&app).focused_quest(), Some(&quest.key));
        assert_eq!(
            map(&app).surface().unwrap().issued_animations().len(),
            1
        );

        app.world_mut().write_message(EndFocusRequest);
        app.update();
        assert!(map(&app).focused_quest().is_none());
        assert!(map(&app).camera_pose_before_focus().is_none());
        assert_eq!(
            map(&app).surface().unwrap().issued_animations().len(),
            2
        );
    }

    #[test]
    fn test_clear_focus_through_messages() {
        let mut app = app();
        app.world_mut().write_message(FocusQuestRequest {
            quest: Quest::for_note(1, CENTER),
            offset: ViewportInsets::default(),
        });
        app.update();
        app.world_mut().write_message(ClearFocusRequest);
        app.update();
        assert!(map(&app).focused_quest().is_none());
        assert!(map(&app).surface().unwrap().visible_markers().is_empty());
    }

    #[test]
    fn test_taps_become_messages() {
        let mut app = app();
        let note = Quest::for_note(9, CENTER);
        app.world_mut()
            .resource_mut::<MessageQuestsMap<SceneSurface>>()
            .set_quest_pins(&[note]);

        app.world_mut().write_message(MapTapRequest {
            screen: Vec2::new(320.0, 240.0),
        });
        app.world_mut().write_message(MapTapRequest {
            screen: Vec2::new(20.0, 20.0),
        });
        app.update();

        let received = app.world().resource::<Received>();
        assert_eq!(received.quests, vec![QuestKey::Note { note_id: 9 }]);
        assert_eq!(received.clicks.len(), 1);
        assert!(received.clicks[0].position.latitude > CENTER.latitude);
    }

    #[test]
    fn test_tap_without_surface_is_ignored() {
        let mut app = app();
        app.world_mut()
            .resource_mut::<MessageQuestsMap<SceneSurface>>()
            .on_map_destroyed();
        app.world_mut().write_message(MapTapRequest { screen: Vec2::ZERO });
        app.update();
        let received = app.world().resource::<Received>();
        assert!(received.quests.is_empty());
        assert!(received.clicks.is_empty());
    }
}
