//! Headless walk through the quests map: focus a camp site quest, tap its
//! pin, answer with a split way, end the focus and remember the camera.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use chrono::Utc;

use questmap::camera::CameraPose;
use questmap::config::{
    AppConfig, ConfigPersist, ConfigPlugin, RememberCameraPoseRequest, load_config,
};
use questmap::data::{OsmQuestSplitWay, SplitPolylineAtPosition, SplitWayStore};
use questmap::geo::LatLon;
use questmap::osm::{Element, ElementGeometry, ElementType};
use questmap::plugin::{
    EndFocusRequest, FocusQuestRequest, MapClicked, MapTapRequest, MessageQuestsMap, QuestClicked,
    QuestMapPlugin,
};
use questmap::quest::{AddCampDrinkingWater, Quest, QuestType};
use questmap::surface::{MarkerIcon, RenderSurface, SceneSurface, ViewportInsets};

const SCREEN_SIZE: Vec2 = Vec2::new(1080.0, 1920.0);
const START: LatLon = LatLon::new(52.5163, 13.3777);
const DEMO_FRAMES: u32 = 120;

/// Set up file logging for debug builds
#[cfg(debug_assertions)]
fn setup_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use tracing_subscriber::prelude::*;

    let logs_dir = questmap::paths::logs_dir();
    if std::fs::create_dir_all(&logs_dir).is_err() {
        eprintln!("Failed to create logs directory");
        return None;
    }

    let log_file_path = logs_dir.join("questmap.log");

    // Append session separator to existing log file
    if let Ok(mut file) = OpenOptions::new().append(true).open(&log_file_path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let separator = "=".repeat(80);
        let _ = writeln!(
            file,
            "\n\n{}\n=== New Session Started at {} ===\n{}\n",
            separator, timestamp, separator
        );
    }

    let file_appender = tracing_appender::rolling::never(&logs_dir, "questmap.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_level(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,questmap=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Some(guard)
}

#[cfg(not(debug_assertions))]
fn setup_logging() -> Option<()> {
    use tracing_subscriber::prelude::*;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,questmap=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    None
}

/// Script of the walk through, advanced once per frame
#[derive(Resource, Default)]
struct Demo {
    frame: u32,
    quest: Option<Quest>,
    store: Option<SplitWayStore>,
}

fn camp_site_quest() -> Quest {
    let now = Utc::now();
    let element = Element::new(ElementType::Way, 4_200_017, now)
        .with_tag("tourism", "camp_site")
        .with_tag("name", "Zeltplatz am See");
    let geometry = ElementGeometry::Polygons {
        polygons: vec![vec![
            LatLon::new(52.5301, 13.4102),
            LatLon::new(52.5307, 13.4118),
            LatLon::new(52.5296, 13.4125),
            LatLon::new(52.5291, 13.4109),
            LatLon::new(52.5301, 13.4102),
        ]],
        center: LatLon::new(52.5299, 13.4113),
    };
    let quest_type = AddCampDrinkingWater;
    if !quest_type.is_applicable_to(&element, now) {
        warn!("Demo camp site does not need a drinking water survey");
    }
    Quest::for_element(&quest_type, &element, geometry)
}

/// Attach a surface configured from the loaded config
fn attach_surface(config: Res<AppConfig>, mut map: ResMut<MessageQuestsMap<SceneSurface>>) {
    let pose = config
        .data
        .last_camera_pose
        .unwrap_or_else(|| CameraPose::new(START, 15.0));
    let surface = SceneSurface::new(SCREEN_SIZE, config.data.display_density, pose);
    map.on_map_ready(surface);
    map.set_follow_position(config.data.follow_position);

    let quest = camp_site_quest();
    map.set_quest_pins(std::slice::from_ref(&quest));
}

fn open_store(config: Res<AppConfig>, mut demo: ResMut<Demo>) {
    let path = config.data.split_way_store_path();
    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        error!("Failed to create store directory: {}", e);
        return;
    }
    match SplitWayStore::open(&path) {
        Ok(store) => demo.store = Some(store),
        Err(e) => error!("Split way answers unavailable: {}", e),
    }
}

fn run_demo(
    mut demo: ResMut<Demo>,
    map: Res<MessageQuestsMap<SceneSurface>>,
    mut focus: MessageWriter<FocusQuestRequest>,
    mut taps: MessageWriter<MapTapRequest>,
    mut end_focus: MessageWriter<EndFocusRequest>,
    mut remember: MessageWriter<RememberCameraPoseRequest>,
    mut exit: MessageWriter<AppExit>,
) {
    demo.frame += 1;
    match demo.frame {
        1 => {
            let quest = camp_site_quest();
            focus.write(FocusQuestRequest {
                quest: quest.clone(),
                offset: ViewportInsets::new(0.0, 0.0, 0.0, SCREEN_SIZE.y * 0.4),
            });
            demo.quest = Some(quest);
        }
        60 => {
            let Some(surface) = map.surface() else {
                return;
            };
            let Some(quest) = demo.quest.as_ref() else {
                return;
            };
            let pin = surface.geo_to_screen(&quest.geometry.center());
            taps.write(MapTapRequest { screen: pin });
            taps.write(MapTapRequest {
                screen: Vec2::new(40.0, 40.0),
            });
        }
        90 => {
            end_focus.write(EndFocusRequest);
        }
        DEMO_FRAMES => {
            if let Some(surface) = map.surface() {
                remember.write(RememberCameraPoseRequest {
                    pose: surface.camera_pose(),
                });
            }
            exit.write(AppExit::Success);
        }
        _ => {}
    }
}

fn answer_with_split(
    mut clicked: MessageReader<QuestClicked>,
    mut demo: ResMut<Demo>,
    mut map: ResMut<MessageQuestsMap<SceneSurface>>,
) {
    for event in clicked.read() {
        info!("Quest clicked: {:?}", event.key);
        let split = SplitPolylineAtPosition::AtLinePosition {
            first: LatLon::new(52.5301, 13.4102),
            second: LatLon::new(52.5307, 13.4118),
            delta: 0.5,
        };
        let icon = MarkerIcon {
            name: "ic_quest_split_way".to_string(),
            width_px: 48,
            height_px: 48,
        };
        map.put_marker_for_current_quest(split.position(), &icon);
        let Some(store) = demo.store.as_mut() else {
            continue;
        };
        let entry = OsmQuestSplitWay {
            quest_id: 1,
            quest_type: AddCampDrinkingWater.name().to_string(),
            way_id: 4_200_017,
            source: "survey".to_string(),
            splits: vec![split],
        };
        match store.put(entry) {
            Ok(()) => info!("Stored split, {} answers waiting", store.count()),
            Err(e) => error!("Failed to store split: {}", e),
        }
    }
}

fn log_map_clicks(mut clicked: MessageReader<MapClicked>) {
    for event in clicked.read() {
        info!(
            "Map clicked at {:?} within {:.1}m",
            event.position, event.radius_m
        );
    }
}

fn main() {
    // Keep the guard alive for the duration of the program
    let _log_guard = setup_logging();
    if let Err(e) = questmap::paths::ensure_directories() {
        eprintln!("Failed to create app directories: {}", e);
    }

    let (config, reset_notification) =
        load_config(&questmap::paths::config_file()).into_resources();
    let ring = config.data.selection_ring.clone();

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(1.0 / 60.0),
        )))
        .insert_resource(config)
        .insert_resource(reset_notification)
        .add_plugins(ConfigPlugin)
        .add_plugins(QuestMapPlugin::<SceneSurface>::new(ring))
        .init_resource::<Demo>()
        .add_systems(Startup, (attach_surface, open_store))
        .add_systems(
            Update,
            (
                // The camera pose must be saved before the exit takes effect
                run_demo.before(ConfigPersist),
                answer_with_split,
                log_map_clicks,
            ),
        )
        .run();
}
