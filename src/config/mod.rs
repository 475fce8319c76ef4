use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::camera::CameraPose;
use crate::surface::MarkerIcon;

/// System set that applies config requests and writes the file. Systems
/// sending requests run before it to have them saved in the same frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigPersist;

fn default_display_density() -> f32 {
    1.0
}

fn default_selection_ring() -> MarkerIcon {
    MarkerIcon {
        name: "quest_selection_ring".to_string(),
        width_px: 96,
        height_px: 96,
    }
}

/// Application configuration persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfigData {
    /// Camera pose when the app was last closed
    #[serde(default)]
    pub last_camera_pose: Option<CameraPose>,

    /// Whether the map recenters on the user's location
    #[serde(default)]
    pub follow_position: bool,

    /// Physical pixels per density-independent pixel
    #[serde(default = "default_display_density")]
    pub display_density: f32,

    /// Icon drawn around the pins of the focused quest
    #[serde(default = "default_selection_ring")]
    pub selection_ring: MarkerIcon,

    /// Where split way answers are kept. Defaults to the data directory.
    #[serde(default)]
    pub split_way_store: Option<PathBuf>,
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            last_camera_pose: None,
            follow_position: false,
            display_density: default_display_density(),
            selection_ring: default_selection_ring(),
            split_way_store: None,
        }
    }
}

impl AppConfigData {
    pub fn split_way_store_path(&self) -> PathBuf {
        self.split_way_store
            .clone()
            .unwrap_or_else(crate::paths::split_way_store_file)
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Set when the config file could not be used and defaults were loaded instead
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to remember the camera pose for the next start
#[derive(Message)]
pub struct RememberCameraPoseRequest {
    pub pose: CameraPose,
}

/// Result of loading config from disk
pub struct LoadConfigResult {
    pub config: AppConfig,
    /// Error message if config was reset to defaults due to an error
    pub reset_reason: Option<String>,
}

impl LoadConfigResult {
    /// Split into the resources [`ConfigPlugin`] works with
    pub fn into_resources(self) -> (AppConfig, ConfigResetNotification) {
        let notification = ConfigResetNotification {
            show: self.reset_reason.is_some(),
            reason: self.reset_reason,
        };
        (self.config, notification)
    }
}

/// Load configuration from `config_path`, falling back to defaults
pub fn load_config(config_path: &Path) -> LoadConfigResult {
    let (data, reset_reason) = if config_path.exists() {
        match std::fs::read_to_string(config_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(data) => {
                    info!("Loaded config from {:?}", config_path);
                    (data, None)
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}", e);
                    (
                        AppConfigData::default(),
                        Some(format!("Configuration file was corrupted: {}", e)),
                    )
                }
            },
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                (
                    AppConfigData::default(),
                    Some(format!("Could not read configuration file: {}", e)),
                )
            }
        }
    } else {
        info!("No config file found, using defaults");
        (AppConfigData::default(), None)
    };

    LoadConfigResult {
        config: AppConfig {
            data,
            config_path: config_path.to_path_buf(),
            dirty: false,
        },
        reset_reason,
    }
}

/// Save configuration to disk. Failures are logged, the config stays in memory.
pub fn save_config(config: &AppConfig) -> bool {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
                false
            } else {
                info!("Config saved to {:?}", config.config_path);
                true
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
            false
        }
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty && save_config(&config) {
            config.dirty = false;
        }
    }
}

fn remember_camera_pose_system(
    mut events: MessageReader<RememberCameraPoseRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        config.data.last_camera_pose = Some(event.pose);
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

/// Persists the config on request. Loads it from the default location unless
/// an [`AppConfig`] was inserted before the plugin.
pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<AppConfig>() {
            let (config, notification) =
                load_config(&crate::paths::config_file()).into_resources();
            app.insert_resource(config).insert_resource(notification);
        }
        app.init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<RememberCameraPoseRequest>()
            .add_systems(
                Update,
                (
                    remember_camera_pose_system.run_if(on_message::<RememberCameraPoseRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain()
                    .in_set(ConfigPersist),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLon;

    #[test]
    fn test_app_config_data_default() {
        let data = AppConfigData::default();
        assert!(data.last_camera_pose.is_none());
        assert!(!data.follow_position);
        assert_eq!(data.display_density, 1.0);
        assert_eq!(data.selection_ring.name, "quest_selection_ring");
        assert!(data.split_way_store.is_none());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let data: AppConfigData = serde_json::from_str(r#"{"follow_position": true}"#).unwrap();
        assert!(data.follow_position);
        assert_eq!(data.display_density, 1.0);
        assert_eq!(data.selection_ring, default_selection_ring());
    }

    #[test]
    fn test_load_missing_file_is_not_a_reset() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(&dir.path().join("config.json"));
        assert!(result.reset_reason.is_none());
        assert_eq!(result.config.data, AppConfigData::default());
    }

    #[test]
    fn test_load_corrupted_file_resets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = load_config(&path);
        assert_eq!(result.config.data, AppConfigData::default());
        assert!(result.reset_reason.unwrap().contains("corrupted"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = load_config(&path).config;
        config.data.last_camera_pose = Some(CameraPose {
            position: LatLon::new(53.5, 10.0),
            zoom: 16.5,
            tilt: 0.3,
            rotation: -1.2,
        });
        config.data.display_density = 2.75;
        assert!(save_config(&config));

        let loaded = load_config(&path);
        assert!(loaded.reset_reason.is_none());
        assert_eq!(loaded.config.data, config.data);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data: AppConfigData::default(),
            config_path: dir.path().join("missing").join("config.json"),
            dirty: true,
        };
        assert!(!save_config(&config));
    }

    #[test]
    fn test_remember_camera_pose_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).insert_resource(AppConfig {
            data: AppConfigData::default(),
            config_path: path.clone(),
            dirty: false,
        })
        .add_plugins(ConfigPlugin);
        app.update();

        let pose = CameraPose::new(LatLon::new(1.0, 2.0), 12.0);
        app.world_mut().write_message(RememberCameraPoseRequest { pose });
        app.update();

        assert!(!app.world().resource::<AppConfig>().dirty);
        assert_eq!(load_config(&path).config.data.last_camera_pose, Some(pose));
    }

    #[derive(Resource)]
    struct PoseToRemember(CameraPose);

    fn request_pose(pose: Res<PoseToRemember>, mut remember: MessageWriter<RememberCameraPoseRequest>) {
        remember.write(RememberCameraPoseRequest { pose: pose.0 });
    }

    #[test]
    fn test_request_before_persist_set_is_saved_same_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let pose = CameraPose::new(LatLon::new(48.1, 11.6), 17.0);
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(AppConfig {
                data: AppConfigData::default(),
                config_path: path.clone(),
                dirty: false,
            })
            .insert_resource(PoseToRemember(pose))
            .add_plugins(ConfigPlugin)
            .add_systems(Update, request_pose.before(ConfigPersist));

        // A single frame, as when the app exits right after the request
        app.update();

        assert_eq!(load_config(&path).config.data.last_camera_pose, Some(pose));
    }

    #[test]
    fn test_plugin_keeps_inserted_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let (mut config, notification) = load_config(&path).into_resources();
        assert!(notification.show);
        config.data.display_density = 3.0;

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(config)
            .insert_resource(notification)
            .add_plugins(ConfigPlugin);
        app.update();

        assert_eq!(app.world().resource::<AppConfig>().data.display_density, 3.0);
        let notification = app.world().resource::<ConfigResetNotification>();
        assert!(notification.reason.as_deref().unwrap().contains("corrupted"));
    }
}
