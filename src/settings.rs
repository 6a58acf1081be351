use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

use crate::highlight::{OverlayStyle, ProjectorConfig, Rgba};
use crate::iconset::ResizeFilter;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pagelight";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    /// Fallback wait for page layout before drawing the overlay
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Fallback wait for the fade-out transition before removal
    #[serde(default = "default_fade_out_ms")]
    pub fade_out_ms: u64,

    #[serde(default = "default_fill")]
    pub fill: String,

    #[serde(default = "default_fill_alpha")]
    pub fill_alpha: f32,

    #[serde(default = "default_border")]
    pub border: String,

    #[serde(default = "default_border_width")]
    pub border_width: f64,

    #[serde(default = "default_z_index")]
    pub z_index: i32,

    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSettings {
    #[serde(default = "default_filter_debounce_ms")]
    pub filter_debounce_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconsetSettings {
    #[serde(default)]
    pub filter: ResizeFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub overlay: OverlaySettings,

    #[serde(default)]
    pub panel: PanelSettings,

    #[serde(default)]
    pub iconset: IconsetSettings,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_fade_out_ms() -> u64 {
    300
}

fn default_fill() -> String {
    "FFEB3B".to_string()
}

fn default_fill_alpha() -> f32 {
    0.35
}

fn default_border() -> String {
    "F9A825".to_string()
}

fn default_border_width() -> f64 {
    2.0
}

fn default_z_index() -> i32 {
    100
}

fn default_opacity() -> f32 {
    1.0
}

fn default_filter_debounce_ms() -> u64 {
    250
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            fade_out_ms: default_fade_out_ms(),
            fill: default_fill(),
            fill_alpha: default_fill_alpha(),
            border: default_border(),
            border_width: default_border_width(),
            z_index: default_z_index(),
            opacity: default_opacity(),
        }
    }
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            filter_debounce_ms: default_filter_debounce_ms(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            overlay: OverlaySettings::default(),
            panel: PanelSettings::default(),
            iconset: IconsetSettings::default(),
        }
    }
}

impl OverlaySettings {
    /// Projector configuration; unparseable colours fall back to defaults
    pub fn projector_config(&self) -> ProjectorConfig {
        let defaults = OverlayStyle::default();
        let fill = Rgba::from_hex(&self.fill, self.fill_alpha).unwrap_or_else(|| {
            warn!("Invalid overlay fill colour {:?}, using default", self.fill);
            defaults.fill
        });
        let border = Rgba::from_hex(&self.border, 1.0).unwrap_or_else(|| {
            warn!("Invalid overlay border colour {:?}, using default", self.border);
            defaults.border
        });
        let fade_out = Duration::from_millis(self.fade_out_ms);

        ProjectorConfig {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            fade_out,
            style: OverlayStyle {
                fill,
                border,
                border_width: self.border_width.max(0.0),
                z_index: self.z_index,
                interactive: false,
                target_opacity: self.opacity.clamp(0.0, 1.0),
                transition: fade_out,
            },
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from `override_path` or the user config directory. A
/// missing file is created with defaults.
pub fn load_settings(override_path: Option<&Path>) {
    let path = match override_path {
        Some(path) => path.to_path_buf(),
        None => {
            let Some(path) = preferred_config_path() else {
                warn!("Could not determine config directory, using default settings");
                return;
            };
            path
        }
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

pub fn parse_settings(content: &str) -> Result<Settings, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content)
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = match generate_settings_yaml(settings) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> Result<String, serde_yaml::Error> {
    let mut content = String::from(SETTINGS_HEADER);
    content.push_str(&serde_yaml::to_string(settings)?);
    Ok(content)
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# pagelight settings
# ============================================================================
# overlay.settle_delay_ms  wait for page layout when the viewer sends no signal
# overlay.fade_out_ms      fade-out length before the overlay is removed
# overlay.fill / border    RRGGBB hex colours, fill_alpha in 0..1
# panel.filter_debounce_ms delay between typing and re-filtering the list
# iconset.filter           lanczos3 | catmull-rom | bilinear | nearest

"#;

// Public API for accessing settings

pub fn current() -> Settings {
    SETTINGS
        .read()
        .map(|s| s.clone())
        .unwrap_or_default()
}

pub fn get_projector_config() -> ProjectorConfig {
    SETTINGS
        .read()
        .map(|s| s.overlay.projector_config())
        .unwrap_or_default()
}

pub fn get_filter_debounce() -> Duration {
    let ms = SETTINGS
        .read()
        .map(|s| s.panel.filter_debounce_ms)
        .unwrap_or_else(|_| default_filter_debounce_ms());
    Duration::from_millis(ms)
}

pub fn get_iconset_filter() -> ResizeFilter {
    SETTINGS
        .read()
        .map(|s| s.iconset.filter)
        .unwrap_or_default()
}

pub fn set_iconset_filter(filter: ResizeFilter) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.iconset.filter = filter;
    }
}
