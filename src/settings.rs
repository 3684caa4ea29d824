use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{LevelFilter, debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::compositor::Palette;
use crate::error::SettingsError;
use crate::surface::{PixelFormat, Rgb};
use crate::viewport::ScrollSteps;

pub const CURRENT_VERSION: u32 = 1;
pub const APP_NAME: &str = "stripview";
pub const DEFAULT_CONVERTER: &str = "/usr/bin/2ff";
const SETTINGS_FILENAME: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Converter used by comic-viewer; reads the image on stdin.
    #[serde(default = "default_converter")]
    pub converter: PathBuf,

    /// Layout height for undecoded items. Each viewer has its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_height: Option<u32>,

    #[serde(default = "default_page_step")]
    pub page_step: f32,

    #[serde(default = "default_arrow_step")]
    pub arrow_step: f32,

    #[serde(default = "default_zoom_step")]
    pub zoom_step: f32,

    #[serde(default = "default_background")]
    pub background: String,

    #[serde(default = "default_error_color")]
    pub error_color: String,

    #[serde(default)]
    pub surface_format: PixelFormat,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(default = "default_true")]
    pub compress_frames: bool,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_converter() -> PathBuf {
    PathBuf::from(DEFAULT_CONVERTER)
}

fn default_page_step() -> f32 {
    ScrollSteps::default().page
}

fn default_arrow_step() -> f32 {
    ScrollSteps::default().arrow
}

fn default_zoom_step() -> f32 {
    ScrollSteps::default().zoom
}

fn default_background() -> String {
    "#000000".to_string()
}

fn default_error_color() -> String {
    "#ff0000".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            converter: default_converter(),
            fallback_height: None,
            page_step: default_page_step(),
            arrow_step: default_arrow_step(),
            zoom_step: default_zoom_step(),
            background: default_background(),
            error_color: default_error_color(),
            surface_format: PixelFormat::default(),
            log_level: None,
            compress_frames: true,
        }
    }
}

impl Settings {
    /// Scroll and zoom multipliers. Values outside their usable range fall
    /// back to the defaults.
    pub fn steps(&self) -> ScrollSteps {
        let defaults = ScrollSteps::default();
        ScrollSteps {
            page: fraction_or("page_step", self.page_step, 1.0, defaults.page),
            arrow: fraction_or("arrow_step", self.arrow_step, 1.0, defaults.arrow),
            // A zoom step of 1 would make zooming a no-op.
            zoom: fraction_or("zoom_step", self.zoom_step, 0.99, defaults.zoom),
        }
    }

    pub fn palette(&self) -> Palette {
        let defaults = Palette::default();
        Palette {
            background: color_or("background", &self.background, defaults.background),
            error: color_or("error_color", &self.error_color, defaults.error),
        }
    }

    pub fn log_level(&self) -> Option<LevelFilter> {
        let level = self.log_level.as_deref()?;
        match LevelFilter::from_str(level) {
            Ok(level) => Some(level),
            Err(_) => {
                warn!("Ignoring unknown log_level {level:?}");
                None
            }
        }
    }
}

/// Accept `value` if it lies in `(0, max]`.
fn fraction_or(name: &str, value: f32, max: f32, default: f32) -> f32 {
    if value.is_finite() && value > 0.0 && value <= max {
        value
    } else {
        warn!("Ignoring {name} {value}, using {default}");
        default
    }
}

fn color_or(name: &str, value: &str, default: Rgb) -> Rgb {
    Rgb::from_hex(value).unwrap_or_else(|| {
        warn!("Ignoring {name} {value:?}, expected #rrggbb");
        default
    })
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from `explicit`, or from the default location.
///
/// Problems with an explicitly given file are returned to the caller. A
/// missing or broken default file is logged and defaults are used; the
/// defaults are never written back.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    if let Some(path) = explicit {
        return load_settings_from_path(path);
    }

    let Some(path) = default_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return Ok(Settings::default());
    };
    if !path.exists() {
        info!("No settings file at {path:?}, using defaults");
        return Ok(Settings::default());
    }

    match load_settings_from_path(&path) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            error!("{e}");
            Ok(Settings::default())
        }
    }
}

pub fn load_settings_from_path(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut settings = parse_settings(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded settings from {path:?}");

    if settings.version < CURRENT_VERSION {
        migrate_settings(&mut settings);
    }
    Ok(settings)
}

fn parse_settings(content: &str) -> Result<Settings, serde_yaml::Error> {
    // An empty or comment-only file deserializes as null.
    if content.trim().lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('#')) {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content)
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // Future migrations go here:
    // if settings.version < 2 {
    //     migrate_v1_to_v2(settings);
    // }

    settings.version = CURRENT_VERSION;
}
