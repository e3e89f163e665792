use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kiln_scene::SceneConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "kiln.toml";

/// Contents of `kiln.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub window: WindowConfig,
    pub scene: SceneConfig,
    pub editor: EditorConfig,
    pub logging: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f64,
    pub height: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Kiln Studio".to_string(),
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Start with fixed 60 Hz stepping.
    pub locked_fps: bool,
    /// Start with the periodic stats log line enabled.
    pub show_stats: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `env_logger` filter; overrides `RUST_LOG` when set.
    pub filter: Option<String>,
}

impl StudioConfig {
    /// Reads `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Config path: the first CLI argument, else `kiln.toml` in the working
/// directory.
pub fn config_path(arg: Option<std::ffi::OsString>) -> PathBuf {
    arg.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(StudioConfig::parse("").unwrap(), StudioConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = StudioConfig::parse(
            r#"
            [window]
            title = "scratch"

            [scene]
            fov_y_degrees = 60.0

            [editor]
            locked_fps = true
            "#,
        )
        .unwrap();

        assert_eq!(cfg.window.title, "scratch");
        assert_eq!(cfg.window.width, 1280.0);
        assert_eq!(cfg.scene.fov_y_degrees, 60.0);
        assert_eq!(cfg.scene.far_plane, 100.0);
        assert!(cfg.editor.locked_fps);
        assert!(!cfg.editor.show_stats);
        assert_eq!(cfg.logging.filter, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(StudioConfig::parse("[window\ntitle = ").is_err());
        assert!(StudioConfig::parse("[scene]\nnear_plane = \"close\"").is_err());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let cfg = StudioConfig::load(Path::new("definitely/not/here/kiln.toml")).unwrap();
        assert_eq!(cfg, StudioConfig::default());
    }

    #[test]
    fn path_prefers_cli_argument() {
        assert_eq!(config_path(None), PathBuf::from("kiln.toml"));
        assert_eq!(
            config_path(Some("scenes/demo.toml".into())),
            PathBuf::from("scenes/demo.toml")
        );
    }
}
