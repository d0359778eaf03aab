//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skyforge_atlas::StitchConfig;

use crate::error::ConfigError;

const CONFIG_FILE: &str = "skyforge.ron";
const APP_NAME: &str = "skyforge";

/// Top-level converter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where face images are read from.
    pub input: InputConfig,
    /// Where the atlas and material files go.
    pub output: OutputConfig,
    /// Face matching, size inference and transform tables.
    pub stitch: StitchConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Seconds to wait before exiting, so a double-clicked console window
    /// stays readable.
    pub exit_delay_secs: u64,
}

/// Input settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Directory scanned for face images.
    pub directory: PathBuf,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the atlas and material files.
    pub directory: PathBuf,
    /// Atlas file name.
    pub atlas_file: String,
    /// Skybox material file name.
    pub skybox_material_file: String,
    /// Moondome material file name.
    pub moondome_material_file: String,
    /// Engine-side root folder that material texture paths start from.
    pub material_root: String,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            stitch: StitchConfig::default(),
            debug: DebugConfig::default(),
            exit_delay_secs: 3,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("skybox"),
            atlas_file: "skybox_jimi.png".to_string(),
            skybox_material_file: "skybox_jimi.vmat".to_string(),
            moondome_material_file: "moondome_jimi.vmat".to_string(),
            material_root: "materials".to_string(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Derived paths ---

impl OutputConfig {
    /// Filesystem path of the atlas.
    pub fn atlas_path(&self) -> PathBuf {
        self.directory.join(&self.atlas_file)
    }

    /// Filesystem path of the skybox material.
    pub fn skybox_material_path(&self) -> PathBuf {
        self.directory.join(&self.skybox_material_file)
    }

    /// Filesystem path of the moondome material.
    pub fn moondome_material_path(&self) -> PathBuf {
        self.directory.join(&self.moondome_material_file)
    }

    /// Engine-relative texture path written into materials, e.g.
    /// `materials/skybox/skybox_jimi.png`. Always uses forward slashes.
    pub fn engine_texture_path(&self) -> String {
        let folder = self
            .directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        [self.material_root.as_str(), folder.as_str(), self.atlas_file.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Platform configuration directory for Skyforge.
///
/// # Errors
///
/// [`ConfigError::NoConfigDir`] if the OS does not expose one.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `skyforge.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyforge_atlas::{FaceId, Rotation};

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(4))
                .unwrap();
        assert!(ron_str.contains("atlas_file: \"skybox_jimi.png\""));
        assert!(ron_str.contains("exit_delay_secs: 3"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(input: (directory: \"faces\"))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.input.directory, PathBuf::from("faces"));
        assert_eq!(config.output, OutputConfig::default());
        assert_eq!(config.stitch, StitchConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_transform_override_from_ron() {
        let ron_str = "(stitch: (tables: (default: [(slot: front, source: front, rotation: 90)])))";
        let config: Config = ron::from_str(ron_str).unwrap();
        let rule = config.stitch.tables.default.rule_for(FaceId::Front);
        assert_eq!(rule.source, FaceId::Front);
        assert_eq!(rule.rotation, Rotation::Ccw90);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.output.atlas_file = "night.png".to_string();
        config.stitch.min_face_size = 32;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_output_paths() {
        let output = OutputConfig::default();
        assert_eq!(output.atlas_path(), PathBuf::from("skybox").join("skybox_jimi.png"));
        assert_eq!(
            output.moondome_material_path(),
            PathBuf::from("skybox").join("moondome_jimi.vmat")
        );
        assert_eq!(output.engine_texture_path(), "materials/skybox/skybox_jimi.png");
    }

    #[test]
    fn test_engine_path_uses_last_directory_component() {
        let output = OutputConfig {
            directory: PathBuf::from("out").join("sky_night"),
            material_root: String::new(),
            ..OutputConfig::default()
        };
        assert_eq!(output.engine_texture_path(), "sky_night/skybox_jimi.png");
    }
}
