//! ConfigLoader facade over the layered sources.

use super::sources;
use super::AppConfig;
use crate::error::ApiError;
use std::path::Path;
use tracing::debug;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, the global file, an optional explicit file, then the environment.
    pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ApiError> {
        let builder = sources::defaults()?;
        let builder = sources::add_global_file(builder)?;
        let builder = match explicit {
            Some(path) => sources::add_explicit_file(builder, path)?,
            None => builder,
        };
        let builder = sources::add_environment(builder)?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        debug!(?explicit, "Configuration loaded");
        Ok(config)
    }

    /// Load a single file over the defaults, without global file or environment.
    pub fn load_file(path: &Path) -> Result<AppConfig, ApiError> {
        let builder = sources::defaults()?;
        let builder = sources::add_explicit_file(builder, path)?;
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Create default configuration.
    pub fn default() -> AppConfig {
        AppConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_round_trip_through_builder() {
        let config = sources::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.save.content_debounce_ms, 450);
        assert_eq!(config.save.write_back_debounce_ms, 900);
    }

    #[test]
    fn file_overrides_only_the_keys_it_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markdesk.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[save]\ncontent_debounce_ms = 100\n\n[storage]\ndata_dir = \"/tmp/md\"\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(config.save.content_debounce_ms, 100);
        assert_eq!(config.save.write_back_debounce_ms, 900);
        assert_eq!(
            config.storage.data_dir.as_deref(),
            Some(Path::new("/tmp/md"))
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ApiError::ConfigError(_))));
    }
}
