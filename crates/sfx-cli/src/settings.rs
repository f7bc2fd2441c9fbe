use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration (§6). Loaded from a TOML file and overridable by
/// `SFX_`-prefixed environment variables (`__` nests, e.g.
/// `SFX_DESTINATION__PATH`), mirroring the file-then-env layering the rest
/// of this codebase's services use for settings.
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub source: SourceSettings,
    pub destination: DestinationSettings,
    pub driver: sfx_driver::DriverConfig,
}

#[derive(Debug, Deserialize)]
pub struct SourceSettings {
    /// `source.dsn`: the Postgres connection string.
    pub dsn: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_pk_column")]
    pub pk_column: String,
    #[serde(default = "default_last_modified_column")]
    pub last_modified_column: String,
}

#[derive(Debug, Deserialize)]
pub struct DestinationSettings {
    /// `destination.*`: for the bundled file-based reference `Destination`,
    /// the newline-delimited JSON path to append batches to.
    pub path: PathBuf,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_pk_column() -> String {
    "id".to_string()
}

fn default_last_modified_column() -> String {
    "last_modified".to_string()
}

pub fn load_settings(path: &std::path::Path) -> Result<Settings, config::ConfigError> {
    let mut config = config::Config::default();
    config.merge(config::File::from(path.to_path_buf()).required(true))?;
    config.merge(
        config::Environment::with_prefix("SFX")
            .prefix_separator("_")
            .separator("__"),
    )?;
    config.try_into()
}
