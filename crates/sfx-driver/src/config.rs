use serde::Deserialize;

fn default_chunk_size() -> u32 {
    1000
}

fn default_statement_timeout_ms() -> u64 {
    30_000
}

fn default_root_table() -> String {
    "job".to_string()
}

/// Everything the driver needs that isn't source/destination connection
/// details (those live in `sfx-postgres`/`sfx-destination-file`'s own
/// settings types; `sfx-cli`'s top-level `Settings` composes all of them).
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_root_table")]
    pub root_table: String,
    pub include_set: Vec<String>,
    #[serde(default)]
    pub prune_edges: Vec<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,
    pub checkpoint_prefix: String,
    #[serde(default)]
    pub drift_allow_override: bool,
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

impl DriverConfig {
    pub fn state_key(&self) -> String {
        format!("{}.state", self.checkpoint_prefix)
    }

    pub fn sql_key(&self) -> String {
        format!("{}.sql", self.checkpoint_prefix)
    }
}
