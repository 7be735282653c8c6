//! Runtime configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use combat_core::EngineConfig;

/// Configuration shared by the battle service and its workers.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    /// Attempts per submission before surfacing `RefreshRequired`.
    pub max_commit_attempts: u32,
    pub event_buffer_size: usize,
    pub aggregation_buffer_size: usize,
    /// Root of the file stores. `None` falls back to [`default_data_dir`].
    pub data_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            max_commit_attempts: 3,
            event_buffer_size: 100,
            aggregation_buffer_size: 64,
            data_dir: None,
        }
    }
}

impl RuntimeConfig {
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_MAX_COMMIT_ATTEMPTS` - Attempts per submission (default: 3)
    /// - `BATTLE_EVENT_BUFFER` - Event broadcast capacity (default: 100)
    /// - `BATTLE_AGGREGATION_BUFFER` - Usage counter queue size (default: 64)
    /// - `BATTLE_DATA_DIR` - Directory for battle files (default: platform-specific)
    /// - `BATTLE_ROUND_DURATION_MS` - Round length (default: 40000)
    /// - `BATTLE_AP_DEPLETION_PER_SECOND` - AP lost per elapsed second (default: 1.0)
    /// - `BATTLE_COMBAT_TIME_UNIT_MS` - Length of one cooldown unit (default: 10000)
    /// - `BATTLE_STACKING` - Force effect stacking on or off (default: per battle type)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(attempts) = read_env::<u32>("BATTLE_MAX_COMMIT_ATTEMPTS") {
            config.max_commit_attempts = attempts.max(1);
        }
        if let Some(capacity) = read_env::<usize>("BATTLE_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("BATTLE_AGGREGATION_BUFFER") {
            config.aggregation_buffer_size = capacity.max(1);
        }
        config.data_dir = env::var("BATTLE_DATA_DIR").ok().map(PathBuf::from);

        let engine = &mut config.engine;
        if let Some(round_ms) = read_env::<i64>("BATTLE_ROUND_DURATION_MS") {
            engine.clock.round_duration_ms = round_ms.max(1);
        }
        if let Some(rate) = read_env::<f64>("BATTLE_AP_DEPLETION_PER_SECOND") {
            engine.clock.ap_depletion_per_second = rate.max(0.0);
        }
        if let Some(unit_ms) = read_env::<i64>("BATTLE_COMBAT_TIME_UNIT_MS") {
            engine.combat_time_unit_ms = unit_ms.max(0);
        }
        if let Some(stacking) = read_env::<bool>("BATTLE_STACKING") {
            engine.stacking_override = Some(stacking);
        }

        config
    }

    /// Directory holding battle and usage files.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

/// Platform data directory for battle files.
///
/// - macOS: `~/Library/Application Support/battle-engine`
/// - Linux: `~/.local/share/battle-engine` (or `$XDG_DATA_HOME/battle-engine`)
/// - Windows: `%APPDATA%\battle-engine`
/// - Fallback: `./battle_data`
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "battle-engine")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./battle_data"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
