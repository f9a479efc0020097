//! Engine session tunables.
//!
//! Every value has a compile-time default and can be overridden at runtime
//! through a `CHESSLENS_*` environment variable. Unparseable values fall back
//! to the default.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of ranked variations requested from the engine.
pub const DEFAULT_MULTIPV: u32 = 3;

/// Default time allowed for `uciok` and `readyok` during start-up.
const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;

/// Default time allowed between `stop` and the engine's `bestmove`.
const DEFAULT_STOP_TIMEOUT_MS: u64 = 2_000;

/// Locations tried when no engine path is configured.
const ENGINE_SEARCH_PATHS: &[&str] = &[
    "/usr/local/bin/stockfish",
    "/usr/bin/stockfish",
    "/opt/homebrew/bin/stockfish",
    "/usr/games/stockfish",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Explicit engine binary. `None` means search the usual locations.
    pub path: Option<PathBuf>,
    pub multipv: u32,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    pub handshake_timeout: Duration,
    pub stop_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            multipv: DEFAULT_MULTIPV,
            threads: None,
            hash_mb: None,
            handshake_timeout: Duration::from_millis(DEFAULT_HANDSHAKE_TIMEOUT_MS),
            stop_timeout: Duration::from_millis(DEFAULT_STOP_TIMEOUT_MS),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            path: get_engine_path(),
            multipv: get_multipv(),
            threads: None,
            hash_mb: None,
            handshake_timeout: get_handshake_timeout(),
            stop_timeout: get_stop_timeout(),
        }
    }

    pub fn with_multipv(mut self, multipv: u32) -> Self {
        self.multipv = multipv.max(1);
        self
    }

    /// Resolve the binary to launch.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) => Some(path.clone()),
            None => find_engine_path(),
        }
    }
}

/// Get the configured engine binary.
///
/// Priority:
/// 1. `CHESSLENS_ENGINE_PATH` env variable if set
/// 2. `None`, meaning [`find_engine_path`] is consulted at start-up
pub fn get_engine_path() -> Option<PathBuf> {
    std::env::var_os("CHESSLENS_ENGINE_PATH").map(PathBuf::from)
}

/// Get the number of ranked lines (`CHESSLENS_MULTIPV`, default 3, minimum 1).
pub fn get_multipv() -> u32 {
    std::env::var("CHESSLENS_MULTIPV")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MULTIPV)
        .max(1)
}

/// Get the handshake timeout (`CHESSLENS_HANDSHAKE_TIMEOUT_MS`, default 10 s).
pub fn get_handshake_timeout() -> Duration {
    Duration::from_millis(env_millis(
        "CHESSLENS_HANDSHAKE_TIMEOUT_MS",
        DEFAULT_HANDSHAKE_TIMEOUT_MS,
    ))
}

/// Get the stop timeout (`CHESSLENS_STOP_TIMEOUT_MS`, default 2 s).
pub fn get_stop_timeout() -> Duration {
    Duration::from_millis(env_millis("CHESSLENS_STOP_TIMEOUT_MS", DEFAULT_STOP_TIMEOUT_MS))
}

fn env_millis(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Find an engine executable in common locations, then on `PATH`.
pub fn find_engine_path() -> Option<PathBuf> {
    if let Some(found) = ENGINE_SEARCH_PATHS
        .iter()
        .map(Path::new)
        .find(|path| path.is_file())
    {
        return Some(found.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join("stockfish"))
        .find(|candidate| candidate.is_file())
}
