//! Runtime tunables for the command line front end.
//!
//! Engine, depth and detection settings live with the crates that use them
//! (`engine::config`, `session::config`, `detection::config`); this module
//! only covers what the binary itself owns.

use std::path::PathBuf;

/// Log file name prefix inside the log directory.
pub const LOG_FILE_PREFIX: &str = "chesslens";

/// Get the directory for rolling log files.
///
/// Priority:
/// 1. `CHESSLENS_LOG_DIR` env variable if set and non-empty
/// 2. `None`: logs go to stderr only
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("CHESSLENS_LOG_DIR")
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}
