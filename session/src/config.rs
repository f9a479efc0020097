use engine::EngineConfig;

/// Default search depth for a new analysis.
pub const DEFAULT_DEPTH: u32 = 18;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub depth: u32,
    pub detection_threshold: f32,
    pub engine: EngineConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            detection_threshold: detection::config::DEFAULT_ACCEPT_THRESHOLD,
            engine: EngineConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self {
            depth: get_depth(),
            detection_threshold: detection::config::get_accept_threshold(),
            engine: EngineConfig::from_env(),
        }
    }
}

/// Get the analysis depth.
///
/// Priority:
/// 1. `CHESSLENS_DEPTH` env variable if set and positive
/// 2. `18` as fallback
pub fn get_depth() -> u32 {
    std::env::var("CHESSLENS_DEPTH")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|d| *d > 0)
        .unwrap_or(DEFAULT_DEPTH)
}
