use serde::{Deserialize, Serialize};

/// Owned by external collaborators; the engine only updates
/// `pool_platform`/`pool_id` during migration rewiring (§3, §4.5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub id: i64,
    pub pool_platform: String,
    pub pool_id: String,
}
