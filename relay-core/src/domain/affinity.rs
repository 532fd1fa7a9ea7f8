//! Workspace affinity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable mapping from a user to the workspace their jobs run in.
///
/// One row per user. Replaced (last write wins) when the stored workspace
/// turns out to be unreachable; no history is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceAffinity {
    pub user_id: String,
    pub workspace_id: String,
    pub updated_at: DateTime<Utc>,
}
