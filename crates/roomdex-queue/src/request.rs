//! Indexing request carried through the per-dataroom queue

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single request to index a dataroom
///
/// Immutable once enqueued; removed from the queue atomically on dequeue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingRequest {
    pub dataroom_id: String,
    pub team_id: String,
    pub user_id: String,
    /// Enqueue time in epoch milliseconds, doubles as the queue sort score
    pub timestamp_ms: i64,
    pub request_id: String,
}

impl IndexingRequest {
    /// Build a new request with a fresh `request_id`
    ///
    /// The ID carries the dataroom, team, and timestamp for log readability
    /// plus a random fragment so that two triggers in the same millisecond
    /// never collide. Every trigger is meant to be represented in the queue,
    /// so IDs are intentionally unique per call.
    pub fn new(
        dataroom_id: impl Into<String>,
        team_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let dataroom_id = dataroom_id.into();
        let team_id = team_id.into();
        let timestamp_ms = Utc::now().timestamp_millis();
        let fragment = Uuid::new_v4().simple().to_string();
        let request_id = format!(
            "{dataroom_id}:{team_id}:{timestamp_ms}:{}",
            &fragment[..8]
        );

        Self {
            dataroom_id,
            team_id,
            user_id: user_id.into(),
            timestamp_ms,
            request_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_unique_per_call() {
        let a = IndexingRequest::new("dr_1", "team_1", "user_1");
        let b = IndexingRequest::new("dr_1", "team_1", "user_1");
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn request_id_embeds_dataroom_and_team() {
        let request = IndexingRequest::new("dr_1", "team_1", "user_1");
        assert!(request.request_id.starts_with("dr_1:team_1:"));
    }
}
