//! Per-team feature flag gate for the indexing trigger

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Flags resolved for a team
///
/// Carries only the flags this subsystem consults; providers may expose
/// more.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamFlags {
    pub rag_indexing: bool,
}

/// Resolves feature flags for a team
#[async_trait]
pub trait FeatureFlagService: Send + Sync {
    /// Fetch the team's flags; lookup failures should degrade to
    /// all-disabled rather than propagate
    async fn get_flags(&self, team_id: &str) -> TeamFlags;
}

/// Flag service driven by a static default plus per-team disables
///
/// Stands in for an external flag provider: enabled by default, with an
/// explicit deny list.
#[derive(Clone)]
pub struct StaticFlagService {
    enabled_by_default: bool,
    disabled_teams: Arc<Mutex<HashSet<String>>>,
}

impl Default for StaticFlagService {
    fn default() -> Self {
        Self {
            enabled_by_default: true,
            disabled_teams: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl StaticFlagService {
    pub fn new(enabled_by_default: bool) -> Self {
        Self {
            enabled_by_default,
            ..Self::default()
        }
    }

    /// Disable the flag for a specific team
    pub fn disable_team(&self, team_id: &str) {
        if let Ok(mut teams) = self.disabled_teams.lock() {
            teams.insert(team_id.to_string());
        }
    }
}

#[async_trait]
impl FeatureFlagService for StaticFlagService {
    async fn get_flags(&self, team_id: &str) -> TeamFlags {
        let disabled = self
            .disabled_teams
            .lock()
            .map(|teams| teams.contains(team_id))
            .unwrap_or(true);
        TeamFlags {
            rag_indexing: self.enabled_by_default && !disabled,
        }
    }
}
