use std::collections::HashMap;

use tracing::warn;

/// Reputation assumed when no collaborator knows the author.
pub const NEUTRAL_REPUTATION: f64 = 0.5;

/// Supplies author reputation in [0, 1].
pub trait ReputationSource {
    /// `None` when the agent is unknown.
    fn reputation_of(&self, agent_id: &str) -> Option<f64>;
}

/// Knows nobody; every author resolves to [`NEUTRAL_REPUTATION`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NeutralReputation;

impl ReputationSource for NeutralReputation {
    fn reputation_of(&self, _agent_id: &str) -> Option<f64> {
        None
    }
}

/// Fixed reputation table.
#[derive(Clone, Debug, Default)]
pub struct StaticReputation {
    scores: HashMap<String, f64>,
}

impl StaticReputation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, agent_id: impl Into<String>, reputation: f64) -> Self {
        self.scores.insert(agent_id.into(), reputation);
        self
    }
}

impl ReputationSource for StaticReputation {
    fn reputation_of(&self, agent_id: &str) -> Option<f64> {
        self.scores.get(agent_id).copied()
    }
}

impl<R: ReputationSource + ?Sized> ReputationSource for &R {
    fn reputation_of(&self, agent_id: &str) -> Option<f64> {
        (**self).reputation_of(agent_id)
    }
}

/// Resolve an author's reputation into [0, 1].
///
/// Unknown and non-finite values fall back to neutral; out-of-range values
/// are clamped.
pub fn resolve_reputation<R: ReputationSource + ?Sized>(source: &R, agent_id: &str) -> f64 {
    match source.reputation_of(agent_id) {
        None => NEUTRAL_REPUTATION,
        Some(value) if !value.is_finite() => {
            warn!(agent_id, "Non-finite reputation, using neutral");
            NEUTRAL_REPUTATION
        }
        Some(value) if !(0.0..=1.0).contains(&value) => {
            warn!(agent_id, value, "Reputation out of range, clamping");
            value.clamp(0.0, 1.0)
        }
        Some(value) => value,
    }
}
