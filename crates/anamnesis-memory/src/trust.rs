//! Trust scoring.
//!
//! Trust is derived entirely from a memory's attestation state. The score is
//! built from threshold credits rather than linear sums:
//!
//! - existence: 0.2 for a record with declared authorship
//! - confirmations: +0.2 at the first, +0.1 more at the third
//! - anchors: +0.2 at the first, +0.1 more at the second
//! - author reputation: `reputation × 0.2`
//! - disputes: −0.15 each
//!
//! The total is clamped to [0, 1] and rounded to three decimals. Partial
//! attestations are recorded but count toward neither bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::Memory;
use crate::provenance::{Anchor, Attestation, Witness};

/// Weights of the scoring algorithm.
///
/// The defaults are the only weights stored trust is ever computed with;
/// other values are for previewing alternatives via [`compute_trust_with`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustWeights {
    /// Flat credit for a record with declared authorship. Becomes a
    /// signature-verification credit once signing exists.
    pub existence_credit: f64,
    /// Credit at the first confirmation.
    pub first_confirmation: f64,
    /// Number of confirmations that unlocks the corroboration bonus.
    pub corroboration_threshold: u32,
    pub corroboration_bonus: f64,
    pub first_anchor: f64,
    pub second_anchor: f64,
    /// Multiplier applied to author reputation.
    pub reputation_weight: f64,
    /// Deducted per dispute.
    pub dispute_penalty: f64,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            existence_credit: 0.2,
            first_confirmation: 0.2,
            corroboration_threshold: 3,
            corroboration_bonus: 0.1,
            first_anchor: 0.2,
            second_anchor: 0.1,
            reputation_weight: 0.2,
            dispute_penalty: 0.15,
        }
    }
}

/// Snapshot of the inputs a score was computed from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustFactors {
    pub author_reputation: f64,
    /// Confirmations only.
    pub witness_count: u32,
    pub anchor_count: u32,
    /// Whole days from creation to computation.
    pub age_days: u32,
    pub dispute_count: u32,
}

/// Derived trust. Never set directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trust {
    /// In [0, 1], three decimals.
    pub score: f64,
    pub factors: TrustFactors,
    pub computed_at: DateTime<Utc>,
}

impl Trust {
    /// Same score and factors, regardless of when each was computed.
    pub fn same_assessment(&self, other: &Trust) -> bool {
        self.score == other.score && self.factors == other.factors
    }
}

/// Everything the scorer reads.
#[derive(Clone, Copy, Debug)]
pub struct TrustInputs<'a> {
    pub witnesses: &'a [Witness],
    pub anchors: &'a [Anchor],
    pub created_at: DateTime<Utc>,
    pub author_reputation: f64,
}

/// Score with the default weights.
pub fn compute_trust(inputs: &TrustInputs<'_>, now: DateTime<Utc>) -> Trust {
    compute_trust_with(&TrustWeights::default(), inputs, now)
}

/// Score with explicit weights. Pure: the same inputs always give the same
/// score and factors.
pub fn compute_trust_with(
    weights: &TrustWeights,
    inputs: &TrustInputs<'_>,
    now: DateTime<Utc>,
) -> Trust {
    let confirmations = count(inputs.witnesses, Attestation::Confirm);
    let disputes = count(inputs.witnesses, Attestation::Dispute);
    let anchors = saturating_u32(inputs.anchors.len());

    let mut score = weights.existence_credit;

    if confirmations >= 1 {
        score += weights.first_confirmation;
    }
    if confirmations >= weights.corroboration_threshold {
        score += weights.corroboration_bonus;
    }

    if anchors >= 1 {
        score += weights.first_anchor;
    }
    if anchors >= 2 {
        score += weights.second_anchor;
    }

    score += inputs.author_reputation * weights.reputation_weight;
    score -= f64::from(disputes) * weights.dispute_penalty;

    Trust {
        score: round3(score.clamp(0.0, 1.0)),
        factors: TrustFactors {
            author_reputation: inputs.author_reputation,
            witness_count: confirmations,
            anchor_count: anchors,
            age_days: age_days(inputs.created_at, now),
            dispute_count: disputes,
        },
        computed_at: now,
    }
}

/// Recompute a memory's score from its current state.
pub fn compute_trust_score(memory: &Memory) -> f64 {
    compute_trust(&memory.trust_inputs(), memory.trust().computed_at).score
}

fn count(witnesses: &[Witness], attestation: Attestation) -> u32 {
    saturating_u32(
        witnesses
            .iter()
            .filter(|w| w.attestation == attestation)
            .count(),
    )
}

fn age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let days = (now - created_at).num_days().max(0);
    u32::try_from(days).unwrap_or(u32::MAX)
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{MemoryType, content_hash};
    use crate::provenance::AnchorType;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 3, 16, 0, 0).unwrap()
    }

    fn witness(attestation: Attestation) -> Witness {
        Witness {
            agent_id: "eudaemon_0".to_string(),
            witnessed_at: t0(),
            attestation,
            signature: None,
            notes: None,
        }
    }

    fn anchor() -> Anchor {
        Anchor {
            anchor_type: AnchorType::Url,
            reference: "https://example.org/p/1".to_string(),
            created_at: t0(),
            hash: content_hash(MemoryType::Insight, "s", "b"),
        }
    }

    fn score(witnesses: &[Witness], anchors: &[Anchor], reputation: f64) -> f64 {
        let inputs = TrustInputs {
            witnesses,
            anchors,
            created_at: t0(),
            author_reputation: reputation,
        };
        compute_trust(&inputs, t0()).score
    }

    #[test]
    fn test_bare_memory_score() {
        assert_eq!(score(&[], &[], 0.5), 0.3);
        assert_eq!(score(&[], &[], 0.0), 0.2);
        assert_eq!(score(&[], &[], 1.0), 0.4);
    }

    #[test]
    fn test_confirmation_thresholds() {
        let confirms: Vec<_> = (0..5).map(|_| witness(Attestation::Confirm)).collect();
        let scores: Vec<f64> = (0..=5).map(|n| score(&confirms[..n], &[], 0.5)).collect();
        assert_eq!(scores, vec![0.3, 0.5, 0.5, 0.6, 0.6, 0.6]);
    }

    #[test]
    fn test_anchor_thresholds() {
        let anchors: Vec<_> = (0..3).map(|_| anchor()).collect();
        assert_eq!(score(&[], &anchors[..1], 0.5), 0.5);
        assert_eq!(score(&[], &anchors[..2], 0.5), 0.6);
        assert_eq!(score(&[], &anchors[..3], 0.5), 0.6);
    }

    #[test]
    fn test_disputes_penalize_and_clamp() {
        assert_eq!(score(&[witness(Attestation::Dispute)], &[], 0.5), 0.15);
        let disputes: Vec<_> = (0..10).map(|_| witness(Attestation::Dispute)).collect();
        assert_eq!(score(&disputes, &[], 0.5), 0.0);
    }

    #[test]
    fn test_score_never_exceeds_one() {
        let confirms: Vec<_> = (0..10).map(|_| witness(Attestation::Confirm)).collect();
        let anchors: Vec<_> = (0..10).map(|_| anchor()).collect();
        let heavy = TrustWeights {
            existence_credit: 0.9,
            ..TrustWeights::default()
        };
        let inputs = TrustInputs {
            witnesses: &confirms,
            anchors: &anchors,
            created_at: t0(),
            author_reputation: 1.0,
        };
        assert_eq!(compute_trust(&inputs, t0()).score, 1.0);
        assert_eq!(compute_trust_with(&heavy, &inputs, t0()).score, 1.0);
    }

    #[test]
    fn test_partial_counts_nowhere() {
        let witnesses = vec![witness(Attestation::Partial), witness(Attestation::Partial)];
        let inputs = TrustInputs {
            witnesses: &witnesses,
            anchors: &[],
            created_at: t0(),
            author_reputation: 0.5,
        };
        let trust = compute_trust(&inputs, t0());
        assert_eq!(trust.score, 0.3);
        assert_eq!(trust.factors.witness_count, 0);
        assert_eq!(trust.factors.dispute_count, 0);
    }

    #[test]
    fn test_age_days_from_creation() {
        let inputs = TrustInputs {
            witnesses: &[],
            anchors: &[],
            created_at: t0(),
            author_reputation: 0.5,
        };
        let later = compute_trust(&inputs, t0() + Duration::hours(73));
        assert_eq!(later.factors.age_days, 3);
        assert_eq!(later.score, 0.3);

        let earlier = compute_trust(&inputs, t0() - Duration::days(1));
        assert_eq!(earlier.factors.age_days, 0);
    }

    #[test]
    fn test_same_assessment_ignores_timestamp() {
        let inputs = TrustInputs {
            witnesses: &[],
            anchors: &[],
            created_at: t0(),
            author_reputation: 0.5,
        };
        let a = compute_trust(&inputs, t0());
        let b = compute_trust(&inputs, t0() + Duration::minutes(5));
        assert!(a.same_assessment(&b));
        assert_ne!(a, b);
    }
}
