//! Structured wire/storage representation.
//!
//! Field names are the compatibility contract:
//!
//! ```text
//! id, version,
//! content    { type, summary, body, tags },
//! provenance { author { agent_id, platform, signature }, created_at,
//!              context { session_id, trigger, confidence }, extensions },
//! witnesses  [ { agent_id, witnessed_at, attestation, signature, notes } ],
//! anchors    [ { type, reference, created_at, hash } ],
//! lineage    { supersedes, superseded_by, derived_from, chain_depth },
//! trust      { score, factors { author_reputation, witness_count,
//!              anchor_count, age_days, dispute_count }, computed_at }
//! ```
//!
//! Timestamps are RFC 3339 in UTC, enums are their lowercase tags, hashes
//! are lowercase hex. Field order is fixed by declaration order, extension
//! keys are sorted, and absent optionals are written as `null`, so
//! decoding and re-encoding a record reproduces it byte for byte.

use std::collections::HashSet;

use serde::Deserialize;

use crate::content::Content;
use crate::error::{MemoryError, Result};
use crate::id::MemoryId;
use crate::memory::Memory;
use crate::provenance::{Anchor, Lineage, Provenance, Witness};
use crate::trust::{Trust, compute_trust};

/// Decoded but unchecked record. Becomes a [`Memory`] only through
/// `TryFrom`, which rejects records whose trust has drifted.
#[derive(Deserialize)]
pub struct MemoryRecord {
    id: MemoryId,
    version: u32,
    content: Content,
    provenance: Provenance,
    #[serde(default)]
    witnesses: Vec<Witness>,
    #[serde(default)]
    anchors: Vec<Anchor>,
    lineage: Lineage,
    trust: Trust,
}

impl TryFrom<MemoryRecord> for Memory {
    type Error = MemoryError;

    fn try_from(record: MemoryRecord) -> Result<Self> {
        let memory = Memory {
            id: record.id,
            version: record.version,
            content: record.content,
            provenance: record.provenance,
            witnesses: record.witnesses,
            anchors: record.anchors,
            lineage: record.lineage,
            trust: record.trust,
        };

        if let Some(problem) = structural_errors(&memory).into_iter().next() {
            return Err(MemoryError::InvalidRecord(problem));
        }

        let recomputed = compute_trust(&memory.trust_inputs(), memory.trust.computed_at);
        if !recomputed.same_assessment(&memory.trust) {
            return Err(MemoryError::TrustMismatch {
                stored: memory.trust.score,
                recomputed: recomputed.score,
            });
        }
        Ok(memory)
    }
}

/// Violations that make a record unusable, independent of any configured
/// limits. Empty for every memory built through the factory.
pub(crate) fn structural_errors(memory: &Memory) -> Vec<String> {
    let mut errors = Vec::new();

    if memory.id.is_empty() {
        errors.push("id cannot be empty".to_string());
    }
    if memory.version == 0 {
        errors.push("version must be at least 1".to_string());
    }
    if memory.provenance.author.agent_id.trim().is_empty() {
        errors.push("provenance.author.agent_id cannot be empty".to_string());
    }

    let confidence = memory.provenance.context.confidence;
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        errors.push(format!(
            "provenance.context.confidence must be between 0 and 1, got {confidence}"
        ));
    }

    let lineage = &memory.lineage;
    if lineage.supersedes.is_none() && lineage.chain_depth != 0 {
        errors.push(format!(
            "lineage.chain_depth is {} but the memory supersedes nothing",
            lineage.chain_depth
        ));
    }
    if lineage.supersedes.is_some() && lineage.chain_depth == 0 {
        errors.push("lineage.chain_depth is 0 but the memory supersedes another".to_string());
    }
    if lineage.supersedes.as_ref() == Some(&memory.id)
        || lineage.superseded_by.as_ref() == Some(&memory.id)
        || lineage.derived_from.contains(&memory.id)
    {
        errors.push("lineage cannot reference the memory itself".to_string());
    }
    let mut ancestors = HashSet::new();
    for (i, ancestor) in lineage.derived_from.iter().enumerate() {
        if ancestor.is_empty() {
            errors.push(format!("lineage.derived_from[{i}] cannot be empty"));
        } else if !ancestors.insert(ancestor) {
            errors.push(format!("lineage.derived_from[{i}] repeats {ancestor}"));
        }
    }

    let trust = &memory.trust;
    if !(0.0..=1.0).contains(&trust.score) {
        errors.push(format!("trust.score must be between 0 and 1, got {}", trust.score));
    }
    let reputation = trust.factors.author_reputation;
    if !(0.0..=1.0).contains(&reputation) {
        errors.push(format!(
            "trust.factors.author_reputation must be between 0 and 1, got {reputation}"
        ));
    }

    errors
}

/// Nested field-name → value mapping of the whole memory.
pub fn to_value(memory: &Memory) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(memory)?)
}

/// Compact JSON.
pub fn to_json(memory: &Memory) -> Result<String> {
    Ok(serde_json::to_string(memory)?)
}

/// Indented JSON for humans.
pub fn to_json_pretty(memory: &Memory) -> Result<String> {
    Ok(serde_json::to_string_pretty(memory)?)
}

/// Decode a structured record, rejecting malformed or drifted ones.
pub fn from_value(value: serde_json::Value) -> Result<Memory> {
    serde_json::from_value(value).map_err(into_memory_error)
}

/// Decode JSON, rejecting malformed or drifted records.
pub fn from_json(json: &str) -> Result<Memory> {
    serde_json::from_str(json).map_err(into_memory_error)
}

/// Validation failures surface through serde as custom errors; keep them
/// distinguishable from syntax errors by re-wrapping as `InvalidRecord`.
fn into_memory_error(err: serde_json::Error) -> MemoryError {
    if err.is_data() {
        MemoryError::InvalidRecord(err.to_string())
    } else {
        MemoryError::Serialization(err)
    }
}
