//! Provenance records: authorship, witness attestations, external anchors,
//! and lineage pointers.
//!
//! - **Provenance**: who wrote the memory, where, when, and why
//! - **Witness**: another agent's confirm / dispute / partial attestation
//! - **Anchor**: an external reference pinned to the content hash
//! - **Lineage**: supersede chain and derivation links
//!
//! Witnesses and anchors are append-only. Once recorded they are never
//! edited or removed; the aggregate only exposes them as slices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::content::ContentHash;
use crate::error::MemoryError;
use crate::id::MemoryId;

/// The authoring agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub agent_id: String,
    pub platform: String,
    /// Always `None` until a signer is integrated.
    pub signature: Option<String>,
}

/// Circumstances under which the memory was written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreationContext {
    pub session_id: Option<String>,
    /// What prompted the memory.
    pub trigger: Option<String>,
    /// Author's self-declared confidence, in [0, 1].
    pub confidence: f64,
}

/// Authorship record, set once at creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub context: CreationContext,
    /// Forward-compatible slot for fields added by future collaborators
    /// (signers, attestation services). Sorted by key on the wire.
    #[serde(default)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// A witness's verdict on a memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attestation {
    /// The memory is accurate.
    Confirm,
    /// The memory is wrong.
    Dispute,
    /// Some of it holds, some does not.
    Partial,
}

impl Attestation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Dispute => "dispute",
            Self::Partial => "partial",
        }
    }
}

impl fmt::Display for Attestation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attestation {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirm" => Ok(Self::Confirm),
            "dispute" => Ok(Self::Dispute),
            "partial" => Ok(Self::Partial),
            other => Err(MemoryError::UnknownAttestation(other.to_string())),
        }
    }
}

/// One recorded attestation. Permanent once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub agent_id: String,
    pub witnessed_at: DateTime<Utc>,
    pub attestation: Attestation,
    pub signature: Option<String>,
    pub notes: Option<String>,
}

/// Where an anchor points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorType {
    /// A post on an external publishing platform.
    #[serde(alias = "moltbook_post")]
    ExternalPost,
    /// A version-control commit.
    GitCommit,
    /// A distributed-ledger record.
    Blockchain,
    /// Any other URL.
    Url,
}

impl AnchorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExternalPost => "external_post",
            Self::GitCommit => "git_commit",
            Self::Blockchain => "blockchain",
            Self::Url => "url",
        }
    }
}

impl fmt::Display for AnchorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnchorType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external_post" | "moltbook_post" => Ok(Self::ExternalPost),
            "git_commit" => Ok(Self::GitCommit),
            "blockchain" => Ok(Self::Blockchain),
            "url" => Ok(Self::Url),
            other => Err(MemoryError::UnknownAnchorType(other.to_string())),
        }
    }
}

/// External reference tied to the content hash at the moment of anchoring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    #[serde(rename = "type")]
    pub anchor_type: AnchorType,
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub hash: ContentHash,
}

impl Anchor {
    /// Whether the anchored hash still matches `current`.
    pub fn matches(&self, current: &ContentHash) -> bool {
        &self.hash == current
    }
}

/// Supersede and derivation pointers. References by id only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    pub supersedes: Option<MemoryId>,
    /// Set by whoever creates the successor.
    pub superseded_by: Option<MemoryId>,
    #[serde(default)]
    pub derived_from: Vec<MemoryId>,
    /// Distance to the root of the supersede chain; 0 for an original.
    pub chain_depth: u32,
}

impl Lineage {
    /// Lineage of an original memory.
    pub fn root(derived_from: Vec<MemoryId>) -> Self {
        Self {
            derived_from,
            ..Default::default()
        }
    }

    /// Lineage of a memory superseding `predecessor`, which sits at
    /// `predecessor_depth`.
    pub fn successor_of(
        predecessor: MemoryId,
        predecessor_depth: u32,
        derived_from: Vec<MemoryId>,
    ) -> Self {
        Self {
            supersedes: Some(predecessor),
            superseded_by: None,
            derived_from,
            chain_depth: predecessor_depth.saturating_add(1),
        }
    }

    pub fn is_original(&self) -> bool {
        self.supersedes.is_none()
    }

    pub fn is_superseded(&self) -> bool {
        self.superseded_by.is_some()
    }
}
