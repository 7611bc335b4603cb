//! Memory content and its fingerprint.
//!
//! The content hash covers the memory type, summary and body. Tags are
//! categorization metadata and stay outside the hash, so retagging a memory
//! never invalidates its anchors.
//!
//! Two encodings exist. [`content_hash`] frames each field with its length
//! and is what new anchors record. [`legacy_content_hash`] is the older
//! `type:summary:body` join; it is ambiguous when a summary contains `:`
//! but is kept so anchors written by colon-joining tools still verify.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::MemoryError;

/// Kinds of memory an agent can record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    /// Realized something non-obvious.
    Insight,
    /// Met an interesting agent.
    Encounter,
    /// Chose between alternatives.
    Decision,
    /// Was wrong about something.
    Correction,
    /// Noticed a pattern.
    Observation,
}

impl MemoryType {
    pub const ALL: [MemoryType; 5] = [
        MemoryType::Insight,
        MemoryType::Encounter,
        MemoryType::Decision,
        MemoryType::Correction,
        MemoryType::Observation,
    ];

    /// Canonical string tag, as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insight => "insight",
            Self::Encounter => "encounter",
            Self::Decision => "decision",
            Self::Correction => "correction",
            Self::Observation => "observation",
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MemoryError::UnknownMemoryType(s.to_string()))
    }
}

/// The substantive payload of a memory. Fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    pub summary: String,
    pub body: String,
    /// Display order is preserved; semantics treat tags as a set.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Content {
    /// Fingerprint of type, summary and body.
    pub fn hash(&self) -> ContentHash {
        content_hash(self.memory_type, &self.summary, &self.body)
    }

    /// Fingerprint in the older colon-joined encoding.
    pub fn legacy_hash(&self) -> ContentHash {
        legacy_content_hash(self.memory_type, &self.summary, &self.body)
    }

    /// Whether the memory carries `tag`, ignoring display order.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// SHA-256 digest of a memory's substantive content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}..)", &self.to_hex()[..8])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)) {
            return Err(MemoryError::InvalidContentHash(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| MemoryError::InvalidContentHash(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for ContentHash {
    type Error = MemoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_hex()
    }
}

/// Hash type, summary and body with SHA-256.
///
/// Each field is framed by its byte length so that text moving between
/// summary and body always changes the digest.
pub fn content_hash(memory_type: MemoryType, summary: &str, body: &str) -> ContentHash {
    let mut hasher = Sha256::new();
    for field in [memory_type.as_str(), summary, body] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    ContentHash(hasher.finalize().into())
}

/// SHA-256 of `"{type}:{summary}:{body}"`.
///
/// Only for verifying anchors recorded by colon-joining tools; `"a:b" + "c"`
/// and `"a" + "b:c"` collide here.
pub fn legacy_content_hash(memory_type: MemoryType, summary: &str, body: &str) -> ContentHash {
    let joined = format!("{}:{summary}:{body}", memory_type.as_str());
    ContentHash(Sha256::digest(joined.as_bytes()).into())
}
