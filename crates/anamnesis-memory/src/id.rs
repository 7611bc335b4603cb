use rand::random;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by every generated memory id.
pub const MEMORY_ID_PREFIX: &str = "mem_";

/// Opaque memory identifier.
///
/// Generated ids are `mem_` followed by 128 random bits in hex. Ids read back
/// from storage are accepted as-is; the prefix is not required to decode.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(String);

impl MemoryId {
    /// Generate a fresh random id. Carries no information about content,
    /// author, or time.
    pub fn generate() -> Self {
        let bytes = random::<[u8; 16]>();
        Self(format!("{MEMORY_ID_PREFIX}{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id carries the `mem_` prefix.
    pub fn has_memory_prefix(&self) -> bool {
        self.0.starts_with(MEMORY_ID_PREFIX)
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for MemoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MemoryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for MemoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryId({})", self.0)
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
