//! Shared, lock-guarded memory handle.
//!
//! Appends hold the write lock across the append and the rescore, so no
//! reader ever observes a witness or anchor list that trust has not caught
//! up with, and concurrent appends are never lost.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::clock::Clock;
use crate::content::ContentHash;
use crate::error::Result;
use crate::id::MemoryId;
use crate::memory::{IntegrityResult, Memory};
use crate::provenance::{AnchorType, Attestation};
use crate::trust::Trust;

/// One lock per memory; lineage links to other memories are by id only.
#[derive(Clone)]
pub struct SharedMemory {
    inner: Arc<RwLock<Memory>>,
    clock: Arc<dyn Clock>,
}

impl SharedMemory {
    pub fn new(memory: Memory, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(memory)),
            clock,
        }
    }

    pub fn id(&self) -> MemoryId {
        self.inner.read().id().clone()
    }

    /// Record a witness at the clock's current time. Returns the new trust.
    pub fn add_witness(
        &self,
        agent_id: impl Into<String>,
        attestation: Attestation,
        notes: Option<String>,
    ) -> Result<Trust> {
        let mut memory = self.inner.write();
        let now = self.clock.now();
        memory.add_witness(agent_id, attestation, notes, now).cloned()
    }

    /// Anchor the current content at the clock's current time.
    pub fn add_anchor(&self, anchor_type: AnchorType, reference: impl Into<String>) -> Result<Trust> {
        let mut memory = self.inner.write();
        let now = self.clock.now();
        memory.add_anchor(anchor_type, reference, now).cloned()
    }

    pub fn trust(&self) -> Trust {
        self.inner.read().trust().clone()
    }

    pub fn content_hash(&self) -> ContentHash {
        self.inner.read().content_hash()
    }

    pub fn verify_anchors(&self) -> IntegrityResult {
        self.inner.read().verify_anchors()
    }

    /// Consistent copy of the whole aggregate.
    pub fn snapshot(&self) -> Memory {
        self.inner.read().clone()
    }

    /// Run `f` against the memory under the read lock.
    pub fn read<T>(&self, f: impl FnOnce(&Memory) -> T) -> T {
        f(&self.inner.read())
    }

    pub fn to_json(&self) -> Result<String> {
        self.inner.read().to_json()
    }
}
