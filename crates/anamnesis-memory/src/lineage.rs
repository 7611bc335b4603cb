use std::collections::{HashMap, HashSet};

use crate::error::{MemoryError, Result};
use crate::id::MemoryId;
use crate::memory::Memory;

/// Lookup over previously created memories, used to compute true chain depth.
pub trait LineageIndex {
    fn chain_depth(&self, id: &MemoryId) -> Option<u32>;
    fn successor_of(&self, id: &MemoryId) -> Option<MemoryId>;
    /// Record a memory and link it as its predecessor's successor.
    fn register(&mut self, memory: &Memory) -> Result<()>;
}

#[derive(Clone, Debug)]
struct LineageEntry {
    chain_depth: u32,
    supersedes: Option<MemoryId>,
    superseded_by: Option<MemoryId>,
}

/// In-memory lineage index backed by HashMap.
#[derive(Default)]
pub struct InMemoryLineageIndex {
    entries: HashMap<MemoryId, LineageEntry>,
}

impl InMemoryLineageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &MemoryId) -> bool {
        self.entries.contains_key(id)
    }

    /// Walk the supersede chain back toward the root, nearest first.
    pub fn chain(&self, id: &MemoryId) -> Vec<MemoryId> {
        let mut result = Vec::new();
        let mut seen = HashSet::from([id.clone()]);
        let mut current = self.entries.get(id);
        while let Some(entry) = current {
            match &entry.supersedes {
                Some(prev) if seen.insert(prev.clone()) => {
                    result.push(prev.clone());
                    current = self.entries.get(prev);
                }
                _ => break,
            }
        }
        result
    }

    /// Follow successors forward to the newest memory in the chain.
    pub fn latest(&self, id: &MemoryId) -> MemoryId {
        let mut latest = id.clone();
        let mut seen = HashSet::from([id.clone()]);
        while let Some(next) = self.successor_of(&latest) {
            if !seen.insert(next.clone()) {
                break;
            }
            latest = next;
        }
        latest
    }
}

impl LineageIndex for InMemoryLineageIndex {
    fn chain_depth(&self, id: &MemoryId) -> Option<u32> {
        self.entries.get(id).map(|e| e.chain_depth)
    }

    fn successor_of(&self, id: &MemoryId) -> Option<MemoryId> {
        self.entries.get(id).and_then(|e| e.superseded_by.clone())
    }

    fn register(&mut self, memory: &Memory) -> Result<()> {
        let id = memory.id();
        let lineage = memory.lineage();

        if lineage.supersedes.as_ref() == Some(id) || lineage.superseded_by.as_ref() == Some(id) {
            return Err(MemoryError::SelfReference(id.clone()));
        }
        if let Some(prev) = &lineage.supersedes {
            if let Some(successor) = self.successor_of(prev) {
                if &successor != id {
                    return Err(MemoryError::AlreadySuperseded {
                        id: prev.clone(),
                        successor,
                    });
                }
            }
        }

        let superseded_by = self
            .successor_of(id)
            .or_else(|| lineage.superseded_by.clone());
        self.entries.insert(
            id.clone(),
            LineageEntry {
                chain_depth: lineage.chain_depth,
                supersedes: lineage.supersedes.clone(),
                superseded_by,
            },
        );

        if let Some(prev) = &lineage.supersedes {
            if let Some(entry) = self.entries.get_mut(prev) {
                entry.superseded_by = Some(id.clone());
            }
        }
        Ok(())
    }
}
