//! Provenance and trust for agent memories.
//!
//! A [`Memory`] is a unit of agent knowledge that carries its own history:
//! who wrote it and under what circumstances, which other agents confirmed or
//! disputed it, where its content hash was pinned externally, and which
//! memory it replaces. Trust is derived from that history and recomputed on
//! every change; it is never set by hand.
//!
//! ```no_run
//! use anamnesis_memory::{Attestation, MemoryFactory, MemoryType, NewMemory};
//! use chrono::Utc;
//!
//! let mut factory = MemoryFactory::in_memory();
//! let mut memory = factory.create(
//!     NewMemory::new(MemoryType::Insight, "Synthesis is harder than storage", "...", "babel")
//!         .with_tags(["memory"]),
//! )?;
//! memory.add_witness("eudaemon_0", Attestation::Confirm, None, Utc::now())?;
//! assert_eq!(memory.trust().score, 0.5);
//! # Ok::<(), anamnesis_memory::MemoryError>(())
//! ```

pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod id;
pub mod lineage;
pub mod memory;
pub mod provenance;
pub mod reputation;
pub mod serializer;
pub mod shared;
pub mod trust;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::MemoryConfig;
pub use content::{Content, ContentHash, MemoryType, content_hash, legacy_content_hash};
pub use error::{MemoryError, Result};
pub use id::{MEMORY_ID_PREFIX, MemoryId};
pub use lineage::{InMemoryLineageIndex, LineageIndex};
pub use memory::{IntegrityResult, Memory, MemoryFactory, NewMemory};
pub use provenance::{
    Anchor, AnchorType, Attestation, Author, CreationContext, Lineage, Provenance, Witness,
};
pub use reputation::{
    NEUTRAL_REPUTATION, NeutralReputation, ReputationSource, StaticReputation, resolve_reputation,
};
pub use shared::SharedMemory;
pub use trust::{
    Trust, TrustFactors, TrustInputs, TrustWeights, compute_trust, compute_trust_score,
    compute_trust_with,
};
pub use validation::{ValidationReport, validate};
