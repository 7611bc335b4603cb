use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::MemoryConfig;
use crate::content::{Content, ContentHash, MemoryType};
use crate::error::{MemoryError, Result};
use crate::id::MemoryId;
use crate::lineage::{InMemoryLineageIndex, LineageIndex};
use crate::provenance::{
    Anchor, AnchorType, Attestation, Author, CreationContext, Lineage, Provenance, Witness,
};
use crate::reputation::{NeutralReputation, ReputationSource, resolve_reputation};
use crate::serializer::MemoryRecord;
use crate::trust::{Trust, TrustInputs, compute_trust};

/// Result of checking stored anchor hashes against the current content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntegrityResult {
    /// No anchors to check against.
    Unanchored,
    /// Every anchor matches the current content hash.
    Intact { anchors: usize },
    /// Content no longer matches what was anchored.
    Diverged {
        first_mismatch_index: usize,
        anchored: ContentHash,
        current: ContentHash,
    },
}

impl IntegrityResult {
    pub fn is_diverged(&self) -> bool {
        matches!(self, Self::Diverged { .. })
    }
}

/// A provenance-tracked unit of agent knowledge.
///
/// Content, provenance and lineage are fixed at creation. Witnesses and
/// anchors only grow, and every append recomputes trust before returning.
/// There is no way to set trust from outside.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MemoryRecord")]
pub struct Memory {
    pub(crate) id: MemoryId,
    pub(crate) version: u32,
    pub(crate) content: Content,
    pub(crate) provenance: Provenance,
    pub(crate) witnesses: Vec<Witness>,
    pub(crate) anchors: Vec<Anchor>,
    pub(crate) lineage: Lineage,
    pub(crate) trust: Trust,
}

impl Memory {
    /// A version-1 memory with no attestations, scored at `now`.
    fn assemble(
        content: Content,
        provenance: Provenance,
        lineage: Lineage,
        author_reputation: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let trust = compute_trust(
            &TrustInputs {
                witnesses: &[],
                anchors: &[],
                created_at: provenance.created_at,
                author_reputation,
            },
            now,
        );
        Self {
            id: MemoryId::generate(),
            version: 1,
            content,
            provenance,
            witnesses: Vec::new(),
            anchors: Vec::new(),
            lineage,
            trust,
        }
    }

    pub fn id(&self) -> &MemoryId {
        &self.id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn witnesses(&self) -> &[Witness] {
        &self.witnesses
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn trust(&self) -> &Trust {
        &self.trust
    }

    pub fn is_superseded(&self) -> bool {
        self.lineage.is_superseded()
    }

    /// Fingerprint of type, summary and body.
    pub fn content_hash(&self) -> ContentHash {
        self.content.hash()
    }

    /// Current scorer inputs, using the reputation captured in stored trust.
    pub fn trust_inputs(&self) -> TrustInputs<'_> {
        TrustInputs {
            witnesses: &self.witnesses,
            anchors: &self.anchors,
            created_at: self.provenance.created_at,
            author_reputation: self.trust.factors.author_reputation,
        }
    }

    /// Record a witness attestation and rescore.
    ///
    /// Repeat attestations from the same agent are kept and counted.
    pub fn add_witness(
        &mut self,
        agent_id: impl Into<String>,
        attestation: Attestation,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&Trust> {
        let agent_id = agent_id.into();
        if agent_id.trim().is_empty() {
            return Err(MemoryError::EmptyField("witness.agent_id"));
        }

        self.witnesses.push(Witness {
            agent_id,
            witnessed_at: now,
            attestation,
            signature: None,
            notes,
        });
        self.rescore(now);

        debug!(
            memory_id = %self.id,
            %attestation,
            witnesses = self.witnesses.len(),
            score = self.trust.score,
            "Witness recorded"
        );
        Ok(&self.trust)
    }

    /// Pin the current content hash to an external reference and rescore.
    pub fn add_anchor(
        &mut self,
        anchor_type: AnchorType,
        reference: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<&Trust> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(MemoryError::EmptyField("anchor.reference"));
        }

        let hash = self.content_hash();
        self.anchors.push(Anchor {
            anchor_type,
            reference,
            created_at: now,
            hash,
        });
        self.rescore(now);

        debug!(
            memory_id = %self.id,
            %anchor_type,
            %hash,
            anchors = self.anchors.len(),
            score = self.trust.score,
            "Anchor recorded"
        );
        Ok(&self.trust)
    }

    /// Record that `successor` supersedes this memory.
    ///
    /// Linking the same successor twice is a no-op; a different successor
    /// is rejected.
    pub fn link_successor(&mut self, successor: MemoryId, now: DateTime<Utc>) -> Result<()> {
        if successor == self.id {
            return Err(MemoryError::SelfReference(successor));
        }
        match &self.lineage.superseded_by {
            Some(existing) if existing == &successor => return Ok(()),
            Some(existing) => {
                return Err(MemoryError::AlreadySuperseded {
                    id: self.id.clone(),
                    successor: existing.clone(),
                });
            }
            None => {}
        }
        debug!(memory_id = %self.id, %successor, "Memory superseded");
        self.lineage.superseded_by = Some(successor);
        self.rescore(now);
        Ok(())
    }

    /// Re-read the author's reputation and rescore with it.
    pub fn refresh_reputation<R: ReputationSource + ?Sized>(
        &mut self,
        source: &R,
        now: DateTime<Utc>,
    ) -> &Trust {
        let author_reputation = resolve_reputation(source, &self.provenance.author.agent_id);
        let trust = compute_trust(
            &TrustInputs {
                author_reputation,
                ..self.trust_inputs()
            },
            now,
        );
        self.trust = trust;
        &self.trust
    }

    /// Compare every anchor's stored hash with the current content hash.
    ///
    /// Anchors recorded in the legacy colon-joined encoding are accepted
    /// when they match that encoding of the current content.
    pub fn verify_anchors(&self) -> IntegrityResult {
        if self.anchors.is_empty() {
            return IntegrityResult::Unanchored;
        }
        let current = self.content_hash();
        let legacy = self.content.legacy_hash();
        match self
            .anchors
            .iter()
            .position(|a| !a.matches(&current) && !a.matches(&legacy))
        {
            Some(index) => {
                let anchored = self.anchors[index].hash;
                warn!(
                    memory_id = %self.id,
                    index,
                    %anchored,
                    %current,
                    "Content diverged from anchor"
                );
                IntegrityResult::Diverged {
                    first_mismatch_index: index,
                    anchored,
                    current,
                }
            }
            None => IntegrityResult::Intact {
                anchors: self.anchors.len(),
            },
        }
    }

    /// Structured representation; see [`crate::serializer::to_value`].
    pub fn to_value(&self) -> Result<serde_json::Value> {
        crate::serializer::to_value(self)
    }

    /// Compact JSON; see [`crate::serializer::to_json`].
    pub fn to_json(&self) -> Result<String> {
        crate::serializer::to_json(self)
    }

    /// Decode and validate; see [`crate::serializer::from_value`].
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        crate::serializer::from_value(value)
    }

    /// Decode and validate; see [`crate::serializer::from_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        crate::serializer::from_json(json)
    }

    fn rescore(&mut self, now: DateTime<Utc>) {
        let trust = compute_trust(&self.trust_inputs(), now);
        self.trust = trust;
    }
}

/// Inputs for creating a memory.
#[derive(Clone, Debug)]
pub struct NewMemory {
    pub memory_type: MemoryType,
    pub summary: String,
    pub body: String,
    pub tags: Vec<String>,
    pub author_id: String,
    /// Falls back to [`MemoryConfig::default_platform`].
    pub platform: Option<String>,
    /// Falls back to [`MemoryConfig::default_confidence`].
    pub confidence: Option<f64>,
    pub trigger: Option<String>,
    pub session_id: Option<String>,
    pub supersedes: Option<MemoryId>,
    pub derived_from: Vec<MemoryId>,
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl NewMemory {
    pub fn new(
        memory_type: MemoryType,
        summary: impl Into<String>,
        body: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            memory_type,
            summary: summary.into(),
            body: body.into(),
            tags: Vec::new(),
            author_id: author_id.into(),
            platform: None,
            confidence: None,
            trigger: None,
            session_id: None,
            supersedes: None,
            derived_from: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn superseding(mut self, predecessor: MemoryId) -> Self {
        self.supersedes = Some(predecessor);
        self
    }

    pub fn derived_from<I: IntoIterator<Item = MemoryId>>(mut self, ancestors: I) -> Self {
        self.derived_from = ancestors.into_iter().collect();
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Creates memories with seeded provenance, true chain depth, and initial
/// trust.
///
/// Generic over its collaborators. Use `MemoryFactory::in_memory()` for
/// tests and standalone use.
pub struct MemoryFactory<C: Clock, R: ReputationSource, L: LineageIndex> {
    clock: C,
    reputation: R,
    lineage: L,
    config: MemoryConfig,
}

impl MemoryFactory<SystemClock, NeutralReputation, InMemoryLineageIndex> {
    /// Wall clock, neutral reputation, in-memory lineage, default limits.
    pub fn in_memory() -> Self {
        Self::new(
            SystemClock,
            NeutralReputation,
            InMemoryLineageIndex::new(),
            MemoryConfig::default(),
        )
    }
}

impl<C: Clock, R: ReputationSource, L: LineageIndex> MemoryFactory<C, R, L> {
    pub fn new(clock: C, reputation: R, lineage: L, config: MemoryConfig) -> Self {
        Self {
            clock,
            reputation,
            lineage,
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn lineage(&self) -> &L {
        &self.lineage
    }

    pub fn lineage_mut(&mut self) -> &mut L {
        &mut self.lineage
    }

    /// Validate inputs, resolve lineage, and score a new memory.
    ///
    /// Nothing is registered in the lineage index unless creation succeeds.
    #[instrument(skip(self, new), fields(memory_type = %new.memory_type, author = %new.author_id))]
    pub fn create(&mut self, new: NewMemory) -> Result<Memory> {
        let confidence = new.confidence.unwrap_or(self.config.default_confidence);
        check_new(&new, confidence, &self.config)?;
        let derived_from = dedupe_ids(new.derived_from);

        let lineage = match new.supersedes {
            Some(prev) => {
                let depth = self
                    .lineage
                    .chain_depth(&prev)
                    .ok_or_else(|| MemoryError::UnknownPredecessor(prev.clone()))?;
                if let Some(successor) = self.lineage.successor_of(&prev) {
                    return Err(MemoryError::AlreadySuperseded { id: prev, successor });
                }
                Lineage::successor_of(prev, depth, derived_from)
            }
            None => Lineage::root(derived_from),
        };

        let now = self.clock.now();
        let author_reputation = resolve_reputation(&self.reputation, &new.author_id);
        let provenance = Provenance {
            author: Author {
                agent_id: new.author_id,
                platform: new
                    .platform
                    .unwrap_or_else(|| self.config.default_platform.clone()),
                signature: None,
            },
            created_at: now,
            context: CreationContext {
                session_id: new.session_id,
                trigger: new.trigger,
                confidence,
            },
            extensions: new.extensions,
        };
        let content = Content {
            memory_type: new.memory_type,
            summary: new.summary,
            body: new.body,
            tags: new.tags,
        };

        let memory = Memory::assemble(content, provenance, lineage, author_reputation, now);
        self.lineage.register(&memory)?;

        debug!(
            memory_id = %memory.id,
            chain_depth = memory.lineage.chain_depth,
            score = memory.trust.score,
            "Memory created"
        );
        Ok(memory)
    }

    /// Create a successor to `predecessor` and link both records.
    ///
    /// A predecessor the index has not seen (e.g. loaded from storage) is
    /// registered first, but only once `new` has passed validation.
    pub fn supersede(&mut self, predecessor: &mut Memory, new: NewMemory) -> Result<Memory> {
        if let Some(successor) = predecessor.lineage.superseded_by.clone() {
            return Err(MemoryError::AlreadySuperseded {
                id: predecessor.id.clone(),
                successor,
            });
        }
        let confidence = new.confidence.unwrap_or(self.config.default_confidence);
        check_new(&new, confidence, &self.config)?;
        if self.lineage.chain_depth(&predecessor.id).is_none() {
            self.lineage.register(predecessor)?;
        }

        let successor = self.create(new.superseding(predecessor.id.clone()))?;
        predecessor.link_successor(successor.id.clone(), self.clock.now())?;
        Ok(successor)
    }
}

fn check_new(new: &NewMemory, confidence: f64, config: &MemoryConfig) -> Result<()> {
    if new.summary.trim().is_empty() {
        return Err(MemoryError::EmptyField("content.summary"));
    }
    if new.author_id.trim().is_empty() {
        return Err(MemoryError::EmptyField("provenance.author.agent_id"));
    }
    check_len("content.summary", &new.summary, config.max_summary_chars)?;
    check_len("content.body", &new.body, config.max_body_chars)?;
    for tag in &new.tags {
        if tag.trim().is_empty() {
            return Err(MemoryError::EmptyField("content.tags"));
        }
        check_len("content.tags", tag, config.max_tag_chars)?;
    }
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(MemoryError::InvalidConfidence(confidence));
    }
    if new.derived_from.iter().any(MemoryId::is_empty) {
        return Err(MemoryError::EmptyField("lineage.derived_from"));
    }
    Ok(())
}

/// Ancestors form a set; keep the first occurrence of each id.
fn dedupe_ids(ids: Vec<MemoryId>) -> Vec<MemoryId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(MemoryError::FieldTooLong { field, len, max });
    }
    Ok(())
}
