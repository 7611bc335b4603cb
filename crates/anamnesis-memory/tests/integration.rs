use anamnesis_memory::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 3, 16, 0, 0).unwrap()
}

fn factory() -> MemoryFactory<FixedClock, NeutralReputation, InMemoryLineageIndex> {
    anamnesis_logging::init_testing();
    MemoryFactory::new(
        FixedClock::new(t0()),
        NeutralReputation,
        InMemoryLineageIndex::new(),
        MemoryConfig::default(),
    )
}

fn insight() -> NewMemory {
    NewMemory::new(
        MemoryType::Insight,
        "Memory synthesis is harder than storage",
        "Storing memories is trivial. Knowing what to remember is the hard part.",
        "babel",
    )
    .with_tags(["memory", "synthesis"])
    .with_confidence(0.9)
    .with_trigger("Deep thinking session")
}

// ----------------------------------------------------------------------------
// Trust lifecycle
// ----------------------------------------------------------------------------

#[test]
fn test_trust_lifecycle() {
    let mut factory = factory();
    let mut memory = factory.create(insight()).unwrap();
    assert_eq!(memory.trust().score, 0.3);

    let trust = memory
        .add_witness("eudaemon_0", Attestation::Confirm, Some("Agree".into()), t0())
        .unwrap();
    assert_eq!(trust.score, 0.5);

    let trust = memory
        .add_anchor(AnchorType::ExternalPost, "https://moltbook.com/post/abc123", t0())
        .unwrap();
    assert_eq!(trust.score, 0.7);

    let trust = memory
        .add_witness("skeptic", Attestation::Dispute, None, t0())
        .unwrap();
    assert_eq!(trust.score, 0.55);
    assert_eq!(trust.factors.witness_count, 1);
    assert_eq!(trust.factors.dispute_count, 1);
    assert_eq!(trust.factors.anchor_count, 1);
}

#[test]
fn test_corroboration_bonus_applies_once() {
    let mut factory = factory();
    let mut memory = factory.create(insight()).unwrap();

    let mut scores = Vec::new();
    for i in 0..5 {
        let trust = memory
            .add_witness(format!("agent-{i}"), Attestation::Confirm, None, t0())
            .unwrap();
        scores.push(trust.score);
    }
    assert_eq!(scores, vec![0.5, 0.5, 0.6, 0.6, 0.6]);
    assert_eq!(memory.trust().factors.witness_count, 5);
}

#[test]
fn test_age_tracks_creation() {
    let mut factory = factory();
    let mut memory = factory.create(insight()).unwrap();

    let later = t0() + Duration::days(10);
    let trust = memory
        .add_witness("eudaemon_0", Attestation::Partial, None, later)
        .unwrap();
    assert_eq!(trust.factors.age_days, 10);
    assert_eq!(trust.score, 0.3);
    assert_eq!(compute_trust_score(&memory), 0.3);
}

#[test]
fn test_reputation_feeds_score() {
    anamnesis_logging::init_testing();
    let reputation = StaticReputation::new().with("trusted", 1.0).with("inflated", 7.5);
    let mut factory = MemoryFactory::new(
        FixedClock::new(t0()),
        reputation,
        InMemoryLineageIndex::new(),
        MemoryConfig::default(),
    );

    let trusted = factory
        .create(NewMemory::new(MemoryType::Decision, "s", "b", "trusted"))
        .unwrap();
    assert_eq!(trusted.trust().score, 0.4);

    let inflated = factory
        .create(NewMemory::new(MemoryType::Decision, "s", "b", "inflated"))
        .unwrap();
    assert_eq!(inflated.trust().factors.author_reputation, 1.0);
}

// ----------------------------------------------------------------------------
// Lineage
// ----------------------------------------------------------------------------

#[test]
fn test_supersede_chain_depth() {
    let mut factory = factory();
    let mut first = factory.create(insight()).unwrap();
    let mut second = factory
        .supersede(
            &mut first,
            NewMemory::new(MemoryType::Correction, "Revised", "Second take", "babel"),
        )
        .unwrap();
    let third = factory
        .supersede(
            &mut second,
            NewMemory::new(MemoryType::Correction, "Revised again", "Third take", "babel"),
        )
        .unwrap();

    assert_eq!(first.lineage().chain_depth, 0);
    assert_eq!(second.lineage().chain_depth, 1);
    assert_eq!(third.lineage().chain_depth, 2);

    assert_eq!(first.lineage().superseded_by.as_ref(), Some(second.id()));
    assert_eq!(second.lineage().supersedes.as_ref(), Some(first.id()));
    assert_eq!(second.lineage().superseded_by.as_ref(), Some(third.id()));
    assert!(!third.is_superseded());

    let index = factory.lineage();
    assert_eq!(index.len(), 3);
    assert_eq!(
        index.chain(third.id()),
        vec![second.id().clone(), first.id().clone()]
    );
    assert_eq!(&index.latest(first.id()), third.id());
    assert_eq!(index.successor_of(first.id()).as_ref(), Some(second.id()));
}

#[test]
fn test_unknown_predecessor_rejected() {
    let mut factory = factory();
    let result = factory.create(insight().superseding(MemoryId::generate()));
    assert!(matches!(result, Err(MemoryError::UnknownPredecessor(_))));
    assert!(factory.lineage().is_empty());
}

#[test]
fn test_second_successor_rejected() {
    let mut factory = factory();
    let mut first = factory.create(insight()).unwrap();
    factory.supersede(&mut first, insight()).unwrap();

    assert!(matches!(
        factory.supersede(&mut first, insight()),
        Err(MemoryError::AlreadySuperseded { .. })
    ));
    // same check through the index alone
    assert!(matches!(
        factory.create(insight().superseding(first.id().clone())),
        Err(MemoryError::AlreadySuperseded { .. })
    ));
}

#[test]
fn test_supersede_registers_loaded_predecessor() {
    let mut original = factory();
    let stored = original.create(insight()).unwrap().to_json().unwrap();

    let mut fresh = factory();
    let mut loaded = Memory::from_json(&stored).unwrap();
    let successor = fresh.supersede(&mut loaded, insight()).unwrap();

    assert_eq!(successor.lineage().chain_depth, 1);
    assert_eq!(loaded.lineage().superseded_by.as_ref(), Some(successor.id()));
    assert_eq!(fresh.lineage().len(), 2);
}

#[test]
fn test_derived_from_is_kept() {
    let mut factory = factory();
    let a = factory.create(insight()).unwrap();
    let b = factory.create(insight()).unwrap();
    let merged = factory
        .create(insight().derived_from([a.id().clone(), b.id().clone()]))
        .unwrap();

    assert_eq!(merged.lineage().derived_from, vec![a.id().clone(), b.id().clone()]);
    assert_eq!(merged.lineage().chain_depth, 0);
}

// ----------------------------------------------------------------------------
// Serialization
// ----------------------------------------------------------------------------

fn attested() -> Memory {
    let mut factory = factory();
    let mut memory = factory
        .create(insight().with_session("session-42").with_extension("lang", json!("en")))
        .unwrap();
    memory
        .add_witness("eudaemon_0", Attestation::Confirm, Some("Agree".into()), t0())
        .unwrap();
    memory
        .add_witness("skeptic", Attestation::Dispute, None, t0() + Duration::hours(2))
        .unwrap();
    memory
        .add_anchor(AnchorType::GitCommit, "4f2a9c1", t0() + Duration::days(1))
        .unwrap();
    memory
}

#[test]
fn test_json_round_trip_is_exact() {
    let memory = attested();
    let json = memory.to_json().unwrap();
    let decoded = Memory::from_json(&json).unwrap();

    assert_eq!(decoded, memory);
    assert_eq!(decoded.to_json().unwrap(), json);
}

#[test]
fn test_record_field_names() {
    let value = attested().to_value().unwrap();
    let keys: Vec<&str> = value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    let mut expected = vec![
        "id",
        "version",
        "content",
        "provenance",
        "witnesses",
        "anchors",
        "lineage",
        "trust",
    ];
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    expected.sort_unstable();
    assert_eq!(sorted, expected);

    assert_eq!(value["provenance"]["context"]["session_id"], json!("session-42"));
    assert_eq!(value["provenance"]["context"]["confidence"], json!(0.9));
    assert_eq!(value["anchors"][0]["type"], json!("git_commit"));
    assert_eq!(value["trust"]["factors"]["dispute_count"], json!(1));
    assert_eq!(value["trust"]["factors"]["age_days"], json!(1));
    assert_eq!(value["trust"]["computed_at"], json!("2026-02-04T16:00:00Z"));
}

#[test]
fn test_tampered_content_is_detected() {
    let memory = attested();
    let mut value = memory.to_value().unwrap();
    value["content"]["body"] = json!("Something else entirely.");

    let tampered = Memory::from_value(value).unwrap();
    match tampered.verify_anchors() {
        IntegrityResult::Diverged {
            first_mismatch_index,
            anchored,
            current,
        } => {
            assert_eq!(first_mismatch_index, 0);
            assert_eq!(anchored, memory.content_hash());
            assert_eq!(current, tampered.content_hash());
        }
        other => panic!("expected divergence, got {other:?}"),
    }
    assert!(!validate(&tampered, &MemoryConfig::default()).is_valid());
}

#[test]
fn test_retagging_keeps_anchors_intact() {
    let mut value = attested().to_value().unwrap();
    value["content"]["tags"] = json!(["renamed"]);
    let retagged = Memory::from_value(value).unwrap();
    assert_eq!(retagged.verify_anchors(), IntegrityResult::Intact { anchors: 1 });
}

#[test]
fn test_inflated_trust_is_rejected() {
    let mut value = attested().to_value().unwrap();
    value["trust"]["score"] = json!(0.99);
    assert!(matches!(
        Memory::from_value(value),
        Err(MemoryError::InvalidRecord(_))
    ));

    let mut value = attested().to_value().unwrap();
    value["trust"]["factors"]["witness_count"] = json!(4);
    assert!(Memory::from_value(value).is_err());
}

#[test]
fn test_legacy_anchor_tag_decodes() {
    let memory = {
        let mut factory = factory();
        let mut memory = factory.create(insight()).unwrap();
        memory
            .add_anchor(AnchorType::ExternalPost, "https://moltbook.com/post/1", t0())
            .unwrap();
        memory
    };
    let mut value = memory.to_value().unwrap();
    value["anchors"][0]["type"] = json!("moltbook_post");

    let decoded = Memory::from_value(value).unwrap();
    assert_eq!(decoded.anchors()[0].anchor_type, AnchorType::ExternalPost);
    assert_eq!(decoded, memory);
}

#[test]
fn test_pretty_json_through_serializer() {
    let memory = attested();
    let pretty = serializer::to_json_pretty(&memory).unwrap();
    assert_eq!(serializer::from_json(&pretty).unwrap(), memory);
}

// ----------------------------------------------------------------------------
// Validation
// ----------------------------------------------------------------------------

#[test]
fn test_factory_output_validates() {
    let report = validate(&attested(), &MemoryConfig::default());
    assert!(report.is_valid(), "{:?}", report.errors);
}

#[test]
fn test_validation_warnings_are_advisory() {
    let mut factory = factory();
    let mut memory = factory
        .create(NewMemory::new(MemoryType::Encounter, "Met an agent", "", "babel"))
        .unwrap();
    memory
        .add_witness("babel", Attestation::Confirm, None, t0())
        .unwrap();

    let report = validate(&memory, &MemoryConfig::default());
    assert!(report.is_valid());
    assert_eq!(report.warnings.len(), 3, "{:?}", report.warnings);
}

// ----------------------------------------------------------------------------
// Shared handle
// ----------------------------------------------------------------------------

#[test]
fn test_shared_handle_round_trip() {
    let clock = std::sync::Arc::new(FixedClock::new(t0()));
    let memory = factory().create(insight()).unwrap();
    let handle = SharedMemory::new(memory, clock.clone());

    handle
        .add_witness("eudaemon_0", Attestation::Confirm, None)
        .unwrap();
    clock.advance(Duration::days(2));
    let trust = handle
        .add_anchor(AnchorType::Url, "https://example.org/a")
        .unwrap();

    assert_eq!(trust.score, 0.7);
    assert_eq!(trust.factors.age_days, 2);
    let decoded = Memory::from_json(&handle.to_json().unwrap()).unwrap();
    assert_eq!(decoded, handle.snapshot());
}
