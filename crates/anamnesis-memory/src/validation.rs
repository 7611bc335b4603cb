//! Whole-record validation.
//!
//! Unlike decoding, which fails fast on the first structural problem,
//! [`validate`] collects everything it finds. Errors make a record
//! unfit to store or share; warnings are advisory.

use std::collections::HashSet;

use crate::config::MemoryConfig;
use crate::id::MEMORY_ID_PREFIX;
use crate::memory::{IntegrityResult, Memory};
use crate::serializer::structural_errors;

/// Outcome of [`validate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Check a memory against structural rules and the configured limits.
pub fn validate(memory: &Memory, config: &MemoryConfig) -> ValidationReport {
    let mut report = ValidationReport {
        errors: structural_errors(memory),
        warnings: Vec::new(),
    };

    let content = memory.content();
    if content.summary.trim().is_empty() {
        report.error("content.summary cannot be empty");
    }
    check_len(&mut report, "content.summary", &content.summary, config.max_summary_chars);
    check_len(&mut report, "content.body", &content.body, config.max_body_chars);
    let mut tags = HashSet::new();
    for (i, tag) in content.tags.iter().enumerate() {
        if tag.trim().is_empty() {
            report.error(format!("content.tags[{i}] cannot be empty"));
        }
        check_len(&mut report, "content.tags", tag, config.max_tag_chars);
        if !tags.insert(tag.as_str()) {
            report.warn(format!("content.tags[{i}] repeats tag {tag:?}"));
        }
    }
    if content.tags.is_empty() {
        report.warn("no tags; consider adding tags for discoverability");
    }

    if memory.provenance().context.trigger.is_none() {
        report.warn("provenance.context.trigger is not set");
    }
    if !memory.id().has_memory_prefix() {
        report.warn(format!(
            "id {} does not use the {MEMORY_ID_PREFIX} prefix",
            memory.id()
        ));
    }

    let author = &memory.provenance().author.agent_id;
    let mut seen = HashSet::new();
    for (i, witness) in memory.witnesses().iter().enumerate() {
        if witness.agent_id.trim().is_empty() {
            report.error(format!("witnesses[{i}].agent_id cannot be empty"));
        }
        if &witness.agent_id == author {
            report.warn(format!("witnesses[{i}] is the author attesting their own memory"));
        }
        if !seen.insert(witness.agent_id.as_str()) {
            report.warn(format!(
                "witnesses[{i}] repeats an attestation from {}",
                witness.agent_id
            ));
        }
    }

    for (i, anchor) in memory.anchors().iter().enumerate() {
        if anchor.reference.trim().is_empty() {
            report.error(format!("anchors[{i}].reference cannot be empty"));
        }
    }
    if let IntegrityResult::Diverged {
        first_mismatch_index,
        ..
    } = memory.verify_anchors()
    {
        report.error(format!(
            "content has changed since anchors[{first_mismatch_index}] was recorded"
        ));
    }

    report
}

fn check_len(report: &mut ValidationReport, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        report.error(format!("{field} is {len} chars, limit is {max}"));
    }
}
