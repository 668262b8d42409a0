//! Update operations and batch results
//!
//! An update batch is the structured output of a reflection pass: an ordered
//! list of add/score/remove operations applied to the loaded view. Each
//! operation is independent; a failing one is reported and does not abort
//! its siblings.

use crate::types::{HierarchyLevel, SkillId, Vote};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_delta() -> u32 {
    1
}

/// One operation in an update batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum UpdateOperation {
    /// Create a new skill (or refresh a near-duplicate)
    Add {
        section: String,
        content: String,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        framework: Option<String>,
        #[serde(default)]
        project_type: Option<String>,
        /// Explicit layer; inferred from the context when absent
        #[serde(default)]
        level: Option<HierarchyLevel>,
    },
    /// Record a vote on an existing skill
    Score {
        id: SkillId,
        vote: Vote,
        #[serde(default = "default_delta")]
        delta: u32,
    },
    /// Delete a skill from the view
    Remove { id: SkillId },
}

/// Ordered batch of update operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBatch {
    pub operations: Vec<UpdateOperation>,
}

impl UpdateBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation
    pub fn push(&mut self, operation: UpdateOperation) {
        self.operations.push(operation);
    }

    /// Number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True when the batch holds no operations
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Outcome of a single applied operation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum OperationResult {
    /// A new skill was created and, when routable, persisted
    Added {
        id: SkillId,
        path: Option<PathBuf>,
    },
    /// The content matched an existing skill, which was only refreshed
    Deduplicated { id: SkillId },
    Scored { id: SkillId, vote: Vote },
    Removed { id: SkillId },
    Failed { error: String },
}

/// Per-operation results of one applied batch
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub results: Vec<OperationResult>,
    pub added: usize,
    pub deduplicated: usize,
    pub scored: usize,
    pub removed: usize,
    pub failed: usize,
}

impl BatchReport {
    /// Record one result and bump the matching counter
    pub fn record(&mut self, result: OperationResult) {
        match &result {
            OperationResult::Added { .. } => self.added += 1,
            OperationResult::Deduplicated { .. } => self.deduplicated += 1,
            OperationResult::Scored { .. } => self.scored += 1,
            OperationResult::Removed { .. } => self.removed += 1,
            OperationResult::Failed { .. } => self.failed += 1,
        }
        self.results.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_operation_serde() {
        let json = r#"{
            "op": "add",
            "section": "success",
            "content": "Use connection pooling",
            "projectType": "web_backend"
        }"#;
        let op: UpdateOperation = serde_json::from_str(json).unwrap();

        match op {
            UpdateOperation::Add {
                section,
                content,
                project_type,
                level,
                ..
            } => {
                assert_eq!(section, "success");
                assert_eq!(content, "Use connection pooling");
                assert_eq!(project_type.as_deref(), Some("web_backend"));
                assert!(level.is_none());
            }
            other => panic!("unexpected operation: {:?}", other),
        }
    }

    #[test]
    fn test_score_operation_default_delta() {
        let json = r#"{"op": "score", "id": "success-00001", "vote": "helpful"}"#;
        let op: UpdateOperation = serde_json::from_str(json).unwrap();

        match op {
            UpdateOperation::Score { id, vote, delta } => {
                assert_eq!(id.as_str(), "success-00001");
                assert_eq!(vote, Vote::Helpful);
                assert_eq!(delta, 1);
            }
            other => panic!("unexpected operation: {:?}", other),
        }
    }

    #[test]
    fn test_batch_round_trip() {
        let mut batch = UpdateBatch::new();
        batch.push(UpdateOperation::Remove {
            id: SkillId::new("failure", 3),
        });
        batch.push(UpdateOperation::Score {
            id: SkillId::new("success", 1),
            vote: Vote::Harmful,
            delta: 2,
        });

        let json = serde_json::to_string(&batch).unwrap();
        let parsed: UpdateBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(matches!(parsed.operations[0], UpdateOperation::Remove { .. }));
    }

    #[test]
    fn test_batch_report_counters() {
        let mut report = BatchReport::default();
        report.record(OperationResult::Added {
            id: SkillId::new("success", 1),
            path: None,
        });
        report.record(OperationResult::Deduplicated {
            id: SkillId::new("success", 1),
        });
        report.record(OperationResult::Failed {
            error: "skill not found: failure-00009".to_string(),
        });

        assert_eq!(report.added, 1);
        assert_eq!(report.deduplicated, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.results.len(), 3);
    }
}
