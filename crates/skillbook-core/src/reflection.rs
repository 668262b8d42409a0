//! Reflection results and the producer seam
//!
//! A reflection is the structured result of an external model call analyzing
//! one task execution. The engine never talks to the model itself; it
//! consumes the parsed result and turns each extracted pattern into an add
//! operation for the matching section.

use crate::error::SkillbookResult;
use crate::types::ProjectContext;
use crate::update::{UpdateBatch, UpdateOperation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How the reflected-on task ended; decides the target section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOutcome {
    Success,
    Failure,
}

impl TaskOutcome {
    /// Section new skills from this outcome are filed under
    pub fn section(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    /// Build from a boolean success flag
    pub fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Failure }
    }
}

impl std::str::FromStr for TaskOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            other => Err(format!("unknown outcome: {}", other)),
        }
    }
}

/// Structured result of a reflection pass over one task execution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    /// Brief explanation of what happened and why
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    /// Reusable patterns, one candidate skill content each
    #[serde(default)]
    pub patterns: Vec<String>,
    /// What went wrong (failed tasks only)
    #[serde(default)]
    pub error_identified: Option<String>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub suggested_action: Option<String>,
}

impl Reflection {
    /// Build an update batch with one add operation per extracted pattern,
    /// tagged with the current context. Layer placement is left for the
    /// applier to infer.
    pub fn to_update_batch(&self, outcome: TaskOutcome, context: &ProjectContext) -> UpdateBatch {
        let section = outcome.section();
        let mut batch = UpdateBatch::new();

        for pattern in &self.patterns {
            batch.push(UpdateOperation::Add {
                section: section.to_string(),
                content: pattern.clone(),
                language: context.language.clone(),
                framework: context.framework.clone(),
                project_type: context.project_type.clone(),
                level: None,
            });
        }

        batch
    }
}

/// External collaborator producing reflections, typically backed by a
/// language model. Implementations own their prompting, response parsing,
/// and timeouts.
#[async_trait]
pub trait ReflectionProducer: Send + Sync {
    /// Analyze one task execution and extract reusable patterns.
    /// `skills` is the rendered view of currently applicable skills.
    async fn reflect(
        &self,
        task: &str,
        result: &str,
        outcome: TaskOutcome,
        skills: &str,
    ) -> SkillbookResult<Reflection>;
}

/// Totals of one learning pass
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnReport {
    /// Newly created skills
    pub new_skills_added: usize,
    /// Patterns that matched an existing skill and only refreshed it
    pub skills_updated: usize,
    pub failed: usize,
    /// Skills in the view after the pass
    pub total_skills: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_sections() {
        assert_eq!(TaskOutcome::Success.section(), "success");
        assert_eq!(TaskOutcome::Failure.section(), "failure");
        assert_eq!(TaskOutcome::from_success(false), TaskOutcome::Failure);
        assert_eq!("Success".parse::<TaskOutcome>(), Ok(TaskOutcome::Success));
    }

    #[test]
    fn test_reflection_parses_producer_json() {
        let json = r#"{
            "reasoning": "The task succeeded by batching writes.",
            "keyInsights": ["batching reduces syscalls"],
            "patterns": [
                "Batch small writes into one buffered write",
                "Flush buffers before closing file handles"
            ]
        }"#;
        let reflection: Reflection = serde_json::from_str(json).unwrap();

        assert_eq!(reflection.patterns.len(), 2);
        assert_eq!(reflection.key_insights.len(), 1);
        assert!(reflection.error_identified.is_none());
    }

    #[test]
    fn test_reflection_parses_failure_fields() {
        let json = r#"{
            "reasoning": "The build failed.",
            "patterns": ["Run the linter before the full build"],
            "errorIdentified": "missing dependency",
            "rootCause": "lockfile out of date",
            "suggestedAction": "regenerate the lockfile"
        }"#;
        let reflection: Reflection = serde_json::from_str(json).unwrap();

        assert_eq!(reflection.error_identified.as_deref(), Some("missing dependency"));
        assert_eq!(reflection.suggested_action.as_deref(), Some("regenerate the lockfile"));
    }

    #[test]
    fn test_to_update_batch() {
        let reflection = Reflection {
            patterns: vec!["Pattern one".to_string(), "Pattern two".to_string()],
            ..Default::default()
        };
        let context = ProjectContext::new().language("python").framework("django");

        let batch = reflection.to_update_batch(TaskOutcome::Failure, &context);
        assert_eq!(batch.len(), 2);

        match &batch.operations[0] {
            UpdateOperation::Add {
                section,
                content,
                language,
                framework,
                level,
                ..
            } => {
                assert_eq!(section, "failure");
                assert_eq!(content, "Pattern one");
                assert_eq!(language.as_deref(), Some("python"));
                assert_eq!(framework.as_deref(), Some("django"));
                assert!(level.is_none());
            }
            other => panic!("unexpected operation: {:?}", other),
        }
    }

    #[test]
    fn test_empty_reflection_yields_empty_batch() {
        let batch = Reflection::default().to_update_batch(TaskOutcome::Success, &ProjectContext::new());
        assert!(batch.is_empty());
    }

    struct StubProducer;

    #[async_trait]
    impl ReflectionProducer for StubProducer {
        async fn reflect(
            &self,
            task: &str,
            _result: &str,
            _outcome: TaskOutcome,
            _skills: &str,
        ) -> SkillbookResult<Reflection> {
            Ok(Reflection {
                reasoning: format!("analyzed: {}", task),
                patterns: vec!["Canned pattern".to_string()],
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_producer_seam() {
        let producer = StubProducer;
        let reflection = producer
            .reflect("add auth", "done", TaskOutcome::Success, "")
            .await
            .unwrap();

        assert_eq!(reflection.patterns, vec!["Canned pattern".to_string()]);
        assert!(reflection.reasoning.contains("add auth"));
    }
}
