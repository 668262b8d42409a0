//! Skill types and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique skill identifier in `<section>-<5-digit-sequence>` form
/// (e.g. `success-00007`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillId(pub String);

impl SkillId {
    /// Build an ID from a section and its sequence number
    pub fn new(section: &str, sequence: u32) -> Self {
        Self(format!("{}-{:05}", section, sequence))
    }

    /// Create from string
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the trailing numeric suffix, if well-formed
    pub fn sequence(&self) -> Option<u32> {
        self.0.rsplit('-').next()?.parse().ok()
    }
}

impl std::fmt::Display for SkillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vote recorded against a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Helpful,
    Harmful,
    Neutral,
}

impl Vote {
    /// Get display name
    pub fn name(&self) -> &str {
        match self {
            Self::Helpful => "helpful",
            Self::Harmful => "harmful",
            Self::Neutral => "neutral",
        }
    }
}

impl std::str::FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "helpful" => Ok(Self::Helpful),
            "harmful" => Ok(Self::Harmful),
            "neutral" => Ok(Self::Neutral),
            other => Err(format!("unknown vote: {}", other)),
        }
    }
}

/// Layer a skill belongs to, broadest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyLevel {
    Global,
    Language,
    Framework,
    Project,
}

impl Default for HierarchyLevel {
    fn default() -> Self {
        Self::Global
    }
}

impl HierarchyLevel {
    /// Get display name
    pub fn name(&self) -> &str {
        match self {
            Self::Global => "global",
            Self::Language => "language",
            Self::Framework => "framework",
            Self::Project => "project",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Global => 0,
            Self::Language => 1,
            Self::Framework => 2,
            Self::Project => 3,
        }
    }

    /// Whether this level covers a wider scope than `other`
    pub fn is_broader_than(&self, other: HierarchyLevel) -> bool {
        self.rank() < other.rank()
    }

    /// Pick the level a new skill should live at, given what the context
    /// knows. Precedence mirrors the write routing: framework, then
    /// language, then project, then global.
    pub fn infer(context: &ProjectContext) -> Self {
        if context.framework.is_some() {
            Self::Framework
        } else if context.language.is_some() {
            Self::Language
        } else if context.project_id.is_some() {
            Self::Project
        } else {
            Self::Global
        }
    }
}

impl std::str::FromStr for HierarchyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "language" => Ok(Self::Language),
            "framework" => Ok(Self::Framework),
            "project" => Ok(Self::Project),
            other => Err(format!("unknown hierarchy level: {}", other)),
        }
    }
}

impl std::fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Threshold policy deciding when a skill has proven itself enough to be
/// moved to a broader layer.
#[derive(Debug, Clone, Copy)]
pub struct PromotionPolicy {
    /// Minimum total votes before promotion is considered
    pub min_votes: u32,
    /// Minimum helpful share of all votes
    pub min_success_rate: f32,
}

impl Default for PromotionPolicy {
    fn default() -> Self {
        Self {
            min_votes: 10,
            min_success_rate: 0.85,
        }
    }
}

/// A stored, reusable lesson with vote counters and optional context tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    /// Unique identifier, assigned at creation and never reassigned
    pub id: SkillId,
    /// Category the skill belongs to (e.g. "success", "failure")
    pub section: String,
    /// Free text of the lesson
    pub content: String,
    #[serde(default)]
    pub helpful: u32,
    #[serde(default)]
    pub harmful: u32,
    #[serde(default)]
    pub neutral: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Context tags, set at creation
    pub language: Option<String>,
    pub framework: Option<String>,
    pub project_type: Option<String>,
    /// Layer this skill was (or should be) persisted to
    #[serde(default)]
    pub hierarchy_level: HierarchyLevel,
    /// How many times the skill was moved to a broader layer
    #[serde(default)]
    pub promotion_count: u32,
}

impl Skill {
    /// Create a new skill with zeroed counters and fresh timestamps
    pub fn new(id: SkillId, section: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            section: section.into(),
            content: content.into(),
            helpful: 0,
            harmful: 0,
            neutral: 0,
            created_at: now,
            updated_at: now,
            language: None,
            framework: None,
            project_type: None,
            hierarchy_level: HierarchyLevel::Global,
            promotion_count: 0,
        }
    }

    /// Set the language tag
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the framework tag
    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    /// Set the project type tag
    pub fn with_project_type(mut self, project_type: impl Into<String>) -> Self {
        self.project_type = Some(project_type.into());
        self
    }

    /// Set the hierarchy level
    pub fn with_level(mut self, level: HierarchyLevel) -> Self {
        self.hierarchy_level = level;
        self
    }

    /// Refresh the update timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Increment a vote counter and refresh the update timestamp
    pub fn apply_vote(&mut self, vote: Vote, delta: u32) {
        match vote {
            Vote::Helpful => self.helpful += delta,
            Vote::Harmful => self.harmful += delta,
            Vote::Neutral => self.neutral += delta,
        }
        self.touch();
    }

    /// Net usefulness score
    pub fn net_score(&self) -> i64 {
        self.helpful as i64 - self.harmful as i64
    }

    /// Total votes recorded
    pub fn total_votes(&self) -> u32 {
        self.helpful + self.harmful + self.neutral
    }

    /// Helpful share of all votes (0.0 when unvoted)
    pub fn success_rate(&self) -> f32 {
        let total = self.total_votes();
        if total == 0 {
            0.0
        } else {
            self.helpful as f32 / total as f32
        }
    }

    /// Check whether the skill applies to the given context. Global skills
    /// always apply; tagged skills only mismatch when both sides carry a
    /// differing value for the same tag.
    pub fn matches_context(&self, context: &ProjectContext) -> bool {
        if self.hierarchy_level == HierarchyLevel::Global {
            return true;
        }

        if let (Some(mine), Some(theirs)) = (&self.language, &context.language) {
            if !mine.eq_ignore_ascii_case(theirs) {
                return false;
            }
        }

        if let (Some(mine), Some(theirs)) = (&self.framework, &context.framework) {
            if !mine.eq_ignore_ascii_case(theirs) {
                return false;
            }
        }

        if let (Some(mine), Some(theirs)) = (&self.project_type, &context.project_type) {
            if !mine.eq_ignore_ascii_case(theirs) {
                return false;
            }
        }

        true
    }

    /// Whether the skill has earned a move to a broader layer
    pub fn should_promote(&self, policy: &PromotionPolicy) -> bool {
        if self.hierarchy_level == HierarchyLevel::Global {
            return false;
        }

        let total = self.total_votes();
        if total < policy.min_votes {
            return false;
        }

        self.success_rate() >= policy.min_success_rate
    }
}

/// Detected project context, immutable for the duration of one task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub language: Option<String>,
    pub framework: Option<String>,
    pub project_type: Option<String>,
    pub project_id: Option<String>,
    pub working_directory: Option<String>,
}

impl ProjectContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the framework
    pub fn framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    /// Set the project type
    pub fn project_type(mut self, project_type: impl Into<String>) -> Self {
        self.project_type = Some(project_type.into());
        self
    }

    /// Set the project identifier
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Set the working directory
    pub fn working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// True when nothing was detected
    pub fn is_empty(&self) -> bool {
        self.language.is_none()
            && self.framework.is_none()
            && self.project_type.is_none()
            && self.project_id.is_none()
    }
}
