//! Context-aware skillbook manager
//!
//! Composes the in-memory skillbook with the hierarchy layout and the layer
//! store: loads every layer that applies to a project context into one merged
//! view, routes new skills back to the correct layer on update, and exposes
//! the read side used for prompt injection.
//!
//! Writes to one layer path must be serialized by the caller; saves replace
//! the whole file.

use crate::book::{Skillbook, SkillbookStats};
use crate::error::{SkillbookError, SkillbookResult};
use crate::hierarchy::HierarchyConfig;
use crate::reflection::{LearnReport, Reflection, TaskOutcome};
use crate::similarity::DEFAULT_DEDUP_THRESHOLD;
use crate::store;
use crate::types::{HierarchyLevel, ProjectContext, PromotionPolicy, Skill, SkillId, Vote};
use crate::update::{BatchReport, OperationResult, UpdateBatch, UpdateOperation};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Manager configuration
#[derive(Debug, Clone)]
pub struct SkillbookConfig {
    /// Hierarchy layout; `None` keeps the view purely in memory
    pub hierarchy: Option<HierarchyConfig>,
    /// Enable content-similarity deduplication on add
    pub deduplicate: bool,
    /// Similarity threshold for deduplication (0.0 - 1.0)
    pub dedup_threshold: f32,
    /// Promotion thresholds
    pub promotion: PromotionPolicy,
}

impl Default for SkillbookConfig {
    fn default() -> Self {
        Self {
            hierarchy: None,
            deduplicate: true,
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
            promotion: PromotionPolicy::default(),
        }
    }
}

impl SkillbookConfig {
    /// Create a config with a hierarchy layout
    pub fn with_hierarchy(hierarchy: HierarchyConfig) -> Self {
        Self {
            hierarchy: Some(hierarchy),
            ..Default::default()
        }
    }

    /// Set the dedup threshold
    pub fn dedup_threshold(mut self, threshold: f32) -> Self {
        self.dedup_threshold = threshold;
        self
    }

    /// Disable deduplication
    pub fn without_deduplication(mut self) -> Self {
        self.deduplicate = false;
        self
    }

    /// Set the promotion policy
    pub fn promotion(mut self, policy: PromotionPolicy) -> Self {
        self.promotion = policy;
        self
    }
}

/// Result of adding one skill
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOutcome {
    pub skill: Skill,
    /// False when the content matched an existing skill
    pub is_new: bool,
    /// Layer file the skill was persisted to, if any
    pub path: Option<PathBuf>,
}

/// Context-aware skillbook: one merged view per task session, constructed,
/// loaded, used, and discarded. Persistence happens only through explicit
/// operations, never on drop.
pub struct SkillbookManager {
    config: SkillbookConfig,
    book: RwLock<Skillbook>,
    context: RwLock<ProjectContext>,
    loaded_sources: RwLock<Vec<String>>,
}

impl SkillbookManager {
    /// Create a manager from a config
    pub fn new(config: SkillbookConfig) -> Self {
        Self {
            config,
            book: RwLock::new(Skillbook::new()),
            context: RwLock::new(ProjectContext::new()),
            loaded_sources: RwLock::new(Vec::new()),
        }
    }

    /// Create a manager over a hierarchy layout
    pub fn with_hierarchy(hierarchy: HierarchyConfig) -> Self {
        Self::new(SkillbookConfig::with_hierarchy(hierarchy))
    }

    /// Create a purely in-memory manager (nothing is persisted)
    pub fn in_memory() -> Self {
        Self::new(SkillbookConfig::default())
    }

    /// Set the current project context
    pub async fn set_context(&self, context: ProjectContext) {
        *self.context.write().await = context;
    }

    /// Get the current project context
    pub async fn context(&self) -> ProjectContext {
        self.context.read().await.clone()
    }

    /// Sources merged by the last hierarchical load
    pub async fn loaded_sources(&self) -> Vec<String> {
        self.loaded_sources.read().await.clone()
    }

    /// Number of skills in the view
    pub async fn len(&self) -> usize {
        self.book.read().await.len()
    }

    /// True when the view holds no skills
    pub async fn is_empty(&self) -> bool {
        self.book.read().await.is_empty()
    }

    /// Get a skill by id
    pub async fn get(&self, id: &SkillId) -> Option<Skill> {
        self.book.read().await.get(id).cloned()
    }

    /// Load every layer that applies to `context` into the view, global
    /// layer first. Returns the merged skill count and the source labels.
    pub async fn load_hierarchical(
        &self,
        context: ProjectContext,
    ) -> SkillbookResult<(usize, Vec<String>)> {
        *self.context.write().await = context.clone();

        let Some(hierarchy) = &self.config.hierarchy else {
            warn!("no hierarchy configured, nothing to load");
            return Ok((0, Vec::new()));
        };

        let mut total = 0;
        let mut sources = Vec::new();

        for (level, path) in hierarchy.read_paths(&context) {
            let skills = store::load(&path).await?;
            if skills.is_empty() {
                continue;
            }
            let merged = self.book.write().await.merge_layer(skills);
            debug!("merged {} skills from {}", merged, path.display());
            if merged > 0 {
                total += merged;
                sources.push(format!("{} ({} skills)", source_label(level, &context), merged));
            }
        }

        info!("loaded {} skills from {} sources", total, sources.len());
        *self.loaded_sources.write().await = sources.clone();
        Ok((total, sources))
    }

    /// Add a skill, deduplicating against the loaded view. New skills are
    /// tagged from the current context, placed at the inferred level, and
    /// persisted to the routed layer.
    pub async fn add_skill(&self, section: &str, content: &str) -> SkillbookResult<AddOutcome> {
        self.add_internal(section, content, None).await
    }

    /// Add a skill at an explicit hierarchy level
    pub async fn add_skill_at(
        &self,
        section: &str,
        content: &str,
        level: HierarchyLevel,
    ) -> SkillbookResult<AddOutcome> {
        self.add_internal(section, content, Some(level)).await
    }

    async fn add_internal(
        &self,
        section: &str,
        content: &str,
        level: Option<HierarchyLevel>,
    ) -> SkillbookResult<AddOutcome> {
        let context = self.context.read().await.clone();
        let mut book = self.book.write().await;

        if self.config.deduplicate {
            if let Some(id) = book
                .find_similar(content, self.config.dedup_threshold)
                .map(|skill| skill.id.clone())
            {
                // A near-duplicate only refreshes the existing skill; its
                // content and counters stay untouched.
                let skill = book.touch(&id)?.clone();
                debug!("deduplicated content into {}", id);
                return Ok(AddOutcome {
                    skill,
                    is_new: false,
                    path: None,
                });
            }
        }

        let context_tags = (
            context.language.clone(),
            context.framework.clone(),
            context.project_type.clone(),
        );
        self.create_skill(&mut book, &context, section, content, context_tags, level)
            .await
    }

    /// Create a new skill, insert it into the view, and persist it to its
    /// routed layer. The id sequence is taken from whichever is further
    /// along: the view's section counter or the target file's.
    async fn create_skill(
        &self,
        book: &mut Skillbook,
        context: &ProjectContext,
        section: &str,
        content: &str,
        tags: (Option<String>, Option<String>, Option<String>),
        level: Option<HierarchyLevel>,
    ) -> SkillbookResult<AddOutcome> {
        let level = level.unwrap_or_else(|| HierarchyLevel::infer(context));

        let (path, mut file_skills) = match &self.config.hierarchy {
            Some(hierarchy) => {
                let path = hierarchy.level_path(level, context);
                let skills = store::load(&path).await?;
                (Some(path), skills)
            }
            None => (None, Vec::new()),
        };

        let sequence = book
            .next_sequence(section)
            .max(store::next_sequence(&file_skills, section));

        let (language, framework, project_type) = tags;
        let mut skill =
            Skill::new(SkillId::new(section, sequence), section, content).with_level(level);
        skill.language = language;
        skill.framework = framework;
        skill.project_type = project_type;

        book.insert(skill.clone())?;

        if let Some(path) = &path {
            file_skills.push(skill.clone());
            store::save(path, &file_skills).await?;
            info!("saved skill {} to {}", skill.id, path.display());
        }

        Ok(AddOutcome {
            skill,
            is_new: true,
            path,
        })
    }

    /// Record a vote. The refreshed skill is written back to its routed
    /// layer when that layer already contains it; otherwise the change stays
    /// in memory and is logged.
    pub async fn vote(&self, id: &SkillId, vote: Vote, delta: u32) -> SkillbookResult<Skill> {
        let skill = {
            let mut book = self.book.write().await;
            book.score(id, vote, delta)?.clone()
        };
        self.persist_refresh(&skill).await;
        Ok(skill)
    }

    /// Remove a skill from the view and from its routed layer file
    pub async fn remove_skill(&self, id: &SkillId) -> SkillbookResult<Skill> {
        let skill = self.book.write().await.remove(id)?;

        if let Some(hierarchy) = &self.config.hierarchy {
            let context = self.context.read().await.clone();
            let path = hierarchy.write_path(&skill, &context);
            match store::load(&path).await {
                Ok(mut file_skills) => {
                    let before = file_skills.len();
                    file_skills.retain(|s| s.id != skill.id);
                    if file_skills.len() < before {
                        if let Err(err) = store::save(&path, &file_skills).await {
                            warn!("could not remove {} from {}: {}", skill.id, path.display(), err);
                        }
                    }
                }
                Err(err) => warn!("could not reload {}: {}", path.display(), err),
            }
        }

        Ok(skill)
    }

    /// Apply a batch of update operations. Operations are independent: a
    /// failing score or remove is reported in the result list and does not
    /// abort its siblings.
    pub async fn apply_update(&self, batch: &UpdateBatch) -> BatchReport {
        let context = self.context.read().await.clone();
        let mut book = self.book.write().await;
        let mut report = BatchReport::default();

        for operation in &batch.operations {
            match self.apply_operation(&mut book, &context, operation).await {
                Ok(result) => report.record(result),
                Err(err) => {
                    warn!("update operation failed: {}", err);
                    report.record(OperationResult::Failed {
                        error: err.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn apply_operation(
        &self,
        book: &mut Skillbook,
        context: &ProjectContext,
        operation: &UpdateOperation,
    ) -> SkillbookResult<OperationResult> {
        match operation {
            UpdateOperation::Add {
                section,
                content,
                language,
                framework,
                project_type,
                level,
            } => {
                if self.config.deduplicate {
                    if let Some(id) = book
                        .find_similar(content, self.config.dedup_threshold)
                        .map(|skill| skill.id.clone())
                    {
                        book.touch(&id)?;
                        debug!("deduplicated pattern into {}", id);
                        return Ok(OperationResult::Deduplicated { id });
                    }
                }

                let tags = (language.clone(), framework.clone(), project_type.clone());
                let outcome = self
                    .create_skill(book, context, section, content, tags, *level)
                    .await?;
                Ok(OperationResult::Added {
                    id: outcome.skill.id,
                    path: outcome.path,
                })
            }
            UpdateOperation::Score { id, vote, delta } => {
                book.score(id, *vote, *delta)?;
                Ok(OperationResult::Scored {
                    id: id.clone(),
                    vote: *vote,
                })
            }
            UpdateOperation::Remove { id } => {
                book.remove(id)?;
                Ok(OperationResult::Removed { id: id.clone() })
            }
        }
    }

    /// Apply a reflection: one add per extracted pattern, filed under the
    /// outcome's section.
    pub async fn learn(&self, reflection: &Reflection, outcome: TaskOutcome) -> LearnReport {
        let context = self.context.read().await.clone();
        let batch = reflection.to_update_batch(outcome, &context);
        let report = self.apply_update(&batch).await;

        LearnReport {
            new_skills_added: report.added,
            skills_updated: report.deduplicated,
            failed: report.failed,
            total_skills: self.book.read().await.len(),
        }
    }

    /// Skills matching an arbitrary predicate, best net score first
    pub async fn rank<F>(&self, predicate: F) -> Vec<Skill>
    where
        F: Fn(&Skill) -> bool,
    {
        let book = self.book.read().await;
        book.rank(|skill| predicate(skill))
            .into_iter()
            .cloned()
            .collect()
    }

    /// Best-ranked skills applying to the current context
    pub async fn top_skills(&self, limit: usize) -> Vec<Skill> {
        let context = self.context.read().await.clone();
        let book = self.book.read().await;
        book.rank(|skill| skill.matches_context(&context))
            .into_iter()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Render the best-ranked applicable skills as prompt-injection lines
    pub async fn render_context(&self, limit: usize) -> String {
        let lines: Vec<String> = self
            .top_skills(limit)
            .await
            .iter()
            .map(|skill| format!("[{}] {}", skill.section, skill.content))
            .collect();
        lines.join("\n")
    }

    /// Aggregate statistics over the view
    pub async fn stats(&self) -> SkillbookStats {
        self.book.read().await.stats()
    }

    /// Skills that currently satisfy the promotion policy
    pub async fn promotable(&self) -> Vec<Skill> {
        let book = self.book.read().await;
        book.iter()
            .filter(|skill| skill.should_promote(&self.config.promotion))
            .cloned()
            .collect()
    }

    /// Move a skill to a broader layer.
    ///
    /// The skill is written to the new layer before it is deleted from the
    /// old one, so a crash between the two writes leaves the broader copy as
    /// the source of truth and never a state where the skill exists nowhere.
    pub async fn promote(&self, id: &SkillId, to: HierarchyLevel) -> SkillbookResult<PathBuf> {
        let Some(hierarchy) = &self.config.hierarchy else {
            return Err(SkillbookError::routing("no hierarchy configured, cannot promote"));
        };

        let context = self.context.read().await.clone();
        let original = {
            let book = self.book.read().await;
            book.get(id)
                .cloned()
                .ok_or_else(|| SkillbookError::SkillNotFound(id.clone()))?
        };

        if !to.is_broader_than(original.hierarchy_level) {
            return Err(SkillbookError::routing(format!(
                "{} is not broader than {}",
                to, original.hierarchy_level
            )));
        }

        let old_path = hierarchy.write_path(&original, &context);
        let mut promoted = original;
        promoted.hierarchy_level = to;
        promoted.promotion_count += 1;
        promoted.touch();
        let new_path = hierarchy.write_path(&promoted, &context);

        let mut new_skills = store::load(&new_path).await?;
        match new_skills.iter_mut().find(|s| s.id == promoted.id) {
            Some(slot) => *slot = promoted.clone(),
            None => new_skills.push(promoted.clone()),
        }
        store::save(&new_path, &new_skills).await?;

        if old_path != new_path {
            let mut old_skills = store::load(&old_path).await?;
            let before = old_skills.len();
            old_skills.retain(|s| s.id != promoted.id);
            if old_skills.len() < before {
                store::save(&old_path, &old_skills).await?;
            }
        }

        self.book.write().await.replace(promoted)?;
        info!("promoted {} to the {} layer", id, to);
        Ok(new_path)
    }

    async fn persist_refresh(&self, skill: &Skill) {
        let Some(hierarchy) = &self.config.hierarchy else {
            return;
        };
        let context = self.context.read().await.clone();
        let path = hierarchy.write_path(skill, &context);

        let mut file_skills = match store::load(&path).await {
            Ok(skills) => skills,
            Err(err) => {
                warn!("could not reload {} to persist {}: {}", path.display(), skill.id, err);
                return;
            }
        };

        match file_skills.iter_mut().find(|s| s.id == skill.id) {
            Some(slot) => {
                *slot = skill.clone();
                if let Err(err) = store::save(&path, &file_skills).await {
                    warn!("could not persist {} to {}: {}", skill.id, path.display(), err);
                }
            }
            None => debug!(
                "skill {} not present in {}, change kept in memory",
                skill.id,
                path.display()
            ),
        }
    }
}

fn source_label(level: HierarchyLevel, context: &ProjectContext) -> String {
    match level {
        HierarchyLevel::Global => "global".to_string(),
        HierarchyLevel::Language => {
            format!("language/{}", context.language.as_deref().unwrap_or("?"))
        }
        HierarchyLevel::Framework => {
            format!("framework/{}", context.framework.as_deref().unwrap_or("?"))
        }
        HierarchyLevel::Project => {
            format!("project/{}", context.project_id.as_deref().unwrap_or("?"))
        }
    }
}
