//! Hierarchy layout and layer routing
//!
//! Computes the ordered list of layer files to merge for a context, and the
//! single file a skill is written to. Merge order is fixed: global, then
//! language, then framework, then project; the loader's first-wins rule
//! depends on it.

use crate::types::{HierarchyLevel, ProjectContext, Skill};
use std::path::{Path, PathBuf};

/// Filesystem layout of the skillbook hierarchy
#[derive(Debug, Clone)]
pub struct HierarchyConfig {
    base_path: PathBuf,
    global_file: String,
    languages_dir: String,
    frameworks_dir: String,
    projects_dir: String,
}

impl HierarchyConfig {
    /// Create a config rooted at `base_path` with the default layout
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            global_file: "global/universal.json".to_string(),
            languages_dir: "languages".to_string(),
            frameworks_dir: "frameworks".to_string(),
            projects_dir: "projects".to_string(),
        }
    }

    /// Default base directory under the user's config dir
    pub fn default_base() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skillbook")
    }

    /// Override the global layer file (relative to the base path)
    pub fn global_file(mut self, file: impl Into<String>) -> Self {
        self.global_file = file.into();
        self
    }

    /// Override the languages directory
    pub fn languages_dir(mut self, dir: impl Into<String>) -> Self {
        self.languages_dir = dir.into();
        self
    }

    /// Override the frameworks directory
    pub fn frameworks_dir(mut self, dir: impl Into<String>) -> Self {
        self.frameworks_dir = dir.into();
        self
    }

    /// Override the projects directory
    pub fn projects_dir(mut self, dir: impl Into<String>) -> Self {
        self.projects_dir = dir.into();
        self
    }

    /// Root directory of the hierarchy
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the global layer
    pub fn global_path(&self) -> PathBuf {
        self.base_path.join(&self.global_file)
    }

    /// Path of a language layer
    pub fn language_path(&self, language: &str) -> PathBuf {
        self.base_path
            .join(&self.languages_dir)
            .join(format!("{}.json", language.to_lowercase()))
    }

    /// Path of a framework layer
    pub fn framework_path(&self, framework: &str) -> PathBuf {
        self.base_path
            .join(&self.frameworks_dir)
            .join(format!("{}.json", framework.to_lowercase()))
    }

    /// Path of a project layer
    pub fn project_path(&self, project_id: &str) -> PathBuf {
        self.base_path
            .join(&self.projects_dir)
            .join(format!("{}.json", project_id))
    }

    /// Layer files to read for a context, in merge order. The global layer
    /// always comes first; narrower layers follow for whichever context
    /// fields are set.
    pub fn read_paths(&self, context: &ProjectContext) -> Vec<(HierarchyLevel, PathBuf)> {
        let mut paths = vec![(HierarchyLevel::Global, self.global_path())];

        if let Some(language) = &context.language {
            paths.push((HierarchyLevel::Language, self.language_path(language)));
        }
        if let Some(framework) = &context.framework {
            paths.push((HierarchyLevel::Framework, self.framework_path(framework)));
        }
        if let Some(project_id) = &context.project_id {
            paths.push((HierarchyLevel::Project, self.project_path(project_id)));
        }

        paths
    }

    /// Layer file for a hierarchy level under the given context. Total: when
    /// the context field the level needs is missing, the global layer is
    /// returned instead.
    pub fn level_path(&self, level: HierarchyLevel, context: &ProjectContext) -> PathBuf {
        match level {
            HierarchyLevel::Framework => {
                if let Some(framework) = &context.framework {
                    return self.framework_path(framework);
                }
            }
            HierarchyLevel::Language => {
                if let Some(language) = &context.language {
                    return self.language_path(language);
                }
            }
            HierarchyLevel::Project => {
                if let Some(project_id) = &context.project_id {
                    return self.project_path(project_id);
                }
            }
            HierarchyLevel::Global => {}
        }
        self.global_path()
    }

    /// Layer file a skill is written to, selected by its hierarchy level
    pub fn write_path(&self, skill: &Skill, context: &ProjectContext) -> PathBuf {
        self.level_path(skill.hierarchy_level, context)
    }
}
