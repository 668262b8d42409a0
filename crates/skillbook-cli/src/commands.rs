//! Command handlers
//!
//! Every handler prints its result as JSON on stdout, matching the layer
//! file conventions (camelCase keys).

use crate::args::{Cli, Commands};
use anyhow::{Context as _, Result};
use serde_json::json;
use skillbook_core::{
    ContextDetector, HierarchyConfig, HierarchyLevel, ProjectContext, Reflection, SkillId,
    SkillbookConfig, SkillbookManager, TaskOutcome, Vote,
};
use std::path::{Path, PathBuf};

pub async fn run(cli: Cli) -> Result<()> {
    let base = cli.dir.clone().unwrap_or_else(HierarchyConfig::default_base);
    let project_dir = match cli.project.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    let context = ContextDetector::new(&project_dir).detect();

    match cli.command {
        Commands::Context => print_json(&context),

        Commands::Stats => {
            let manager = open(&base, &context, SkillbookConfig::default()).await?;
            let stats = manager.stats().await;
            let sources = manager.loaded_sources().await;
            print_json(&json!({
                "stats": stats,
                "sources": sources,
                "context": context,
            }))
        }

        Commands::Add {
            section,
            content,
            no_dedup,
            threshold,
            level,
        } => {
            let mut config = SkillbookConfig::default().dedup_threshold(threshold);
            if no_dedup {
                config = config.without_deduplication();
            }
            let manager = open(&base, &context, config).await?;

            let outcome = match parse_level(level.as_deref())? {
                Some(level) => manager.add_skill_at(&section, &content, level).await?,
                None => manager.add_skill(&section, &content).await?,
            };
            print_json(&outcome)
        }

        Commands::Vote { id, vote, count } => {
            let vote: Vote = vote.parse().map_err(anyhow::Error::msg)?;
            let manager = open(&base, &context, SkillbookConfig::default()).await?;
            let skill = manager
                .vote(&SkillId::from_string(id), vote, count)
                .await?;
            print_json(&skill)
        }

        Commands::Remove { id } => {
            let manager = open(&base, &context, SkillbookConfig::default()).await?;
            let skill = manager
                .remove_skill(&SkillId::from_string(id))
                .await?;
            print_json(&json!({ "removed": skill }))
        }

        Commands::List { section, limit } => {
            let manager = open(&base, &context, SkillbookConfig::default()).await?;
            let mut skills = match section {
                Some(section) => manager.rank(move |s| s.section == section).await,
                None => manager.rank(|_| true).await,
            };
            skills.truncate(limit);
            print_json(&skills)
        }

        Commands::Learn {
            reflection,
            outcome,
        } => {
            let outcome: TaskOutcome = outcome.parse().map_err(anyhow::Error::msg)?;
            let reflection = read_reflection(&reflection)?;
            let manager = open(&base, &context, SkillbookConfig::default()).await?;
            let report = manager.learn(&reflection, outcome).await;
            print_json(&report)
        }

        Commands::Promote { id, to } => {
            let to: HierarchyLevel = to.parse().map_err(anyhow::Error::msg)?;
            let manager = open(&base, &context, SkillbookConfig::default()).await?;
            let id = SkillId::from_string(id);
            let path = manager.promote(&id, to).await?;
            print_json(&json!({
                "id": id,
                "promotedTo": to,
                "path": path,
            }))
        }
    }
}

/// Build a manager over the hierarchy at `base` and merge the layers that
/// apply to `context`.
async fn open(
    base: &Path,
    context: &ProjectContext,
    config: SkillbookConfig,
) -> Result<SkillbookManager> {
    let config = SkillbookConfig {
        hierarchy: Some(HierarchyConfig::new(base)),
        ..config
    };
    let manager = SkillbookManager::new(config);
    manager.load_hierarchical(context.clone()).await?;
    Ok(manager)
}

fn parse_level(level: Option<&str>) -> Result<Option<HierarchyLevel>> {
    level
        .map(|value| value.parse::<HierarchyLevel>().map_err(anyhow::Error::msg))
        .transpose()
}

fn read_reflection(path: &PathBuf) -> Result<Reflection> {
    let content = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("cannot read reflection from stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("cannot read reflection file {}", path.display()))?
    };
    serde_json::from_str(&content).context("reflection is not valid JSON")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(None).unwrap(), None);
        assert_eq!(
            parse_level(Some("framework")).unwrap(),
            Some(HierarchyLevel::Framework)
        );
        assert!(parse_level(Some("galaxy")).is_err());
    }

    #[test]
    fn test_read_reflection_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reflection.json");
        std::fs::write(
            &path,
            r#"{"reasoning": "ok", "patterns": ["Pin versions in CI"]}"#,
        )
        .unwrap();

        let reflection = read_reflection(&path).unwrap();
        assert_eq!(reflection.patterns, vec!["Pin versions in CI".to_string()]);
    }

    #[test]
    fn test_read_reflection_rejects_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{oops").unwrap();

        assert!(read_reflection(&path).is_err());
    }

    #[tokio::test]
    async fn test_open_loads_hierarchy() {
        let temp = TempDir::new().unwrap();
        let context = ProjectContext::new();

        let manager = open(temp.path(), &context, SkillbookConfig::default())
            .await
            .unwrap();
        assert!(manager.is_empty().await);

        manager.add_skill("success", "Persisted lesson").await.unwrap();

        let reopened = open(temp.path(), &context, SkillbookConfig::default())
            .await
            .unwrap();
        assert_eq!(reopened.len().await, 1);
    }
}
