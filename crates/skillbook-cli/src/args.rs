//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skillbook")]
#[command(about = "Hierarchical skill memory for learning agents")]
#[command(
    long_about = r#"Hierarchical skill memory for learning agents

Skills are short reusable lessons stored in layered JSON skillbooks
(global -> language -> framework -> project). Every command detects the
project context, merges the applicable layers into one view, and prints
its result as JSON on stdout.

USAGE:
  skillbook stats                        # Show stats for the detected context
  skillbook add success "Lesson text"    # Add a skill to the routed layer
  skillbook vote success-00001 helpful   # Record a vote
  skillbook list --section success       # List skills ranked by net score
  skillbook learn reflection.json        # Apply a reflection result
  skillbook promote success-00001 --to global

For detailed help: skillbook --help"#
)]
#[command(version)]
pub struct Cli {
    /// Base directory for skillbook layers (defaults to the user config dir)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Project directory used for context detection (defaults to the current
    /// directory)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show skillbook statistics for the detected context
    Stats,

    /// Add a skill to the layer routed from the current context
    Add {
        /// Section the skill belongs to (e.g. "success", "failure")
        section: String,

        /// Lesson text
        content: String,

        /// Disable content-similarity deduplication
        #[arg(long)]
        no_dedup: bool,

        /// Similarity threshold for deduplication
        #[arg(long, default_value_t = skillbook_core::DEFAULT_DEDUP_THRESHOLD)]
        threshold: f32,

        /// Hierarchy level override (global|language|framework|project)
        #[arg(long)]
        level: Option<String>,
    },

    /// Record a vote on a skill
    Vote {
        /// Skill id (e.g. success-00001)
        id: String,

        /// One of: helpful, harmful, neutral
        vote: String,

        /// Vote increment
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Remove a skill from the view and its layer file
    Remove {
        /// Skill id
        id: String,
    },

    /// List skills ranked by net score
    List {
        /// Only list skills from this section
        #[arg(long)]
        section: Option<String>,

        /// Maximum number of skills to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Detect and print the project context
    Context,

    /// Apply a reflection produced by an external model
    Learn {
        /// Path to a reflection JSON file ("-" reads stdin)
        reflection: PathBuf,

        /// Task outcome, decides the target section
        #[arg(long, default_value = "success")]
        outcome: String,
    },

    /// Move a skill to a broader layer
    Promote {
        /// Skill id
        id: String,

        /// Target level (global|language|framework)
        #[arg(long)]
        to: String,
    },
}
