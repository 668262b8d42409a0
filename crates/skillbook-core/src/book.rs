//! In-memory skillbook aggregate
//!
//! Owns the id → skill mapping plus a section index and the global insertion
//! order. Layers are merged in load order and the first layer loaded wins any
//! id collision, so the similarity scan and ranking see the broadest scope
//! first.

use crate::error::{SkillbookError, SkillbookResult};
use crate::similarity::similarity;
use crate::types::{Skill, SkillId, Vote};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Aggregate statistics over the loaded view
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillbookStats {
    pub total_skills: usize,
    /// Skills with more helpful than harmful votes
    pub helpful_skills: usize,
    pub harmful_skills: usize,
    pub neutral_skills: usize,
    pub sections: Vec<String>,
    pub by_level: HashMap<String, usize>,
}

/// Unified in-memory view of one or more loaded layers
#[derive(Debug, Default)]
pub struct Skillbook {
    skills: HashMap<SkillId, Skill>,
    sections: HashMap<String, Vec<SkillId>>,
    order: Vec<SkillId>,
    /// High-water sequence per section, never decremented on remove
    counters: HashMap<String, u32>,
}

impl Skillbook {
    /// Create an empty skillbook
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of loaded skills
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// True when no skills are loaded
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Whether a skill with this id is present
    pub fn contains(&self, id: &SkillId) -> bool {
        self.skills.contains_key(id)
    }

    /// Get a skill by id
    pub fn get(&self, id: &SkillId) -> Option<&Skill> {
        self.skills.get(id)
    }

    /// Iterate skills in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.order.iter().filter_map(|id| self.skills.get(id))
    }

    /// Ids belonging to a section, in insertion order
    pub fn section_ids(&self, section: &str) -> &[SkillId] {
        self.sections.get(section).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Section names present in the view
    pub fn sections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sections.keys().cloned().collect();
        names.sort();
        names
    }

    /// Add a skill to both indices. Fails if the id is already present.
    pub fn insert(&mut self, skill: Skill) -> SkillbookResult<()> {
        if self.skills.contains_key(&skill.id) {
            return Err(SkillbookError::DuplicateId(skill.id.clone()));
        }

        if let Some(seq) = skill.id.sequence() {
            let counter = self.counters.entry(skill.section.clone()).or_insert(0);
            *counter = (*counter).max(seq);
        }

        self.sections
            .entry(skill.section.clone())
            .or_default()
            .push(skill.id.clone());
        self.order.push(skill.id.clone());
        self.skills.insert(skill.id.clone(), skill);
        Ok(())
    }

    /// Merge one loaded layer into the view, skipping ids that are already
    /// present so the first layer loaded wins. Returns how many skills were
    /// actually merged.
    pub fn merge_layer(&mut self, skills: Vec<Skill>) -> usize {
        let mut merged = 0;
        for skill in skills {
            let id = skill.id.clone();
            if self.insert(skill).is_err() {
                debug!("skipping already-loaded skill {}", id);
                continue;
            }
            merged += 1;
        }
        merged
    }

    /// Replace a present skill with an updated copy of itself
    pub fn replace(&mut self, skill: Skill) -> SkillbookResult<()> {
        if !self.skills.contains_key(&skill.id) {
            return Err(SkillbookError::SkillNotFound(skill.id.clone()));
        }

        if self.skills[&skill.id].section != skill.section {
            self.remove(&skill.id)?;
            self.insert(skill)
        } else {
            self.skills.insert(skill.id.clone(), skill);
            Ok(())
        }
    }

    /// First skill whose content is at least `threshold` similar, scanning in
    /// insertion order so ties prefer the broadest-scope skill.
    pub fn find_similar(&self, content: &str, threshold: f32) -> Option<&Skill> {
        self.iter()
            .find(|skill| similarity(&skill.content, content) >= threshold)
    }

    /// Increment a vote counter and refresh the update timestamp
    pub fn score(&mut self, id: &SkillId, vote: Vote, delta: u32) -> SkillbookResult<&Skill> {
        let skill = self
            .skills
            .get_mut(id)
            .ok_or_else(|| SkillbookError::SkillNotFound(id.clone()))?;
        skill.apply_vote(vote, delta);
        Ok(skill)
    }

    /// Refresh a skill's update timestamp without touching anything else
    pub fn touch(&mut self, id: &SkillId) -> SkillbookResult<&Skill> {
        let skill = self
            .skills
            .get_mut(id)
            .ok_or_else(|| SkillbookError::SkillNotFound(id.clone()))?;
        skill.touch();
        Ok(skill)
    }

    /// Delete a skill from both indices
    pub fn remove(&mut self, id: &SkillId) -> SkillbookResult<Skill> {
        let skill = self
            .skills
            .remove(id)
            .ok_or_else(|| SkillbookError::SkillNotFound(id.clone()))?;

        if let Some(ids) = self.sections.get_mut(&skill.section) {
            ids.retain(|sid| sid != id);
            if ids.is_empty() {
                self.sections.remove(&skill.section);
            }
        }
        self.order.retain(|sid| sid != id);

        Ok(skill)
    }

    /// Next id sequence for a section. Removes never roll this back, so a
    /// sequence is not reused within the lifetime of the view.
    pub fn next_sequence(&self, section: &str) -> u32 {
        self.counters.get(section).copied().unwrap_or(0) + 1
    }

    /// Skills matching `predicate`, best net score (`helpful - harmful`)
    /// first, ties broken by most recent update.
    pub fn rank<F>(&self, predicate: F) -> Vec<&Skill>
    where
        F: Fn(&Skill) -> bool,
    {
        let mut ranked: Vec<&Skill> = self.iter().filter(|skill| predicate(skill)).collect();
        ranked.sort_by(|a, b| {
            b.net_score()
                .cmp(&a.net_score())
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        ranked
    }

    /// Aggregate statistics over the view
    pub fn stats(&self) -> SkillbookStats {
        let mut stats = SkillbookStats {
            total_skills: self.skills.len(),
            sections: self.sections(),
            ..Default::default()
        };

        for skill in self.skills.values() {
            match skill.helpful.cmp(&skill.harmful) {
                std::cmp::Ordering::Greater => stats.helpful_skills += 1,
                std::cmp::Ordering::Less => stats.harmful_skills += 1,
                std::cmp::Ordering::Equal => stats.neutral_skills += 1,
            }
            *stats
                .by_level
                .entry(skill.hierarchy_level.name().to_string())
                .or_default() += 1;
        }

        stats
    }
}
