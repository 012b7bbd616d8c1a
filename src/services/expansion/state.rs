use std::collections::{HashMap, HashSet};

use super::technique::Technique;

/// Exclusion state of one expansion session
#[derive(Debug, Default, Clone)]
pub struct ExpansionState {
    used_seeds: HashMap<Technique, HashSet<String>>,
    recommended: HashSet<String>,
    last_technique: Option<Technique>,
}

impl ExpansionState {
    /// Starts a session that must not repeat anything in `previously_recommended`
    pub fn with_history(previously_recommended: HashSet<String>) -> Self {
        Self {
            recommended: previously_recommended,
            ..Default::default()
        }
    }

    pub fn is_seed_used(&self, technique: Technique, seed: &str) -> bool {
        self.used_seeds
            .get(&technique)
            .is_some_and(|used| used.contains(seed))
    }

    pub fn is_recommended(&self, id: &str) -> bool {
        self.recommended.contains(id)
    }

    pub fn recommended_count(&self) -> usize {
        self.recommended.len()
    }

    pub fn last_technique(&self) -> Option<Technique> {
        self.last_technique
    }

    /// Applies a successful page in one step
    pub fn record_page<S, I>(&mut self, technique: Technique, seeds: S, produced: I)
    where
        S: IntoIterator<Item = String>,
        I: IntoIterator<Item = String>,
    {
        if technique != Technique::RandomGenres {
            self.used_seeds.entry(technique).or_default().extend(seeds);
        }
        self.recommended.extend(produced);
        self.last_technique = Some(technique);
    }
}
