use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};

/// How well the listener already knows an item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Familiarity {
    /// Played recently or a short/medium-term favorite
    CurrentFavorite,
    /// A long-term favorite
    ReliableClassic,
    /// Saved but never surfaced by any listening signal
    UnderappreciatedGem,
}

impl Familiarity {
    /// Category label used in titles
    pub fn label(&self) -> &'static str {
        match self {
            Familiarity::CurrentFavorite => "Current Favorites",
            Familiarity::ReliableClassic => "Reliable Classics",
            Familiarity::UnderappreciatedGem => "Underappreciated Gems",
        }
    }
}

/// A multi-dimensional mood query
///
/// Every dimension is optional. An unset dimension means "no preference" and is
/// left out of scoring entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MoodQuery {
    #[serde(default)]
    pub familiarity: Option<Familiarity>,
    /// `true` prefers instrumental items, `false` prefers vocal ones
    #[serde(default)]
    pub instrumental: Option<bool>,
    #[serde(default)]
    pub acousticness: Option<f64>,
    #[serde(default)]
    pub valence: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub danceability: Option<f64>,
    #[serde(default)]
    pub genres: Option<BTreeSet<String>>,
}

impl MoodQuery {
    /// Genre preference, if one is set and non-empty
    pub fn genre_preference(&self) -> Option<&BTreeSet<String>> {
        self.genres.as_ref().filter(|genres| !genres.is_empty())
    }

    /// Number of dimensions that take part in scoring
    pub fn dimension_count(&self) -> usize {
        [
            self.familiarity.is_some(),
            self.instrumental.is_some(),
            self.acousticness.is_some(),
            self.valence.is_some(),
            self.energy.is_some(),
            self.danceability.is_some(),
            self.genre_preference().is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Same query with the genre dimension unset
    pub fn without_genres(&self) -> Self {
        Self {
            genres: None,
            ..self.clone()
        }
    }

    /// Rejects continuous preferences outside [0, 1]
    pub fn validate(&self) -> AppResult<()> {
        let spectrum = [
            ("acousticness", self.acousticness),
            ("valence", self.valence),
            ("energy", self.energy),
            ("danceability", self.danceability),
        ];

        for (name, value) in spectrum {
            if let Some(value) = value {
                if !(0.0..=1.0).contains(&value) {
                    return Err(AppError::InvalidInput(format!(
                        "{} must be between 0 and 1, got {}",
                        name, value
                    )));
                }
            }
        }

        Ok(())
    }
}
