use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ArtistRef;

/// Listening signals attached to a saved item
///
/// The flags are independent; an item can be both a short-term and a long-term
/// favorite at the same time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FamiliarityRecord {
    #[serde(default)]
    pub recently_played: bool,
    #[serde(default)]
    pub short_term_favorite: bool,
    #[serde(default)]
    pub medium_term_favorite: bool,
    #[serde(default)]
    pub long_term_favorite: bool,
}

impl FamiliarityRecord {
    /// No listening signal at all
    pub fn is_low(&self) -> bool {
        !(self.recently_played
            || self.short_term_favorite
            || self.medium_term_favorite
            || self.long_term_favorite)
    }
}

/// Audio features averaged over an item's tracks, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AudioFeatures {
    pub acousticness: f64,
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    #[serde(default)]
    pub instrumentalness: f64,
}

/// An item saved in the user's library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    pub features: AudioFeatures,
    #[serde(default)]
    pub familiarity: FamiliarityRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_familiarity() {
        assert!(FamiliarityRecord::default().is_low());

        let record = FamiliarityRecord {
            long_term_favorite: true,
            ..Default::default()
        };
        assert!(!record.is_low());
    }

    #[test]
    fn test_library_item_deserialization_defaults() {
        let json = r#"{
            "id": "album-1",
            "features": {
                "acousticness": 0.9,
                "valence": 0.5,
                "energy": 0.3,
                "danceability": 0.2
            }
        }"#;

        let item: LibraryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "album-1");
        assert!(item.genres.is_empty());
        assert_eq!(item.features.instrumentalness, 0.0);
        assert!(item.familiarity.is_low());
    }
}
