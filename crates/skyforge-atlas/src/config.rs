//! Pipeline settings, passed by value into [`crate::Stitcher`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::face::FaceId;
use crate::topology::MIN_SIZE;
use crate::transform::TransformTables;

/// Settings for one stitching run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StitchConfig {
    /// Faces smaller than this on either side become black placeholders.
    pub min_face_size: u32,
    /// Filename keywords per face.
    pub keywords: FaceKeywords,
    /// Slot reassignment and orientation tables.
    pub tables: TransformTables,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            min_face_size: MIN_SIZE,
            keywords: FaceKeywords::default(),
            tables: TransformTables::default(),
        }
    }
}

/// Filename keywords that identify each face.
///
/// Faces absent from the map use their built-in keywords.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FaceKeywords(BTreeMap<FaceId, Vec<String>>);

impl Default for FaceKeywords {
    fn default() -> Self {
        Self(
            FaceId::ALL
                .into_iter()
                .map(|face| {
                    let words = face.default_keywords().iter().map(|s| s.to_string()).collect();
                    (face, words)
                })
                .collect(),
        )
    }
}

impl FaceKeywords {
    /// Lowercased keywords for `face`.
    #[must_use]
    pub fn for_face(&self, face: FaceId) -> Vec<String> {
        match self.0.get(&face) {
            Some(words) if !words.is_empty() => {
                words.iter().map(|w| w.to_ascii_lowercase()).collect()
            }
            _ => face
                .default_keywords()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the keywords for one face.
    pub fn set(&mut self, face: FaceId, words: Vec<String>) {
        self.0.insert(face, words);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keywords() {
        let keywords = FaceKeywords::default();
        assert_eq!(keywords.for_face(FaceId::Back), vec!["back", "bk"]);
        assert_eq!(keywords.for_face(FaceId::Up), vec!["up", "top"]);
    }

    #[test]
    fn test_custom_keywords_are_lowercased() {
        let mut keywords = FaceKeywords::default();
        keywords.set(FaceId::Up, vec!["SKY".to_string()]);
        assert_eq!(keywords.for_face(FaceId::Up), vec!["sky"]);
    }

    #[test]
    fn test_missing_face_uses_defaults() {
        let keywords: FaceKeywords = ron::from_str("{front: [\"fwd\"]}").unwrap();
        assert_eq!(keywords.for_face(FaceId::Front), vec!["fwd"]);
        assert_eq!(keywords.for_face(FaceId::Down), vec!["down", "dn"]);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: StitchConfig = ron::from_str("(min_face_size: 16)").unwrap();
        assert_eq!(config.min_face_size, 16);
        assert_eq!(config.tables, TransformTables::default());
        assert_eq!(config.keywords, FaceKeywords::default());
    }
}
