//! Rule-based entity extraction.
//!
//! Capitalised phrases are matched against a fixed list of patterns. The
//! heuristics are coarse: they trade recall for zero I/O and no model.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("Policy", r"\bPolicy\s+[A-Z][a-zA-Z\s]+\b"),
        ("Regulation", r"\bRegulation\s+[A-Z][a-zA-Z\s]+\b"),
        ("System", r"\b[A-Z][a-zA-Z]+\s+System\b"),
        ("Team", r"\b[A-Z][a-zA-Z]+\s+Team\b"),
        ("Person", r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b"),
        ("Concept", r"\b[A-Z][a-zA-Z\s]{3,}\b"),
    ]
    .into_iter()
    .map(|(entity_type, pattern)| {
        (
            entity_type,
            Regex::new(pattern).expect("valid entity pattern"),
        )
    })
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Entities in pattern order, de-duplicated on `(type, name)`.
    pub fn extract(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut entities: Vec<ExtractedEntity> = Vec::new();
        if text.trim().is_empty() {
            return entities;
        }

        for (entity_type, regex) in PATTERNS.iter() {
            for m in regex.find_iter(text) {
                let name = m.as_str().trim();
                if name.chars().count() <= 2 {
                    continue;
                }
                let duplicate = entities
                    .iter()
                    .any(|e| e.entity_type == *entity_type && e.name == name);
                if !duplicate {
                    entities.push(ExtractedEntity {
                        entity_type: entity_type.to_string(),
                        name: name.to_string(),
                    });
                }
            }
        }

        entities
    }

    /// Distinct entity names in first-seen order. A name found under several
    /// types appears once.
    pub fn entity_names(&self, text: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entity in self.extract(text) {
            if !names.contains(&entity.name) {
                names.push(entity.name);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(text: &str) -> Vec<(String, String)> {
        EntityExtractor::new()
            .extract(text)
            .into_iter()
            .map(|e| (e.entity_type, e.name))
            .collect()
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(EntityExtractor::new().extract("").is_empty());
        assert!(EntityExtractor::new().extract("   \n").is_empty());
    }

    #[test]
    fn lowercase_text_has_no_entities() {
        assert!(EntityExtractor::new()
            .extract("what is the refund process?")
            .is_empty());
    }

    #[test]
    fn system_and_team_patterns_match() {
        let found = pairs("The Billing System is owned by the Platform Team.");

        assert!(found.contains(&("System".into(), "Billing System".into())));
        assert!(found.contains(&("Team".into(), "Platform Team".into())));
    }

    #[test]
    fn person_pattern_matches_two_capitalised_words() {
        let found = pairs("ask about Jane Smith today");
        assert_eq!(found[0], ("Person".into(), "Jane Smith".into()));
    }

    #[test]
    fn policy_pattern_extends_over_capitalised_words() {
        let found = pairs("see Policy Energy Data");
        assert_eq!(found[0], ("Policy".into(), "Policy Energy Data".into()));
    }

    #[test]
    fn duplicates_are_removed_preserving_order() {
        let found = pairs("Grid Team meets. Grid Team reports.");
        let teams: Vec<_> = found.iter().filter(|(t, _)| t == "Team").collect();
        assert_eq!(teams.len(), 1);
        assert_eq!(found[0].0, "Team");
    }

    #[test]
    fn same_name_under_different_types_is_kept() {
        let found = pairs("Grid Team");
        assert!(found.contains(&("Team".into(), "Grid Team".into())));
        assert!(found.contains(&("Person".into(), "Grid Team".into())));
        assert!(found.contains(&("Concept".into(), "Grid Team".into())));
    }

    #[test]
    fn entity_names_are_distinct() {
        let names = EntityExtractor::new().entity_names("Grid Team");
        assert_eq!(names, vec!["Grid Team".to_string()]);
    }

    #[test]
    fn serializes_type_field() {
        let entity = ExtractedEntity {
            entity_type: "Team".into(),
            name: "Grid Team".into(),
        };
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "Team");
    }
}
