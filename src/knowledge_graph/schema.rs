//! Labels and types used in the knowledge graph.

pub const ENTITY_TYPES: [&str; 6] = ["Policy", "Regulation", "Team", "System", "Person", "Concept"];

pub const RELATION_TYPES: [&str; 5] = ["MENTIONS", "RELATED_TO", "OWNED_BY", "DEPENDS_ON", "GOVERNS"];

pub const NODE_LABELS: [&str; 3] = ["Entity", "Document", "Chunk"];

/// Relationship followed by graph retrieval and written by the builder.
pub const MENTIONS: &str = "MENTIONS";

pub fn is_entity_type(name: &str) -> bool {
    ENTITY_TYPES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_relation_is_a_known_type() {
        assert!(RELATION_TYPES.contains(&MENTIONS));
    }

    #[test]
    fn entity_type_lookup_is_case_sensitive() {
        assert!(is_entity_type("Policy"));
        assert!(!is_entity_type("policy"));
        assert!(NODE_LABELS.contains(&"Document"));
    }
}
