//! Fusing a repeated observation into the record it resolved to

use crate::confidence::Weight;
use crate::entity::Entity;
use crate::relation::Relationship;
use chrono::Utc;

/// What a write did with an incoming record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<Id> {
    /// Stored as a new record
    Inserted(Id),
    /// Folded into the existing record with this id
    Merged(Id),
}

impl<Id: Copy> Outcome<Id> {
    /// Id of the stored record that now carries the observation
    pub fn id(&self) -> Id {
        match self {
            Self::Inserted(id) | Self::Merged(id) => *id,
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged(_))
    }
}

/// Applies the entity and relationship fusion rules
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MergeEngine {
    pub entity_weight: Weight,
    pub relationship_weight: Weight,
}

impl MergeEngine {
    pub fn new(entity_weight: Weight, relationship_weight: Weight) -> Self {
        Self {
            entity_weight,
            relationship_weight,
        }
    }

    /// Fold `incoming` into `existing` using the configured entity weight
    pub fn merge_entity(&self, existing: &mut Entity, incoming: &Entity) {
        merge_entity(existing, incoming, self.entity_weight);
    }

    /// Record one more sighting of `existing` using the configured weight
    pub fn merge_relationship(&self, existing: &mut Relationship, incoming: &Relationship) {
        merge_relationship(existing, self.relationship_weight);
        existing
            .source_devices
            .extend(incoming.source_devices.iter().cloned());
    }
}

/// Entity fusion
///
/// Category and function are taken from `incoming` only when it was more
/// confident than `existing` before the blend, and only when non-blank.
/// `last_observed` is the merge wall-clock time, not the observation's own
/// timestamp.
pub fn merge_entity(existing: &mut Entity, incoming: &Entity, weight: Weight) {
    let incoming_more_confident = incoming.confidence > existing.confidence;

    existing.last_observed = existing.last_observed.max(Utc::now());
    existing.observation_count += 1;

    existing
        .semantic
        .tags
        .extend(incoming.semantic.tags.iter().cloned());
    existing
        .semantic
        .aliases
        .extend(incoming.semantic.aliases.iter().cloned());

    existing.confidence = existing.confidence.blend(incoming.confidence, weight);

    existing
        .source_devices
        .extend(incoming.source_devices.iter().cloned());

    for (key, value) in &incoming.properties {
        existing.properties.insert(key.clone(), value.clone());
    }

    if incoming_more_confident {
        if let Some(category) = non_empty(&incoming.semantic.category) {
            existing.semantic.category = Some(category.to_string());
        }
        if let Some(function) = non_empty(&incoming.semantic.function) {
            existing.semantic.function = Some(function.to_string());
        }
    }

    tracing::debug!(
        "Merged observation into entity {} (count={}, confidence={})",
        existing.id,
        existing.observation_count,
        existing.confidence
    );
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Relationship fusion: one more sighting pushes confidence toward 1
pub fn merge_relationship(existing: &mut Relationship, weight: Weight) {
    existing.last_observed = existing.last_observed.max(Utc::now());
    existing.observation_count += 1;
    existing.confidence = existing.confidence.reinforce(weight);

    tracing::debug!(
        "Merged observation into relationship {} (count={}, confidence={})",
        existing.id,
        existing.observation_count,
        existing.confidence
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, EntityType};
    use crate::relation::RelationType;
    use serde_json::json;

    #[test]
    fn test_entity_merge() {
        let mut existing = Entity::new(EntityType::Object, "Tool")
            .with_confidence(0.5)
            .unwrap()
            .with_tag("red")
            .with_tag("metal")
            .with_alias("Wrench")
            .with_source_device("cam-1")
            .with_property("shelf", json!(1));
        let before = existing.last_observed;

        let incoming = Entity::new(EntityType::Object, "Tool")
            .with_confidence(0.8)
            .unwrap()
            .with_tag("heavy")
            .with_alias("Wrench")
            .with_source_device("phone-2")
            .with_property("shelf", json!(3))
            .with_property("color", json!("red"));

        merge_entity(&mut existing, &incoming, Weight::default());

        assert_eq!(existing.observation_count, 2);
        assert!(existing.last_observed >= before);
        assert_eq!(existing.semantic.tags.len(), 3);
        assert_eq!(existing.semantic.aliases, vec!["Wrench", "Wrench"]);
        assert!((existing.confidence.value() - (0.7 * 0.5 + 0.3 * 0.8)).abs() < 1e-12);
        assert!(existing.source_devices.contains("cam-1"));
        assert!(existing.source_devices.contains("phone-2"));
        assert_eq!(existing.properties["shelf"], json!(3));
        assert_eq!(existing.properties["color"], json!("red"));
    }

    #[test]
    fn test_category_follows_pre_blend_confidence() {
        let mut existing = Entity::new(EntityType::Object, "Tool")
            .with_confidence(0.6)
            .unwrap()
            .with_category("hardware")
            .with_function("fastening");

        // Less confident: keeps what it had
        let weaker = Entity::new(EntityType::Object, "Tool")
            .with_confidence(0.4)
            .unwrap()
            .with_category("toy");
        merge_entity(&mut existing, &weaker, Weight::default());
        assert_eq!(existing.semantic.category.as_deref(), Some("hardware"));

        // More confident than the stored value at call time: replaces
        let stronger = Entity::new(EntityType::Object, "Tool")
            .with_confidence(0.9)
            .unwrap()
            .with_category("hand tool");
        merge_entity(&mut existing, &stronger, Weight::default());
        assert_eq!(existing.semantic.category.as_deref(), Some("hand tool"));
        // Incoming had no function: nothing to copy
        assert_eq!(existing.semantic.function.as_deref(), Some("fastening"));
    }

    #[test]
    fn test_empty_category_never_replaces() {
        let mut existing = Entity::new(EntityType::Object, "Screwdriver")
            .with_confidence(0.4)
            .unwrap()
            .with_category("hardware")
            .with_function("fastening");

        let blank = Entity::new(EntityType::Object, "Screwdriver")
            .with_confidence(0.9)
            .unwrap()
            .with_category("")
            .with_function("  ");
        merge_entity(&mut existing, &blank, Weight::default());

        assert_eq!(existing.semantic.category.as_deref(), Some("hardware"));
        assert_eq!(existing.semantic.function.as_deref(), Some("fastening"));
        assert_eq!(existing.observation_count, 2);
    }

    #[test]
    fn test_relationship_merge() {
        let mut rel = Relationship::new(RelationType::On, EntityId::new(), EntityId::new())
            .with_confidence(0.5)
            .unwrap();
        merge_relationship(&mut rel, Weight::default());

        assert_eq!(rel.observation_count, 2);
        assert!((rel.confidence.value() - 0.65).abs() < 1e-12);

        let mut full = Relationship::new(RelationType::In, EntityId::new(), EntityId::new())
            .with_confidence(1.0)
            .unwrap();
        merge_relationship(&mut full, Weight::default());
        assert_eq!(full.confidence.value(), 1.0);
    }

    #[test]
    fn test_engine_unions_relationship_devices() {
        let (a, b) = (EntityId::new(), EntityId::new());
        let mut rel = Relationship::new(RelationType::Near, a, b).with_source_device("cam-1");
        let again = Relationship::new(RelationType::Near, a, b).with_source_device("cam-2");

        MergeEngine::default().merge_relationship(&mut rel, &again);

        assert_eq!(rel.observation_count, 2);
        assert_eq!(rel.source_devices.len(), 2);
    }
}
