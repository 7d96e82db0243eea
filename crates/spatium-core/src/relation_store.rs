//! Relationship storage with outgoing/incoming adjacency

use crate::entity::EntityId;
use crate::entity_store::EntityStore;
use crate::error::{Error, Result};
use crate::merge::{MergeEngine, Outcome};
use crate::relation::{RelationId, RelationType, Relationship};
use std::collections::HashMap;

/// Owns every relationship record
///
/// Entities are referenced by id only. Parallel edges between the same
/// ordered pair, even of the same type, are separate records.
#[derive(Debug, Default, Clone)]
pub struct RelationshipStore {
    relationships: HashMap<RelationId, Relationship>,
    order: Vec<RelationId>,
    outgoing: HashMap<EntityId, Vec<RelationId>>,
    incoming: HashMap<EntityId, Vec<RelationId>>,
}

impl RelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a relationship, or fold it into an existing one
    ///
    /// Fails with [`Error::EntityNotFound`] when either endpoint is missing
    /// from `entities`; nothing is written in that case. With `merge` set,
    /// the first stored edge with the same source, target and type absorbs
    /// the observation instead of a new record being created.
    pub fn insert(
        &mut self,
        entities: &EntityStore,
        relationship: Relationship,
        merge: Option<&MergeEngine>,
    ) -> Result<Outcome<RelationId>> {
        for endpoint in [&relationship.source_id, &relationship.target_id] {
            if !entities.contains(endpoint) {
                tracing::warn!(
                    "Rejected {} relationship {}: entity {} not found",
                    relationship.relation_type,
                    relationship.id,
                    endpoint
                );
                return Err(Error::EntityNotFound(*endpoint));
            }
        }

        if let Some(engine) = merge {
            let existing = self
                .query(
                    Some(&relationship.source_id),
                    Some(&relationship.target_id),
                    Some(relationship.relation_type),
                )
                .first()
                .map(|r| r.id);

            if let Some(id) = existing {
                if let Some(stored) = self.relationships.get_mut(&id) {
                    engine.merge_relationship(stored, &relationship);
                    return Ok(Outcome::Merged(id));
                }
            }
        }

        if self.relationships.contains_key(&relationship.id) {
            return Err(Error::DuplicateId(relationship.id.to_string()));
        }

        let id = relationship.id;
        self.outgoing
            .entry(relationship.source_id)
            .or_default()
            .push(id);
        self.incoming
            .entry(relationship.target_id)
            .or_default()
            .push(id);
        self.order.push(id);

        tracing::debug!(
            "Stored relationship {}: {} -[{}]-> {}",
            id,
            relationship.source_id,
            relationship.relation_type,
            relationship.target_id
        );
        self.relationships.insert(id, relationship);
        Ok(Outcome::Inserted(id))
    }

    /// Fold `incoming` into the stored record `id`, whatever its endpoints
    pub(crate) fn merge_into(
        &mut self,
        id: &RelationId,
        incoming: &Relationship,
        engine: &MergeEngine,
    ) -> Option<Outcome<RelationId>> {
        let stored = self.relationships.get_mut(id)?;
        engine.merge_relationship(stored, incoming);
        Some(Outcome::Merged(*id))
    }

    pub fn get(&self, id: &RelationId) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    pub fn contains(&self, id: &RelationId) -> bool {
        self.relationships.contains_key(id)
    }

    /// Relationships matching the given endpoints and type
    ///
    /// Both endpoints: the edges of that ordered pair. Source only: outgoing
    /// edges. Target only: incoming edges. Neither: every edge. The type
    /// filter applies on top.
    pub fn query(
        &self,
        source: Option<&EntityId>,
        target: Option<&EntityId>,
        relation_type: Option<RelationType>,
    ) -> Vec<&Relationship> {
        let candidates: Vec<&Relationship> = match (source, target) {
            (Some(s), Some(t)) => self
                .outgoing(s)
                .into_iter()
                .filter(|r| r.target_id == *t)
                .collect(),
            (Some(s), None) => self.outgoing(s),
            (None, Some(t)) => self.incoming(t),
            (None, None) => self.iter().collect(),
        };

        match relation_type {
            Some(rt) => candidates
                .into_iter()
                .filter(|r| r.relation_type == rt)
                .collect(),
            None => candidates,
        }
    }

    /// Edges leaving `id`, in insertion order
    pub fn outgoing(&self, id: &EntityId) -> Vec<&Relationship> {
        self.resolve(self.outgoing.get(id))
    }

    /// Edges arriving at `id`, in insertion order
    pub fn incoming(&self, id: &EntityId) -> Vec<&Relationship> {
        self.resolve(self.incoming.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.order.iter().filter_map(|id| self.relationships.get(id))
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    pub fn clear(&mut self) {
        self.relationships.clear();
        self.order.clear();
        self.outgoing.clear();
        self.incoming.clear();
    }

    fn resolve(&self, ids: Option<&Vec<RelationId>>) -> Vec<&Relationship> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.relationships.get(id))
                .collect()
        })
        .unwrap_or_default()
    }
}
