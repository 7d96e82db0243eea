//! Graph traversal: multi-hop spatial queries, path finding and local context

use crate::entity::{Entity, EntityId};
use crate::entity_store::EntityStore;
use crate::error::Result;
use crate::limits::validate_hops;
use crate::relation::{RelationId, RelationType, Relationship};
use crate::relation_store::RelationshipStore;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// One spatial query hit: the related entity and the edge that reached it
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SpatialHit<'a> {
    pub entity: &'a Entity,
    pub relationship: &'a Relationship,
}

/// A path through the graph
#[derive(Debug, Clone, Serialize)]
pub struct GraphPath<'a> {
    /// Entities from source to target, both included
    pub entities: Vec<&'a Entity>,

    /// Edges connecting consecutive entities
    pub relationships: Vec<&'a Relationship>,
}

impl GraphPath<'_> {
    /// Number of hops
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id).collect()
    }
}

/// What surrounds an entity
#[derive(Debug, Clone, Serialize)]
pub struct EntityContext<'a> {
    pub entity: &'a Entity,

    /// Target of the last outgoing IN edge, if any
    pub container: Option<&'a Entity>,

    /// Sources of incoming IN edges
    pub contents: Vec<&'a Entity>,

    /// Targets of outgoing NEAR edges
    pub nearby: Vec<&'a Entity>,

    /// Full `query_spatial` result within the context radius
    pub spatial_neighbors: Vec<SpatialHit<'a>>,
}

/// Read-only query engine over the two stores
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    entities: &'a EntityStore,
    relationships: &'a RelationshipStore,
}

impl<'a> QueryEngine<'a> {
    pub fn new(entities: &'a EntityStore, relationships: &'a RelationshipStore) -> Self {
        Self {
            entities,
            relationships,
        }
    }

    /// Spatial relationships reachable from `start` within `max_hops`
    ///
    /// Hop 1 reports every outgoing spatial edge passing `relation_type`.
    /// Deeper levels expand through edges of any type, so an entity can carry
    /// the search onward without being reported itself. A target is expanded
    /// at most once; all edges that discover it on the same level are
    /// reported.
    pub fn query_spatial(
        &self,
        start: &EntityId,
        relation_type: Option<RelationType>,
        max_hops: u32,
    ) -> Result<Vec<SpatialHit<'a>>> {
        validate_hops(max_hops)?;

        let mut results = Vec::new();
        if !self.entities.contains(start) {
            return Ok(results);
        }

        let reportable = |rel: &Relationship| {
            rel.is_spatial() && relation_type.map_or(true, |t| rel.relation_type == t)
        };

        let mut visited: HashSet<EntityId> = HashSet::from([*start]);
        let mut frontier: Vec<EntityId> = Vec::new();

        for rel in self.relationships.outgoing(start) {
            if reportable(rel) {
                self.push_hit(&mut results, rel);
            }
            if visited.insert(rel.target_id) {
                frontier.push(rel.target_id);
            }
        }

        for hop in 2..=max_hops {
            if frontier.is_empty() {
                break;
            }

            let mut discovered: HashSet<EntityId> = HashSet::new();
            let mut next: Vec<EntityId> = Vec::new();

            for id in &frontier {
                for rel in self.relationships.outgoing(id) {
                    if visited.contains(&rel.target_id) {
                        continue;
                    }
                    if reportable(rel) {
                        self.push_hit(&mut results, rel);
                    }
                    if discovered.insert(rel.target_id) {
                        next.push(rel.target_id);
                    }
                }
            }

            tracing::trace!("Spatial hop {} discovered {} entities", hop, next.len());
            visited.extend(discovered);
            frontier = next;
        }

        tracing::debug!(
            "Spatial query from {} (hops={}, type={:?}) returned {} hits",
            start,
            max_hops,
            relation_type,
            results.len()
        );

        Ok(results)
    }

    /// Shortest hop-count path from `source` to `target` over `allowed` edges
    ///
    /// Only outgoing edges whose type is in `allowed` are followed. `None`
    /// means no path, including when either endpoint is unknown.
    pub fn find_path(
        &self,
        source: &EntityId,
        target: &EntityId,
        allowed: &[RelationType],
    ) -> Option<GraphPath<'a>> {
        let start = self.entities.get(source)?;
        self.entities.get(target)?;

        let mut visited: HashSet<EntityId> = HashSet::from([*source]);
        let mut parent: HashMap<EntityId, (EntityId, RelationId)> = HashMap::new();
        let mut queue: VecDeque<EntityId> = VecDeque::from([*source]);
        let mut found = source == target;

        while let Some(current) = queue.pop_front() {
            if found {
                break;
            }

            for rel in self.relationships.outgoing(&current) {
                if !allowed.contains(&rel.relation_type) {
                    continue;
                }
                if visited.insert(rel.target_id) {
                    parent.insert(rel.target_id, (current, rel.id));
                    if rel.target_id == *target {
                        found = true;
                        break;
                    }
                    queue.push_back(rel.target_id);
                }
            }
        }

        if !found {
            tracing::debug!("No path from {} to {}", source, target);
            return None;
        }

        let path = self.reconstruct_path(start, target, &parent);
        tracing::debug!("Found path from {} to {} with {} hops", source, target, path.len());
        Some(path)
    }

    /// Container, contents, nearby entities and spatial neighbours of `id`
    ///
    /// When several outgoing IN edges exist, the one stored last becomes the
    /// container; the others are not reported.
    pub fn get_context(&self, id: &EntityId, radius: u32) -> Result<Option<EntityContext<'a>>> {
        validate_hops(radius)?;

        let Some(entity) = self.entities.get(id) else {
            return Ok(None);
        };

        let mut container = None;
        let mut nearby = Vec::new();
        for rel in self.relationships.outgoing(id) {
            let Some(target) = self.entities.get(&rel.target_id) else {
                continue;
            };
            match rel.relation_type {
                RelationType::In => container = Some(target),
                RelationType::Near => nearby.push(target),
                _ => {}
            }
        }

        let contents = self
            .relationships
            .incoming(id)
            .into_iter()
            .filter(|rel| rel.relation_type == RelationType::In)
            .filter_map(|rel| self.entities.get(&rel.source_id))
            .collect();

        let spatial_neighbors = self.query_spatial(id, None, radius)?;

        Ok(Some(EntityContext {
            entity,
            container,
            contents,
            nearby,
            spatial_neighbors,
        }))
    }

    fn push_hit(&self, results: &mut Vec<SpatialHit<'a>>, rel: &'a Relationship) {
        if let Some(entity) = self.entities.get(&rel.target_id) {
            results.push(SpatialHit {
                entity,
                relationship: rel,
            });
        }
    }

    /// Walk parent pointers back from `end` to `start`
    fn reconstruct_path(
        &self,
        start: &'a Entity,
        end: &EntityId,
        parent: &HashMap<EntityId, (EntityId, RelationId)>,
    ) -> GraphPath<'a> {
        let mut entities = Vec::new();
        let mut relationships = Vec::new();
        let mut current = *end;

        while current != start.id {
            let Some((prev, rel_id)) = parent.get(&current) else {
                break;
            };
            if let (Some(entity), Some(rel)) =
                (self.entities.get(&current), self.relationships.get(rel_id))
            {
                entities.push(entity);
                relationships.push(rel);
            }
            current = *prev;
        }
        entities.push(start);

        entities.reverse();
        relationships.reverse();

        GraphPath {
            entities,
            relationships,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    struct Fixture {
        entities: EntityStore,
        relationships: RelationshipStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                entities: EntityStore::new(),
                relationships: RelationshipStore::new(),
            }
        }

        fn entity(&mut self, name: &str, t: EntityType) -> EntityId {
            self.entities.insert(Entity::new(t, name)).unwrap().id
        }

        fn edge(&mut self, from: EntityId, t: RelationType, to: EntityId) -> RelationId {
            self.relationships
                .insert(&self.entities, Relationship::new(t, from, to), None)
                .unwrap()
                .id()
        }

        fn engine(&self) -> QueryEngine<'_> {
            QueryEngine::new(&self.entities, &self.relationships)
        }
    }

    fn names(hits: &[SpatialHit<'_>]) -> Vec<String> {
        hits.iter().map(|h| h.entity.name.clone()).collect()
    }

    #[test]
    fn test_single_hop() {
        let mut f = Fixture::new();
        let a = f.entity("A", EntityType::Object);
        let b = f.entity("B", EntityType::Surface);
        let rel = f.edge(a, RelationType::On, b);

        let hits = f.engine().query_spatial(&a, None, 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity.id, b);
        assert_eq!(hits[0].relationship.id, rel);
    }

    #[test]
    fn test_single_hop_skips_non_spatial_and_filters_type() {
        let mut f = Fixture::new();
        let a = f.entity("A", EntityType::Object);
        let b = f.entity("B", EntityType::Object);
        let c = f.entity("C", EntityType::Object);
        f.edge(a, RelationType::PartOf, b);
        f.edge(a, RelationType::Near, c);
        f.edge(a, RelationType::On, b);

        assert_eq!(names(&f.engine().query_spatial(&a, None, 1).unwrap()), vec!["C", "B"]);
        assert_eq!(
            names(&f.engine().query_spatial(&a, Some(RelationType::On), 1).unwrap()),
            vec!["B"]
        );
        assert!(f.engine().query_spatial(&a, Some(RelationType::PartOf), 1).unwrap().is_empty());
    }

    #[test]
    fn test_multi_hop_expands_through_non_spatial_edges() {
        let mut f = Fixture::new();
        let drawer = f.entity("Drawer", EntityType::Container);
        let desk = f.entity("Desk", EntityType::Surface);
        let office = f.entity("Office", EntityType::Space);
        f.edge(drawer, RelationType::PartOf, desk);
        f.edge(desk, RelationType::In, office);

        // Desk is reachable but not reported; Office comes through it
        let hits = f.engine().query_spatial(&drawer, None, 2).unwrap();
        assert_eq!(names(&hits), vec!["Office"]);

        let hits = f.engine().query_spatial(&drawer, None, 1).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_multi_hop_does_not_revisit() {
        let mut f = Fixture::new();
        let a = f.entity("A", EntityType::Object);
        let b = f.entity("B", EntityType::Object);
        let c = f.entity("C", EntityType::Object);
        f.edge(a, RelationType::Near, b);
        f.edge(b, RelationType::Near, a);
        f.edge(b, RelationType::Near, c);
        f.edge(c, RelationType::Near, b);

        let hits = f.engine().query_spatial(&a, None, 5).unwrap();
        assert_eq!(names(&hits), vec!["B", "C"]);
    }

    #[test]
    fn test_parallel_edges_into_new_target_all_reported() {
        let mut f = Fixture::new();
        let a = f.entity("A", EntityType::Object);
        let b = f.entity("B", EntityType::Object);
        let c = f.entity("C", EntityType::Object);
        f.edge(a, RelationType::RelatedTo, b);
        f.edge(b, RelationType::On, c);
        f.edge(b, RelationType::Near, c);

        let hits = f.engine().query_spatial(&a, None, 2).unwrap();
        assert_eq!(names(&hits), vec!["C", "C"]);
    }

    #[test]
    fn test_spatial_validation_and_unknown_start() {
        let mut f = Fixture::new();
        let a = f.entity("A", EntityType::Object);
        assert!(f.engine().query_spatial(&a, None, 0).is_err());
        assert!(f.engine().query_spatial(&EntityId::new(), None, 1).unwrap().is_empty());
    }

    #[test]
    fn test_find_path_chain() {
        let mut f = Fixture::new();
        let a = f.entity("A", EntityType::Object);
        let b = f.entity("B", EntityType::Container);
        let c = f.entity("C", EntityType::Space);
        f.edge(a, RelationType::On, b);
        f.edge(b, RelationType::In, c);

        let path = f
            .engine()
            .find_path(&a, &c, &RelationType::DEFAULT_PATH_TYPES)
            .unwrap();
        assert_eq!(path.ids(), vec![a, b, c]);
        assert_eq!(path.len(), 2);
        assert_eq!(path.relationships[0].relation_type, RelationType::On);

        // Edges are directed
        assert!(f
            .engine()
            .find_path(&c, &a, &RelationType::DEFAULT_PATH_TYPES)
            .is_none());
    }

    #[test]
    fn test_find_path_respects_allowed_types() {
        let mut f = Fixture::new();
        let a = f.entity("Blade", EntityType::Object);
        let b = f.entity("Saw", EntityType::Equipment);
        f.edge(a, RelationType::PartOf, b);

        assert!(f
            .engine()
            .find_path(&a, &b, &RelationType::DEFAULT_PATH_TYPES)
            .is_none());
        let path = f.engine().find_path(&a, &b, &[RelationType::PartOf]).unwrap();
        assert_eq!(path.ids(), vec![a, b]);
    }

    #[test]
    fn test_find_path_is_shortest() {
        let mut f = Fixture::new();
        let a = f.entity("A", EntityType::Object);
        let b = f.entity("B", EntityType::Object);
        let c = f.entity("C", EntityType::Object);
        let d = f.entity("D", EntityType::Object);
        f.edge(a, RelationType::Near, b);
        f.edge(b, RelationType::Near, c);
        f.edge(c, RelationType::Near, d);
        f.edge(a, RelationType::NextTo, d);

        let path = f
            .engine()
            .find_path(&a, &d, &RelationType::DEFAULT_PATH_TYPES)
            .unwrap();
        assert_eq!(path.ids(), vec![a, d]);
    }

    #[test]
    fn test_find_path_trivial_and_unknown() {
        let mut f = Fixture::new();
        let a = f.entity("A", EntityType::Object);

        let path = f.engine().find_path(&a, &a, &RelationType::DEFAULT_PATH_TYPES).unwrap();
        assert_eq!(path.ids(), vec![a]);
        assert!(path.is_empty());

        assert!(f
            .engine()
            .find_path(&a, &EntityId::new(), &RelationType::DEFAULT_PATH_TYPES)
            .is_none());
    }

    #[test]
    fn test_context() {
        let mut f = Fixture::new();
        let hammer = f.entity("Hammer", EntityType::Object);
        let toolbox = f.entity("Toolbox", EntityType::Container);
        let workbench = f.entity("Workbench", EntityType::Surface);
        let nails = f.entity("Nails", EntityType::Material);
        let saw = f.entity("Saw", EntityType::Object);
        f.edge(hammer, RelationType::In, toolbox);
        f.edge(toolbox, RelationType::On, workbench);
        f.edge(nails, RelationType::In, toolbox);
        f.edge(toolbox, RelationType::Near, saw);

        let engine = f.engine();
        let ctx = engine.get_context(&hammer, 2).unwrap().unwrap();
        assert_eq!(ctx.container.unwrap().id, toolbox);
        assert!(ctx.contents.is_empty());
        assert_eq!(names(&ctx.spatial_neighbors), vec!["Toolbox", "Workbench", "Saw"]);

        let ctx = engine.get_context(&toolbox, 2).unwrap().unwrap();
        assert!(ctx.container.is_none());
        let contents: Vec<_> = ctx.contents.iter().map(|e| e.id).collect();
        assert_eq!(contents, vec![hammer, nails]);
        assert_eq!(ctx.nearby[0].id, saw);

        assert!(engine.get_context(&EntityId::new(), 2).unwrap().is_none());
    }

    #[test]
    fn test_context_last_container_wins() {
        let mut f = Fixture::new();
        let cup = f.entity("Cup", EntityType::Object);
        let cabinet = f.entity("Cabinet", EntityType::Container);
        let kitchen = f.entity("Kitchen", EntityType::Space);
        f.edge(cup, RelationType::In, cabinet);
        f.edge(cup, RelationType::In, kitchen);

        let ctx = f.engine().get_context(&cup, 1).unwrap().unwrap();
        assert_eq!(ctx.container.unwrap().id, kitchen);
    }
}
