//! Entity storage with type and name indices

use crate::entity::{Entity, EntityId, EntityType};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Owns every entity record plus two denormalized indices
///
/// The primary map, the insertion order, the type index and the lower-cased
/// name index are only ever written together inside one `&mut self` call.
/// All list results come back in insertion order.
#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    entities: HashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    by_type: HashMap<EntityType, Vec<EntityId>>,
    by_name: HashMap<String, Vec<EntityId>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record. Never merges; a reused id is rejected.
    pub fn insert(&mut self, entity: Entity) -> Result<&Entity> {
        if self.entities.contains_key(&entity.id) {
            return Err(Error::DuplicateId(entity.id.to_string()));
        }

        let id = entity.id;
        self.by_type.entry(entity.entity_type).or_default().push(id);
        self.by_name
            .entry(entity.name.to_lowercase())
            .or_default()
            .push(id);
        self.order.push(id);

        tracing::debug!("Stored entity {} ({}, {})", id, entity.name, entity.entity_type);
        Ok(self.entities.entry(id).or_insert(entity))
    }

    /// Apply `update` to a stored entity and refresh its index entries
    ///
    /// Name and type are re-indexed in the same call, so a caller that changes
    /// either never leaves the indices behind the primary map.
    pub(crate) fn update<F>(&mut self, id: &EntityId, update: F) -> Option<&Entity>
    where
        F: FnOnce(&mut Entity),
    {
        let entity = self.entities.get_mut(id)?;
        let old_type = entity.entity_type;
        let old_name = entity.name.to_lowercase();

        update(entity);

        let new_type = entity.entity_type;
        let new_name = entity.name.to_lowercase();

        if old_type != new_type {
            remove_id(&mut self.by_type, &old_type, id);
            self.by_type.entry(new_type).or_default().push(*id);
            sort_by_order(self.by_type.get_mut(&new_type), &self.order);
        }
        if old_name != new_name {
            remove_id(&mut self.by_name, &old_name, id);
            self.by_name.entry(new_name.clone()).or_default().push(*id);
            sort_by_order(self.by_name.get_mut(&new_name), &self.order);
        }

        self.entities.get(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn by_type(&self, entity_type: EntityType) -> Vec<&Entity> {
        self.resolve(self.by_type.get(&entity_type))
    }

    /// Case-insensitive exact name lookup
    pub fn by_name_exact(&self, name: &str) -> Vec<&Entity> {
        self.resolve(self.by_name.get(&name.to_lowercase()))
    }

    /// Case-insensitive substring lookup over names and aliases
    ///
    /// An entity matches when the query is contained in its name, its name is
    /// contained in the query, or the query is contained in one of its aliases.
    pub fn by_name_fuzzy(&self, query: &str) -> Vec<&Entity> {
        let query = query.to_lowercase();
        self.iter()
            .filter(|entity| {
                let name = entity.name.to_lowercase();
                name.contains(&query)
                    || query.contains(&name)
                    || entity
                        .semantic
                        .aliases
                        .iter()
                        .any(|alias| alias.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// All entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities per type, only for types that occur
    pub fn type_counts(&self) -> impl Iterator<Item = (EntityType, usize)> + '_ {
        self.by_type
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(t, ids)| (*t, ids.len()))
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.order.clear();
        self.by_type.clear();
        self.by_name.clear();
    }

    fn resolve(&self, ids: Option<&Vec<EntityId>>) -> Vec<&Entity> {
        ids.map(|ids| ids.iter().filter_map(|id| self.entities.get(id)).collect())
            .unwrap_or_default()
    }
}

fn remove_id<K>(index: &mut HashMap<K, Vec<EntityId>>, key: &K, id: &EntityId)
where
    K: std::hash::Hash + Eq,
{
    if let Some(ids) = index.get_mut(key) {
        ids.retain(|other| other != id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

fn sort_by_order(ids: Option<&mut Vec<EntityId>>, order: &[EntityId]) {
    if let Some(ids) = ids {
        ids.sort_by_key(|id| order.iter().position(|o| o == id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(names: &[(&str, EntityType)]) -> EntityStore {
        let mut store = EntityStore::new();
        for (name, t) in names {
            store.insert(Entity::new(*t, *name)).unwrap();
        }
        store
    }

    #[test]
    fn test_insert_twice_gives_two_records() {
        let mut store = EntityStore::new();
        let a = store.insert(Entity::new(EntityType::Object, "Tool")).unwrap().id;
        let b = store.insert(Entity::new(EntityType::Object, "Tool")).unwrap().id;

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.by_name_exact("tool").len(), 2);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = EntityStore::new();
        let entity = Entity::new(EntityType::Object, "Tool");
        store.insert(entity.clone()).unwrap();

        let err = store.insert(entity).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.by_type(EntityType::Object).len(), 1);
    }

    #[test]
    fn test_by_type() {
        let store = store_with(&[
            ("Tool1", EntityType::Object),
            ("Tool2", EntityType::Object),
            ("Table", EntityType::Surface),
        ]);

        let objects: Vec<_> = store.by_type(EntityType::Object).iter().map(|e| e.name.clone()).collect();
        assert_eq!(objects, vec!["Tool1", "Tool2"]);
        assert_eq!(store.by_type(EntityType::Surface).len(), 1);
        assert!(store.by_type(EntityType::Person).is_empty());
    }

    #[test]
    fn test_by_name_exact_is_case_insensitive() {
        let store = store_with(&[("Red Toolbox", EntityType::Container)]);
        assert_eq!(store.by_name_exact("RED TOOLBOX").len(), 1);
        assert!(store.by_name_exact("toolbox").is_empty());
    }

    #[test]
    fn test_by_name_fuzzy() {
        let mut store = store_with(&[
            ("Red Toolbox", EntityType::Container),
            ("Box", EntityType::Container),
        ]);
        store
            .insert(Entity::new(EntityType::Object, "Driver").with_alias("Phillips Screwdriver"))
            .unwrap();

        // query inside name
        let hits: Vec<_> = store.by_name_fuzzy("toolbox").iter().map(|e| e.name.clone()).collect();
        assert_eq!(hits, vec!["Red Toolbox"]);

        // name inside query
        let hits: Vec<_> = store.by_name_fuzzy("big box lid").iter().map(|e| e.name.clone()).collect();
        assert_eq!(hits, vec!["Box"]);

        // query inside alias
        let hits: Vec<_> = store.by_name_fuzzy("SCREWDRIVER").iter().map(|e| e.name.clone()).collect();
        assert_eq!(hits, vec!["Driver"]);

        assert!(store.by_name_fuzzy("ladder").is_empty());
    }

    #[test]
    fn test_update_reindexes_name_and_type() {
        let mut store = store_with(&[("Crate", EntityType::Unknown)]);
        let id = store.iter().next().unwrap().id;

        store.update(&id, |e| {
            e.name = "Wooden Crate".to_string();
            e.entity_type = EntityType::Container;
        });

        assert!(store.by_name_exact("crate").is_empty());
        assert_eq!(store.by_name_exact("wooden crate")[0].id, id);
        assert!(store.by_type(EntityType::Unknown).is_empty());
        assert_eq!(store.by_type(EntityType::Container)[0].id, id);
        assert_eq!(store.type_counts().count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut store = store_with(&[("A", EntityType::Object), ("B", EntityType::Space)]);
        store.clear();
        assert!(store.is_empty());
        assert!(store.by_type(EntityType::Object).is_empty());
        assert!(store.by_name_exact("a").is_empty());
        assert_eq!(store.iter().count(), 0);
    }
}
