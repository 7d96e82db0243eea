//! Identity resolution: is a new observation the same thing as a stored one?

use crate::entity::Entity;
use crate::entity_store::EntityStore;
use std::collections::HashSet;

/// Default cosine-similarity threshold for embedding matches
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.7;

/// Default Jaccard threshold for tag-set matches
pub const DEFAULT_TAG_OVERLAP: f64 = 0.5;

/// Stateless ordered predicate chain deciding entity identity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentityResolver {
    pub threshold: f32,
    pub tag_overlap: f64,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            tag_overlap: DEFAULT_TAG_OVERLAP,
        }
    }
}

impl IdentityResolver {
    pub fn new(threshold: f32, tag_overlap: f64) -> Self {
        Self {
            threshold,
            tag_overlap,
        }
    }

    /// Decide whether `a` and `b` describe the same physical thing
    ///
    /// The first rule that fires decides; nothing is weighted or averaged.
    pub fn matches(&self, a: &Entity, b: &Entity) -> bool {
        if a.entity_type.is_known()
            && b.entity_type.is_known()
            && a.entity_type != b.entity_type
        {
            return false;
        }

        if a.name.to_lowercase() == b.name.to_lowercase() {
            return true;
        }

        if !a.all_names_lower().is_disjoint(&b.all_names_lower()) {
            return true;
        }

        if let (Some(ea), Some(eb)) = (&a.visual.embedding, &b.visual.embedding) {
            if ea.len() == eb.len() && cosine_similarity(ea, eb) > self.threshold {
                return true;
            }
        }

        let (ta, tb) = (&a.semantic.tags, &b.semantic.tags);
        if !ta.is_empty() && !tb.is_empty() {
            let overlap = ta.intersection(tb).count() as f64;
            let union = ta.union(tb).count() as f64;
            if overlap / union > self.tag_overlap {
                return true;
            }
        }

        false
    }

    /// First stored entity the candidate resolves to, if any
    ///
    /// Candidates are tried in this order: exact-name hits, fuzzy-name hits,
    /// then (only when the candidate has an embedding) every stored entity of
    /// the same type. The first positive wins even if a later one would score
    /// better.
    pub fn find_match<'a>(&self, store: &'a EntityStore, candidate: &Entity) -> Option<&'a Entity> {
        let mut tried = HashSet::new();

        let by_name = store
            .by_name_exact(&candidate.name)
            .into_iter()
            .chain(store.by_name_fuzzy(&candidate.name));

        for existing in by_name {
            if tried.insert(existing.id) && self.matches(existing, candidate) {
                return Some(existing);
            }
        }

        if candidate.visual.embedding.is_some() {
            for existing in store.by_type(candidate.entity_type) {
                if tried.insert(existing.id) && self.matches(existing, candidate) {
                    return Some(existing);
                }
            }
        }

        None
    }
}

/// Cosine similarity, 0 for mismatched lengths or a zero-norm vector
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
