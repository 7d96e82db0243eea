//! Observations: one device's batch of candidate entities and relationships

use crate::confidence::Confidence;
use crate::entity::{Entity, EntityId};
use crate::error::Result;
use crate::relation::{RelationId, Relationship};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ulid::Ulid;

/// Unique identifier for an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservationId(pub Ulid);

impl ObservationId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ObservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input modality an observation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Photo,
    Video,
    Description,
    Manual,
}

/// A batch of candidates reported by one device at one time
///
/// Candidate relationships may reference candidate entities of the same
/// batch by id, or entities already in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub id: ObservationId,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    pub device_id: String,

    #[serde(default)]
    pub source_type: SourceType,

    #[serde(default)]
    pub entities: Vec<Entity>,

    #[serde(default)]
    pub relationships: Vec<Relationship>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-text place hint, e.g. "warehouse"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default)]
    pub confidence: Confidence,

    #[serde(default)]
    pub processed: bool,

    #[serde(default)]
    pub processing_errors: Vec<String>,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Observation {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            id: ObservationId::new(),
            timestamp: Utc::now(),
            device_id: device_id.into(),
            source_type: SourceType::default(),
            entities: Vec::new(),
            relationships: Vec::new(),
            image_path: None,
            video_path: None,
            description: None,
            location_hint: None,
            context: None,
            confidence: Confidence::default(),
            processed: false,
            processing_errors: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location_hint(mut self, hint: impl Into<String>) -> Self {
        self.location_hint = Some(hint.into());
        self
    }

    /// Add a candidate entity, stamping this observation's device on it
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        entity.source_devices.insert(self.device_id.clone());
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    /// Add a candidate relationship, stamping this observation's device on it
    pub fn add_relationship(&mut self, mut relationship: Relationship) -> RelationId {
        relationship.source_devices.insert(self.device_id.clone());
        let id = relationship.id;
        self.relationships.push(relationship);
        id
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What ingesting one observation did to the graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub observation_id: ObservationId,
    pub entities_created: Vec<EntityId>,
    pub entities_merged: Vec<EntityId>,
    pub relationships_created: Vec<RelationId>,
    pub relationships_merged: Vec<RelationId>,
}

impl IngestReport {
    pub(crate) fn new(observation_id: ObservationId) -> Self {
        Self {
            observation_id,
            ..Default::default()
        }
    }

    /// Number of candidates that touched the graph
    pub fn total(&self) -> usize {
        self.entities_created.len()
            + self.entities_merged.len()
            + self.relationships_created.len()
            + self.relationships_merged.len()
    }
}

/// Raw input handed to an [`Extractor`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionInput {
    #[serde(default)]
    pub source_type: SourceType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_hint: Option<String>,
}

/// Candidates produced by an [`Extractor`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub errors: Vec<String>,
}

impl Extraction {
    /// An extraction that produced nothing
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Default::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Bundle the candidates into an observation from `device_id`
    ///
    /// A failed extraction yields an observation that carries its errors and
    /// no candidates.
    pub fn into_observation(self, device_id: impl Into<String>, input: &ExtractionInput) -> Observation {
        let mut observation = Observation::new(device_id).with_source_type(input.source_type);
        observation.image_path = input.image_path.clone();
        observation.description = input.description.clone();
        observation.location_hint = input.location_hint.clone();

        if self.is_failed() {
            tracing::warn!(
                "Extraction for {} failed: {}",
                observation.id,
                self.errors.join("; ")
            );
            observation.processing_errors = self.errors;
            return observation;
        }

        for entity in self.entities {
            observation.add_entity(entity);
        }
        for relationship in self.relationships {
            observation.add_relationship(relationship);
        }
        observation
    }
}

/// Turns raw input (a photo, a description) into candidate records
///
/// Implementations must report failure through [`Extraction::errors`] rather
/// than panic.
pub trait Extractor {
    fn extract(&self, input: &ExtractionInput) -> Extraction;
}
