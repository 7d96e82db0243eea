//! Entity (node) types: physical things observed in the world

use crate::confidence::Confidence;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use ulid::Ulid;

/// Unique identifier for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Ulid);

impl EntityId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn from_string(s: &str) -> std::result::Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of physical entity classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Tools, parts, products
    Object,
    /// Rooms, zones, areas
    Space,
    /// Doors, corners, fixtures
    Landmark,
    Person,
    /// Raw materials, supplies
    Material,
    /// Machines, vehicles
    Equipment,
    /// Boxes, shelves, bins
    Container,
    /// Tables, floors, walls
    Surface,
    Unknown,
}

impl EntityType {
    pub const ALL: [EntityType; 9] = [
        Self::Object,
        Self::Space,
        Self::Landmark,
        Self::Person,
        Self::Material,
        Self::Equipment,
        Self::Container,
        Self::Surface,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Space => "space",
            Self::Landmark => "landmark",
            Self::Person => "person",
            Self::Material => "material",
            Self::Equipment => "equipment",
            Self::Container => "container",
            Self::Surface => "surface",
            Self::Unknown => "unknown",
        }
    }

    /// Everything except `Unknown`
    pub fn is_known(&self) -> bool {
        *self != Self::Unknown
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| Error::validation(format!("unknown entity type '{}'", s)))
    }
}

/// Semantic properties of an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticAttributes {
    /// High-level category
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// What it's used for
    pub function: Option<String>,
    pub material_composition: Vec<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub tags: BTreeSet<String>,
    pub description: Option<String>,
    /// Alternative names, in the order they were observed
    pub aliases: Vec<String>,
}

/// Visual appearance features used for matching
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualFeatures {
    pub embedding: Option<Vec<f32>>,
    pub color_histogram: Option<Vec<f32>>,
    pub dominant_colors: Vec<String>,
    /// "small", "medium", "large"
    pub size_estimate: Option<String>,
    pub shape_descriptor: Option<String>,
    pub texture_features: Option<Vec<f32>>,
}

/// An entity in the semantic graph (a node)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier, immutable for the life of the store
    pub id: EntityId,

    pub entity_type: EntityType,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub semantic: SemanticAttributes,

    #[serde(default)]
    pub visual: VisualFeatures,

    pub first_observed: DateTime<Utc>,

    pub last_observed: DateTime<Utc>,

    #[serde(default = "default_observation_count")]
    pub observation_count: u32,

    /// Devices that contributed an observation
    #[serde(default)]
    pub source_devices: BTreeSet<String>,

    #[serde(default)]
    pub confidence: Confidence,

    /// Arbitrary free-form properties
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

pub(crate) fn default_observation_count() -> u32 {
    1
}

impl Entity {
    /// Create a new entity observed now, with default confidence
    pub fn new(entity_type: EntityType, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(),
            entity_type,
            name: name.into(),
            semantic: SemanticAttributes::default(),
            visual: VisualFeatures::default(),
            first_observed: now,
            last_observed: now,
            observation_count: 1,
            source_devices: BTreeSet::new(),
            confidence: Confidence::default(),
            properties: HashMap::new(),
        }
    }

    /// Set the confidence, rejecting values outside `[0, 1]`
    pub fn with_confidence(mut self, confidence: f64) -> Result<Self> {
        self.confidence = Confidence::new(confidence)?;
        Ok(self)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.semantic.category = Some(category.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.semantic.function = Some(function.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.semantic.tags.insert(tag.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.semantic.aliases.push(alias.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.semantic.description = Some(description.into());
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.visual.embedding = Some(embedding);
        self
    }

    pub fn with_source_device(mut self, device: impl Into<String>) -> Self {
        self.source_devices.insert(device.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Check if entity carries a specific tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.semantic.tags.contains(tag)
    }

    /// Lower-cased name plus every lower-cased alias
    pub fn all_names_lower(&self) -> BTreeSet<String> {
        std::iter::once(&self.name)
            .chain(self.semantic.aliases.iter())
            .map(|n| n.to_lowercase())
            .collect()
    }
}
