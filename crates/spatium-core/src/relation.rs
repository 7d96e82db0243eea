//! Relationship (edge) types and operations

use crate::confidence::Confidence;
use crate::entity::{default_observation_count, EntityId};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use ulid::Ulid;

/// Unique identifier for a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationId(pub Ulid);

impl RelationId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Family a relation type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationCategory {
    Spatial,
    Functional,
    Taxonomic,
    Organizational,
    Temporal,
    Generic,
}

/// Closed set of relationship types. Edges read "source <type> target".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    // Spatial
    /// A is on top of B
    On,
    /// A is inside B
    In,
    Near,
    NextTo,
    Above,
    Below,
    LeftOf,
    RightOf,
    InFrontOf,
    Behind,
    AttachedTo,

    // Functional
    /// A is a component of B
    PartOf,
    UsedWith,
    Operates,
    Produces,
    Consumes,

    // Taxonomic
    IsA,
    InstanceOf,

    // Organizational
    OwnedBy,
    AssignedTo,
    /// A is typically kept in B
    StoredIn,

    // Temporal
    Before,
    After,
    Replaces,

    RelatedTo,
}

impl RelationType {
    pub const ALL: [RelationType; 25] = [
        Self::On,
        Self::In,
        Self::Near,
        Self::NextTo,
        Self::Above,
        Self::Below,
        Self::LeftOf,
        Self::RightOf,
        Self::InFrontOf,
        Self::Behind,
        Self::AttachedTo,
        Self::PartOf,
        Self::UsedWith,
        Self::Operates,
        Self::Produces,
        Self::Consumes,
        Self::IsA,
        Self::InstanceOf,
        Self::OwnedBy,
        Self::AssignedTo,
        Self::StoredIn,
        Self::Before,
        Self::After,
        Self::Replaces,
        Self::RelatedTo,
    ];

    /// Relation types a path search follows unless told otherwise
    pub const DEFAULT_PATH_TYPES: [RelationType; 5] =
        [Self::On, Self::In, Self::Near, Self::NextTo, Self::AttachedTo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::In => "in",
            Self::Near => "near",
            Self::NextTo => "next_to",
            Self::Above => "above",
            Self::Below => "below",
            Self::LeftOf => "left_of",
            Self::RightOf => "right_of",
            Self::InFrontOf => "in_front_of",
            Self::Behind => "behind",
            Self::AttachedTo => "attached_to",
            Self::PartOf => "part_of",
            Self::UsedWith => "used_with",
            Self::Operates => "operates",
            Self::Produces => "produces",
            Self::Consumes => "consumes",
            Self::IsA => "is_a",
            Self::InstanceOf => "instance_of",
            Self::OwnedBy => "owned_by",
            Self::AssignedTo => "assigned_to",
            Self::StoredIn => "stored_in",
            Self::Before => "before",
            Self::After => "after",
            Self::Replaces => "replaces",
            Self::RelatedTo => "related_to",
        }
    }

    pub fn category(&self) -> RelationCategory {
        match self {
            Self::On
            | Self::In
            | Self::Near
            | Self::NextTo
            | Self::Above
            | Self::Below
            | Self::LeftOf
            | Self::RightOf
            | Self::InFrontOf
            | Self::Behind
            | Self::AttachedTo => RelationCategory::Spatial,
            Self::PartOf | Self::UsedWith | Self::Operates | Self::Produces | Self::Consumes => {
                RelationCategory::Functional
            }
            Self::IsA | Self::InstanceOf => RelationCategory::Taxonomic,
            Self::OwnedBy | Self::AssignedTo | Self::StoredIn => RelationCategory::Organizational,
            Self::Before | Self::After | Self::Replaces => RelationCategory::Temporal,
            Self::RelatedTo => RelationCategory::Generic,
        }
    }

    /// True for the eleven physical-placement types
    pub fn is_spatial(&self) -> bool {
        self.category() == RelationCategory::Spatial
    }

    /// The type describing the same fact from the target's point of view, if any
    ///
    /// IN and PART_OF have no inverse in the closed set.
    pub fn inverse(&self) -> Option<RelationType> {
        match self {
            Self::On => Some(Self::Below),
            Self::Below => Some(Self::On),
            Self::Above => Some(Self::Below),
            Self::LeftOf => Some(Self::RightOf),
            Self::RightOf => Some(Self::LeftOf),
            Self::InFrontOf => Some(Self::Behind),
            Self::Behind => Some(Self::InFrontOf),
            Self::Before => Some(Self::After),
            Self::After => Some(Self::Before),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| Error::validation(format!("unknown relation type '{}'", s)))
    }
}

/// Properties specific to spatial relationships
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialProperties {
    /// "touching", "close", "medium", "far"
    #[serde(default)]
    pub distance_estimate: Option<String>,

    #[serde(default)]
    pub distance_meters: Option<f64>,

    /// Angle in degrees
    #[serde(default)]
    pub relative_orientation: Option<f64>,

    /// "same_level", "higher", "lower"
    #[serde(default)]
    pub elevation_difference: Option<String>,

    #[serde(default)]
    pub confidence: Confidence,
}

/// A directed relationship (edge) between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier
    pub id: RelationId,

    pub relation_type: RelationType,

    /// The subject entity
    pub source_id: EntityId,

    /// The object entity
    pub target_id: EntityId,

    #[serde(default)]
    pub spatial: Option<SpatialProperties>,

    pub first_observed: DateTime<Utc>,

    pub last_observed: DateTime<Utc>,

    #[serde(default = "default_observation_count")]
    pub observation_count: u32,

    #[serde(default)]
    pub source_devices: BTreeSet<String>,

    #[serde(default)]
    pub confidence: Confidence,

    #[serde(default)]
    pub is_bidirectional: bool,

    /// Arbitrary free-form properties
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl Relationship {
    /// Create a new relationship observed now, with default confidence
    pub fn new(relation_type: RelationType, source_id: EntityId, target_id: EntityId) -> Self {
        let now = Utc::now();
        Self {
            id: RelationId::new(),
            relation_type,
            source_id,
            target_id,
            spatial: None,
            first_observed: now,
            last_observed: now,
            observation_count: 1,
            source_devices: BTreeSet::new(),
            confidence: Confidence::default(),
            is_bidirectional: false,
            properties: HashMap::new(),
        }
    }

    /// Set the confidence, rejecting values outside `[0, 1]`
    pub fn with_confidence(mut self, confidence: f64) -> Result<Self> {
        self.confidence = Confidence::new(confidence)?;
        Ok(self)
    }

    pub fn with_spatial(mut self, spatial: SpatialProperties) -> Self {
        self.spatial = Some(spatial);
        self
    }

    pub fn with_source_device(mut self, device: impl Into<String>) -> Self {
        self.source_devices.insert(device.into());
        self
    }

    pub fn bidirectional(mut self) -> Self {
        self.is_bidirectional = true;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn is_spatial(&self) -> bool {
        self.relation_type.is_spatial()
    }

    pub fn inverse_type(&self) -> Option<RelationType> {
        self.relation_type.inverse()
    }
}
