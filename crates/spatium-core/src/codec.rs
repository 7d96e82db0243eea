//! Export document format

use crate::entity::Entity;
use crate::error::Result;
use crate::relation::Relationship;
use crate::stats::GraphStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A full snapshot of a graph
///
/// Importing it rebuilds the graph with the same ids and field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    #[serde(default)]
    pub entities: Vec<Entity>,

    #[serde(default)]
    pub relationships: Vec<Relationship>,

    /// Informational only; ignored on import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExportMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub stats: GraphStats,
}

impl ExportDocument {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
