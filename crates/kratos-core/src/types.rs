//! Core domain types for the Kratos query-synthesis pipeline.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, PipelineError};

// ── Records ───────────────────────────────────────────────────────

/// One row returned by query execution: column name → value, in column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Intent categories used when none are configured.
pub const DEFAULT_INTENT_CATEGORIES: &[&str] = &["lineage", "impact", "dependency", "rca", "generic"];

// ── Schema ────────────────────────────────────────────────────────

/// Schema metadata as reported by the graph store, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawSchema {
    pub labels: Vec<String>,
    pub relationship_types: Vec<String>,
    /// (label, property name) pairs.
    pub node_properties: Vec<(String, String)>,
}

/// Inventory of labels, relationship types, and per-label properties.
///
/// Immutable once built. Every key of `properties_by_label` is also in `labels`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaSnapshot {
    labels: BTreeSet<String>,
    relationship_types: BTreeSet<String>,
    properties_by_label: BTreeMap<String, BTreeSet<String>>,
}

impl SchemaSnapshot {
    /// Build a snapshot, folding any label that only appears in property
    /// metadata into the label set.
    pub fn new(
        labels: impl IntoIterator<Item = String>,
        relationship_types: impl IntoIterator<Item = String>,
        properties_by_label: BTreeMap<String, BTreeSet<String>>,
    ) -> Self {
        let mut labels: BTreeSet<String> = labels.into_iter().filter(|l| !l.is_empty()).collect();
        labels.extend(properties_by_label.keys().cloned());

        Self {
            labels,
            relationship_types: relationship_types
                .into_iter()
                .filter(|r| !r.is_empty())
                .collect(),
            properties_by_label,
        }
    }

    /// Normalize raw introspection output.
    ///
    /// Fails with `SchemaUnavailable` when the store reported no labels at all.
    pub fn from_raw(raw: RawSchema) -> Result<Self, PipelineError> {
        let mut properties_by_label: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for label in &raw.labels {
            properties_by_label.entry(label.clone()).or_default();
        }
        for (label, property) in raw.node_properties {
            if label.is_empty() {
                continue;
            }
            let props = properties_by_label.entry(label).or_default();
            if !property.is_empty() {
                props.insert(property);
            }
        }

        let snapshot = Self::new(raw.labels, raw.relationship_types, properties_by_label);
        if snapshot.labels.is_empty() {
            return Err(PipelineError::SchemaUnavailable(
                "introspection returned no node labels".to_string(),
            ));
        }
        Ok(snapshot)
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    pub fn relationship_types(&self) -> &BTreeSet<String> {
        &self.relationship_types
    }

    pub fn properties_by_label(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.properties_by_label
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn has_relationship_type(&self, rel_type: &str) -> bool {
        self.relationship_types.contains(rel_type)
    }

    /// True if any label declares this property.
    pub fn has_property(&self, property: &str) -> bool {
        self.properties_by_label
            .values()
            .any(|props| props.contains(property))
    }
}

// ── Validation ────────────────────────────────────────────────────

/// Verdict of the query validator for one candidate query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Accepted,
    Rejected { reason: ErrorKind, detail: String },
}

impl ValidationOutcome {
    pub fn rejected(reason: ErrorKind, detail: impl Into<String>) -> Self {
        Self::Rejected {
            reason,
            detail: detail.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Convert into a result, turning a rejection into `PipelineError::Rejected`.
    pub fn into_result(self) -> Result<(), PipelineError> {
        match self {
            Self::Accepted => Ok(()),
            Self::Rejected { reason, detail } => Err(PipelineError::Rejected {
                kind: reason,
                detail,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_movies() -> RawSchema {
        RawSchema {
            labels: vec!["Person".to_string(), "Movie".to_string()],
            relationship_types: vec!["ACTED_IN".to_string()],
            node_properties: vec![
                ("Person".to_string(), "name".to_string()),
                ("Person".to_string(), "born".to_string()),
                ("Movie".to_string(), "title".to_string()),
                ("Studio".to_string(), "founded".to_string()),
            ],
        }
    }

    #[test]
    fn property_only_labels_are_folded_into_labels() {
        let schema = SchemaSnapshot::from_raw(raw_movies()).unwrap();
        assert!(schema.has_label("Studio"));
        for label in schema.properties_by_label().keys() {
            assert!(schema.labels().contains(label));
        }
    }

    #[test]
    fn property_lookup_spans_all_labels() {
        let schema = SchemaSnapshot::from_raw(raw_movies()).unwrap();
        assert!(schema.has_property("title"));
        assert!(schema.has_property("name"));
        assert!(!schema.has_property("salary"));
        assert!(schema.has_relationship_type("ACTED_IN"));
        assert!(!schema.has_relationship_type("DIRECTED"));
    }

    #[test]
    fn empty_introspection_is_unavailable() {
        let err = SchemaSnapshot::from_raw(RawSchema::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaUnavailable);
    }

    #[test]
    fn rejection_converts_into_pipeline_error() {
        let outcome = ValidationOutcome::rejected(ErrorKind::UnknownLabel, "Robot");
        assert!(!outcome.is_accepted());
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownLabel);
        assert_eq!(err.detail(), "Robot");
    }
}
