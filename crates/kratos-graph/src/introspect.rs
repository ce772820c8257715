//! Schema introspection through Neo4j's built-in procedures.

use neo4rs::query;

use kratos_core::RawSchema;

use crate::client::{GraphClient, GraphError};

impl GraphClient {
    /// Read labels, relationship types, and per-label property names.
    pub async fn introspect_schema(&self) -> Result<RawSchema, GraphError> {
        let labels = self
            .query_rows(query("CALL db.labels() YIELD label RETURN label"))
            .await?
            .iter()
            .filter_map(|row| row.get::<String>("label").ok())
            .collect::<Vec<_>>();

        let relationship_types = self
            .query_rows(query(
                "CALL db.relationshipTypes() YIELD relationshipType
                 RETURN relationshipType",
            ))
            .await?
            .iter()
            .filter_map(|row| row.get::<String>("relationshipType").ok())
            .collect::<Vec<_>>();

        let rows = self
            .query_rows(query(
                "CALL db.schema.nodeTypeProperties() YIELD nodeLabels, propertyName
                 RETURN nodeLabels, propertyName",
            ))
            .await?;

        let mut node_properties = Vec::with_capacity(rows.len());
        for row in rows {
            let node_labels: Vec<String> = row.get("nodeLabels").unwrap_or_default();
            let property: Option<String> = row.get("propertyName").unwrap_or_default();
            node_properties.extend(expand_label_properties(node_labels, property));
        }

        tracing::info!(
            labels = labels.len(),
            relationship_types = relationship_types.len(),
            properties = node_properties.len(),
            "Schema introspected"
        );

        Ok(RawSchema {
            labels,
            relationship_types,
            node_properties,
        })
    }
}

/// One `nodeTypeProperties` row covers every label of a multi-label node type.
/// Label-only rows (no property) still register the label.
fn expand_label_properties(
    node_labels: Vec<String>,
    property: Option<String>,
) -> impl Iterator<Item = (String, String)> {
    let property = property.unwrap_or_default();
    node_labels
        .into_iter()
        .map(move |label| (label, property.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_label_rows_fan_out() {
        let pairs: Vec<_> = expand_label_properties(
            vec!["Person".to_string(), "Employee".to_string()],
            Some("name".to_string()),
        )
        .collect();
        assert_eq!(
            pairs,
            vec![
                ("Person".to_string(), "name".to_string()),
                ("Employee".to_string(), "name".to_string()),
            ]
        );
    }

    #[test]
    fn property_less_rows_keep_label() {
        let pairs: Vec<_> = expand_label_properties(vec!["Tag".to_string()], None).collect();
        assert_eq!(pairs, vec![("Tag".to_string(), String::new())]);
    }
}
