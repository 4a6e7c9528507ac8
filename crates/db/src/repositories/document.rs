//! Mapping between domain records and stored documents.
//!
//! A record's id is its document key and is not repeated in the body.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::error::RepositoryError;

/// Serializes `record` and drops `id_field` from the body.
pub(crate) fn to_document<T: Serialize>(record: &T, id_field: &str) -> Result<Value, RepositoryError> {
    let mut value = serde_json::to_value(record)?;
    if let Some(fields) = value.as_object_mut() {
        fields.remove(id_field);
    }
    Ok(value)
}

/// Decodes a document, restoring `id_field` from its key.
pub(crate) fn from_document<T: DeserializeOwned>(
    collection: &str,
    id: &str,
    mut body: Value,
    id_field: &str,
) -> Result<T, RepositoryError> {
    if let Some(fields) = body.as_object_mut() {
        fields.insert(id_field.to_string(), Value::String(id.to_string()));
    }
    serde_json::from_value(body).map_err(|source| RepositoryError::Corrupt {
        path: format!("{collection}/{id}"),
        source,
    })
}

/// Decodes a whole collection, skipping documents that do not decode.
pub(crate) fn decode_all<T: DeserializeOwned>(
    collection: &str,
    docs: Vec<(String, Value)>,
    id_field: &str,
) -> Vec<T> {
    docs.into_iter()
        .filter_map(|(id, body)| match from_document(collection, &id, body, id_field) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection, id = %id, error = %e, "Skipping unreadable document");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use sitebook_shared::types::WorkerId;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        id: WorkerId,
        name: String,
    }

    #[test]
    fn test_id_lives_in_the_key() {
        let row = Row {
            id: WorkerId::new(),
            name: "Suresh".to_string(),
        };
        let doc = to_document(&row, "id").unwrap();
        assert_eq!(doc, json!({ "name": "Suresh" }));

        let back: Row = from_document("workers", &row.id.to_string(), doc, "id").unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_decode_all_skips_bad_keys() {
        let id = WorkerId::new().to_string();
        let docs = vec![
            (id.clone(), json!({ "name": "A" })),
            ("legacy-key".to_string(), json!({ "name": "B" })),
            (WorkerId::new().to_string(), json!({ "nom": "C" })),
        ];
        let rows: Vec<Row> = decode_all("workers", docs, "id");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.to_string(), id);
    }
}
