// Identifier helpers shared across crates.
use uuid::Uuid;

/// Deterministic UUIDv5 from an arbitrary string id.
///
/// The same input always maps to the same UUID, so points written twice
/// under the same key overwrite each other instead of duplicating.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

/// Fresh random id for newly registered records.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Stable point id for the `index`-th chunk of a namespace.
pub fn chunk_point_id(namespace: &str, index: usize) -> Uuid {
    stable_uuid(&format!("{namespace}#{index}"))
}

/// Stable point id for the completion marker of a namespace.
pub fn marker_point_id(namespace: &str) -> Uuid {
    stable_uuid(&format!("{namespace}#marker"))
}
