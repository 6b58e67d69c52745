use uuid::Uuid;

/// Deterministic UUIDv5 from an arbitrary string id.
///
/// The same input always maps to the same UUID, so re-upserting a record id
/// replaces the previous point instead of adding a new one.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

/// Random (v4) UUID, 122 bits of entropy.
pub fn random_uuid() -> Uuid {
    Uuid::new_v4()
}
