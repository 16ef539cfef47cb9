//! Identifier generation.

use uuid::Uuid;

/// Generate a new entity ID.
///
/// IDs are random v4 UUIDs without hyphens, so they are safe to embed in
/// URLs and sharing links.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_shape() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_id());
    }
}
