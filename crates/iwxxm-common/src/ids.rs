//! gml:id generation.

use uuid::Uuid;

/// Fresh `gml:id` value. GML ids must not start with a digit, hence the
/// `uuid.` prefix.
pub fn gml_id() -> String {
    format!("uuid.{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::gml_id;

    #[test]
    fn test_gml_id_shape() {
        let id = gml_id();
        assert!(id.starts_with("uuid."));
        assert_eq!(id.len(), 5 + 36);
    }

    #[test]
    fn test_gml_id_unique() {
        assert_ne!(gml_id(), gml_id());
    }
}
