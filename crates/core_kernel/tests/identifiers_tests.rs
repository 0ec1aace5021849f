//! Tests for strongly-typed identifiers

use core_kernel::{ClaimId, CompanyId, UserId};
use uuid::Uuid;

mod claim_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(ClaimId::new(), ClaimId::new());
    }

    #[test]
    fn test_prefix() {
        assert_eq!(ClaimId::prefix(), "EXP");
    }

    #[test]
    fn test_roundtrip() {
        let original = ClaimId::new_v7();
        let parsed: ClaimId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_parse_without_prefix() {
        let uuid = Uuid::new_v4();
        let parsed: ClaimId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.as_uuid(), &uuid);
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!("EXP-not-a-uuid".parse::<ClaimId>().is_err());
    }
}

mod directory_id_tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(CompanyId::prefix(), "CMP");
        assert_eq!(UserId::prefix(), "USR");
    }

    #[test]
    fn test_json_is_transparent_uuid() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
