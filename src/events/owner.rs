//! Object ownership and address helpers.

use serde::{Deserialize, Serialize};

/// Length in bytes of an account/object address.
pub const ADDRESS_LENGTH: usize = 20;

/// Owner of an object as reported by the node.
///
/// The node encodes well-known ownership kinds as a bare string (for example
/// `"Immutable"`) and address-bearing kinds as an object keyed by the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectOwner {
    Named(String),
    Owned(OwnerKind),
}

/// Address-bearing ownership kinds. Exactly one field is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerKind {
    #[serde(rename = "AddressOwner", default, skip_serializing_if = "Option::is_none")]
    pub address_owner: Option<String>,
    #[serde(rename = "ObjectOwner", default, skip_serializing_if = "Option::is_none")]
    pub object_owner: Option<String>,
    #[serde(rename = "SingleOwner", default, skip_serializing_if = "Option::is_none")]
    pub single_owner: Option<String>,
    #[serde(rename = "Shared", default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<SharedOwner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedOwner {
    pub initial_shared_version: u64,
}

impl ObjectOwner {
    /// The owning address, preferring object, then address, then single owner.
    ///
    /// Named and shared owners have no address.
    pub fn address(&self) -> Option<String> {
        match self {
            ObjectOwner::Named(_) => None,
            ObjectOwner::Owned(kind) => kind
                .object_owner
                .as_deref()
                .or(kind.address_owner.as_deref())
                .or(kind.single_owner.as_deref())
                .map(normalize_address),
        }
    }

    /// Canonical JSON text, as persisted in owner/recipient columns.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Persisted form of an optional owner: its JSON text, or empty.
pub fn owner_text(owner: Option<&ObjectOwner>) -> String {
    owner.map(ObjectOwner::to_json).unwrap_or_default()
}

/// Normalize a hex address to lower-case, `0x`-prefixed, [`ADDRESS_LENGTH`] bytes.
///
/// Longer input is cropped from the left, shorter input is zero-padded on the
/// left. Input that is not hex is returned unchanged.
pub fn normalize_address(raw: &str) -> String {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };

    let bytes = match hex::decode(&padded) {
        Ok(bytes) => bytes,
        Err(_) => return raw.to_string(),
    };

    let mut address = [0u8; ADDRESS_LENGTH];
    let tail = &bytes[bytes.len().saturating_sub(ADDRESS_LENGTH)..];
    address[ADDRESS_LENGTH - tail.len()..].copy_from_slice(tail);

    format!("0x{}", hex::encode(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_named_string() {
        let owner: ObjectOwner = serde_json::from_str(r#""Immutable""#).unwrap();
        assert_eq!(owner, ObjectOwner::Named("Immutable".to_string()));
        assert_eq!(owner.address(), None);
        assert_eq!(owner.to_json(), r#""Immutable""#);
    }

    #[test]
    fn test_owner_address_kind() {
        let owner: ObjectOwner =
            serde_json::from_str(r#"{"AddressOwner":"0xABCDEF"}"#).unwrap();
        assert_eq!(
            owner.address().as_deref(),
            Some("0x0000000000000000000000000000000000abcdef")
        );
        assert_eq!(owner.to_json(), r#"{"AddressOwner":"0xABCDEF"}"#);
    }

    #[test]
    fn test_owner_address_prefers_object_owner() {
        let owner = ObjectOwner::Owned(OwnerKind {
            address_owner: Some("0x01".to_string()),
            object_owner: Some("0x02".to_string()),
            ..Default::default()
        });
        assert!(owner.address().unwrap().ends_with("02"));
    }

    #[test]
    fn test_owner_shared_has_no_address() {
        let owner: ObjectOwner =
            serde_json::from_str(r#"{"Shared":{"initial_shared_version":3}}"#).unwrap();
        assert_eq!(owner.address(), None);
    }

    #[test]
    fn test_owner_text_for_missing_owner() {
        assert_eq!(owner_text(None), "");
    }

    #[test]
    fn test_normalize_address_crops_from_left() {
        let long = format!("0x{}", "ab".repeat(32));
        assert_eq!(normalize_address(&long), format!("0x{}", "ab".repeat(20)));
    }

    #[test]
    fn test_normalize_address_odd_length() {
        assert_eq!(
            normalize_address("0x1"),
            "0x0000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_normalize_address_non_hex_passthrough() {
        assert_eq!(normalize_address("not-an-address"), "not-an-address");
    }
}
