//! Identifier types for order documents
//!
//! The order identifier is carried inside the payload itself (`order_uid`
//! field) and is the sole key used for storage, caching, and lookup.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for an order document
///
/// A non-empty, opaque string assigned by the upstream system that
/// produces order payloads. Stable across redeliveries of the same
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderUid(String);

impl OrderUid {
    /// Create a new OrderUid from a string
    ///
    /// # Panics
    /// Panics if the string is empty
    pub fn new(uid: impl Into<String>) -> Self {
        let s = uid.into();
        assert!(!s.is_empty(), "OrderUid must be non-empty");
        Self(s)
    }

    /// Try to create an OrderUid, returning None if the string is empty
    pub fn try_new(uid: impl Into<String>) -> Option<Self> {
        let s = uid.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Get the identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the newtype, returning the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Allows map lookups keyed by OrderUid to accept a plain &str.
// Sound because the derived Hash/Eq delegate to the inner String.
impl Borrow<str> for OrderUid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_uid_creation() {
        let uid = OrderUid::new("b563feb7b2b84b6test");
        assert_eq!(uid.as_str(), "b563feb7b2b84b6test");
    }

    #[test]
    fn test_order_uid_try_new() {
        assert!(OrderUid::try_new("a1").is_some());
        assert!(OrderUid::try_new("").is_none());
    }

    #[test]
    #[should_panic(expected = "OrderUid must be non-empty")]
    fn test_order_uid_empty_panics() {
        OrderUid::new("");
    }

    #[test]
    fn test_order_uid_serialization() {
        let uid = OrderUid::new("a1");
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, "\"a1\"");

        let deserialized: OrderUid = serde_json::from_str(&json).unwrap();
        assert_eq!(uid, deserialized);
    }

    #[test]
    fn test_order_uid_borrow_lookup() {
        use std::collections::HashMap;

        let mut map: HashMap<OrderUid, u32> = HashMap::new();
        map.insert(OrderUid::new("a1"), 7);
        assert_eq!(map.get("a1"), Some(&7));
    }
}
