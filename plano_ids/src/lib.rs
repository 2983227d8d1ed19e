//! 32-bit unique identifiers with type-safe wrappers and separate atomic counters per type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

/// Base 32-bit unique identifier type
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Uid32(u32);

impl Uid32 {
    pub fn nil() -> Self {
        Self(0)
    }

    pub fn from_u32(value: u32) -> Self {
        Self(value)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn parse_str(s: &str) -> Result<Self, String> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        u32::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| format!("Invalid Uid32 string: {}", e))
    }

    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Uid32 {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Debug for Uid32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid32({:08x})", self.0)
    }
}

impl fmt::Display for Uid32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl Hash for Uid32 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for Uid32 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Uid32 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Serialize for Uid32 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:08x}", self.0))
    }
}

impl<'de> Deserialize<'de> for Uid32 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Uid32Visitor;

        impl<'de> serde::de::Visitor<'de> for Uid32Visitor {
            type Value = Uid32;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a hex string or u32")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Uid32::parse_str(v).map_err(E::custom)
            }

            fn visit_u32<E: serde::de::Error>(self, v: u32) -> Result<Self::Value, E> {
                Ok(Uid32::from_u32(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Uid32::from_u32(v as u32))
            }
        }

        deserializer.deserialize_any(Uid32Visitor)
    }
}

// Type-safe ID wrappers with separate atomic counters per type
static NODE_COUNTER: AtomicU32 = AtomicU32::new(1);
static TOOL_COUNTER: AtomicU32 = AtomicU32::new(1);
static TXN_COUNTER: AtomicU32 = AtomicU32::new(1);

macro_rules! define_id_type {
    ($type_name:ident, $counter:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $type_name(Uid32);

        impl $type_name {
            pub fn new() -> Self {
                let counter = $counter.fetch_add(1, Ordering::Relaxed);
                let id_value = if counter == 0 { 1 } else { counter };
                Self(Uid32::from_u32(id_value))
            }

            pub fn nil() -> Self {
                Self(Uid32::nil())
            }

            /// Create from a u32 value directly (bypasses atomic counter)
            /// Useful for deserialization and deterministic ID creation
            pub fn from_u32(value: u32) -> Self {
                Self(Uid32::from_u32(value))
            }

            pub fn from_uid32(uid: Uid32) -> Self {
                Self(uid)
            }

            pub fn as_uid32(&self) -> Uid32 {
                self.0
            }

            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $type_name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl From<Uid32> for $type_name {
            fn from(uid: Uid32) -> Self {
                Self(uid)
            }
        }

        impl From<$type_name> for Uid32 {
            fn from(id: $type_name) -> Self {
                id.0
            }
        }

        impl fmt::Debug for $type_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($type_name), "({})"), self.0)
            }
        }

        impl fmt::Display for $type_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $type_name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $type_name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                Uid32::deserialize(deserializer).map(Self)
            }
        }
    };
}

define_id_type!(NodeId, NODE_COUNTER, "Identifier for a scene node");
define_id_type!(ToolId, TOOL_COUNTER, "Identifier for a catalog tool/product");
define_id_type!(TxnId, TXN_COUNTER, "Identifier for one edit transaction");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_is_reserved() {
        assert!(NodeId::nil().is_nil());
        assert!(!NodeId::new().is_nil());
        assert_eq!(NodeId::default(), NodeId::nil());
    }

    #[test]
    fn test_counters_are_independent() {
        let n = NodeId::new();
        let t = ToolId::new();
        // Separate counters: ids from different types may collide numerically,
        // but each type keeps issuing without gaps from the other's use.
        let n2 = NodeId::new();
        assert_ne!(n, n2);
        assert!(!t.is_nil());
    }

    #[test]
    fn test_parse_round_trip() {
        let uid = Uid32::from_u32(0xdeadbeef);
        let parsed = Uid32::parse_str(&uid.to_string()).unwrap();
        assert_eq!(uid, parsed);
        assert_eq!(Uid32::parse_str("0x10").unwrap().as_u32(), 16);
        assert!(Uid32::parse_str("not-hex").is_err());
    }
}
