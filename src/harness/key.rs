//! Benchmark key with identity-by-id semantics.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// A key object that can be weakly referenced.
///
/// Equality and hashing use only `id`; `data` exists to give each key a
/// realistic heap footprint.
///
/// # Example
///
/// ```
/// use weakkit::harness::key::Key;
///
/// let a = Key::new(42);
/// let b = Key::with_data(42, "other payload");
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "Key(42)");
/// ```
#[derive(Clone)]
pub struct Key {
    id: i32,
    data: String,
}

impl Key {
    /// Creates a key whose payload embeds the id and a nanosecond timestamp.
    pub fn new(id: i32) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        Self {
            id,
            data: format!("Key_{id}_{nanos}"),
        }
    }

    /// Creates a key with an explicit payload.
    pub fn with_data(id: i32, data: impl Into<String>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> i32 {
        self.id
    }

    #[inline]
    pub fn data(&self) -> &str {
        &self.data
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.id)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("id", &self.id)
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHasher;

    use super::*;

    fn hash_of(key: &Key) -> u64 {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn same_id_different_payload_is_equal() {
        let a = Key::with_data(7, "alpha");
        let b = Key::with_data(7, "beta");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn different_ids_differ() {
        assert_ne!(Key::new(1), Key::new(2));
    }

    #[test]
    fn payload_embeds_id() {
        let key = Key::new(-13);
        assert!(key.data().starts_with("Key_-13_"));
        assert_eq!(key.id(), -13);
    }

    #[test]
    fn display_shows_id_only() {
        assert_eq!(Key::with_data(5, "ignored").to_string(), "Key(5)");
    }

    mod property_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            /// Equality and hash depend only on the id.
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_identity_by_id(id in any::<i32>(), a in ".*", b in ".*") {
                let left = Key::with_data(id, a);
                let right = Key::with_data(id, b);
                prop_assert_eq!(&left, &right);
                prop_assert_eq!(hash_of(&left), hash_of(&right));
            }
        }
    }
}
