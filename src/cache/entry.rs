//! Reference-strength handles and the shard slot type.
//!
//! A slot holds its key and value either strongly (`Arc`) or weakly (`Weak`)
//! depending on the cache configuration. A slot is *live* only while both
//! handles can produce a strong reference; once either referent has been
//! dropped everywhere else, the slot is *collected*: every read treats it as
//! absent and the next maintenance pass removes it.

use std::sync::{Arc, Weak};

/// How the cache holds a key or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strength {
    /// The cache keeps the referent alive.
    #[default]
    Strong,
    /// The cache does not keep the referent alive.
    Weak,
}

/// Handle to a referent held with a configurable [`Strength`].
#[derive(Debug)]
pub enum RefHandle<T> {
    Strong(Arc<T>),
    Weak(Weak<T>),
}

/// Key handle stored in a slot.
pub type KeyRef<K> = RefHandle<K>;
/// Value handle stored in a slot.
pub type ValueRef<V> = RefHandle<V>;

impl<T> RefHandle<T> {
    /// Wraps `referent` with the requested strength.
    #[inline]
    pub fn new(referent: Arc<T>, strength: Strength) -> Self {
        match strength {
            Strength::Strong => RefHandle::Strong(referent),
            Strength::Weak => RefHandle::Weak(Arc::downgrade(&referent)),
        }
    }

    /// Returns a strong reference if the referent is still alive.
    #[inline]
    pub fn upgrade(&self) -> Option<Arc<T>> {
        match self {
            RefHandle::Strong(arc) => Some(Arc::clone(arc)),
            RefHandle::Weak(weak) => weak.upgrade(),
        }
    }

    /// Returns `true` if the referent is still alive.
    ///
    /// Cheaper than [`upgrade`](Self::upgrade): no reference count is touched
    /// for strong handles.
    #[inline]
    pub fn is_alive(&self) -> bool {
        match self {
            RefHandle::Strong(_) => true,
            RefHandle::Weak(weak) => weak.strong_count() > 0,
        }
    }

    /// Returns the strength this handle was created with.
    #[inline]
    pub fn strength(&self) -> Strength {
        match self {
            RefHandle::Strong(_) => Strength::Strong,
            RefHandle::Weak(_) => Strength::Weak,
        }
    }
}

impl<T: Eq> RefHandle<T> {
    /// Returns `true` if the referent is alive and equal to `other`.
    #[inline]
    pub fn matches(&self, other: &T) -> bool {
        match self {
            RefHandle::Strong(arc) => **arc == *other,
            RefHandle::Weak(weak) => weak.upgrade().is_some_and(|arc| *arc == *other),
        }
    }
}

/// One mapping inside a shard.
#[derive(Debug)]
pub struct Slot<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: KeyRef<K>,
    pub(crate) value: ValueRef<V>,
    /// Insertion sequence number; matches exactly one record in the shard's
    /// FIFO order queue.
    pub(crate) seq: u64,
}

impl<K, V> Slot<K, V> {
    #[inline]
    pub(crate) fn is_live(&self) -> bool {
        self.key.is_alive() && self.value.is_alive()
    }
}
