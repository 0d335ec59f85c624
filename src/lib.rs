//! weakkit: a weak-reference cache and a benchmark harness that drives it
//! under reclamation pressure.
//!
//! The cache holds keys and/or values through `Weak` handles; an entry whose
//! referent has been dropped reads as absent and is reaped by amortized
//! maintenance or by an explicit `clean_up`. The harness feeds it from a
//! scrambled Zipfian key stream while a bounded pool of strong references
//! controls how fast entries become collectable.

pub mod builder;
pub mod cache;
pub mod ds;
pub mod error;
pub mod harness;
pub mod logging;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod traits;
