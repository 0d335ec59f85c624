pub mod entry;
pub mod weak;

pub use entry::Strength;
pub use weak::WeakCache;
