//! Bundled backend implementations

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
#[allow(unused_imports)]
pub use memory::InMemoryBackend;
