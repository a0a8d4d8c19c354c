//! # Infrastructure Adapters
//!
//! Storage implementations of the core interfaces.

pub mod memory_registry;

pub use memory_registry::InMemoryInstallationRegistry;
