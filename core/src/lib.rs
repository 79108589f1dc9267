//! Chains Core - Foundational Types and Abstractions
//!
//! This module provides the foundational types, traits, and abstractions
//! shared by the provenance storage backends.

pub mod config;
pub mod error;
pub mod event;
pub mod log;
pub mod payload;
pub mod storage;

// Re-export commonly used types
pub use config::{ChainsConfig, OciStorageConfig};
pub use error::{ChainsError, Result};
pub use event::{EventEmitter, StorageEvent};
pub use payload::{ImageIdentity, SimpleSigning};
pub use storage::{StorageBackend, StorageOpts, TaskRunRef};

/// Chains core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
