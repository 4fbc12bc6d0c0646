//! Mellow Core
//!
//! Platform-agnostic domain types, error handling, and key-value storage
//! for the Mellow playback engine.
//!
//! This crate defines:
//! - **Domain Types**: `Song`, `Platform`, `LyricLine`, `SongDetails`
//! - **Identity**: the `(name, singer, platform)` triple that decides
//!   whether two song records refer to the same track
//! - **Storage**: the `KeyValueStore` trait plus in-memory and
//!   JSON-file-backed implementations
//! - **Error Handling**: unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use mellow_core::{Platform, Song};
//!
//! let a = Song::new("Respect", "Aretha Franklin", Platform::Wy);
//! let b = Song::new("Respect", "Aretha Franklin", Platform::Wy);
//! assert!(a.same_song(&b));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use types::{LyricLine, Platform, Song, SongDetails};
