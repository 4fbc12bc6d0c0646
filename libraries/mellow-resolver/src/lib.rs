//! Mellow Resolver
//!
//! Client for the song-resolution proxy endpoint.
//!
//! The proxy forwards a `platform + term + index + quality` tuple to the
//! upstream provider and returns its raw JSON. The two platforms answer
//! with different shapes (and with field-name drift between search and
//! detail responses); this crate normalizes everything into the
//! canonical [`Song`](mellow_core::Song) / [`ResolvedMedia`] types so
//! the divergent shapes never leak past this boundary.
//!
//! The [`SongResolver`] trait is the seam the playback engine talks
//! through. Tests script it; production uses [`HttpResolver`].

#![forbid(unsafe_code)]

mod client;
mod error;
mod models;
mod request;

pub use client::HttpResolver;
pub use error::{ResolverError, Result};
pub use models::ResolvedMedia;
pub use request::ResolveRequest;

use async_trait::async_trait;
use mellow_core::{Platform, Song};

/// Resolution backend seam
///
/// `search` lists candidate songs for a term on one platform;
/// `resolve` turns one search hit into playable media.
#[async_trait]
pub trait SongResolver: Send + Sync {
    /// Search `platform` for `term`, returning unresolved song references
    async fn search(&self, platform: Platform, term: &str) -> Result<Vec<Song>>;

    /// Resolve a single search hit into playable media
    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolvedMedia>;
}
