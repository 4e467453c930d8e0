use async_trait::async_trait;
use serde::Serialize;

use super::domain::{Listing, ListingId, NewListing};
use super::pagination::PaginatedResult;
use super::query::ListingQuery;
use crate::auth::AuthenticatedUser;

/// Which implementation is serving listing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    Backend,
    Fallback,
}

/// Outcome of flipping a favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteToggle {
    Added,
    Removed,
}

/// Storage abstraction selected once at startup: the hosted backend when
/// credentials are configured, the static catalog otherwise.
#[async_trait]
pub trait ListingStore: Send + Sync {
    fn mode(&self) -> StoreMode;

    async fn fetch_listings(
        &self,
        query: &ListingQuery,
    ) -> Result<PaginatedResult<Listing>, StoreError>;

    async fn fetch_by_id(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;

    /// Remove the favorite when present, add it otherwise.
    async fn toggle_favorite(
        &self,
        user: &AuthenticatedUser,
        property_id: &ListingId,
    ) -> Result<FavoriteToggle, StoreError>;

    async fn list_favorites(&self, user: &AuthenticatedUser)
        -> Result<Vec<ListingId>, StoreError>;

    async fn insert_listing(
        &self,
        user: &AuthenticatedUser,
        listing: NewListing,
    ) -> Result<Listing, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database connection missing; running in offline mode")]
    Unconfigured,
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("backend rejected the request ({status}): {message}")]
    Backend { status: u16, message: String },
    #[error("unexpected backend payload: {0}")]
    Decode(String),
}
