use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::catalog::seed_listings;
use super::domain::{Listing, ListingId, NewListing};
use super::pagination::PaginatedResult;
use super::query::ListingQuery;
use super::store::{FavoriteToggle, ListingStore, StoreError, StoreMode};
use crate::auth::AuthenticatedUser;

/// Read-only store over a fixed listing set. Queries are delayed by a fixed
/// latency so clients see the same loading states as against the backend.
#[derive(Debug, Clone)]
pub struct FallbackStore {
    listings: Vec<Listing>,
    latency: Duration,
}

impl FallbackStore {
    pub fn new(listings: Vec<Listing>, latency: Duration) -> Self {
        Self { listings, latency }
    }

    pub fn with_catalog(latency: Duration) -> Self {
        Self::new(seed_listings(), latency)
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    async fn simulate_round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ListingStore for FallbackStore {
    fn mode(&self) -> StoreMode {
        StoreMode::Fallback
    }

    async fn fetch_listings(
        &self,
        query: &ListingQuery,
    ) -> Result<PaginatedResult<Listing>, StoreError> {
        self.simulate_round_trip().await;
        let result = query.apply(&self.listings);
        debug!(total = result.total, page = result.page, "served listings from static catalog");
        Ok(result)
    }

    async fn fetch_by_id(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        self.simulate_round_trip().await;
        Ok(self.listings.iter().find(|listing| listing.id == *id).cloned())
    }

    async fn toggle_favorite(
        &self,
        _user: &AuthenticatedUser,
        _property_id: &ListingId,
    ) -> Result<FavoriteToggle, StoreError> {
        Err(StoreError::Unconfigured)
    }

    async fn list_favorites(
        &self,
        _user: &AuthenticatedUser,
    ) -> Result<Vec<ListingId>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert_listing(
        &self,
        _user: &AuthenticatedUser,
        _listing: NewListing,
    ) -> Result<Listing, StoreError> {
        Err(StoreError::Unconfigured)
    }
}
