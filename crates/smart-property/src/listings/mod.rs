//! Listing search, detail, favorites, and publishing.
//!
//! Filters from a search form become a [`ListingQuery`], which is served by
//! whichever [`ListingStore`] was selected at startup: the hosted PostgREST
//! backend when credentials are configured, the static catalog otherwise.

pub mod catalog;
pub mod domain;
pub mod fallback;
pub mod filters;
pub mod pagination;
pub mod query;
pub mod router;
pub mod service;
pub mod store;
pub mod supabase;

#[cfg(test)]
mod tests;

pub use catalog::{seed_listings, CatalogOptions};
pub use domain::{AgentContact, Listing, ListingId, ListingValidationError, NewListing, PropertyType};
pub use fallback::FallbackStore;
pub use filters::{BedroomFilter, FilterState, FilterUpdate, DEFAULT_MAX_PRICE};
pub use pagination::{PageWindow, PaginatedResult, PAGE_SIZE};
pub use query::{ListingQuery, Predicate, SortOrder};
pub use router::{listing_router, ListingSearchResponse};
pub use service::{
    Dashboard, DashboardStats, FavoriteSet, ListingService, ListingServiceError, FEATURED_LIMIT,
};
pub use store::{FavoriteToggle, ListingStore, StoreError, StoreMode};
pub use supabase::SupabaseStore;
