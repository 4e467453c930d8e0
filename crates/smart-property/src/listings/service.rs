use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::catalog::{seed_listings, CatalogOptions};
use super::domain::{Listing, ListingId, ListingValidationError, NewListing};
use super::filters::FilterState;
use super::pagination::{PageWindow, PaginatedResult};
use super::query::{ListingQuery, Predicate};
use super::store::{FavoriteToggle, ListingStore, StoreError, StoreMode};
use crate::auth::{AuthError, AuthProvider, AuthenticatedUser, Role, UserProfile};
use crate::insights::{insights_for, InsightGenerator, InsightOutcome};

pub const FEATURED_LIMIT: u32 = 3;
const DASHBOARD_LIMIT: u32 = 50;

/// Service composing the listing store, auth provider, and insight generator.
pub struct ListingService {
    store: Arc<dyn ListingStore>,
    auth: Arc<dyn AuthProvider>,
    insights: Arc<dyn InsightGenerator>,
    options: CatalogOptions,
}

/// Favorite ids after a toggle, with what the toggle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteSet {
    pub toggled: FavoriteToggle,
    pub favorites: Vec<ListingId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub saved: usize,
    pub active_listings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub profile: UserProfile,
    pub favorites: Vec<Listing>,
    pub own_listings: Vec<Listing>,
    pub stats: DashboardStats,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn ListingStore>,
        auth: Arc<dyn AuthProvider>,
        insights: Arc<dyn InsightGenerator>,
    ) -> Self {
        Self {
            store,
            auth,
            insights,
            options: CatalogOptions::from_listings(&seed_listings()),
        }
    }

    pub fn mode(&self) -> StoreMode {
        self.store.mode()
    }

    pub fn store(&self) -> Arc<dyn ListingStore> {
        self.store.clone()
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    pub fn catalog_options(&self) -> &CatalogOptions {
        &self.options
    }

    /// One page of listings matching `filters`, newest first.
    pub async fn search(
        &self,
        filters: &FilterState,
    ) -> Result<PaginatedResult<Listing>, ListingServiceError> {
        let query = ListingQuery::from_filters(filters);
        self.store.fetch_listings(&query).await.map_err(|err| {
            error!(error = %err, page = filters.page, "listing search failed");
            ListingServiceError::Store(err)
        })
    }

    /// Lookup failures are logged and reported as a missing listing.
    pub async fn property_by_id(&self, id: &ListingId) -> Option<Listing> {
        match self.store.fetch_by_id(id).await {
            Ok(listing) => listing,
            Err(err) => {
                error!(error = %err, listing = %id, "listing lookup failed");
                None
            }
        }
    }

    /// Up to `limit` featured listings, newest first. A zero limit asks for nothing.
    pub async fn featured(&self, limit: u32) -> Result<Vec<Listing>, ListingServiceError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query = ListingQuery::new(PageWindow::new(1, limit)).with(Predicate::Featured);
        let page = self.store.fetch_listings(&query).await?;
        Ok(page.items)
    }

    pub async fn toggle_favorite(
        &self,
        user: &AuthenticatedUser,
        id: &ListingId,
    ) -> Result<FavoriteSet, ListingServiceError> {
        let toggled = self.store.toggle_favorite(user, id).await?;
        info!(user = %user.id(), listing = %id, ?toggled, "favorite toggled");
        let favorites = self.store.list_favorites(user).await?;
        Ok(FavoriteSet { toggled, favorites })
    }

    /// Read failures degrade to an empty set.
    pub async fn favorites(&self, user: &AuthenticatedUser) -> Vec<ListingId> {
        match self.store.list_favorites(user).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, user = %user.id(), "could not load favorites");
                Vec::new()
            }
        }
    }

    pub async fn add_listing(
        &self,
        user: &AuthenticatedUser,
        listing: NewListing,
    ) -> Result<Listing, ListingServiceError> {
        if !user.profile.role.can_publish_listings() {
            return Err(ListingServiceError::Forbidden);
        }
        listing.validate()?;
        let created = self.store.insert_listing(user, listing).await?;
        info!(user = %user.id(), listing = %created.id, "listing published");
        Ok(created)
    }

    /// Fetch the listing first, then ask for commentary on it.
    pub async fn insights(&self, id: &ListingId) -> Result<InsightOutcome, ListingServiceError> {
        let listing = self
            .property_by_id(id)
            .await
            .ok_or(ListingServiceError::NotFound)?;
        Ok(insights_for(self.insights.as_ref(), &listing).await)
    }

    pub async fn dashboard(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Dashboard, ListingServiceError> {
        let favorite_ids = self.favorites(user).await;
        let favorites = if favorite_ids.is_empty() {
            Vec::new()
        } else {
            let window = PageWindow::new(1, u32::try_from(favorite_ids.len()).unwrap_or(u32::MAX));
            let query = ListingQuery::new(window).with(Predicate::IdIn(favorite_ids));
            self.store.fetch_listings(&query).await?.items
        };

        let own_listings = if user.profile.role == Role::Agent {
            let query = ListingQuery::new(PageWindow::new(1, DASHBOARD_LIMIT))
                .with(Predicate::AgentName(user.profile.name.clone()));
            self.store.fetch_listings(&query).await?.items
        } else {
            Vec::new()
        };

        Ok(Dashboard {
            profile: user.profile.clone(),
            stats: DashboardStats {
                saved: favorites.len(),
                active_listings: own_listings.len(),
            },
            favorites,
            own_listings,
        })
    }

    /// Resolve a bearer token into the caller's identity.
    pub async fn authenticate(
        &self,
        access_token: &str,
    ) -> Result<AuthenticatedUser, ListingServiceError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(ListingServiceError::Unauthenticated);
        }
        let profile = self.auth.user_for_token(access_token).await?;
        Ok(AuthenticatedUser {
            profile,
            access_token: access_token.to_string(),
        })
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Validation(#[from] ListingValidationError),
    #[error("only agents can publish listings")]
    Forbidden,
    #[error("listing not found")]
    NotFound,
    #[error("sign in required")]
    Unauthenticated,
}
