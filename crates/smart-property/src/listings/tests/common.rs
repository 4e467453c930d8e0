use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::auth::{
    AuthError, AuthEvent, AuthProvider, AuthenticatedUser, Role, Session, SignUpOutcome,
    SignUpRequest, UserId, UserProfile,
};
use crate::insights::{InsightError, InsightGenerator, UnconfiguredInsights};
use crate::listings::{
    listing_router, seed_listings, AgentContact, FallbackStore, FavoriteToggle, Listing,
    ListingId, ListingQuery, ListingService, ListingStore, NewListing, PaginatedResult,
    PropertyType, StoreError, StoreMode,
};

pub(super) const AGENT_TOKEN: &str = "agent-token";
pub(super) const BUYER_TOKEN: &str = "buyer-token";

pub(super) fn agent_profile() -> UserProfile {
    UserProfile {
        id: UserId("agent-1".to_string()),
        name: "Harvey Specter".to_string(),
        email: "harvey@smartproperty.com".to_string(),
        role: Role::Agent,
    }
}

pub(super) fn buyer_profile() -> UserProfile {
    UserProfile {
        id: UserId("buyer-1".to_string()),
        name: "Rachel Zane".to_string(),
        email: "rachel@example.com".to_string(),
        role: Role::User,
    }
}

pub(super) fn agent() -> AuthenticatedUser {
    AuthenticatedUser {
        profile: agent_profile(),
        access_token: AGENT_TOKEN.to_string(),
    }
}

pub(super) fn buyer() -> AuthenticatedUser {
    AuthenticatedUser {
        profile: buyer_profile(),
        access_token: BUYER_TOKEN.to_string(),
    }
}

pub(super) fn new_listing() -> NewListing {
    NewListing {
        title: "Harbor View Loft".to_string(),
        description: "Open-plan loft over the marina".to_string(),
        price: 780_000,
        location: "Harbor Point, Baltimore".to_string(),
        city: "Baltimore".to_string(),
        property_type: PropertyType::Apartment,
        bedrooms: 2,
        bathrooms: 2,
        area_sqft: 1_400,
        is_featured: false,
        images: vec!["https://picsum.photos/id/70/800/600".to_string()],
        agent: AgentContact {
            name: "Harvey Specter".to_string(),
            phone: "+1 555-0105".to_string(),
            email: "harvey@smartproperty.com".to_string(),
            avatar: "https://i.pravatar.cc/150?u=harvey".to_string(),
        },
    }
}

/// Auth provider that knows two fixed tokens.
pub(super) struct StubAuth {
    events: broadcast::Sender<AuthEvent>,
}

impl Default for StubAuth {
    fn default() -> Self {
        let (events, _) = broadcast::channel(8);
        Self { events }
    }
}

#[async_trait]
impl AuthProvider for StubAuth {
    fn is_configured(&self) -> bool {
        true
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, AuthError> {
        Ok(SignUpOutcome::ConfirmationRequired {
            email: request.email,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if email == "harvey@smartproperty.com" && password == "pearson-hardman" {
            let session = Session {
                access_token: AGENT_TOKEN.to_string(),
                refresh_token: None,
                expires_in: Some(3600),
                user: agent_profile(),
            };
            let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
            return Ok(session);
        }
        Err(AuthError::Rejected("Invalid login credentials".to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        match access_token {
            AGENT_TOKEN | BUYER_TOKEN => {
                let _ = self.events.send(AuthEvent::SignedOut);
                Ok(())
            }
            _ => Err(AuthError::InvalidToken),
        }
    }

    async fn user_for_token(&self, access_token: &str) -> Result<UserProfile, AuthError> {
        match access_token {
            AGENT_TOKEN => Ok(agent_profile()),
            BUYER_TOKEN => Ok(buyer_profile()),
            _ => Err(AuthError::InvalidToken),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// Writable store over the seed catalog, standing in for the backend.
#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) listings: Mutex<Vec<Listing>>,
    pub(super) favorites: Mutex<HashMap<UserId, Vec<ListingId>>>,
}

impl MemoryStore {
    pub(super) fn seeded() -> Self {
        Self {
            listings: Mutex::new(seed_listings()),
            favorites: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    fn mode(&self) -> StoreMode {
        StoreMode::Backend
    }

    async fn fetch_listings(
        &self,
        query: &ListingQuery,
    ) -> Result<PaginatedResult<Listing>, StoreError> {
        let listings = self.listings.lock().expect("listing mutex poisoned");
        Ok(query.apply(&listings))
    }

    async fn fetch_by_id(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        let listings = self.listings.lock().expect("listing mutex poisoned");
        Ok(listings.iter().find(|listing| listing.id == *id).cloned())
    }

    async fn toggle_favorite(
        &self,
        user: &AuthenticatedUser,
        property_id: &ListingId,
    ) -> Result<FavoriteToggle, StoreError> {
        let mut favorites = self.favorites.lock().expect("favorite mutex poisoned");
        let entry = favorites.entry(user.id().clone()).or_default();
        if let Some(position) = entry.iter().position(|id| id == property_id) {
            entry.remove(position);
            Ok(FavoriteToggle::Removed)
        } else {
            entry.push(property_id.clone());
            Ok(FavoriteToggle::Added)
        }
    }

    async fn list_favorites(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<ListingId>, StoreError> {
        let favorites = self.favorites.lock().expect("favorite mutex poisoned");
        Ok(favorites.get(user.id()).cloned().unwrap_or_default())
    }

    async fn insert_listing(
        &self,
        _user: &AuthenticatedUser,
        listing: NewListing,
    ) -> Result<Listing, StoreError> {
        let mut listings = self.listings.lock().expect("listing mutex poisoned");
        let created = Listing {
            id: ListingId(format!("{}", listings.len() + 1)),
            title: listing.title,
            description: listing.description,
            price: listing.price,
            location: listing.location,
            city: listing.city,
            property_type: listing.property_type,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            area_sqft: listing.area_sqft,
            is_featured: listing.is_featured,
            images: listing.images,
            created_at: Utc
                .with_ymd_and_hms(2023, 12, 1, 0, 0, 0)
                .single()
                .expect("valid date"),
            agent: listing.agent,
        };
        listings.push(created.clone());
        Ok(created)
    }
}

/// Backend that is configured but unreachable.
pub(super) struct UnreachableStore;

#[async_trait]
impl ListingStore for UnreachableStore {
    fn mode(&self) -> StoreMode {
        StoreMode::Backend
    }

    async fn fetch_listings(
        &self,
        _query: &ListingQuery,
    ) -> Result<PaginatedResult<Listing>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    async fn fetch_by_id(&self, _id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    async fn toggle_favorite(
        &self,
        _user: &AuthenticatedUser,
        _property_id: &ListingId,
    ) -> Result<FavoriteToggle, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    async fn list_favorites(
        &self,
        _user: &AuthenticatedUser,
    ) -> Result<Vec<ListingId>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    async fn insert_listing(
        &self,
        _user: &AuthenticatedUser,
        _listing: NewListing,
    ) -> Result<Listing, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }
}

pub(super) struct CannedInsights(pub(super) &'static str);

#[async_trait]
impl InsightGenerator for CannedInsights {
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate(&self, _prompt: &str) -> Result<Option<String>, InsightError> {
        Ok(Some(self.0.to_string()))
    }
}

pub(super) fn service_with(store: Arc<dyn ListingStore>) -> ListingService {
    ListingService::new(
        store,
        Arc::new(StubAuth::default()),
        Arc::new(UnconfiguredInsights),
    )
}

pub(super) fn backend_service() -> (ListingService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::seeded());
    (service_with(store.clone()), store)
}

pub(super) fn fallback_service() -> ListingService {
    service_with(Arc::new(FallbackStore::with_catalog(std::time::Duration::ZERO)))
}

pub(super) fn router_with_service(service: ListingService) -> axum::Router {
    listing_router(Arc::new(service))
}

pub(super) fn ids(listings: &[Listing]) -> Vec<&str> {
    listings.iter().map(|listing| listing.id.as_str()).collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
