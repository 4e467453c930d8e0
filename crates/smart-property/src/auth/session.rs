//! Current-user state shared with the rest of the process.
//!
//! A single listener task owns all writes: it turns provider events into
//! snapshots on a watch channel. Readers clone the latest snapshot and never
//! see a user paired with another user's favorites.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::domain::{AuthEvent, AuthenticatedUser, UserProfile};
use crate::listings::{ListingId, ListingStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    pub favorites: Vec<ListingId>,
}

/// Read side of the session state.
#[derive(Debug, Clone)]
pub struct SessionContext {
    state: watch::Receiver<SessionSnapshot>,
}

impl SessionContext {
    pub fn current(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Wait for the next published snapshot.
    pub async fn changed(&mut self) -> Option<SessionSnapshot> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }
}

/// Spawn the task that keeps a [`SessionContext`] in step with provider
/// events. Favorites are loaded on sign-in and cleared on sign-out.
pub fn spawn_session_listener(
    mut events: broadcast::Receiver<AuthEvent>,
    store: Arc<dyn ListingStore>,
) -> (SessionContext, JoinHandle<()>) {
    let (sender, receiver) = watch::channel(SessionSnapshot::default());

    let handle = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AuthEvent::SignedIn(session)) => {
                    let user = AuthenticatedUser::from(&session);
                    let favorites = match store.list_favorites(&user).await {
                        Ok(ids) => ids,
                        Err(error) => {
                            warn!(%error, user = %user.id(), "could not load favorites");
                            Vec::new()
                        }
                    };
                    debug!(user = %user.id(), favorites = favorites.len(), "session started");
                    sender.send_replace(SessionSnapshot {
                        user: Some(user.profile),
                        favorites,
                    });
                }
                Ok(AuthEvent::SignedOut) => {
                    debug!("session cleared");
                    sender.send_replace(SessionSnapshot::default());
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session listener fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    (SessionContext { state: receiver }, handle)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::auth::domain::{Role, Session, UserId};
    use crate::listings::{
        FallbackStore, FavoriteToggle, Listing, ListingQuery, NewListing, PaginatedResult,
        StoreError, StoreMode,
    };

    struct FixedFavorites(Vec<ListingId>);

    #[async_trait]
    impl ListingStore for FixedFavorites {
        fn mode(&self) -> StoreMode {
            StoreMode::Backend
        }

        async fn fetch_listings(
            &self,
            query: &ListingQuery,
        ) -> Result<PaginatedResult<Listing>, StoreError> {
            Ok(PaginatedResult::empty(query.window))
        }

        async fn fetch_by_id(&self, _id: &ListingId) -> Result<Option<Listing>, StoreError> {
            Ok(None)
        }

        async fn toggle_favorite(
            &self,
            _user: &AuthenticatedUser,
            _property_id: &ListingId,
        ) -> Result<FavoriteToggle, StoreError> {
            Ok(FavoriteToggle::Added)
        }

        async fn list_favorites(
            &self,
            _user: &AuthenticatedUser,
        ) -> Result<Vec<ListingId>, StoreError> {
            Ok(self.0.clone())
        }

        async fn insert_listing(
            &self,
            _user: &AuthenticatedUser,
            _listing: NewListing,
        ) -> Result<Listing, StoreError> {
            Err(StoreError::Unconfigured)
        }
    }

    fn session() -> Session {
        Session {
            access_token: "jwt".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
            user: UserProfile {
                id: UserId("u-7".to_string()),
                name: "Jessica Pearson".to_string(),
                email: "jessica@smartproperty.com".to_string(),
                role: Role::Admin,
            },
        }
    }

    #[tokio::test]
    async fn sign_in_loads_favorites_and_sign_out_clears_them() {
        let (events, receiver) = broadcast::channel(4);
        let store = Arc::new(FixedFavorites(vec![ListingId::from("2"), ListingId::from("5")]));
        let (mut context, _handle) = spawn_session_listener(receiver, store);
        assert_eq!(context.current(), SessionSnapshot::default());

        events.send(AuthEvent::SignedIn(session())).expect("listener alive");
        let snapshot = tokio::time::timeout(Duration::from_secs(1), context.changed())
            .await
            .expect("snapshot published")
            .expect("channel open");
        assert_eq!(snapshot.user.map(|u| u.name), Some("Jessica Pearson".to_string()));
        assert_eq!(snapshot.favorites.len(), 2);

        events.send(AuthEvent::SignedOut).expect("listener alive");
        let snapshot = tokio::time::timeout(Duration::from_secs(1), context.changed())
            .await
            .expect("snapshot published")
            .expect("channel open");
        assert!(snapshot.user.is_none());
        assert!(snapshot.favorites.is_empty());
    }

    #[tokio::test]
    async fn listener_stops_when_provider_goes_away() {
        let (events, receiver) = broadcast::channel(1);
        let store = Arc::new(FallbackStore::with_catalog(Duration::ZERO));
        let (_context, handle) = spawn_session_listener(receiver, store);
        drop(events);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("listener exits")
            .expect("listener does not panic");
    }
}
