use std::sync::Arc;

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Listing, ListingId, NewListing};
use super::filters::FilterState;
use super::pagination::{PageWindow, PaginatedResult};
use super::service::{ListingService, ListingServiceError, FEATURED_LIMIT};
use super::store::{StoreError, StoreMode};
use crate::auth::{AuthError, AuthenticatedUser, SignUpRequest};

/// Router builder exposing listing, account, and favorite endpoints.
pub fn listing_router(service: Arc<ListingService>) -> Router {
    Router::new()
        .route("/api/v1/listings", get(search_handler).post(create_handler))
        .route("/api/v1/listings/featured", get(featured_handler))
        .route("/api/v1/listings/options", get(options_handler))
        .route("/api/v1/listings/:listing_id", get(detail_handler))
        .route("/api/v1/listings/:listing_id/insights", post(insights_handler))
        .route("/api/v1/auth/sign-up", post(sign_up_handler))
        .route("/api/v1/auth/sign-in", post(sign_in_handler))
        .route("/api/v1/auth/sign-out", post(sign_out_handler))
        .route("/api/v1/auth/session", get(session_handler))
        .route("/api/v1/favorites", get(favorites_handler))
        .route("/api/v1/favorites/:listing_id/toggle", post(toggle_handler))
        .route("/api/v1/dashboard", get(dashboard_handler))
        .with_state(service)
}

#[derive(Debug, Serialize)]
pub struct ListingSearchResponse {
    pub filters: FilterState,
    /// Canonical shareable query string for the filters.
    pub query_string: String,
    pub mode: StoreMode,
    #[serde(flatten)]
    pub results: PaginatedResult<Listing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeaturedParams {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInRequest {
    email: String,
    password: String,
}

pub(crate) async fn search_handler(
    State(service): State<Arc<ListingService>>,
    RawQuery(query): RawQuery,
) -> Response {
    let filters = FilterState::from_query_string(query.as_deref().unwrap_or_default());
    let query_string = filters.to_query_string();
    let mode = service.mode();

    match service.search(&filters).await {
        Ok(results) => {
            let body = ListingSearchResponse {
                filters,
                query_string,
                mode,
                results,
                error: None,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => {
            let window = PageWindow::for_page(filters.page);
            let body = ListingSearchResponse {
                filters,
                query_string,
                mode,
                results: PaginatedResult::empty(window),
                error: Some(error.to_string()),
            };
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
    }
}

pub(crate) async fn featured_handler(
    State(service): State<Arc<ListingService>>,
    Query(params): Query<FeaturedParams>,
) -> Response {
    let limit = params.limit.unwrap_or(FEATURED_LIMIT);
    match service.featured(limit).await {
        Ok(listings) => (StatusCode::OK, Json(json!({ "items": listings }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn options_handler(State(service): State<Arc<ListingService>>) -> Response {
    (StatusCode::OK, Json(service.catalog_options().clone())).into_response()
}

pub(crate) async fn detail_handler(
    State(service): State<Arc<ListingService>>,
    Path(listing_id): Path<String>,
) -> Response {
    match service.property_by_id(&ListingId(listing_id)).await {
        Some(listing) => (StatusCode::OK, Json(listing)).into_response(),
        None => error_response(ListingServiceError::NotFound),
    }
}

pub(crate) async fn insights_handler(
    State(service): State<Arc<ListingService>>,
    Path(listing_id): Path<String>,
) -> Response {
    let id = ListingId(listing_id);
    match service.insights(&id).await {
        Ok(outcome) => {
            let payload = json!({
                "listing_id": id,
                "text": outcome.text,
                "source": outcome.source,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler(
    State(service): State<Arc<ListingService>>,
    headers: HeaderMap,
    Json(listing): Json<NewListing>,
) -> Response {
    let user = match authenticated(&service, &headers).await {
        Ok(user) => user,
        Err(error) => return error_response(error),
    };
    match service.add_listing(&user, listing).await {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn sign_up_handler(
    State(service): State<Arc<ListingService>>,
    Json(request): Json<SignUpRequest>,
) -> Response {
    match service.auth().sign_up(request).await {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn sign_in_handler(
    State(service): State<Arc<ListingService>>,
    Json(request): Json<SignInRequest>,
) -> Response {
    match service.auth().sign_in(&request.email, &request.password).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn sign_out_handler(
    State(service): State<Arc<ListingService>>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return error_response(ListingServiceError::Unauthenticated);
    };
    match service.auth().sign_out(token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn session_handler(
    State(service): State<Arc<ListingService>>,
    headers: HeaderMap,
) -> Response {
    match authenticated(&service, &headers).await {
        Ok(user) => {
            let favorites = service.favorites(&user).await;
            let payload = json!({
                "user": user.profile,
                "favorites": favorites,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn favorites_handler(
    State(service): State<Arc<ListingService>>,
    headers: HeaderMap,
) -> Response {
    match authenticated(&service, &headers).await {
        Ok(user) => {
            let favorites = service.favorites(&user).await;
            (StatusCode::OK, Json(json!({ "favorites": favorites }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn toggle_handler(
    State(service): State<Arc<ListingService>>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Response {
    let user = match authenticated(&service, &headers).await {
        Ok(user) => user,
        Err(error) => return error_response(error),
    };
    match service.toggle_favorite(&user, &ListingId(listing_id)).await {
        Ok(set) => (StatusCode::OK, Json(set)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn dashboard_handler(
    State(service): State<Arc<ListingService>>,
    headers: HeaderMap,
) -> Response {
    let user = match authenticated(&service, &headers).await {
        Ok(user) => user,
        Err(error) => return error_response(error),
    };
    match service.dashboard(&user).await {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Token from an `Authorization: Bearer …` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn authenticated(
    service: &ListingService,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, ListingServiceError> {
    let token = bearer_token(headers).ok_or(ListingServiceError::Unauthenticated)?;
    service.authenticate(token).await
}

pub(crate) fn status_for(error: &ListingServiceError) -> StatusCode {
    match error {
        ListingServiceError::Store(StoreError::Unconfigured) => StatusCode::SERVICE_UNAVAILABLE,
        ListingServiceError::Store(_) => StatusCode::BAD_GATEWAY,
        ListingServiceError::Auth(AuthError::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
        ListingServiceError::Auth(AuthError::Rejected(_)) => StatusCode::BAD_REQUEST,
        ListingServiceError::Auth(AuthError::InvalidToken) => StatusCode::UNAUTHORIZED,
        ListingServiceError::Auth(_) => StatusCode::BAD_GATEWAY,
        ListingServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ListingServiceError::Forbidden => StatusCode::FORBIDDEN,
        ListingServiceError::NotFound => StatusCode::NOT_FOUND,
        ListingServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
    }
}

fn error_response(error: ListingServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (status_for(&error), Json(payload)).into_response()
}
