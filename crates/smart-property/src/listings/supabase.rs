//! PostgREST-backed listing store.
//!
//! Rows live in the `properties` and `favorites` tables. Listing queries are
//! rendered by [`ListingQuery::to_postgrest_params`]; this adapter only adds
//! transport details and maps rows into domain listings.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_RANGE};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::domain::{AgentContact, Listing, ListingId, NewListing, PropertyType};
use super::pagination::{PageWindow, PaginatedResult};
use super::query::{ListingQuery, Predicate};
use super::store::{FavoriteToggle, ListingStore, StoreError, StoreMode};
use crate::auth::AuthenticatedUser;
use crate::supabase::{error_message, SupabaseClient};

const LISTINGS_TABLE: &str = "properties";
const FAVORITES_TABLE: &str = "favorites";

#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn url(&self, table: &str) -> Result<url::Url, StoreError> {
        self.client
            .rest_url(table)
            .map_err(|err| StoreError::Transport(err.to_string()))
    }

    fn favorite_filter(user: &AuthenticatedUser, property_id: &ListingId) -> [(String, String); 2] {
        [
            ("user_id".to_string(), format!("eq.{}", user.id())),
            ("property_id".to_string(), format!("eq.{property_id}")),
        ]
    }
}

#[async_trait]
impl ListingStore for SupabaseStore {
    fn mode(&self) -> StoreMode {
        StoreMode::Backend
    }

    async fn fetch_listings(
        &self,
        query: &ListingQuery,
    ) -> Result<PaginatedResult<Listing>, StoreError> {
        let response = self
            .client
            .request(Method::GET, self.url(LISTINGS_TABLE)?, None)
            .header("Prefer", "count=exact")
            .query(&query.to_postgrest_params())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let total = total_from_headers(response.headers());

        // PostgREST answers 416 for offsets past the last row.
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(PaginatedResult::new(
                Vec::new(),
                total.unwrap_or(0),
                query.window,
            ));
        }
        if !status.is_success() {
            return Err(backend_error(response).await);
        }

        let rows: Vec<ListingRow> = response.json().await.map_err(map_decode_error)?;
        let items = rows
            .into_iter()
            .map(ListingRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        let total = total.unwrap_or(items.len() as u64);
        debug!(total, page = query.window.page, "fetched listings from backend");

        Ok(PaginatedResult::new(items, total, query.window))
    }

    async fn fetch_by_id(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        let query = ListingQuery::new(PageWindow::new(1, 1)).with(Predicate::IdIn(vec![id.clone()]));
        let page = self.fetch_listings(&query).await?;
        Ok(page.items.into_iter().next())
    }

    async fn toggle_favorite(
        &self,
        user: &AuthenticatedUser,
        property_id: &ListingId,
    ) -> Result<FavoriteToggle, StoreError> {
        let url = self.url(FAVORITES_TABLE)?;

        // Delete-returning-representation removes the pair only if present and
        // tells us whether it was.
        let response = self
            .client
            .request(Method::DELETE, url.clone(), Some(&user.access_token))
            .header("Prefer", "return=representation")
            .query(&Self::favorite_filter(user, property_id))
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }
        let removed: Vec<serde_json::Value> = response.json().await.map_err(map_decode_error)?;
        if !removed.is_empty() {
            return Ok(FavoriteToggle::Removed);
        }

        let response = self
            .client
            .request(Method::POST, url, Some(&user.access_token))
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(&FavoriteRow {
                user_id: user.id().0.clone(),
                property_id: property_id.0.clone(),
            })
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }
        Ok(FavoriteToggle::Added)
    }

    async fn list_favorites(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<ListingId>, StoreError> {
        let response = self
            .client
            .request(Method::GET, self.url(FAVORITES_TABLE)?, Some(&user.access_token))
            .query(&[
                ("select", "property_id".to_string()),
                ("user_id", format!("eq.{}", user.id())),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }
        let rows: Vec<FavoriteIdRow> = response.json().await.map_err(map_decode_error)?;
        rows.into_iter()
            .map(|row| id_to_string(row.property_id).map(ListingId))
            .collect()
    }

    async fn insert_listing(
        &self,
        user: &AuthenticatedUser,
        listing: NewListing,
    ) -> Result<Listing, StoreError> {
        let response = self
            .client
            .request(Method::POST, self.url(LISTINGS_TABLE)?, Some(&user.access_token))
            .header("Prefer", "return=representation")
            .json(&NewListingRow::from(listing))
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }
        let rows: Vec<ListingRow> = response.json().await.map_err(map_decode_error)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))?
            .into_domain()
    }
}

fn map_transport_error(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

fn map_decode_error(err: reqwest::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

async fn backend_error(response: reqwest::Response) -> StoreError {
    let (status, message) = error_message(response).await;
    StoreError::Backend {
        status: status.as_u16(),
        message,
    }
}

/// Total row count from a `Content-Range` header such as `0-5/42` or `*/0`.
fn total_from_headers(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range_total)
}

fn parse_content_range_total(raw: &str) -> Option<u64> {
    let (_, total) = raw.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Row shape of the `properties` table.
#[derive(Debug, Deserialize)]
struct ListingRow {
    id: serde_json::Value,
    title: String,
    #[serde(default)]
    description: String,
    price: u64,
    location: String,
    city: String,
    #[serde(rename = "type")]
    property_type: String,
    #[serde(default)]
    bedrooms: u32,
    #[serde(default)]
    bathrooms: u32,
    #[serde(alias = "area_sqft")]
    area: u32,
    #[serde(default, alias = "isFeatured")]
    is_featured: bool,
    #[serde(default)]
    images: Vec<String>,
    #[serde(alias = "createdAt")]
    created_at: String,
    agent: AgentContact,
}

impl ListingRow {
    fn into_domain(self) -> Result<Listing, StoreError> {
        let id = id_to_string(self.id)?;
        let property_type = PropertyType::parse(&self.property_type).ok_or_else(|| {
            StoreError::Decode(format!("unknown property type '{}'", self.property_type))
        })?;
        let created_at = parse_timestamp(&self.created_at).ok_or_else(|| {
            StoreError::Decode(format!("invalid created_at '{}'", self.created_at))
        })?;

        Ok(Listing {
            id: ListingId(id),
            title: self.title,
            description: self.description,
            price: self.price,
            location: self.location,
            city: self.city,
            property_type,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area_sqft: self.area,
            is_featured: self.is_featured,
            images: self.images,
            created_at,
            agent: self.agent,
        })
    }
}

/// Ids may be text or integer columns depending on the schema.
fn id_to_string(value: serde_json::Value) -> Result<String, StoreError> {
    match value {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(StoreError::Decode(format!("unsupported id {other}"))),
    }
}

/// Accepts RFC 3339 timestamps, naive timestamps, and bare dates.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| parsed.and_utc())
}

#[derive(Debug, Serialize)]
struct NewListingRow {
    title: String,
    description: String,
    price: u64,
    location: String,
    city: String,
    #[serde(rename = "type")]
    property_type: &'static str,
    bedrooms: u32,
    bathrooms: u32,
    area: u32,
    is_featured: bool,
    images: Vec<String>,
    agent: serde_json::Value,
}

impl From<NewListing> for NewListingRow {
    fn from(listing: NewListing) -> Self {
        Self {
            title: listing.title,
            description: listing.description,
            price: listing.price,
            location: listing.location,
            city: listing.city,
            property_type: listing.property_type.label(),
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            area: listing.area_sqft,
            is_featured: listing.is_featured,
            images: listing.images,
            agent: json!({
                "name": listing.agent.name,
                "phone": listing.agent.phone,
                "email": listing.agent.email,
                "avatar": listing.agent.avatar,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct FavoriteRow {
    user_id: String,
    property_id: String,
}

#[derive(Debug, Deserialize)]
struct FavoriteIdRow {
    property_id: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn content_range_yields_total() {
        assert_eq!(parse_content_range_total("0-5/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-5/*"), None);
    }

    #[test]
    fn timestamps_accept_common_shapes() {
        let expected = Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).single();
        assert_eq!(parse_timestamp("2023-11-01T00:00:00+00:00"), expected);
        assert_eq!(parse_timestamp("2023-11-01T00:00:00"), expected);
        assert_eq!(parse_timestamp("2023-11-01"), expected);
        assert_eq!(parse_timestamp("first of november"), None);
    }

    #[test]
    fn rows_map_into_listings() {
        let row: ListingRow = serde_json::from_value(json!({
            "id": 6,
            "title": "Chic Urban Studio",
            "description": "Efficient living",
            "price": 320000,
            "location": "Arts District, Miami",
            "city": "Miami",
            "type": "Apartment",
            "bedrooms": 1,
            "bathrooms": 1,
            "area": 750,
            "is_featured": false,
            "images": ["https://picsum.photos/id/60/800/600"],
            "created_at": "2023-11-20T00:00:00+00:00",
            "agent": {
                "name": "Donna Paulsen",
                "phone": "+1 555-0106",
                "email": "donna@smartproperty.com",
                "avatar": "https://i.pravatar.cc/150?u=donna"
            }
        }))
        .expect("row decodes");

        let listing = row.into_domain().expect("row maps");
        assert_eq!(listing.id, ListingId::from("6"));
        assert_eq!(listing.property_type, PropertyType::Apartment);
        assert_eq!(listing.area_sqft, 750);
    }

    #[test]
    fn rows_with_unknown_types_are_rejected() {
        let row: ListingRow = serde_json::from_value(json!({
            "id": "x",
            "title": "Houseboat",
            "price": 1,
            "location": "Dock 4",
            "city": "Seattle",
            "type": "Boat",
            "area": 300,
            "created_at": "2023-11-20",
            "agent": {"name": "A", "phone": "1", "email": "a@b.c", "avatar": ""}
        }))
        .expect("row decodes");
        assert!(matches!(row.into_domain(), Err(StoreError::Decode(_))));
    }
}
