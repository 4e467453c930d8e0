//! Search criteria and their query-string representation.
//!
//! The filter state is the single source of truth for a results page: the
//! query string is derived from it and the store query is translated from it.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::domain::PropertyType;

/// Price ceiling applied when the user has not picked one.
pub const DEFAULT_MAX_PRICE: u64 = 5_000_000;

/// Minimum bedroom requirement; `Any` is the "no preference" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BedroomFilter {
    #[default]
    Any,
    AtLeast(u32),
}

impl BedroomFilter {
    /// Anything that is not a whole number means "any".
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse::<u32>()
            .map(Self::AtLeast)
            .unwrap_or(Self::Any)
    }

    pub fn minimum(self) -> Option<u32> {
        match self {
            Self::Any => None,
            Self::AtLeast(count) => Some(count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub search: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    pub min_bedrooms: BedroomFilter,
    pub max_price: u64,
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: None,
            city: None,
            property_type: None,
            min_bedrooms: BedroomFilter::Any,
            max_price: DEFAULT_MAX_PRICE,
            page: 1,
        }
    }
}

/// Raw field edits coming from a search form. `None` leaves a field alone,
/// an empty string clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterUpdate {
    pub search: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub min_bedrooms: Option<String>,
    pub max_price: Option<String>,
}

impl FilterUpdate {
    pub fn search(mut self, value: impl Into<String>) -> Self {
        self.search = Some(value.into());
        self
    }

    pub fn city(mut self, value: impl Into<String>) -> Self {
        self.city = Some(value.into());
        self
    }

    pub fn property_type(mut self, value: impl Into<String>) -> Self {
        self.property_type = Some(value.into());
        self
    }

    pub fn min_bedrooms(mut self, value: impl Into<String>) -> Self {
        self.min_bedrooms = Some(value.into());
        self
    }

    pub fn max_price(mut self, value: impl Into<String>) -> Self {
        self.max_price = Some(value.into());
        self
    }
}

impl FilterState {
    /// Merge field edits. Any edit sends the user back to the first page.
    pub fn update_filters(&mut self, update: FilterUpdate) {
        if let Some(search) = update.search {
            self.search = non_empty(search);
        }
        if let Some(city) = update.city {
            self.city = non_empty(city);
        }
        if let Some(kind) = update.property_type {
            self.property_type = PropertyType::parse(&kind);
        }
        if let Some(beds) = update.min_bedrooms {
            self.min_bedrooms = BedroomFilter::parse(&beds);
        }
        if let Some(max) = update.max_price {
            self.max_price = parse_max_price(&max);
        }
        self.page = 1;
    }

    /// Jump to a page without touching the criteria. The page is not checked
    /// against the result count; out-of-range pages come back empty.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Rebuild the state from `q`, `city`, `type`, `max`, `beds` and `page`.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "q" => state.search = non_empty(value.to_string()),
                "city" => state.city = non_empty(value.to_string()),
                "type" => state.property_type = PropertyType::parse(value),
                "max" => state.max_price = parse_max_price(value),
                "beds" => state.min_bedrooms = BedroomFilter::parse(value),
                "page" => state.page = parse_page(value),
                _ => {}
            }
        }
        state
    }

    pub fn from_query_string(query: &str) -> Self {
        Self::from_query_pairs(form_urlencoded::parse(query.as_bytes()))
    }

    /// Query parameters for this state, leaving out fields at their default.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("q", search.clone()));
        }
        if let Some(city) = &self.city {
            pairs.push(("city", city.clone()));
        }
        if let Some(kind) = self.property_type {
            pairs.push(("type", kind.label().to_string()));
        }
        if self.max_price != DEFAULT_MAX_PRICE {
            pairs.push(("max", self.max_price.to_string()));
        }
        if let Some(beds) = self.min_bedrooms.minimum() {
            pairs.push(("beds", beds.to_string()));
        }
        if self.page != 1 {
            pairs.push(("page", self.page.to_string()));
        }
        pairs
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_query_pairs())
            .finish()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_max_price(raw: &str) -> u64 {
    raw.trim().parse::<u64>().unwrap_or(DEFAULT_MAX_PRICE)
}

fn parse_page(raw: &str) -> u32 {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}
