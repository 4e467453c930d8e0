//! Translation of filter state into store-neutral predicates.
//!
//! A [`ListingQuery`] is rendered to PostgREST parameters for the hosted
//! backend and evaluated directly by the in-memory catalog, so both paths
//! share one definition of what matches.

use std::cmp::Ordering;

use super::domain::{Listing, ListingId, PropertyType};
use super::filters::FilterState;
use super::pagination::{PageWindow, PaginatedResult};

/// One ANDed condition of a listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Title or location contains the text, ignoring case.
    TextContains(String),
    CityEquals(String),
    TypeEquals(PropertyType),
    MinBedrooms(u32),
    /// Inclusive upper price bound.
    MaxPrice(u64),
    Featured,
    AgentName(String),
    IdIn(Vec<ListingId>),
}

impl Predicate {
    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            Predicate::TextContains(needle) => {
                let needle = search_term(needle).to_lowercase();
                listing.title.to_lowercase().contains(&needle)
                    || listing.location.to_lowercase().contains(&needle)
            }
            Predicate::CityEquals(city) => listing.city == *city,
            Predicate::TypeEquals(kind) => listing.property_type == *kind,
            Predicate::MinBedrooms(minimum) => listing.bedrooms >= *minimum,
            Predicate::MaxPrice(ceiling) => listing.price <= *ceiling,
            Predicate::Featured => listing.is_featured,
            Predicate::AgentName(name) => listing.agent.name == *name,
            Predicate::IdIn(ids) => ids.contains(&listing.id),
        }
    }

    fn to_postgrest(&self) -> (String, String) {
        match self {
            Predicate::TextContains(needle) => {
                let pattern = ilike_contains(&search_term(needle));
                (
                    "or".to_string(),
                    format!("(title.ilike.{pattern},location.ilike.{pattern})"),
                )
            }
            Predicate::CityEquals(city) => ("city".to_string(), format!("eq.{city}")),
            Predicate::TypeEquals(kind) => ("type".to_string(), format!("eq.{}", kind.label())),
            Predicate::MinBedrooms(minimum) => ("bedrooms".to_string(), format!("gte.{minimum}")),
            Predicate::MaxPrice(ceiling) => ("price".to_string(), format!("lte.{ceiling}")),
            Predicate::Featured => ("is_featured".to_string(), "is.true".to_string()),
            Predicate::AgentName(name) => ("agent->>name".to_string(), format!("eq.{name}")),
            Predicate::IdIn(ids) => {
                let quoted: Vec<String> = ids.iter().map(|id| quote(id.as_str())).collect();
                ("id".to_string(), format!("in.({})", quoted.join(",")))
            }
        }
    }
}

/// Result ordering. Listings are always shown newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
}

impl SortOrder {
    pub fn compare(self, left: &Listing, right: &Listing) -> Ordering {
        match self {
            SortOrder::NewestFirst => right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| compare_ids(&right.id, &left.id)),
        }
    }

    fn to_postgrest(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "created_at.desc,id.desc",
        }
    }
}

/// Integer ids compare numerically, like an integer key column; any other
/// ids compare as text.
fn compare_ids(left: &ListingId, right: &ListingId) -> Ordering {
    match (left.as_str().parse::<u64>(), right.as_str().parse::<u64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        _ => left.cmp(right),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub predicates: Vec<Predicate>,
    pub order: SortOrder,
    pub window: PageWindow,
}

impl ListingQuery {
    pub fn new(window: PageWindow) -> Self {
        Self {
            predicates: Vec::new(),
            order: SortOrder::NewestFirst,
            window,
        }
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Build the results-page query for a filter state.
    pub fn from_filters(filters: &FilterState) -> Self {
        let mut query = Self::new(PageWindow::for_page(filters.page));
        if let Some(search) = filters.search.as_ref().filter(|text| !text.is_empty()) {
            query = query.with(Predicate::TextContains(search.clone()));
        }
        if let Some(city) = &filters.city {
            query = query.with(Predicate::CityEquals(city.clone()));
        }
        if let Some(kind) = filters.property_type {
            query = query.with(Predicate::TypeEquals(kind));
        }
        if let Some(minimum) = filters.min_bedrooms.minimum() {
            query = query.with(Predicate::MinBedrooms(minimum));
        }
        query.with(Predicate::MaxPrice(filters.max_price))
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.predicates
            .iter()
            .all(|predicate| predicate.matches(listing))
    }

    /// Filter, order and paginate an in-memory listing set.
    pub fn apply(&self, listings: &[Listing]) -> PaginatedResult<Listing> {
        let mut matching: Vec<&Listing> = listings
            .iter()
            .filter(|listing| self.matches(listing))
            .collect();
        matching.sort_by(|left, right| self.order.compare(left, right));

        let total = matching.len() as u64;
        let offset = usize::try_from(self.window.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.window.limit()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        PaginatedResult::new(items, total, self.window)
    }

    /// Query parameters for a PostgREST `GET` on the listings table.
    pub fn to_postgrest_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(self.predicates.iter().map(Predicate::to_postgrest));
        params.push(("order".to_string(), self.order.to_postgrest().to_string()));
        params.push(("offset".to_string(), self.window.offset().to_string()));
        params.push(("limit".to_string(), self.window.limit().to_string()));
        params
    }
}

/// Search text with `*` removed. PostgREST reads `*` in an `ilike` operand
/// as a wildcard and offers no escape for it, so it is dropped on both paths.
fn search_term(needle: &str) -> String {
    needle.chars().filter(|ch| *ch != '*').collect()
}

/// Quoted `ilike` operand matching `needle` literally anywhere in the column.
/// LIKE wildcards in user input are escaped so the backend agrees with the
/// plain substring test used in memory. `needle` must not contain `*`.
fn ilike_contains(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('*');
    for ch in needle.chars() {
        match ch {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped.push('*');
    quote(&escaped)
}

/// Double-quote a PostgREST operand so commas and parentheses stay literal.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
