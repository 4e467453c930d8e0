use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Kind of property being advertised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    House,
    Apartment,
    Plot,
    Villa,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::House,
        PropertyType::Apartment,
        PropertyType::Plot,
        PropertyType::Villa,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PropertyType::House => "House",
            PropertyType::Apartment => "Apartment",
            PropertyType::Plot => "Plot",
            PropertyType::Villa => "Villa",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Listing agent contact card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentContact {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub avatar: String,
}

/// Read-only projection of a property record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub price: u64,
    pub location: String,
    pub city: String,
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area_sqft: u32,
    pub is_featured: bool,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub agent: AgentContact,
}

/// Payload for publishing a new listing from the agent dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: u64,
    pub location: String,
    pub city: String,
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area_sqft: u32,
    #[serde(default)]
    pub is_featured: bool,
    pub images: Vec<String>,
    pub agent: AgentContact,
}

impl NewListing {
    pub fn validate(&self) -> Result<(), ListingValidationError> {
        for (field, value) in [
            ("title", &self.title),
            ("location", &self.location),
            ("city", &self.city),
        ] {
            if value.trim().is_empty() {
                return Err(ListingValidationError::MissingField(field));
            }
        }
        if self.area_sqft == 0 {
            return Err(ListingValidationError::NonPositiveArea);
        }
        if self.images.iter().all(|image| image.trim().is_empty()) {
            return Err(ListingValidationError::MissingImages);
        }
        Ok(())
    }
}

/// Reasons a new listing is rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    #[error("area must be greater than zero")]
    NonPositiveArea,
    #[error("at least one image is required")]
    MissingImages,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_listing() -> NewListing {
        NewListing {
            title: "Garden Flat".to_string(),
            description: "Ground floor with patio".to_string(),
            price: 410_000,
            location: "Elm Row, Leith".to_string(),
            city: "Edinburgh".to_string(),
            property_type: PropertyType::Apartment,
            bedrooms: 2,
            bathrooms: 1,
            area_sqft: 820,
            is_featured: false,
            images: vec!["https://img.example/flat.jpg".to_string()],
            agent: AgentContact {
                name: "Donna Paulsen".to_string(),
                phone: "+1 555-0106".to_string(),
                email: "donna@smartproperty.com".to_string(),
                avatar: "https://i.pravatar.cc/150?u=donna".to_string(),
            },
        }
    }

    #[test]
    fn property_type_parse_is_case_insensitive() {
        assert_eq!(PropertyType::parse("villa"), Some(PropertyType::Villa));
        assert_eq!(PropertyType::parse(" APARTMENT "), Some(PropertyType::Apartment));
        assert_eq!(PropertyType::parse("castle"), None);
    }

    #[test]
    fn validate_accepts_complete_listing() {
        assert_eq!(new_listing().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_blank_fields_and_empty_media() {
        let mut listing = new_listing();
        listing.city = "  ".to_string();
        assert_eq!(
            listing.validate(),
            Err(ListingValidationError::MissingField("city"))
        );

        let mut listing = new_listing();
        listing.area_sqft = 0;
        assert_eq!(listing.validate(), Err(ListingValidationError::NonPositiveArea));

        let mut listing = new_listing();
        listing.images.clear();
        assert_eq!(listing.validate(), Err(ListingValidationError::MissingImages));
    }
}
