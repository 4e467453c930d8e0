use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::domain::{AgentContact, Listing, ListingId, PropertyType};

/// Choices offered by search forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogOptions {
    pub cities: Vec<String>,
    pub property_types: Vec<PropertyType>,
}

impl CatalogOptions {
    pub fn from_listings(listings: &[Listing]) -> Self {
        let mut cities: Vec<String> = Vec::new();
        for listing in listings {
            if !cities.contains(&listing.city) {
                cities.push(listing.city.clone());
            }
        }
        Self {
            cities,
            property_types: PropertyType::ALL.to_vec(),
        }
    }
}

fn listed_on(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn photos(ids: &[u32]) -> Vec<String> {
    ids.iter()
        .map(|id| format!("https://picsum.photos/id/{id}/800/600"))
        .collect()
}

fn agent(name: &str, phone: &str, handle: &str) -> AgentContact {
    AgentContact {
        name: name.to_string(),
        phone: phone.to_string(),
        email: format!("{handle}@smartproperty.com"),
        avatar: format!("https://i.pravatar.cc/150?u={handle}"),
    }
}

/// Static listing set served when no backend is configured.
pub fn seed_listings() -> Vec<Listing> {
    vec![
        Listing {
            id: ListingId::from("1"),
            title: "Modern Luxury Villa".to_string(),
            description: "A stunning modern villa with panoramic ocean views, featuring smart home integration and high-end finishes throughout.".to_string(),
            price: 1_250_000,
            location: "Hilltop Estate, Beverly Hills".to_string(),
            city: "Los Angeles".to_string(),
            property_type: PropertyType::Villa,
            bedrooms: 5,
            bathrooms: 4,
            area_sqft: 4500,
            is_featured: true,
            images: photos(&[10, 11, 12]),
            created_at: listed_on(2023, 11, 1),
            agent: agent("Sarah Connor", "+1 555-0101", "sarah"),
        },
        Listing {
            id: ListingId::from("2"),
            title: "Downtown Penthouse".to_string(),
            description: "Experience city living at its finest in this spacious penthouse. Floor-to-ceiling windows offer breathtaking views of the skyline.".to_string(),
            price: 850_000,
            location: "Central Plaza, Lower Manhattan".to_string(),
            city: "New York".to_string(),
            property_type: PropertyType::Apartment,
            bedrooms: 3,
            bathrooms: 2,
            area_sqft: 2100,
            is_featured: true,
            images: photos(&[20, 21, 22]),
            created_at: listed_on(2023, 11, 5),
            agent: agent("Michael Ross", "+1 555-0102", "mike"),
        },
        Listing {
            id: ListingId::from("3"),
            title: "Cozy Family Suburban House".to_string(),
            description: "Perfect for a growing family, this house offers a large backyard and is located in a top-rated school district.".to_string(),
            price: 450_000,
            location: "Oak Drive, Sunnyvale".to_string(),
            city: "San Jose".to_string(),
            property_type: PropertyType::House,
            bedrooms: 4,
            bathrooms: 3,
            area_sqft: 2800,
            is_featured: false,
            images: photos(&[30, 31]),
            created_at: listed_on(2023, 11, 10),
            agent: agent("Jessica Pearson", "+1 555-0103", "jessica"),
        },
        Listing {
            id: ListingId::from("4"),
            title: "Prime Commercial Plot".to_string(),
            description: "A strategic plot of land ready for commercial development in the heart of the business district.".to_string(),
            price: 2_100_000,
            location: "Tech Corridor, Austin".to_string(),
            city: "Austin".to_string(),
            property_type: PropertyType::Plot,
            bedrooms: 0,
            bathrooms: 0,
            area_sqft: 12000,
            is_featured: false,
            images: photos(&[40]),
            created_at: listed_on(2023, 11, 12),
            agent: agent("Louis Litt", "+1 555-0104", "louis"),
        },
        Listing {
            id: ListingId::from("5"),
            title: "Rustic Lakefront Cabin".to_string(),
            description: "Escape the city to this beautiful lakefront property. Ideal for weekend getaways or permanent residence.".to_string(),
            price: 620_000,
            location: "Blue Lake Trail, Tahoe".to_string(),
            city: "Lake Tahoe".to_string(),
            property_type: PropertyType::House,
            bedrooms: 2,
            bathrooms: 2,
            area_sqft: 1500,
            is_featured: true,
            images: photos(&[50, 51]),
            created_at: listed_on(2023, 11, 15),
            agent: agent("Harvey Specter", "+1 555-0105", "harvey"),
        },
        Listing {
            id: ListingId::from("6"),
            title: "Chic Urban Studio".to_string(),
            description: "Efficient living in a vibrant neighborhood. Close to cafes, transit, and nightlife.".to_string(),
            price: 320_000,
            location: "Arts District, Miami".to_string(),
            city: "Miami".to_string(),
            property_type: PropertyType::Apartment,
            bedrooms: 1,
            bathrooms: 1,
            area_sqft: 750,
            is_featured: false,
            images: photos(&[60, 61]),
            created_at: listed_on(2023, 11, 20),
            agent: agent("Donna Paulsen", "+1 555-0106", "donna"),
        },
    ]
}
