//! Listing search, favorites, authentication, and property insights for the
//! SmartProperty real-estate service.
//!
//! Every data-access path goes through [`listings::ListingStore`], which is
//! backed either by the hosted PostgREST backend or by the static in-memory
//! catalog when no backend credentials are configured.

pub mod auth;
pub mod config;
pub mod error;
pub mod insights;
pub mod listings;
pub mod supabase;
pub mod telemetry;
