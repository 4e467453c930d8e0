use crate::infra::{build_service, format_price};
use clap::Args;
use smart_property::auth::{spawn_session_listener, AuthenticatedUser};
use smart_property::config::AppConfig;
use smart_property::error::AppError;
use smart_property::listings::{
    FavoriteToggle, FilterState, FilterUpdate, Listing, ListingId, ListingServiceError,
    PaginatedResult, StoreMode,
};
use std::time::Duration;

const SESSION_WAIT: Duration = Duration::from_secs(5);

#[derive(Args, Debug, Default)]
pub(crate) struct SearchArgs {
    /// Text matched against title and location
    #[arg(long)]
    pub(crate) q: Option<String>,
    /// Exact city name
    #[arg(long)]
    pub(crate) city: Option<String>,
    /// House, Apartment, Plot or Villa
    #[arg(long = "type")]
    pub(crate) property_type: Option<String>,
    /// Maximum price (inclusive)
    #[arg(long)]
    pub(crate) max: Option<u64>,
    /// Minimum number of bedrooms
    #[arg(long)]
    pub(crate) beds: Option<u32>,
    /// Result page, starting at 1
    #[arg(long)]
    pub(crate) page: Option<u32>,
}

impl SearchArgs {
    pub(crate) fn filters(&self) -> FilterState {
        let mut update = FilterUpdate::default();
        if let Some(q) = &self.q {
            update = update.search(q.as_str());
        }
        if let Some(city) = &self.city {
            update = update.city(city.as_str());
        }
        if let Some(kind) = &self.property_type {
            update = update.property_type(kind.as_str());
        }
        if let Some(max) = self.max {
            update = update.max_price(max.to_string());
        }
        if let Some(beds) = self.beds {
            update = update.min_bedrooms(beds.to_string());
        }

        let mut filters = FilterState::default();
        filters.update_filters(update);
        if let Some(page) = self.page {
            filters.set_page(page);
        }
        filters
    }
}

#[derive(Args, Debug)]
pub(crate) struct ShowArgs {
    /// Listing identifier
    pub(crate) id: String,
    /// Also request generated market commentary
    #[arg(long)]
    pub(crate) insights: bool,
}

#[derive(Args, Debug)]
pub(crate) struct FavoriteArgs {
    /// Listing identifier to add or remove
    pub(crate) id: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long, env = "SMART_PROPERTY_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
}

pub(crate) async fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config)?;
    let filters = args.filters();

    let page = service.search(&filters).await?;
    let share = filters.to_query_string();
    println!(
        "{}",
        render_page_header(&page, service.mode(), share.as_str())
    );
    for listing in &page.items {
        println!("{}", render_listing_line(listing));
    }
    if page.items.is_empty() {
        println!("  No properties match these filters.");
    }
    Ok(())
}

pub(crate) async fn run_show(args: ShowArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config)?;
    let id = ListingId(args.id);

    let Some(listing) = service.property_by_id(&id).await else {
        return Err(ListingServiceError::NotFound.into());
    };

    println!("{} (#{})", listing.title, listing.id);
    println!("  {} | {}", listing.location, listing.city);
    println!(
        "  ${} | {} | {} bd / {} ba | {} sqft",
        format_price(listing.price),
        listing.property_type,
        listing.bedrooms,
        listing.bathrooms,
        listing.area_sqft
    );
    println!("  Listed {}", listing.created_at.format("%Y-%m-%d"));
    println!(
        "  Agent: {} ({}, {})",
        listing.agent.name, listing.agent.phone, listing.agent.email
    );
    println!("\n{}", listing.description);

    if args.insights {
        let outcome = service.insights(&id).await?;
        println!("\nSmart insights\n{}", outcome.text);
    }
    Ok(())
}

pub(crate) async fn run_favorite(args: FavoriteArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config)?;
    let (mut session, _listener) =
        spawn_session_listener(service.auth().subscribe(), service.store());

    let signed_in = service
        .auth()
        .sign_in(&args.email, &args.password)
        .await
        .map_err(ListingServiceError::from)?;
    let user = AuthenticatedUser::from(&signed_in);

    if let Ok(Some(snapshot)) = tokio::time::timeout(SESSION_WAIT, session.changed()).await {
        println!(
            "Signed in as {} ({} saved)",
            user.profile.name,
            snapshot.favorites.len()
        );
    }

    let set = service
        .toggle_favorite(&user, &ListingId(args.id.clone()))
        .await?;
    let verb = match set.toggled {
        FavoriteToggle::Added => "Saved",
        FavoriteToggle::Removed => "Removed",
    };
    println!("{verb} listing {}; {} favorites now", args.id, set.favorites.len());

    if let Err(err) = service.auth().sign_out(&user.access_token).await {
        tracing::warn!(error = %err, "sign-out failed");
    }
    Ok(())
}

fn render_page_header(page: &PaginatedResult<Listing>, mode: StoreMode, share: &str) -> String {
    let source = match mode {
        StoreMode::Backend => "live data",
        StoreMode::Fallback => "offline catalog",
    };
    let mut header = format!(
        "{} properties found ({source}), page {} of {}",
        page.total,
        page.page,
        page.total_pages.max(1)
    );
    if !share.is_empty() {
        header.push_str(&format!("\n  share: ?{share}"));
    }
    header
}

fn render_listing_line(listing: &Listing) -> String {
    let featured = if listing.is_featured { " *" } else { "" };
    format!(
        "- [{}] {}{featured} | {} | {} | {} bd / {} ba | ${}",
        listing.id,
        listing.title,
        listing.city,
        listing.property_type,
        listing.bedrooms,
        listing.bathrooms,
        format_price(listing.price)
    )
}
