use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use housing_search::config::Config;
use housing_search::models::Listing;
use housing_search::mortgage::MortgageTerms;
use housing_search::search::{RawParams, RawValue, SearchService};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Search property listings from the command line
#[derive(Parser, Debug)]
#[command(name = "housing-search", version, about = "Property listing search client")]
struct Cli {
    /// TOML config file; environment variables (HOUSING_SEARCH_*) override it
    #[arg(short, long, env = "HOUSING_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search active listings
    Search {
        /// City to include; repeat for several
        #[arg(long)]
        city: Vec<String>,
        #[arg(long)]
        min_price: Option<String>,
        #[arg(long)]
        max_price: Option<String>,
        #[arg(long)]
        bedrooms: Option<String>,
        #[arg(long)]
        bathrooms: Option<String>,
        /// for_sale, for_rent, commercial_sale, commercial_rent or land
        #[arg(long)]
        property_type: Option<String>,
        #[arg(long)]
        keywords: Option<String>,
        #[arg(short, long)]
        limit: Option<String>,
        /// Print the raw reply as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single listing
    Listing {
        /// Listing key, or MLS number with --mls-id
        id: String,
        #[arg(long)]
        mls_id: bool,
    },
    /// Check that the configured credentials reach the API
    TestConnection,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let service = SearchService::new(&config).context("Failed to create search service")?;

    match cli.command {
        Commands::Search {
            city,
            min_price,
            max_price,
            bedrooms,
            bathrooms,
            property_type,
            keywords,
            limit,
            json,
        } => {
            let mut params = RawParams::new();
            if !city.is_empty() {
                params.insert("city".into(), RawValue::Many(city));
            }
            let singles = [
                ("min_price", min_price),
                ("max_price", max_price),
                ("bedrooms", bedrooms),
                ("bathrooms", bathrooms),
                ("property_type", property_type),
                ("keywords", keywords),
                ("limit", limit),
            ];
            for (key, value) in singles {
                if let Some(value) = value {
                    params.insert(key.into(), RawValue::Single(value));
                }
            }

            if json {
                let reply = service.reply(&params).await;
                println!("{}", serde_json::to_string_pretty(&reply)?);
                return Ok(());
            }

            let results = service.search(&params).await.map_err(|e| {
                anyhow::anyhow!(e.user_message().unwrap_or_else(|| e.to_string()))
            })?;

            info!("Found {} properties", results.count);
            for (i, listing) in results.listings.iter().enumerate() {
                print_listing(i + 1, listing, &config.mortgage);
            }
        }
        Commands::Listing { id, mls_id } => {
            let found = if mls_id {
                service.get_listing_by_mls_id(&id).await
            } else {
                service.get_listing(&id).await
            }
            .map_err(|e| anyhow::anyhow!(e.user_message().unwrap_or_else(|| e.to_string())))?;

            match found {
                Some(listing) => println!("{}", serde_json::to_string_pretty(&listing)?),
                None => println!("Property not found"),
            }
        }
        Commands::TestConnection => {
            let report = service.test_connection().await;
            for check in &report.checks {
                let mark = if check.success { "ok" } else { "FAILED" };
                println!("{:<18} {:<6} {}", check.name, mark, check.message);
            }
            if !report.success {
                anyhow::bail!("API test failed");
            }
            info!("API connection successful");
        }
    }

    Ok(())
}

fn print_listing(n: usize, listing: &Listing, terms: &MortgageTerms) {
    let address = listing.address().unwrap_or("(no address)");
    let price = listing.price().unwrap_or(0.0);
    println!("{}. {} (${:.0})", n, address, price);
    println!(
        "   {} bd, {} ba, {} sqft",
        listing.bedrooms().map_or("-".to_string(), |b| b.to_string()),
        listing.bathrooms().map_or("-".to_string(), |b| b.to_string()),
        listing.living_area().map_or("-".to_string(), |a| format!("{a:.0}")),
    );
    if let Some(city) = listing.city() {
        println!("   City: {}", city);
    }
    if let Some(key) = listing.listing_key() {
        println!("   Key: {}", key);
    }
    println!("   Photos: {}", listing.photos.len());
    let payment = terms.monthly_payment(price);
    if payment > 0 {
        println!("   Est. payment: ${}/mo", payment);
    }
    println!();
}
