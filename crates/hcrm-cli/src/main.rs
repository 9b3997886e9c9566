//! `hcrm` command-line driver.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hcrm_models::{HotelSortField, SortOrder};

mod commands;

#[derive(Parser)]
#[command(name = "hcrm")]
#[command(about = "Hotel CRM API client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with CRM_EMAIL / CRM_PASSWORD and persist the session
    Login,
    /// Forget the persisted session
    Logout,
    /// Show whether a valid session is stored
    Status {
        /// Re-login if the session is close to expiry
        #[arg(long)]
        refresh: bool,
    },
    /// List hotels, one page at a time or all in batches
    Hotels(HotelsArgs),
    /// Free-text hotel search
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Number of hotels the server reports
    Count,
    /// List contacts
    Contacts(HotelScope),
    /// List bookings
    Bookings(HotelScope),
    /// List guests
    Guests(HotelScope),
    /// List support tickets
    Tickets(HotelScope),
}

#[derive(Args)]
struct HotelsArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 50)]
    limit: u32,
    /// name, location, reviews or rating
    #[arg(long)]
    sort: Option<HotelSortField>,
    /// asc or desc
    #[arg(long, default_value = "asc")]
    order: SortOrder,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    segment: Option<String>,
    #[arg(long)]
    sales_process: Option<String>,
    #[arg(long)]
    search: Option<String>,
    /// Fetch every page in staggered batches instead of a single page
    #[arg(long)]
    all: bool,
    #[arg(long, default_value_t = hcrm_client::repos::DEFAULT_BATCH_SIZE)]
    batch_size: u32,
    #[arg(long, default_value_t = hcrm_client::repos::DEFAULT_MAX_BATCHES)]
    max_batches: u32,
}

#[derive(Args)]
struct HotelScope {
    /// Only records belonging to this hotel id
    #[arg(long)]
    hotel: Option<String>,
}

fn init_tracing() {
    // JSON for log shipping, human-readable otherwise. Logs go to stderr so
    // stdout stays valid JSON.
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let client = hcrm_client::CrmClient::from_env()?;
    info!(base_url = %client.config().api_base_url, "hcrm starting");

    match cli.command {
        Commands::Login => commands::login(&client).await?,
        Commands::Logout => commands::logout(&client)?,
        Commands::Status { refresh } => commands::status(&client, refresh).await?,
        Commands::Hotels(args) => commands::hotels(&client, args).await?,
        Commands::Search { query, page, limit } => {
            commands::search(&client, &query, page, limit).await?
        }
        Commands::Count => commands::count(&client).await?,
        Commands::Contacts(scope) => {
            commands::collection(client.contacts(), scope.hotel.as_deref()).await?
        }
        Commands::Bookings(scope) => {
            commands::collection(client.bookings(), scope.hotel.as_deref()).await?
        }
        Commands::Guests(scope) => {
            commands::collection(client.guests(), scope.hotel.as_deref()).await?
        }
        Commands::Tickets(scope) => {
            commands::collection(client.tickets(), scope.hotel.as_deref()).await?
        }
    }

    Ok(())
}
