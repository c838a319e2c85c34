//! Basket CLI - Terminal front end for the shopping cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! basket show
//!
//! # Add a product (line ID derived from product + specs unless --id is given)
//! basket add -p p1 -t "Pineapple Tee" --price 28.00 -s size=M -s shipping=express
//!
//! # Change or drop a line
//! basket set-qty 'p1|size=M|shipping=express' 3
//! basket remove 'p1|size=M|shipping=express'
//!
//! # Order request lines for checkout
//! basket checkout
//! ```
//!
//! Every invocation first checks that the stored cart belongs to the current
//! session (see `BASKET_SESSION_URL`) before showing or changing it.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use basket_storefront::config::StorefrontConfig;
use basket_storefront::error::Result;
use basket_storefront::services::SessionClient;
use basket_storefront::startup::{Hydration, hydrate};
use basket_storefront::storage::{FileStorage, SharedStorage};
use basket_storefront::store::CartStore;
use basket_storefront::sync::OwnershipSync;
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "basket")]
#[command(author, version, about = "Basket shopping cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart lines and total
    Show,
    /// Add a product, or bump its line if already present
    Add {
        /// Catalog product ID
        #[arg(short, long)]
        product: String,

        /// Product title snapshot
        #[arg(short, long)]
        title: String,

        /// Unit price, e.g. 19.99
        #[arg(long)]
        price: String,

        /// Image URL snapshot
        #[arg(short, long)]
        image: Option<String>,

        /// Selected option as name=value (repeatable, order kept)
        #[arg(short, long = "spec")]
        specs: Vec<String>,

        /// Cart line ID (defaults to one derived from product and specs)
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove a line
    Remove {
        /// Cart line ID
        id: String,
    },
    /// Set a line's quantity (values below 1 are ignored)
    SetQty {
        /// Cart line ID
        id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove every line
    Clear,
    /// Open or close the cart panel
    Toggle,
    /// Print the cart total
    Total,
    /// Print the order request lines as JSON
    Checkout,
    /// Print the result of the ownership check
    Owner,
}

impl Commands {
    /// Whether the command may run on an optimistically restored cart.
    ///
    /// Everything except `show` changes or exports the cart and must see the
    /// reconciled state.
    const fn runs_optimistically(&self) -> bool {
        matches!(self, Self::Show)
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "basket=warn,basket_storefront=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        e.report();
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<()> {
    let storage: SharedStorage = Arc::new(FileStorage::new(&config.storage_dir));
    let store = CartStore::create(storage.clone());

    let session = SessionClient::new(&config.session)?;
    let sync = OwnershipSync::new(session, storage, store.clone())
        .with_timeout(config.session.timeout);
    let hydration = settle(
        hydrate(&store, sync, config.hydration_wait).await,
        &cli.command,
    )
    .await;

    match cli.command {
        Commands::Show => commands::cart::show(&store),
        Commands::Add {
            product,
            title,
            price,
            image,
            specs,
            id,
        } => commands::cart::add(
            &store,
            commands::cart::AddLine {
                product,
                title,
                price,
                image,
                specs,
                id,
            },
        )?,
        Commands::Remove { id } => commands::cart::remove(&store, &id),
        Commands::SetQty { id, quantity } => commands::cart::set_quantity(&store, &id, quantity),
        Commands::Clear => commands::cart::clear(&store),
        Commands::Toggle => commands::cart::toggle(&store),
        Commands::Total => commands::cart::total(&store),
        Commands::Checkout => commands::cart::checkout(&store)?,
        Commands::Owner => {
            let outcome = hydration.outcome().await;
            commands::owner::print(&outcome);
            return Ok(());
        }
    }

    // Let a slow ownership check behind `show` finish (and reconcile) before exiting
    let outcome = hydration.outcome().await;
    if outcome.invalidated() {
        tracing::warn!("Cart belonged to a different owner and was cleared");
    }
    Ok(())
}

/// Wait for a pending ownership check unless `command` can run without it.
async fn settle(hydration: Hydration, command: &Commands) -> Hydration {
    if command.runs_optimistically() || hydration.is_synchronized() {
        return hydration;
    }
    Hydration::Synchronized(hydration.outcome().await)
}
