//! Poojabdi CLI - storefront and admin client for the Poojabdi shop.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog
//! poojabdi products
//!
//! # Session cart (server-held, behind a session cookie)
//! poojabdi cart add 1 --qty 2
//! poojabdi cart set 1 5
//! poojabdi cart remove 1
//! poojabdi cart show
//!
//! # Local cart (persisted in a local storage file)
//! poojabdi local add 5
//! poojabdi local checkout
//!
//! # Admin
//! poojabdi admin create --name-en Tea --price "₹60 / 250g" --price-num 60
//! poojabdi admin delete 4 --yes
//! poojabdi admin settings --set shop_name=Poojabdi --set phone=12345
//! poojabdi admin edit 4 --name "Masala Tea"
//! ```
//!
//! # Commands
//!
//! - `products` - Show the product grid
//! - `cart` - Session cart operations
//! - `local` - Local cart operations
//! - `admin` - Product and settings management

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use poojabdi_storefront::StorefrontConfig;

mod commands;

#[derive(Parser)]
#[command(name = "poojabdi")]
#[command(author, version, about = "Poojabdi shop client")]
struct Cli {
    /// Shop origin (overrides `POOJABDI_BASE_URL`)
    #[arg(long, global = true)]
    base_url: Option<Url>,

    /// Local cart storage file (overrides `POOJABDI_CART_FILE`)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the product catalog
    Products,
    /// Manage the session cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Manage the local cart
    Local {
        #[command(subcommand)]
        action: commands::local::LocalAction,
    },
    /// Manage products and site settings
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
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

fn init_tracing() {
    // Logs go to stderr; stdout carries command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "poojabdi=info,poojabdi_storefront=info,poojabdi_admin=info".into()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => apply_overrides(config, &cli),
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!("Command failed: {e}");
        // Flush queued Sentry events before exiting
        drop(sentry_guard);
        std::process::exit(1);
    }
}

fn apply_overrides(mut config: StorefrontConfig, cli: &Cli) -> StorefrontConfig {
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(storage) = &cli.storage {
        config.storage_path.clone_from(storage);
    }
    config
}

async fn run(command: Commands, config: &StorefrontConfig) -> Result<(), commands::CommandError> {
    match command {
        Commands::Products => commands::catalog::show(config).await,
        Commands::Cart { action } => commands::cart::run(action, config).await,
        Commands::Local { action } => commands::local::run(action, config).await,
        Commands::Admin { action } => commands::admin::run(action, config).await,
    }
}
