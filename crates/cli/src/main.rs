//! RocketShoes CLI - product listing and shopping cart.
//!
//! # Usage
//!
//! ```bash
//! # List products with the quantity already in the cart
//! rocketshoes products
//!
//! # Show the cart
//! rocketshoes cart
//!
//! # Add one unit, set an amount, remove an entry
//! rocketshoes add 1
//! rocketshoes update 1 3
//! rocketshoes remove 1
//! ```
//!
//! The cart is restored from `ROCKETSHOES_STORAGE_PATH` on every run and
//! written back after each successful change. See
//! `rocketshoes_storefront::config` for all environment variables.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;
use rocketshoes_storefront::config::StorefrontConfig;
use rocketshoes_storefront::error::AppError;
use rocketshoes_storefront::notify::MemoryNotifier;
use rocketshoes_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rocketshoes")]
#[command(author, version, about = "RocketShoes storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products with their prices and in-cart quantities
    Products,
    /// Show the cart
    Cart,
    /// Add one unit of a product to the cart
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the amount of a product already in the cart
    Update {
        /// Product ID
        id: ProductId,

        /// New amount (0 is ignored; use `remove` instead)
        amount: u32,
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

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to warnings only so command output stays readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _sentry_guard = init_sentry(&config);

    let notifier = Arc::new(MemoryNotifier::new());
    let result = run(cli, &config, notifier.clone()).await;

    commands::cart::print_notifications(&notifier.drain());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_fault() {
                tracing::error!("Command failed: {e}");
            } else {
                tracing::debug!("Command rejected: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(
    cli: Cli,
    config: &StorefrontConfig,
    notifier: Arc<MemoryNotifier>,
) -> Result<(), AppError> {
    let state = AppState::new(config, notifier).await?;

    match cli.command {
        Commands::Products => commands::products::list(&state).await?,
        Commands::Cart => commands::cart::show(&state),
        Commands::Add { id } => commands::cart::add(&state, id).await?,
        Commands::Remove { id } => commands::cart::remove(&state, id).await?,
        Commands::Update { id, amount } => commands::cart::update(&state, id, amount).await?,
    }
    Ok(())
}
