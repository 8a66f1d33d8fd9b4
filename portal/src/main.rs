use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use portal::booking::{DoctorDirectory, InMemoryLedger, SlotAllocator, booking_window};
use portal::credentials::AccountDirectory;
use portal::routing::RouteTable;
use portal::session::{FileTokenStore, SessionAuthority, SessionStatus, TokenCodec};
use shared::config::load_config;

#[derive(Debug, Parser)]
#[command(name = "portal", about = "Hospital portal session and booking core")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "portal.toml")]
    config: PathBuf,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    info!("Loaded config from {}", args.config.display());

    let accounts = AccountDirectory::from_config(&config.accounts);
    info!("Account directory seeded with {} accounts", accounts.len().await);

    let codec = TokenCodec::from_config(&config.auth).context("Failed to build token codec")?;
    let store = FileTokenStore::new(&config.storage.token_path);
    let authority = SessionAuthority::new(store, accounts, codec);

    let routes = RouteTable::portal_routes();
    info!("Route table has {} protected routes", routes.rules().len());

    match authority.initialize().await {
        SessionStatus::Authenticated(identity) => {
            let menu = authority.view().menu().await;
            info!(
                "Signed in as {} ({}), {} menu entries",
                identity.name,
                identity.role,
                menu.len()
            );
            for entry in menu {
                info!("  {} -> {}", entry.label, entry.path);
            }
        }
        _ => info!("No active session; sign in at /signin"),
    }

    let directory = DoctorDirectory::new(config.booking.doctors.clone());
    let allocator =
        SlotAllocator::new(InMemoryLedger::new()).with_window_days(config.booking.window_days);
    let window = booking_window(Local::now().date_naive(), config.booking.window_days);
    info!(
        "{} doctors across {} departments, booking window {} days",
        directory.len(),
        directory.departments().len(),
        window.len()
    );
    if let (Some(first), Some(doctor)) = (window.first(), config.booking.doctors.first()) {
        let slots = allocator
            .available_slots(doctor.id, *first)
            .await
            .context("Failed to compute availability")?;
        info!("{} has {} open slots on {}", doctor.name, slots.len(), first);
    }

    Ok(())
}
