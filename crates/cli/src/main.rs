//! Clementine CLI - storefront browsing, cart operations, and admin tools.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! clem catalog categories
//! clem catalog products --search mug
//! clem catalog product espresso-cup
//!
//! # Cart (the anonymous cart persists across invocations via
//! # CLEMENTINE_STATE_DIR)
//! clem cart add prod-42 --quantity 2
//! clem cart show
//! clem cart set-qty item-1 3
//! clem cart checkout --street "1 Main St" --city Lund --state Skane \
//!     --country SE --postal-code 22100
//!
//! # Admin (requires CLEMENTINE_EMAIL / CLEMENTINE_PASSWORD of an ADMIN
//! # account)
//! clem admin product-list
//! clem admin order-status ord-123 SHIPPED
//! clem admin upload ./hero.png
//! ```
//!
//! # Environment Variables
//!
//! - `CLEMENTINE_API_BASE_URL` - Backend base URL (required)
//! - `CLEMENTINE_STATE_DIR` - Where the cart session is persisted
//! - `CLEMENTINE_EMAIL` / `CLEMENTINE_PASSWORD` - Credentials; when both
//!   are set the CLI logs in before executing the command

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};

use clementine_client::{ClientConfig, Context, Notice, NoticeLevel};
use clementine_core::LoginRequest;

mod commands;

#[derive(Parser)]
#[command(name = "clem")]
#[command(author, version, about = "Clementine storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authentication checks
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Browse categories and products
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// Manage the anonymous cart and check out
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// File a refund request for an order
    Refund {
        /// External order id
        external_id: String,
        /// Amount to refund
        #[arg(long)]
        amount: f64,
        /// Reason shown to support
        #[arg(long)]
        reason: String,
    },
    /// Back-office operations (ADMIN account required)
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let ctx = Context::builder(config).build();
    let mut notices = ctx.notices();

    login_from_env(&ctx).await?;

    let outcome = dispatch(cli, &ctx).await;
    print_notices(&mut notices);
    outcome
}

async fn dispatch(cli: Cli, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Auth { action } => commands::auth::run(ctx, action).await?,
        Commands::Catalog { action } => commands::catalog::run(ctx, action).await?,
        Commands::Cart { action } => commands::cart::run(ctx, action).await?,
        Commands::Refund {
            external_id,
            amount,
            reason,
        } => commands::cart::refund(ctx, &external_id, amount, &reason).await?,
        Commands::Admin { action } => commands::admin::run(ctx, action).await?,
    }
    Ok(())
}

/// Log in when credentials are present in the environment; admin and refund
/// commands need the bearer token attached to their requests.
async fn login_from_env(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let (Ok(email), Ok(password)) = (
        std::env::var("CLEMENTINE_EMAIL"),
        std::env::var("CLEMENTINE_PASSWORD"),
    ) else {
        return Ok(());
    };
    let user = ctx
        .storefront()
        .login(&LoginRequest { email, password })
        .await?;
    tracing::debug!(role = %user.role, "logged in");
    Ok(())
}

/// Echo the notices the SDK emitted while the command ran.
fn print_notices(notices: &mut tokio::sync::broadcast::Receiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice.level {
            NoticeLevel::Success => println!("✔ {}", notice.message),
            NoticeLevel::Error => println!("✖ {}", notice.message),
        }
    }
}
