//! Storefront cart CLI - a terminal shopper for the storefront cart.
//!
//! The guest cart is kept in `CART_DATA_DIR`; once logged in, commands act on
//! the account cart through the cart API at `CART_API_BASE_URL`.
//!
//! # Usage
//!
//! ```bash
//! # Build a guest cart
//! cart-cli add 1
//! cart-cli add 1 -q 2
//!
//! # Log in; the guest cart is merged into the account cart
//! cart-cli login --user 1 --token "$CART_TOKEN"
//!
//! # Retry a merge that failed
//! cart-cli merge
//!
//! # Back to the guest cart
//! cart-cli logout
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use storefront_cart::CartState;
use storefront_cart::config::CartConfig;
use storefront_cart::local::FileStorage;
use storefront_cart_core::{ProductId, UserId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;
use commands::cart::{CartAction, describe_event, describe_outcome, render};
use commands::session::Session;

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Storefront cart CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: ProductId,

        /// Units to add (values below 1 count as 1)
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Product ID
        product_id: ProductId,

        /// New quantity (values below 1 count as 1)
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove every product from the cart
    Clear,
    /// Log in and merge the guest cart into the account cart
    Login {
        /// Account user ID
        #[arg(short, long)]
        user: UserId,

        /// Bearer token for the cart API
        #[arg(short, long)]
        token: String,
    },
    /// Log out and return to the guest cart
    Logout,
    /// Retry merging the guest cart into the account cart
    Merge,
}

impl Commands {
    fn action(&self) -> CartAction {
        match self {
            Self::Add {
                product_id,
                quantity,
            } => CartAction::Add {
                product_id: *product_id,
                quantity: *quantity,
            },
            Self::Update {
                product_id,
                quantity,
            } => CartAction::Update {
                product_id: *product_id,
                quantity: *quantity,
            },
            Self::Remove { product_id } => CartAction::Remove {
                product_id: *product_id,
            },
            Self::Clear => CartAction::Clear,
            Self::Merge => CartAction::Merge,
            Self::Show | Self::Login { .. } | Self::Logout => CartAction::Show,
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    Some(sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = CartConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: CartConfig) -> Result<(), CliError> {
    let mut storage = FileStorage::new(&config.data_dir);

    match &cli.command {
        Commands::Login { user, token } => {
            Session::new(*user, token.clone()).save(&mut storage)?;
            tracing::info!(user_id = %user, "Logged in");
        }
        Commands::Logout => {
            Session::clear(&mut storage)?;
            tracing::info!("Logged out");
        }
        _ => {}
    }

    let (user, token) = match Session::load(&storage)? {
        Some(session) => (Some(session.user), Some(session.token)),
        None => (None, None),
    };

    let state = CartState::new(config, token)?;
    let cart = state.cart();
    let mut events = cart.subscribe();

    let mut messages = Vec::new();
    messages.extend(describe_outcome(&cart.observe_session(user).await));

    let result = commands::cart::execute(cart, cli.command.action()).await;
    while let Ok(event) = events.try_recv() {
        messages.extend(describe_event(&event));
    }
    match result {
        Ok(message) => messages.extend(message),
        Err(e) => {
            print_lines(&messages);
            return Err(e);
        }
    }

    messages.push(render(&cart.summary().await));
    print_lines(&messages);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
