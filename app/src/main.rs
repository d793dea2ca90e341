// In app/src/main.rs

use anyhow::{Context, Result};
use api_client::{SignalApiClient, SignalFeed};
use app_config::Settings;
use billing::MockPaymentGateway;
use chrono::Utc;
use clap::{Parser, Subcommand};
use core_types::{SubscriptionProfile, Symbol};
use engine::{DashboardController, Selection, SessionTokenSource};
use events::ViewMessage;
use identity::{AuthClient, ProfileStore, ProfileStoreClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::prelude::*;

mod tracing_layer;
use self::tracing_layer::UiBroadcastLayer;

/// How often an unverified session is re-checked for the verification link.
const VERIFICATION_POLL_INTERVAL: Duration = Duration::from_secs(30);

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A subscription-gated trading signals client.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Signs in and runs the signals dashboard until interrupted.
    Run {
        /// The symbol to focus on (e.g., "BTCUSDT"). Defaults to the first
        /// watchlist entry.
        #[arg(short, long)]
        symbol: Option<String>,

        /// The chart interval for the focus feed (e.g., "5m", "1h").
        #[arg(short, long)]
        interval: Option<String>,
    },

    /// Signs in and reports the session's verification status.
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Creates an account, dispatches the verification email, runs the mock
    /// payment, and writes the subscription profile.
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// The plan to subscribe to ("1 Month", "6 Months" or "Annual").
        #[arg(long)]
        plan: String,
    },

    /// Prints the subscription plan catalog.
    Plans,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // --- UI Channel and Tracing Setup ---
    let (ui_tx, _) = broadcast::channel::<ViewMessage>(1024);
    let ui_layer = UiBroadcastLayer::new(ui_tx.clone());
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new().with_default(tracing::Level::INFO),
    );
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(ui_layer)
        .init();

    // Parse command-line arguments.
    let cli = Cli::parse();

    tracing::info!("Starting Vigil application");

    let settings = app_config::load_settings().context("Failed to load configuration")?;

    match cli.command {
        Commands::Run { symbol, interval } => {
            run_dashboard(settings, ui_tx, symbol, interval).await?;
        }
        Commands::Login { email, password } => {
            handle_login(settings, email, password).await?;
        }
        Commands::Signup {
            email,
            password,
            plan,
        } => {
            handle_signup(settings, email, password, plan).await?;
        }
        Commands::Plans => {
            handle_plans();
        }
    }

    tracing::info!("Vigil application has finished successfully.");

    Ok(())
}

/// Signs in with the configured credentials and runs the dashboard
/// controller, rendering view messages to stdout.
async fn run_dashboard(
    settings: Settings,
    ui_tx: broadcast::Sender<ViewMessage>,
    symbol: Option<String>,
    interval: Option<String>,
) -> Result<()> {
    let auth = auth_client(&settings);

    let email = settings
        .identity
        .email
        .clone()
        .context("identity.email is required for `run`")?;
    let password = settings
        .identity
        .password
        .clone()
        .context("identity.password is required for `run`")?;

    // The controller reacts to the published session; sign-in just seeds it.
    let session = auth.sign_in(&email, &password).await?;
    if !session.email_verified {
        tracing::warn!(email = %session.email, "Email not verified; waiting for the verification link.");
        spawn_verification_poll(auth.clone());
    }

    let profile_store: Arc<dyn ProfileStore> =
        Arc::new(ProfileStoreClient::new(settings.identity.profile_base_url.clone()));

    let feed = SignalFeed::new(
        SignalApiClient::new(settings.signals.rest_base_url.clone()),
        Arc::new(SessionTokenSource::new(auth.clone())),
        Duration::from_secs(settings.signals.poll_interval_secs),
    );

    let focus_symbol = symbol
        .or_else(|| settings.watchlist.symbols.first().cloned())
        .context("No focus symbol given and the watchlist is empty")?;
    let focus_interval = interval.unwrap_or_else(|| settings.signals.default_interval.clone());
    let (_selection_tx, selection_rx) = watch::channel(Selection {
        symbol: Symbol(focus_symbol),
        interval: focus_interval,
    });

    // Render view messages as JSON lines; log lines are already on stderr
    // via the fmt layer.
    let mut ui_rx = ui_tx.subscribe();
    tokio::spawn(async move {
        while let Ok(msg) = ui_rx.recv().await {
            if matches!(msg, ViewMessage::Log(_)) {
                continue;
            }
            match serde_json::to_string(&msg) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!(error = %e, "Failed to serialize view message."),
            }
        }
    });

    let controller = DashboardController::new(
        auth,
        profile_store,
        feed,
        settings.signals.default_interval.clone(),
        settings.signals.limit,
        selection_rx,
        ui_tx,
    );

    controller.run().await
}

/// Re-queries the session until the verification link has been clicked; each
/// reload publishes on the session channel, so the dashboard controller picks
/// the change up on its own.
fn spawn_verification_poll(auth: AuthClient) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(VERIFICATION_POLL_INTERVAL);
        loop {
            ticker.tick().await;
            match auth.reload_session().await {
                Ok(session) if session.email_verified => {
                    tracing::info!(uid = %session.uid, "Email verified.");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Session reload failed; will retry.");
                }
            }
        }
    });
}

async fn handle_login(settings: Settings, email: String, password: String) -> Result<()> {
    let auth = auth_client(&settings);
    let session = auth.sign_in(&email, &password).await?;

    if session.email_verified {
        tracing::info!(uid = %session.uid, "Signed in with a verified session.");
    } else {
        tracing::warn!(uid = %session.uid, "Please verify your email before using the dashboard.");
    }
    Ok(())
}

async fn handle_signup(
    settings: Settings,
    email: String,
    password: String,
    plan: String,
) -> Result<()> {
    let plan = billing::plan_by_name(&plan)
        .with_context(|| format!("Unknown plan \"{}\"; see `plans` for the catalog", plan))?;

    let auth = auth_client(&settings);
    let session = auth.sign_up(&email, &password).await?;
    auth.send_email_verification().await?;
    tracing::info!(uid = %session.uid, "Account created; verification email sent.");

    // Mocked by design: unconditional success after a fixed delay.
    let receipt = MockPaymentGateway::new().charge(&plan).await;

    let profile = SubscriptionProfile {
        plan: plan.name().to_string(),
        billing_cycle: plan.billing_cycle.to_string(),
        is_active: true,
        created_at: Utc::now(),
    };
    let store = ProfileStoreClient::new(settings.identity.profile_base_url.clone());
    let token = auth.fresh_token().await?;
    store.create_profile(&session.uid, &profile, &token).await?;

    tracing::info!(
        uid = %session.uid,
        plan = %receipt.plan,
        "Subscription active. Verify your email, then start the dashboard with `run`."
    );
    Ok(())
}

fn handle_plans() {
    for plan in billing::catalog() {
        println!(
            "{:<10} ${:<6} {:<8} {}{}",
            plan.name(),
            plan.price_usd,
            plan.billing_cycle,
            plan.trial,
            if plan.recommended { "  (recommended)" } else { "" },
        );
        for feature in plan.features {
            println!("    - {}", feature);
        }
        println!();
    }
}

fn auth_client(settings: &Settings) -> AuthClient {
    AuthClient::new(
        settings.identity.api_key.clone(),
        settings.identity.auth_base_url.clone(),
        settings.identity.token_base_url.clone(),
    )
}
