use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crossskill_client::{AuthProvider, Directory, HttpAuth, HttpDirectory, TableClient};
use crossskill_core::routes::SessionState;

use crossskill_app::cache::QueryCache;
use crossskill_app::config::AppConfig;
use crossskill_app::gate::RouteGate;
use crossskill_app::notice::NoticeBus;
use crossskill_app::screens::{LoginScreen, MarketplaceScreen};
use crossskill_app::session::SessionStore;

/// Headless smoke run: resolve the session, walk the route gate, and if
/// credentials are supplied via `SMOKE_EMAIL`/`SMOKE_PASSWORD`, sign in and
/// print the marketplace listings.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crossskill=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = AppConfig::from_env();
    tracing::info!(
        auth_url = %config.auth_url,
        store_url = %config.store_url,
        "Loaded client configuration"
    );

    // --- Collaborators ---
    let auth: Arc<dyn AuthProvider> = Arc::new(HttpAuth::new(&config.auth_url, &config.api_key));
    let tables = TableClient::new(&config.store_url, &config.api_key);
    let directory: Arc<dyn Directory> =
        Arc::new(HttpDirectory::new(tables, Arc::clone(&auth)));

    let cache = Arc::new(QueryCache::new(config.cache_ttl));
    let notices = NoticeBus::default();
    let mut notice_rx = notices.subscribe();
    tokio::spawn(async move {
        while let Ok(notice) = notice_rx.recv().await {
            tracing::info!(level = ?notice.level, title = %notice.title, body = %notice.body, "Notice");
        }
    });

    // --- Session ---
    let store = SessionStore::start(Arc::clone(&auth), config.auth_resolve_timeout);
    let mut session_rx = store.subscribe();
    // The initial state is Unknown until the first resolution lands.
    while *session_rx.borrow() == SessionState::Unknown {
        session_rx.changed().await?;
    }
    let resolved = match &*session_rx.borrow() {
        SessionState::Present(_) => "present",
        SessionState::Absent => "absent",
        SessionState::Unavailable => "unavailable",
        SessionState::Unknown => "unknown",
    };
    tracing::info!(state = resolved, "Initial session resolved");

    let mut gate = RouteGate::new(store.subscribe());
    for path in ["/", "/dashboard", "/skills", "/no-such-page"] {
        let disposition = gate.navigate(path);
        tracing::info!(path, ?disposition, "Gate decision");
    }

    // --- Optional authenticated walk ---
    let (email, password) = match (
        std::env::var("SMOKE_EMAIL"),
        std::env::var("SMOKE_PASSWORD"),
    ) {
        (Ok(email), Ok(password)) => (email, password),
        _ => {
            tracing::info!("No smoke credentials set; stopping after the anonymous walk");
            return Ok(());
        }
    };

    let mut login = LoginScreen::new(Arc::clone(&auth), Arc::clone(&cache), notices.clone());
    login.form.email = email;
    login.form.password = password;
    match login.submit().await {
        Some(navigation) => {
            let disposition = gate.apply(&navigation);
            tracing::info!(?disposition, "Signed in");
        }
        None => anyhow::bail!("sign-in failed; see notices above"),
    }

    let marketplace = MarketplaceScreen::new(directory, cache, notices);
    let listings = marketplace.filtered().await;
    match listings.ready() {
        Some(listings) => {
            for listing in listings {
                println!(
                    "{} ({}) taught by {} [{}], proficiency {}/5",
                    listing.skill_name,
                    listing.skill_category,
                    listing.teacher_name,
                    listing.teacher_department,
                    listing.proficiency_level
                );
            }
        }
        None => anyhow::bail!("listings did not load"),
    }

    Ok(())
}
