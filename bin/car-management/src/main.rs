//! # Car Management Binary
//!
//! Loads settings, wires the storage and auth plugins chosen at compile time
//! into `AppState`, and serves the site and API.

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use cm_api::{middleware, AppState, SessionPolicy};
use configs::Settings;
use secrecy::ExposeSecret;

#[cfg(feature = "db-sqlite")]
use cm_db_sqlite::SqliteRepo;

#[cfg(feature = "auth-simple")]
use cm_auth_simple::SimpleAuthProvider;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(settings.log_level.as_str()));
    for (level, note) in settings.startup_notes() {
        log::log!(level, "{note}");
    }

    // 1. Database
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteRepo::connect(settings.database.url.expose_secret(), settings.database.max_connections)
        .await
        .context("failed to init SQLite")?;

    // 2. Auth
    #[cfg(feature = "auth-simple")]
    let auth = SimpleAuthProvider::new(settings.auth.session_salt.expose_secret());

    let state = web::Data::new(AppState {
        cars: Box::new(repo.clone()),
        users: Box::new(repo),
        auth: Box::new(auth),
        session: SessionPolicy {
            cookie_name: settings.session.cookie_name.clone(),
            ttl: chrono::Duration::seconds(settings.session.ttl_secs),
            secure: settings.session.secure_cookie,
        },
    });

    let (host, port) = settings.bind_address();
    let static_dir = settings.server.static_dir.clone();
    log::info!("car-management starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::security_headers())
            .wrap(middleware::standard_middleware())
            .service(Files::new("/static", &static_dir))
            .configure(cm_api::configure_routes)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("failed to bind {host}:{port}"))?
    .run()
    .await?;

    Ok(())
}
