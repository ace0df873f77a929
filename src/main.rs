use std::sync::Arc;

use authgate::config::AppConfig;
use authgate::db::{self, MemoryProfileStore, PgProfileStore, ProfileStore};
use authgate::identity::LocalIdentityProvider;
use authgate::routes;
use authgate::services::auth::AuthContext;
use authgate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");

    let profiles: Arc<dyn ProfileStore> = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .expect("database init failed");
            Arc::new(PgProfileStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; profiles are kept in memory");
            Arc::new(MemoryProfileStore::new())
        }
    };

    let identity = Arc::new(LocalIdentityProvider::new());
    let auth = AuthContext::new(identity.clone(), profiles);
    auth.start();

    let state = AppState { auth: Arc::clone(&auth), local_identity: config.dev_routes.then_some(identity) };

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, dev_routes = config.dev_routes, "authgate listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("server failed");

    auth.teardown().await;
}
