//! Keywarden Server — application entry point.

use tracing_subscriber::EnvFilter;

use keywarden_db::DbManager;
use keywarden_server::config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("keywarden=info".parse().unwrap()),
        )
        .json()
        .init();

    let config = ServerConfig::from_env();

    let manager = DbManager::connect(&config.db)
        .await
        .expect("failed to connect to SurrealDB");
    let db = manager.client().clone();

    keywarden_db::run_migrations(&db)
        .await
        .expect("schema migration failed");
    keywarden_db::seed_defaults(&db, config.auth.pepper.clone())
        .await
        .expect("seeding default data failed");

    let app = keywarden_server::app::build_app(db, config.auth.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind listen address");
    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
