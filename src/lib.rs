pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod notify;
pub mod openapi;
pub mod schema;
pub mod signature;
pub mod state;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};
pub use state::AppState;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    if !applied.is_empty() {
        log::info!("applied {} migration(s)", applied.len());
    }
    Ok(())
}

/// Registers the routes and extractor configuration. Shared by the server and
/// the HTTP tests; the caller supplies `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config())
        .app_data(handlers::path_config())
        .app_data(handlers::query_config())
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/products")
                        .route("", web::get().to(handlers::products::list_products))
                        .route("/{id}", web::get().to(handlers::products::get_product)),
                )
                .service(
                    web::scope("/cart")
                        .route("", web::post().to(handlers::cart::add_to_cart))
                        .route("", web::get().to(handlers::cart::list_cart)),
                )
                .service(
                    web::scope("/orders")
                        .route("", web::post().to(handlers::orders::place_order))
                        .route("", web::get().to(handlers::orders::list_orders))
                        .route("/{id}", web::get().to(handlers::orders::get_order)),
                )
                .service(
                    web::scope("/payments")
                        .route(
                            "/orders",
                            web::post().to(handlers::payments::create_payment_order),
                        )
                        .route("/verify", web::post().to(handlers::payments::verify_payment)),
                ),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
            )
            .configure(configure)
    })
    .bind((host.to_string(), port))?
    .run())
}
