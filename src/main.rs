use std::sync::Arc;

use storefront_checkout::application::cart::spawn_cart_sweeper;
use storefront_checkout::config::AppConfig;
use storefront_checkout::infrastructure::gateway::HttpPaymentGateway;
use storefront_checkout::notify::{HttpMailer, LogMailer, Mailer, Notifier, OrderEvents};
use storefront_checkout::state::{Settings, Stores};
use storefront_checkout::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let pool = create_pool(&config.database_url).map_err(std::io::Error::other)?;
    run_migrations(&pool).map_err(std::io::Error::other)?;

    let client = reqwest::Client::new();
    let stores = Stores::postgres(pool);

    let mailer: Arc<dyn Mailer> = match &config.email.api_url {
        Some(url) => Arc::new(HttpMailer::new(
            client.clone(),
            url.clone(),
            config.email.api_key.clone(),
        )),
        None => {
            log::warn!("EMAIL_API_URL not set; order confirmations will only be logged");
            Arc::new(LogMailer)
        }
    };
    let (events, rx) = OrderEvents::channel();
    Notifier::new(
        Arc::clone(&stores.customers),
        mailer,
        config.email.sender.clone(),
    )
    .spawn(rx);

    let gateway = Arc::new(HttpPaymentGateway::new(
        client,
        config.payment.gateway_url.clone(),
        config.payment.key_id.clone(),
        config.payment.key_secret.clone(),
        config.payment.currency.clone(),
    ));

    let state = AppState::new(
        &stores,
        gateway,
        events,
        Settings {
            payment_secret: config.payment.key_secret.clone(),
            session_secret: config.session_secret.clone(),
            cart_ttl: config.cart_ttl,
            stock_policy: config.stock_policy,
        },
    );
    spawn_cart_sweeper(Arc::clone(&state.cart), config.cart_sweep_interval);

    log::info!(
        "Starting server at http://{}:{} (stock policy {:?})",
        config.host,
        config.port,
        config.stock_policy
    );

    build_server(state, &config.host, config.port)?.await
}
