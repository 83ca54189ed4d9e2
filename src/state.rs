use std::sync::Arc;

use crate::application::cart::CartService;
use crate::application::catalog::CatalogService;
use crate::application::checkout::CheckoutService;
use crate::auth::SessionKeys;
use crate::db::DbPool;
use crate::domain::order::StockPolicy;
use crate::domain::ports::{
    CartRepository, CustomerDirectory, OrderRepository, PaymentGateway, ProductRepository,
};
use crate::infrastructure::cart_repo::{DieselCartRepository, DieselCustomerDirectory};
use crate::infrastructure::memory::InMemoryStore;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::product_repo::DieselProductRepository;
use crate::notify::OrderEvents;

/// The repositories behind the services, chosen once at startup.
#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub customers: Arc<dyn CustomerDirectory>,
}

impl Stores {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            products: Arc::new(DieselProductRepository::new(pool.clone())),
            carts: Arc::new(DieselCartRepository::new(pool.clone())),
            orders: Arc::new(DieselOrderRepository::new(pool.clone())),
            customers: Arc::new(DieselCustomerDirectory::new(pool)),
        }
    }

    pub fn in_memory(store: &InMemoryStore) -> Self {
        Self {
            products: Arc::new(store.clone()),
            carts: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            customers: Arc::new(store.clone()),
        }
    }
}

pub struct Settings {
    pub payment_secret: String,
    pub session_secret: String,
    pub cart_ttl: chrono::Duration,
    pub stock_policy: StockPolicy,
}

/// Shared by every worker through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub sessions: Arc<SessionKeys>,
}

impl AppState {
    pub fn new(
        stores: &Stores,
        gateway: Arc<dyn PaymentGateway>,
        events: OrderEvents,
        settings: Settings,
    ) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(Arc::clone(&stores.products))),
            cart: Arc::new(CartService::new(
                Arc::clone(&stores.products),
                Arc::clone(&stores.carts),
                settings.cart_ttl,
            )),
            checkout: Arc::new(CheckoutService::new(
                Arc::clone(&stores.products),
                Arc::clone(&stores.orders),
                gateway,
                events,
                settings.payment_secret,
                settings.stock_policy,
            )),
            sessions: Arc::new(SessionKeys::new(settings.session_secret)),
        }
    }
}
