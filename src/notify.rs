//! Post-commit order notifications.
//!
//! Checkout publishes an [`OrderPlaced`] event after its transaction commits.
//! A background task consumes the events and emails the customer. Delivery
//! problems are logged here and never reach the checkout caller.

use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::customer::Customer;
use crate::domain::ports::CustomerDirectory;

#[derive(Debug, Clone)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub user_id: Option<Uuid>,
    pub total_price: BigDecimal,
    pub item_count: usize,
    pub payment_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("customer lookup failed: {0}")]
    Lookup(String),
    #[error("email delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

/// Writes emails to the log instead of sending them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        log::info!(
            "email (not sent, no email API configured): to={} subject={:?}",
            email.to,
            email.subject
        );
        Ok(())
    }
}

/// Posts emails as JSON to a transactional email API.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let mut request = self.client.post(&self.endpoint).json(email);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        request
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        Ok(())
    }
}

/// Publishing half of the notification channel. Cheap to clone.
#[derive(Clone)]
pub struct OrderEvents {
    tx: mpsc::UnboundedSender<OrderPlaced>,
}

impl OrderEvents {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OrderPlaced>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Never fails; a closed channel only costs the notification.
    pub fn publish(&self, event: OrderPlaced) {
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event) {
            log::warn!(
                "notification consumer stopped; order {} will not be announced",
                event.order_id
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    SkippedGuest,
    SkippedUnknownCustomer,
}

pub struct Notifier {
    customers: Arc<dyn CustomerDirectory>,
    mailer: Arc<dyn Mailer>,
    sender: String,
}

impl Notifier {
    pub fn new(
        customers: Arc<dyn CustomerDirectory>,
        mailer: Arc<dyn Mailer>,
        sender: String,
    ) -> Self {
        Self {
            customers,
            mailer,
            sender,
        }
    }

    pub async fn deliver(&self, event: &OrderPlaced) -> Result<Delivery, NotifyError> {
        let Some(user_id) = event.user_id else {
            return Ok(Delivery::SkippedGuest);
        };

        let customers = Arc::clone(&self.customers);
        let customer = tokio::task::spawn_blocking(move || customers.find_by_id(user_id))
            .await
            .map_err(|e| NotifyError::Lookup(e.to_string()))?
            .map_err(|e| NotifyError::Lookup(e.to_string()))?;
        let Some(customer) = customer else {
            return Ok(Delivery::SkippedUnknownCustomer);
        };

        let email = confirmation_email(&self.sender, &customer, event);
        self.mailer.send(&email).await?;
        Ok(Delivery::Sent)
    }

    /// Consumes events until every [`OrderEvents`] handle is dropped.
    pub fn spawn(self, mut events: mpsc::UnboundedReceiver<OrderPlaced>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match self.deliver(&event).await {
                    Ok(Delivery::Sent) => {
                        log::info!("order {} confirmation sent", event.order_id)
                    }
                    Ok(skipped) => {
                        log::debug!("order {} confirmation skipped: {:?}", event.order_id, skipped)
                    }
                    Err(e) => {
                        log::error!("order {} confirmation failed: {}", event.order_id, e)
                    }
                }
            }
            log::info!("order notification channel closed");
        })
    }
}

pub fn confirmation_email(sender: &str, customer: &Customer, event: &OrderPlaced) -> Email {
    let short_id = event.order_id.simple().to_string();
    let short_id = &short_id[..8];
    Email {
        from: sender.to_string(),
        to: customer.email.clone(),
        subject: format!("Your order #{short_id} is confirmed"),
        html: format!(
            "<p>Hi {name},</p>\
             <p>Thanks for your order <strong>{order_id}</strong>.</p>\
             <p>Items: {items}<br>Total: {total}</p>",
            name = customer.name,
            order_id = event.order_id,
            items = event.item_count,
            total = event.total_price,
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::infrastructure::memory::InMemoryStore;

    struct FailingMailer {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _email: &Email) -> Result<(), NotifyError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::Delivery("smtp down".to_string()))
        }
    }

    fn event(user_id: Option<Uuid>) -> OrderPlaced {
        OrderPlaced {
            order_id: Uuid::new_v4(),
            user_id,
            total_price: BigDecimal::from_str("19.98").expect("decimal"),
            item_count: 2,
            payment_id: None,
        }
    }

    #[test]
    fn confirmation_email_addresses_customer() {
        let customer = Customer {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
        };
        let ev = event(Some(customer.id));
        let email = confirmation_email("shop@example.com", &customer, &ev);

        assert_eq!(email.to, "ada@example.com");
        assert_eq!(email.from, "shop@example.com");
        assert!(email.html.contains(&ev.order_id.to_string()));
        assert!(email.html.contains("19.98"));
    }

    #[tokio::test]
    async fn guest_orders_are_skipped() {
        let store = InMemoryStore::new();
        let notifier = Notifier::new(
            Arc::new(store),
            Arc::new(LogMailer),
            "shop@example.com".to_string(),
        );
        let outcome = notifier.deliver(&event(None)).await.expect("deliver");
        assert_eq!(outcome, Delivery::SkippedGuest);
    }

    #[tokio::test]
    async fn known_customer_is_mailed() {
        let store = InMemoryStore::new();
        let user_id = store.add_customer("ada@example.com", "Ada");
        let notifier = Notifier::new(
            Arc::new(store),
            Arc::new(LogMailer),
            "shop@example.com".to_string(),
        );
        let outcome = notifier.deliver(&event(Some(user_id))).await.expect("deliver");
        assert_eq!(outcome, Delivery::Sent);
    }

    #[tokio::test]
    async fn consumer_keeps_running_after_delivery_failures() {
        let store = InMemoryStore::new();
        let user_id = store.add_customer("ada@example.com", "Ada");
        let mailer = Arc::new(FailingMailer {
            attempts: AtomicUsize::new(0),
        });
        let notifier = Notifier::new(
            Arc::new(store),
            mailer.clone(),
            "shop@example.com".to_string(),
        );

        let (events, rx) = OrderEvents::channel();
        let handle = notifier.spawn(rx);
        events.publish(event(Some(user_id)));
        events.publish(event(Some(user_id)));
        drop(events);

        handle.await.expect("consumer task panicked");
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn publishing_without_consumer_does_not_panic() {
        let (events, rx) = OrderEvents::channel();
        drop(rx);
        events.publish(event(None));
    }
}
