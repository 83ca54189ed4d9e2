use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use serde::Serialize;

use crate::domain::errors::DomainError;
use crate::domain::ports::{GatewayOrder, PaymentGateway};

/// Converts a decimal amount to the gateway's smallest currency unit.
pub fn to_minor_units(amount: &BigDecimal) -> Result<i64, DomainError> {
    if *amount <= BigDecimal::from(0) {
        return Err(DomainError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }
    (amount * BigDecimal::from(100))
        .round(0)
        .to_i64()
        .ok_or_else(|| DomainError::Validation(format!("amount {amount} is out of range")))
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Creates payment orders on a Razorpay-compatible HTTP API.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
    currency: String,
}

impl HttpPaymentGateway {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        key_id: String,
        key_secret: String,
        currency: String,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id,
            key_secret,
            currency,
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(
        &self,
        amount: &BigDecimal,
        receipt: &str,
    ) -> Result<GatewayOrder, DomainError> {
        let body = CreateOrderBody {
            amount: to_minor_units(amount)?,
            currency: &self.currency,
            receipt,
        };

        let resp = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            log::warn!("payment gateway rejected order creation ({status}): {detail}");
            return Err(DomainError::Gateway(format!(
                "order creation returned {status}"
            )));
        }

        resp.json::<GatewayOrder>()
            .await
            .map_err(|e| DomainError::Gateway(format!("unreadable gateway response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn whole_amount_becomes_minor_units() {
        assert_eq!(to_minor_units(&dec("499")).expect("convert"), 49_900);
    }

    #[test]
    fn fractional_amount_is_rounded_to_the_nearest_unit() {
        assert_eq!(to_minor_units(&dec("19.99")).expect("convert"), 1_999);
        assert_eq!(to_minor_units(&dec("0.015")).expect("convert"), 2);
    }

    #[test]
    fn zero_and_negative_amounts_are_rejected() {
        assert!(matches!(
            to_minor_units(&dec("0")),
            Err(DomainError::Validation(_))
        ));
        assert!(to_minor_units(&dec("-5")).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gw = HttpPaymentGateway::new(
            reqwest::Client::new(),
            "https://api.example.com/".to_string(),
            "key".to_string(),
            "secret".to_string(),
            "INR".to_string(),
        );
        assert_eq!(gw.base_url, "https://api.example.com");
    }
}
