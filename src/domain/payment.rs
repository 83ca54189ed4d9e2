use super::errors::DomainError;
use super::order::GatewayRef;
use crate::signature;

const MAX_GATEWAY_ID_LEN: usize = 255;

/// The triple returned by the gateway's client-side checkout.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

impl PaymentConfirmation {
    /// The string the gateway signs: `orderId|paymentId`.
    pub fn signed_payload(&self) -> String {
        signed_payload(&self.gateway_order_id, &self.gateway_payment_id)
    }

    /// Fails with [`DomainError::SignatureMismatch`] unless the signature was
    /// produced with `secret`.
    pub fn verify(&self, secret: &str) -> Result<GatewayRef, DomainError> {
        if self.gateway_order_id.trim().is_empty() || self.gateway_payment_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "gateway order id and payment id are required".to_string(),
            ));
        }
        // Both ids are stored in VARCHAR(255) columns.
        if self.gateway_order_id.chars().count() > MAX_GATEWAY_ID_LEN
            || self.gateway_payment_id.chars().count() > MAX_GATEWAY_ID_LEN
        {
            return Err(DomainError::Validation(format!(
                "gateway order id and payment id must be at most {MAX_GATEWAY_ID_LEN} characters"
            )));
        }
        if !signature::verify_hex(
            secret.as_bytes(),
            self.signed_payload().as_bytes(),
            &self.signature,
        ) {
            return Err(DomainError::SignatureMismatch);
        }
        Ok(GatewayRef {
            order_id: self.gateway_order_id.clone(),
            payment_id: self.gateway_payment_id.clone(),
        })
    }
}

pub fn signed_payload(gateway_order_id: &str, gateway_payment_id: &str) -> String {
    format!("{gateway_order_id}|{gateway_payment_id}")
}

/// The signature the gateway would send for this order/payment pair.
pub fn expected_signature(
    secret: &str,
    gateway_order_id: &str,
    gateway_payment_id: &str,
) -> Result<String, DomainError> {
    signature::sign_hex(
        secret.as_bytes(),
        signed_payload(gateway_order_id, gateway_payment_id).as_bytes(),
    )
    .ok_or_else(|| DomainError::Internal("payment secret rejected by HMAC".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "rzp_test_secret";

    fn confirmation(signature: String) -> PaymentConfirmation {
        PaymentConfirmation {
            gateway_order_id: "order_Abc123".to_string(),
            gateway_payment_id: "pay_Xyz789".to_string(),
            signature,
        }
    }

    #[test]
    fn payload_joins_ids_with_pipe() {
        assert_eq!(signed_payload("order_1", "pay_2"), "order_1|pay_2");
    }

    #[test]
    fn valid_signature_yields_gateway_ref() {
        let sig = expected_signature(SECRET, "order_Abc123", "pay_Xyz789").expect("sign");
        let gateway = confirmation(sig).verify(SECRET).expect("should verify");
        assert_eq!(gateway.order_id, "order_Abc123");
        assert_eq!(gateway.payment_id, "pay_Xyz789");
    }

    #[test]
    fn signature_for_other_payment_is_rejected() {
        let sig = expected_signature(SECRET, "order_Abc123", "pay_Other").expect("sign");
        let err = confirmation(sig).verify(SECRET).unwrap_err();
        assert!(matches!(err, DomainError::SignatureMismatch));
    }

    #[test]
    fn signature_under_other_secret_is_rejected() {
        let sig = expected_signature("another", "order_Abc123", "pay_Xyz789").expect("sign");
        assert!(confirmation(sig).verify(SECRET).is_err());
    }

    #[test]
    fn missing_ids_are_a_validation_error() {
        let mut c = confirmation("00".repeat(32));
        c.gateway_payment_id = "  ".to_string();
        assert!(matches!(c.verify(SECRET), Err(DomainError::Validation(_))));
    }

    #[test]
    fn overlong_payment_id_is_a_validation_error() {
        let payment_id = "p".repeat(256);
        let sig = expected_signature(SECRET, "order_Abc123", &payment_id).expect("sign");
        let mut c = confirmation(sig);
        c.gateway_payment_id = payment_id;
        assert!(matches!(c.verify(SECRET), Err(DomainError::Validation(_))));
    }

    #[test]
    fn mismatch_message_is_stable() {
        assert_eq!(
            DomainError::SignatureMismatch.to_string(),
            "Payment verification failed"
        );
    }
}
