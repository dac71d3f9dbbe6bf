use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::config::PaymentConfig;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    InvalidAmount(String),

    #[error("missing payment setting: {0}")]
    NotConfigured(&'static str),

    #[error("payment request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("payment gateway responded {status}: {description}")]
    Gateway { status: u16, description: String },
}

/// Order as sent to the gateway, amount in minor units
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

impl OrderRequest {
    pub fn new(amount: f64, currency: &str) -> Result<Self, PaymentError> {
        Ok(Self {
            amount: to_minor_units(amount)?,
            currency: currency.to_string(),
            receipt: format!("receipt_{}", Uuid::new_v4()),
        })
    }
}

/// Major currency units to minor (paise, cents)
pub fn to_minor_units(amount: f64) -> Result<i64, PaymentError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PaymentError::InvalidAmount("amount must be greater than zero".to_string()));
    }
    Ok((amount * 100.0).round() as i64)
}

/// Hex HMAC-SHA256 of `"<order_id>|<payment_id>"`
pub fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison against the expected signature
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    mac.verify_slice(&provided).is_ok()
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an order and returns the gateway's JSON for it
    async fn create_order(&self, order: OrderRequest) -> Result<Value, PaymentError>;

    fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}

/// Razorpay Orders API
pub struct RazorpayGateway {
    client: Client,
    key_id: String,
    key_secret: String,
    api_base: String,
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    error: GatewayErrorDetail,
}

#[derive(Deserialize)]
struct GatewayErrorDetail {
    description: String,
}

impl RazorpayGateway {
    pub fn from_config(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let key_id = config
            .razorpay_key_id
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(PaymentError::NotConfigured("RAZORPAY_KEY_ID"))?;
        let key_secret = config
            .razorpay_key_secret
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(PaymentError::NotConfigured("RAZORPAY_KEY_SECRET"))?;

        Ok(Self {
            client: Client::new(),
            key_id,
            key_secret,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, order: OrderRequest) -> Result<Value, PaymentError> {
        let response = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&order)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let description = serde_json::from_str::<GatewayErrorBody>(&body)
                .map(|b| b.error.description)
                .unwrap_or(body);
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                description,
            });
        }

        Ok(response.json::<Value>().await?)
    }

    fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_signature(&self.key_secret, order_id, payment_id, signature)
    }
}
