use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::database::{self, Store};
use crate::services::payment::{PaymentGateway, RazorpayGateway};
use crate::services::storage::{self, ObjectStorage};

/// Shared dependencies handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub storage: Arc<dyn ObjectStorage>,
    /// `None` keeps the payment routes unmounted
    pub payments: Option<Arc<dyn PaymentGateway>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        storage: Arc<dyn ObjectStorage>,
        payments: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            storage,
            payments,
        }
    }

    /// Wire up the backends named in `config`
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store = database::connect_store(&config.database).await?;
        let storage = storage::from_config(&config.storage)?;

        let payments: Option<Arc<dyn PaymentGateway>> = if config.payment.is_configured() {
            info!("Payment gateway configured; mounting payment routes");
            Some(Arc::new(RazorpayGateway::from_config(&config.payment)?))
        } else {
            info!("Payment gateway not configured; payment routes disabled");
            None
        };

        Ok(Self::new(config, store, storage, payments))
    }
}
