use std::sync::Arc;

use paymenu_core::{config::Config, payments::gateway::PaymentGateway};
use paymenu_cryptopay::{CryptoPayClient, CryptoPayConfig};

#[tokio::main]
async fn main() -> Result<(), paymenu_core::Error> {
    paymenu_core::logging::init("paymenu")?;

    let cfg = Arc::new(Config::load()?);

    // An unconfigured client still goes in: the flow answers with an alert
    // instead of a link.
    let gateway: Option<Arc<dyn PaymentGateway>> = match CryptoPayClient::new(
        CryptoPayConfig::from_config(&cfg),
    ) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::error!("payment gateway unavailable: {e}");
            None
        }
    };

    paymenu_telegram::router::run_polling(cfg, gateway)
        .await
        .map_err(|e| paymenu_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
