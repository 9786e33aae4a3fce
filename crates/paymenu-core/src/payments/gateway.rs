use async_trait::async_trait;

use crate::{domain::UserId, payments::request::SaleMode};

#[derive(Clone, Debug, PartialEq)]
pub struct InvoiceRequest {
    pub user_id: UserId,
    /// Billing periods (months) or traffic units (GB), depending on `sale_mode`.
    pub quantity: f64,
    pub amount: f64,
    pub description: String,
    pub sale_mode: SaleMode,
}

/// Payment gateway port.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// False when credentials are missing; the flow refuses to start then.
    fn configured(&self) -> bool;

    /// Create an invoice and return its payment URL.
    ///
    /// Implementations log their own failures and return `None`.
    async fn create_invoice(&self, req: &InvoiceRequest) -> Option<String>;
}
