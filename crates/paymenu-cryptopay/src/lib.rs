//! Crypto Pay adapter (payment gateway).
//!
//! Creates invoices through the `createInvoice` method of the Crypto Pay API
//! (@CryptoBot) and hands back the invoice link.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use paymenu_core::{
    config::Config,
    errors::Error,
    payments::{
        gateway::{InvoiceRequest, PaymentGateway},
        request::format_number,
    },
    Result,
};

const MAX_DESCRIPTION_CHARS: usize = 1024;

#[derive(Clone, Debug)]
pub struct CryptoPayConfig {
    pub token: Option<String>,
    pub api_base: String,
    pub asset: String,
    /// Price invoices in this fiat currency instead of `asset`.
    pub fiat: Option<String>,
    pub timeout: Duration,
}

impl CryptoPayConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            token: cfg.cryptopay_token.clone(),
            api_base: cfg.cryptopay_network.api_base().to_string(),
            asset: cfg.cryptopay_asset.clone(),
            fiat: cfg.cryptopay_fiat.clone(),
            timeout: cfg.cryptopay_timeout,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CryptoPayClient {
    cfg: CryptoPayConfig,
    http: reqwest::Client,
}

#[derive(Debug, PartialEq, Serialize)]
struct CreateInvoiceBody {
    currency_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    asset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fiat: Option<String>,
    amount: String,
    description: String,
    payload: String,
}

#[derive(Debug, Serialize)]
struct InvoicePayload<'a> {
    user_id: i64,
    quantity: f64,
    sale_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<InvoiceResult>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct InvoiceResult {
    bot_invoice_url: Option<String>,
    pay_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<i64>,
    name: Option<String>,
}

impl CryptoPayClient {
    pub fn new(cfg: CryptoPayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| Error::External(format!("cryptopay client build error: {e}")))?;
        Ok(Self { cfg, http })
    }

    fn invoice_body(&self, req: &InvoiceRequest) -> Result<CreateInvoiceBody> {
        let payload = serde_json::to_string(&InvoicePayload {
            user_id: req.user_id.0,
            quantity: req.quantity,
            sale_mode: req.sale_mode.as_str(),
        })?;

        let (currency_type, asset, fiat) = match &self.cfg.fiat {
            Some(fiat) => ("fiat", None, Some(fiat.clone())),
            None => ("crypto", Some(self.cfg.asset.clone()), None),
        };

        Ok(CreateInvoiceBody {
            currency_type,
            asset,
            fiat,
            amount: format_number(req.amount),
            description: req.description.chars().take(MAX_DESCRIPTION_CHARS).collect(),
            payload,
        })
    }

    async fn try_create_invoice(&self, token: &str, req: &InvoiceRequest) -> Result<String> {
        let body = self.invoice_body(req)?;

        let resp = self
            .http
            .post(format!("{}/createInvoice", self.cfg.api_base))
            .header("Crypto-Pay-API-Token", token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("cryptopay request error: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("cryptopay read error: {e}")))?;

        let parsed: ApiResponse = serde_json::from_str(&text).map_err(|e| {
            Error::External(format!(
                "cryptopay {status}: unexpected body ({e}): {}",
                text.chars().take(200).collect::<String>()
            ))
        })?;

        invoice_url(parsed)
    }
}

fn invoice_url(resp: ApiResponse) -> Result<String> {
    if !resp.ok {
        let (code, name) = resp
            .error
            .map(|e| (e.code.unwrap_or_default(), e.name.unwrap_or_default()))
            .unwrap_or_default();
        return Err(Error::External(format!(
            "cryptopay createInvoice failed: {code} {name}"
        )));
    }

    resp.result
        .and_then(|r| r.bot_invoice_url.or(r.pay_url))
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| Error::External("cryptopay invoice has no payment url".to_string()))
}

#[async_trait]
impl PaymentGateway for CryptoPayClient {
    fn configured(&self) -> bool {
        self.cfg
            .token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }

    async fn create_invoice(&self, req: &InvoiceRequest) -> Option<String> {
        let Some(token) = self.cfg.token.as_deref().filter(|t| !t.trim().is_empty()) else {
            tracing::warn!("cryptopay token missing; invoice not created");
            return None;
        };

        match self.try_create_invoice(token, req).await {
            Ok(url) => {
                tracing::info!(
                    user_id = req.user_id.0,
                    sale_mode = req.sale_mode.as_str(),
                    "cryptopay invoice created"
                );
                Some(url)
            }
            Err(e) => {
                tracing::error!(user_id = req.user_id.0, "cryptopay invoice failed: {e}");
                None
            }
        }
    }
}
