use serde::Serialize;

use crate::{domain::UserId, errors::Error, Result};

/// Callback data prefix routed to the payment-link flow.
pub const PAY_CRYPTO_PREFIX: &str = "pay_crypto:";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleMode {
    #[default]
    Subscription,
    Traffic,
}

impl SaleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SaleMode::Subscription => "subscription",
            SaleMode::Traffic => "traffic",
        }
    }

    /// Case-insensitive; an empty tag means the default mode.
    fn parse(tag: &str) -> Result<Self> {
        match tag.trim().to_lowercase().as_str() {
            "" | "subscription" => Ok(SaleMode::Subscription),
            "traffic" => Ok(SaleMode::Traffic),
            other => Err(Error::Payload(format!("unknown sale mode {other:?}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaymentRequest {
    pub user_id: UserId,
    pub quantity: f64,
    pub price_amount: f64,
    pub sale_mode: SaleMode,
}

impl PaymentRequest {
    /// Parse `<tag>:<quantity>:<price>[:<sale_mode>]`.
    ///
    /// Trailing fields past the sale mode are ignored.
    pub fn parse(data: &str, user_id: UserId) -> Result<Self> {
        let Some((_, payload)) = data.split_once(':') else {
            return Err(Error::Payload(format!("missing ':' in {data:?}")));
        };

        let mut parts = payload.split(':');
        let quantity = parse_number(parts.next(), "quantity")?;
        let price_amount = parse_number(parts.next(), "price")?;
        let sale_mode = match parts.next() {
            Some(tag) => SaleMode::parse(tag)?,
            None => SaleMode::default(),
        };

        Ok(Self {
            user_id,
            quantity,
            price_amount,
            sale_mode,
        })
    }

    /// Quantity as shown to users: `3` for whole numbers, `2.5` otherwise.
    pub fn human_quantity(&self) -> String {
        format_number(self.quantity)
    }

    /// Whole billing periods, for the subscription templates.
    pub fn months(&self) -> i64 {
        self.quantity.trunc() as i64
    }
}

pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn parse_number(field: Option<&str>, name: &str) -> Result<f64> {
    let raw = field.ok_or_else(|| Error::Payload(format!("missing {name}")))?;
    let v = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| Error::Payload(format!("invalid {name} {raw:?}: {e}")))?;
    if !v.is_finite() || v <= 0.0 {
        return Err(Error::Payload(format!(
            "{name} must be a positive number, got {raw:?}"
        )));
    }
    Ok(v)
}
