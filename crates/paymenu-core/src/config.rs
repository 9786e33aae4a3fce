use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, messaging::throttled::ThrottleConfig, Result};

/// Crypto Pay API deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CryptoPayNetwork {
    Mainnet,
    Testnet,
}

impl CryptoPayNetwork {
    pub fn api_base(self) -> &'static str {
        match self {
            CryptoPayNetwork::Mainnet => "https://pay.crypt.bot/api",
            CryptoPayNetwork::Testnet => "https://testnet-pay.crypt.bot/api",
        }
    }
}

/// Typed configuration, read from the environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,

    // Menus
    pub menu_images_root: PathBuf,
    pub main_menu_image: String,
    pub payment_menu_image: String,

    // Localization
    pub locales_dir: PathBuf,
    pub default_language: String,
    pub default_currency_symbol: String,

    // Crypto Pay
    pub cryptopay_token: Option<String>,
    pub cryptopay_network: CryptoPayNetwork,
    pub cryptopay_asset: String,
    pub cryptopay_fiat: Option<String>,
    pub cryptopay_timeout: Duration,

    // Outbound throttling
    pub throttle: ThrottleConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"))?;

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let menu_images_root =
            env_path("MENU_IMAGES_ROOT").unwrap_or_else(|| PathBuf::from("/app/bot/static/images"));
        let main_menu_image = env_str("MAIN_MENU_IMAGE")
            .and_then(non_empty)
            .unwrap_or_else(|| "menu_main.png".to_string());
        let payment_menu_image = env_str("PAYMENT_MENU_IMAGE")
            .and_then(non_empty)
            .unwrap_or_else(|| "menu_subscribe.png".to_string());

        let locales_dir = env_path("LOCALES_DIR").unwrap_or_else(|| PathBuf::from("locales"));
        let default_language = env_str("DEFAULT_LANGUAGE")
            .and_then(non_empty)
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| "en".to_string());
        let default_currency_symbol = env_str("DEFAULT_CURRENCY_SYMBOL")
            .and_then(non_empty)
            .unwrap_or_else(|| "RUB".to_string());

        let cryptopay_token = env_str("CRYPTOPAY_TOKEN").and_then(non_empty);
        let cryptopay_network = match env_str("CRYPTOPAY_NETWORK") {
            None => CryptoPayNetwork::Mainnet,
            Some(raw) => parse_network(&raw)?,
        };
        let cryptopay_asset = env_str("CRYPTOPAY_ASSET")
            .and_then(non_empty)
            .map(|s| s.trim().to_uppercase())
            .unwrap_or_else(|| "USDT".to_string());
        let cryptopay_fiat = env_str("CRYPTOPAY_FIAT")
            .and_then(non_empty)
            .map(|s| s.trim().to_uppercase());
        let cryptopay_timeout = Duration::from_secs(env_u64("CRYPTOPAY_TIMEOUT_SECS").unwrap_or(10));

        let defaults = ThrottleConfig::default();
        let throttle = ThrottleConfig {
            global_min_interval: env_u64("THROTTLE_GLOBAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.global_min_interval),
            per_chat_min_interval: env_u64("THROTTLE_PER_CHAT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.per_chat_min_interval),
        };

        Ok(Self {
            telegram_bot_token,
            menu_images_root,
            main_menu_image,
            payment_menu_image,
            locales_dir,
            default_language,
            default_currency_symbol,
            cryptopay_token,
            cryptopay_network,
            cryptopay_asset,
            cryptopay_fiat,
            cryptopay_timeout,
            throttle,
        })
    }
}

fn parse_network(raw: &str) -> Result<CryptoPayNetwork> {
    match raw.trim().to_lowercase().as_str() {
        "" | "mainnet" | "main" => Ok(CryptoPayNetwork::Mainnet),
        "testnet" | "test" => Ok(CryptoPayNetwork::Testnet),
        other => Err(Error::Config(format!(
            "CRYPTOPAY_NETWORK must be mainnet or testnet, got {other:?}"
        ))),
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Variables already set in the environment win over `.env`.
fn load_dotenv_if_present(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(Error::Config(format!("failed to load {}: {e}", path.display()))),
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
