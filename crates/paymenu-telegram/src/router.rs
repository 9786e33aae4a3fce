use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use paymenu_core::{
    config::Config,
    i18n::{JsonI18n, Translator},
    images::ImageStore,
    logging::{EventLog, TracingLog},
    messaging::{port::ChatSurface, throttled::ThrottledSurface},
    payments::{
        flow::{PaymentLinkFlow, PaymentSettings},
        gateway::PaymentGateway,
    },
    render::MenuRenderer,
};

use crate::handlers;
use crate::TelegramSurface;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub renderer: MenuRenderer,
    pub payments: PaymentLinkFlow,
    /// Absent when the locale catalogs failed to load.
    pub i18n: Option<Arc<dyn Translator>>,
    pub gateway: Option<Arc<dyn PaymentGateway>>,
}

impl AppState {
    pub fn new(
        cfg: Arc<Config>,
        surface: Arc<dyn ChatSurface>,
        i18n: Option<Arc<dyn Translator>>,
        gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        let log: Arc<dyn EventLog> = Arc::new(TracingLog);
        let renderer = MenuRenderer::new(
            surface,
            ImageStore::new(cfg.menu_images_root.clone()),
            log.clone(),
        );
        let payments = PaymentLinkFlow::new(
            renderer.clone(),
            log,
            PaymentSettings {
                currency_symbol: cfg.default_currency_symbol.clone(),
                menu_image: Some(cfg.payment_menu_image.clone()),
            },
        );
        Self {
            cfg,
            renderer,
            payments,
            i18n,
            gateway,
        }
    }
}

pub async fn run_polling(
    cfg: Arc<Config>,
    gateway: Option<Arc<dyn PaymentGateway>>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "bot started"),
        Err(e) => tracing::warn!("getMe failed: {e}"),
    }
    tracing::info!(images = %cfg.menu_images_root.display(), "menu image root");

    let i18n: Option<Arc<dyn Translator>> =
        match JsonI18n::load(&cfg.locales_dir, &cfg.default_language) {
            Ok(i18n) => Some(Arc::new(i18n)),
            Err(e) => {
                tracing::error!(
                    dir = %cfg.locales_dir.display(),
                    "failed to load locales: {e}"
                );
                None
            }
        };

    if !gateway.as_ref().map(|g| g.configured()).unwrap_or(false) {
        tracing::warn!("crypto payments are not configured; pay buttons will show an alert");
    }

    // Throttle outbound calls so rapid menu taps don't trip Telegram's flood limits.
    let raw: Arc<dyn ChatSurface> = Arc::new(TelegramSurface::new(bot.clone()));
    let surface: Arc<dyn ChatSurface> = Arc::new(ThrottledSurface::new(raw, cfg.throttle));

    let state = Arc::new(AppState::new(cfg, surface, i18n, gateway));

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
