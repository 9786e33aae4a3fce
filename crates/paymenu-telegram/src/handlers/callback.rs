use std::sync::Arc;

use teloxide::prelude::*;

use paymenu_core::payments::request::PAY_CRYPTO_PREFIX;

use crate::handlers::callback_interaction;
use crate::router::AppState;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb = callback_interaction(&q);

    if cb.data.starts_with(PAY_CRYPTO_PREFIX) {
        tracing::debug!(user_id = cb.user_id.0, data = %cb.data, "payment callback");
        state
            .payments
            .handle_payment_request(&cb, state.i18n.as_deref(), state.gateway.as_deref())
            .await;
        return Ok(());
    }

    // Other menus are routed elsewhere; always answer so the client stops spinning.
    tracing::debug!(data = %cb.data, "unhandled callback");
    if let Err(e) = bot.answer_callback_query(cb.callback_id).await {
        tracing::debug!("failed to answer callback: {e}");
    }
    Ok(())
}
