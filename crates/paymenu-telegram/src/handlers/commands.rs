use std::sync::Arc;

use teloxide::prelude::*;

use paymenu_core::{messaging::types::Interaction, render::MenuContent};

use crate::handlers::incoming_message;
use crate::router::AppState;

pub async fn handle_command(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let cmd = command_name(msg.text().unwrap_or(""));
    match cmd {
        "/start" | "/menu" => show_main_menu(&msg, &state).await,
        _ => tracing::debug!(cmd, "ignoring unknown command"),
    }
    Ok(())
}

/// `/start@my_bot payload` -> `/start`.
fn command_name(text: &str) -> &str {
    let first = text.split_whitespace().next().unwrap_or("");
    first.split('@').next().unwrap_or("")
}

async fn show_main_menu(msg: &Message, state: &AppState) {
    let interaction = Interaction::Message(incoming_message(msg));
    let text = match &state.i18n {
        Some(i18n) => {
            let lang = i18n.resolve_language(interaction.language_code());
            i18n.gettext(&lang, "main_menu_text", &[])
        }
        None => "main_menu_text".to_string(),
    };

    let content = MenuContent::new(text).with_image(state.cfg.main_menu_image.clone());
    let image_used = state
        .renderer
        .render_interaction(&interaction, &content)
        .await
        .image_used();
    tracing::debug!(chat_id = msg.chat.id.0, image_used, "main menu rendered");
}
