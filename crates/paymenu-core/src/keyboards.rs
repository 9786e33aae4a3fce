use crate::{
    i18n::Translator,
    messaging::types::{InlineButton, InlineKeyboard},
};

/// "Pay" link button plus a "back" button returning to the previous step.
pub fn payment_url_keyboard(
    payment_url: &str,
    translator: &dyn Translator,
    lang: &str,
    back_callback: &str,
    back_text_key: &str,
) -> InlineKeyboard {
    InlineKeyboard::one_per_row(vec![
        InlineButton::url(
            translator.gettext(lang, "pay_with_crypto_button", &[]),
            payment_url,
        ),
        InlineButton::callback(translator.gettext(lang, back_text_key, &[]), back_callback),
    ])
}
