use std::sync::Arc;

use tracing::Level;

use crate::{
    i18n::Translator,
    keyboards::payment_url_keyboard,
    logging::EventLog,
    messaging::types::CallbackInteraction,
    payments::{
        gateway::{InvoiceRequest, PaymentGateway},
        request::{format_number, PaymentRequest, SaleMode},
    },
    render::{MenuContent, MenuRenderer},
};

#[derive(Clone, Debug)]
pub struct PaymentSettings {
    pub currency_symbol: String,
    /// Background image for the confirmation menu.
    pub menu_image: Option<String>,
}

/// Turns a `pay_crypto:` button press into a payment link shown in place of
/// the menu the button was on.
#[derive(Clone)]
pub struct PaymentLinkFlow {
    renderer: MenuRenderer,
    log: Arc<dyn EventLog>,
    settings: PaymentSettings,
}

impl PaymentLinkFlow {
    pub fn new(renderer: MenuRenderer, log: Arc<dyn EventLog>, settings: PaymentSettings) -> Self {
        Self {
            renderer,
            log,
            settings,
        }
    }

    /// Handle one payment request. Every outcome ends in a callback answer;
    /// nothing is returned to the caller.
    pub async fn handle_payment_request(
        &self,
        cb: &CallbackInteraction,
        i18n: Option<&dyn Translator>,
        gateway: Option<&dyn PaymentGateway>,
    ) {
        let lang = i18n
            .map(|t| t.resolve_language(cb.language_code.as_deref()))
            .unwrap_or_default();
        let get_text = |key: &str, args: &[(&str, String)]| match i18n {
            Some(t) => t.gettext(&lang, key, args),
            None => key.to_string(),
        };

        let (Some(i18n), Some(message)) = (i18n, cb.message) else {
            self.answer(cb, Some(&get_text("error_occurred_try_again", &[])), true)
                .await;
            return;
        };

        let Some(gateway) = gateway.filter(|g| g.configured()) else {
            self.answer(
                cb,
                Some(&get_text("payment_service_unavailable_alert", &[])),
                true,
            )
            .await;
            return;
        };

        let req = match PaymentRequest::parse(&cb.data, cb.user_id) {
            Ok(req) => req,
            Err(e) => {
                self.log.record(
                    Level::WARN,
                    &format!("Rejected payment payload from user {}: {e}", cb.user_id.0),
                );
                self.answer(cb, Some(&get_text("error_try_again", &[])), true)
                    .await;
                return;
            }
        };

        let human_value = req.human_quantity();
        let description = match req.sale_mode {
            SaleMode::Traffic => get_text(
                "payment_description_traffic",
                &[("traffic_gb", human_value.clone())],
            ),
            SaleMode::Subscription => get_text(
                "payment_description_subscription",
                &[("months", req.months().to_string())],
            ),
        };

        let invoice_url = gateway
            .create_invoice(&InvoiceRequest {
                user_id: req.user_id,
                quantity: req.quantity,
                amount: req.price_amount,
                description,
                sale_mode: req.sale_mode,
            })
            .await;

        let Some(invoice_url) = invoice_url else {
            self.answer(cb, Some(&get_text("error_payment_gateway", &[])), true)
                .await;
            return;
        };

        self.log.record(
            Level::INFO,
            &format!(
                "Payment link issued for user {} ({} x{})",
                req.user_id.0,
                req.sale_mode.as_str(),
                human_value
            ),
        );

        let template = match req.sale_mode {
            SaleMode::Traffic => "payment_link_message_traffic",
            SaleMode::Subscription => "payment_link_message",
        };
        let text = get_text(
            template,
            &[
                ("months", req.months().to_string()),
                ("traffic_gb", human_value.clone()),
                ("price", format_number(req.price_amount)),
                ("currency_symbol", self.settings.currency_symbol.clone()),
            ],
        );
        let controls = payment_url_keyboard(
            &invoice_url,
            i18n,
            &lang,
            &format!("subscribe_period:{human_value}"),
            "back_to_payment_methods_button",
        );

        let mut content = MenuContent::new(text).with_controls(controls);
        if let Some(image) = &self.settings.menu_image {
            content = content.with_image(image.clone());
        }

        if self.renderer.try_update(message, &content).await.is_err() {
            // Already logged by the renderer; a second failure is dropped too.
            let _ = self.renderer.try_send(message.msg.chat_id, &content).await;
        }

        self.answer(cb, None, false).await;
    }

    async fn answer(&self, cb: &CallbackInteraction, text: Option<&str>, show_alert: bool) {
        if let Err(e) = self
            .renderer
            .surface()
            .answer_interaction(&cb.callback_id, text, show_alert)
            .await
        {
            self.log.record(
                Level::DEBUG,
                &format!("Failed to answer callback {}: {e}", cb.callback_id),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::{ChatId, ExistingMessage, MessageId, MessageRef, UserId};
    use crate::i18n::JsonI18n;
    use crate::images::ImageStore;
    use crate::logging::RecordingLog;
    use crate::messaging::types::ButtonAction;
    use crate::testing::{FakeGateway, FakeSurface, Op, Reply, TempImages};

    struct Harness {
        surface: Arc<FakeSurface>,
        flow: PaymentLinkFlow,
        i18n: JsonI18n,
        _images: TempImages,
    }

    fn harness(tag: &str) -> Harness {
        let images = TempImages::new(tag);
        let surface = Arc::new(FakeSurface::new());
        let log = Arc::new(RecordingLog::new());
        let renderer = MenuRenderer::new(surface.clone(), ImageStore::new(&images.root), log.clone());
        let flow = PaymentLinkFlow::new(
            renderer,
            log,
            PaymentSettings {
                currency_symbol: "RUB".to_string(),
                menu_image: Some("menu_subscribe.png".to_string()),
            },
        );

        let en = HashMap::from([
            (
                "payment_description_subscription".to_string(),
                "Subscription for {months} months".to_string(),
            ),
            (
                "payment_description_traffic".to_string(),
                "Traffic package {traffic_gb} GB".to_string(),
            ),
            (
                "payment_link_message".to_string(),
                "Pay {price} {currency_symbol} for {months} months".to_string(),
            ),
            (
                "payment_link_message_traffic".to_string(),
                "Pay {price} {currency_symbol} for {traffic_gb} GB".to_string(),
            ),
            ("error_payment_gateway".to_string(), "Gateway error".to_string()),
        ]);
        let i18n = JsonI18n::new("en", HashMap::from([("en".to_string(), en)]));

        Harness {
            surface,
            flow,
            i18n,
            _images: images,
        }
    }

    fn callback(data: &str, has_message: bool) -> CallbackInteraction {
        CallbackInteraction {
            callback_id: "cb-1".to_string(),
            user_id: UserId(77),
            language_code: Some("en-US".to_string()),
            data: data.to_string(),
            message: has_message.then_some(ExistingMessage {
                msg: MessageRef {
                    chat_id: ChatId(77),
                    message_id: MessageId(10),
                },
                has_photo: false,
            }),
        }
    }

    fn last_answer(surface: &FakeSurface) -> (Option<String>, bool) {
        let answers: Vec<_> = surface
            .calls()
            .into_iter()
            .filter(|c| c.op == Op::Answer)
            .collect();
        assert_eq!(answers.len(), 1, "exactly one callback answer expected");
        (answers[0].text.clone(), answers[0].show_alert)
    }

    #[tokio::test]
    async fn happy_path_renders_link_in_place() {
        let h = harness("flow-ok");
        let gw = FakeGateway::returning(Some("https://t.me/CryptoBot?start=IV1"));

        h.flow
            .handle_payment_request(&callback("pay_crypto:3:9.99", true), Some(&h.i18n), Some(&gw))
            .await;

        let invoices = gw.invoices();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].user_id, UserId(77));
        assert_eq!(invoices[0].amount, 9.99);
        assert_eq!(invoices[0].description, "Subscription for 3 months");
        assert_eq!(invoices[0].sale_mode, SaleMode::Subscription);

        let calls = h.surface.calls();
        assert_eq!(h.surface.ops(), vec![Op::EditText, Op::Answer]);
        assert_eq!(calls[0].text.as_deref(), Some("Pay 9.99 RUB for 3 months"));
        let kb = calls[0].controls.clone().unwrap();
        assert_eq!(
            kb.rows[0][0].action,
            ButtonAction::Url("https://t.me/CryptoBot?start=IV1".to_string())
        );
        assert_eq!(
            kb.rows[1][0].action,
            ButtonAction::Callback("subscribe_period:3".to_string())
        );
        assert_eq!(last_answer(&h.surface), (None, false));
    }

    #[tokio::test]
    async fn traffic_mode_uses_traffic_templates() {
        let h = harness("flow-traffic");
        let gw = FakeGateway::returning(Some("https://pay.example/1"));

        h.flow
            .handle_payment_request(
                &callback("pay_crypto:10:5:traffic", true),
                Some(&h.i18n),
                Some(&gw),
            )
            .await;

        assert_eq!(gw.invoices()[0].description, "Traffic package 10 GB");
        assert_eq!(gw.invoices()[0].sale_mode, SaleMode::Traffic);
        assert_eq!(
            h.surface.calls()[0].text.as_deref(),
            Some("Pay 5 RUB for 10 GB")
        );
    }

    #[tokio::test]
    async fn missing_i18n_or_message_alerts_generic_error() {
        let h = harness("flow-no-i18n");
        let gw = FakeGateway::returning(Some("https://pay.example/1"));

        h.flow
            .handle_payment_request(&callback("pay_crypto:3:9.99", true), None, Some(&gw))
            .await;
        assert_eq!(
            last_answer(&h.surface),
            (Some("error_occurred_try_again".to_string()), true)
        );

        let h = harness("flow-no-msg");
        h.flow
            .handle_payment_request(&callback("pay_crypto:3:9.99", false), Some(&h.i18n), Some(&gw))
            .await;
        assert_eq!(h.surface.ops(), vec![Op::Answer]);
        assert!(gw.invoices().is_empty());
    }

    #[tokio::test]
    async fn unconfigured_gateway_never_creates_invoice() {
        let h = harness("flow-unconfigured");
        let gw = FakeGateway::unconfigured();

        h.flow
            .handle_payment_request(&callback("pay_crypto:3:9.99", true), Some(&h.i18n), Some(&gw))
            .await;

        assert!(gw.invoices().is_empty());
        assert_eq!(
            last_answer(&h.surface),
            (Some("payment_service_unavailable_alert".to_string()), true)
        );

        let h = harness("flow-no-gateway");
        h.flow
            .handle_payment_request(&callback("pay_crypto:3:9.99", true), Some(&h.i18n), None)
            .await;
        assert_eq!(
            last_answer(&h.surface),
            (Some("payment_service_unavailable_alert".to_string()), true)
        );
    }

    #[tokio::test]
    async fn malformed_payload_alerts_retry_without_gateway_call() {
        let h = harness("flow-bad-payload");
        let gw = FakeGateway::returning(Some("https://pay.example/1"));

        h.flow
            .handle_payment_request(&callback("pay_crypto:abc", true), Some(&h.i18n), Some(&gw))
            .await;

        assert!(gw.invoices().is_empty());
        assert_eq!(h.surface.ops(), vec![Op::Answer]);
        assert_eq!(
            last_answer(&h.surface),
            (Some("error_try_again".to_string()), true)
        );
    }

    #[tokio::test]
    async fn non_positive_amounts_never_reach_the_gateway() {
        for data in ["pay_crypto:-3:-1", "pay_crypto:0:0", "pay_crypto:3:0"] {
            let h = harness("flow-non-positive");
            let gw = FakeGateway::returning(Some("https://pay.example/1"));

            h.flow
                .handle_payment_request(&callback(data, true), Some(&h.i18n), Some(&gw))
                .await;

            assert!(gw.invoices().is_empty(), "{data}");
            assert_eq!(h.surface.ops(), vec![Op::Answer]);
            assert_eq!(
                last_answer(&h.surface),
                (Some("error_try_again".to_string()), true)
            );
        }
    }

    #[tokio::test]
    async fn gateway_without_url_alerts_and_skips_render() {
        let h = harness("flow-no-url");
        let gw = FakeGateway::returning(None);

        h.flow
            .handle_payment_request(&callback("pay_crypto:3:9.99", true), Some(&h.i18n), Some(&gw))
            .await;

        assert_eq!(gw.invoices().len(), 1);
        assert_eq!(h.surface.ops(), vec![Op::Answer]);
        assert_eq!(
            last_answer(&h.surface),
            (Some("Gateway error".to_string()), true)
        );
    }

    #[tokio::test]
    async fn failed_update_falls_back_to_send_once() {
        let h = harness("flow-fallback");
        let gw = FakeGateway::returning(Some("https://pay.example/1"));
        h.surface.script(Op::EditText, &[Reply::Transport]);
        h.surface.script(Op::SendText, &[Reply::Transport]);

        h.flow
            .handle_payment_request(&callback("pay_crypto:3:9.99", true), Some(&h.i18n), Some(&gw))
            .await;

        assert_eq!(
            h.surface.ops(),
            vec![Op::EditText, Op::SendText, Op::Answer]
        );
        let calls = h.surface.calls();
        assert_eq!(calls[0].text, calls[1].text);
        assert_eq!(calls[0].controls, calls[1].controls);
        assert_eq!(last_answer(&h.surface), (None, false));
    }

    #[tokio::test]
    async fn answer_failure_is_swallowed() {
        let h = harness("flow-answer-fails");
        let gw = FakeGateway::returning(None);
        h.surface.script(Op::Answer, &[Reply::Transport]);

        h.flow
            .handle_payment_request(&callback("pay_crypto:3:9.99", true), Some(&h.i18n), Some(&gw))
            .await;

        assert_eq!(h.surface.count(Op::Answer), 1);
    }
}
