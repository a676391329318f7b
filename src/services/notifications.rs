use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::errors::ServiceError;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// One rendered line of an order confirmation.
#[derive(Debug, Clone)]
pub struct ConfirmationLine {
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Sends transactional email through the Resend HTTP API.
///
/// Construction never fails: without an API key the mailer is disabled and
/// every send is a logged no-op, so local and test environments need no
/// mail configuration.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_key: Option<String>,
    from: String,
}

impl Mailer {
    pub fn new(api_key: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends the order confirmation email. Callers invoke this outside the
    /// order transaction; a failure here never affects the placed order.
    #[instrument(skip(self, lines), fields(order_id = order_id, to = %to))]
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        customer_name: &str,
        order_id: i32,
        lines: &[ConfirmationLine],
        total_amount: Decimal,
        address: &str,
    ) -> Result<(), ServiceError> {
        let Some(api_key) = &self.api_key else {
            debug!("Mailer disabled; skipping order confirmation");
            return Ok(());
        };

        let html = render_confirmation(customer_name, order_id, lines, total_amount, address);

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(api_key)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": format!("Order #{} confirmed", order_id),
                "html": html,
            }))
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("Mail delivery: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::ExternalServiceError(format!(
                "Mail delivery: {} {}",
                status, body
            )));
        }

        info!("Order confirmation sent");
        Ok(())
    }
}

fn render_confirmation(
    customer_name: &str,
    order_id: i32,
    lines: &[ConfirmationLine],
    total_amount: Decimal,
    address: &str,
) -> String {
    let rows: String = lines
        .iter()
        .map(|line| {
            format!(
                "<tr>\
                 <td style=\"padding:6px 12px;border-bottom:1px solid #eee\">{}</td>\
                 <td style=\"padding:6px 12px;border-bottom:1px solid #eee;text-align:center\">{}</td>\
                 <td style=\"padding:6px 12px;border-bottom:1px solid #eee;text-align:right\">{:.2}</td>\
                 </tr>",
                escape_html(&line.product_name),
                line.quantity,
                line.unit_price * Decimal::from(line.quantity)
            )
        })
        .collect();

    format!(
        "<div style=\"font-family:Arial,sans-serif;max-width:560px;margin:0 auto;color:#333\">\
         <h2>Order #{order_id} confirmed</h2>\
         <p>Hello, <strong>{name}</strong>,</p>\
         <p>Your order was received successfully. We will contact you about delivery.</p>\
         <table style=\"width:100%;border-collapse:collapse;margin:20px 0\">\
         <thead><tr style=\"background:#f5f5f5\">\
         <th style=\"padding:8px 12px;text-align:left\">Product</th>\
         <th style=\"padding:8px 12px;text-align:center\">Qty</th>\
         <th style=\"padding:8px 12px;text-align:right\">Amount</th>\
         </tr></thead>\
         <tbody>{rows}</tbody>\
         <tfoot><tr>\
         <td colspan=\"2\" style=\"padding:10px 12px;font-weight:bold;text-align:right\">Total:</td>\
         <td style=\"padding:10px 12px;font-weight:bold;text-align:right\">{total:.2}</td>\
         </tr></tfoot>\
         </table>\
         <p><strong>Delivery address:</strong> {address}</p>\
         </div>",
        order_id = order_id,
        name = escape_html(customer_name),
        rows = rows,
        total = total_amount,
        address = escape_html(address),
    )
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn disabled_mailer_is_a_noop() {
        let mailer = Mailer::new(None, "Shop <noreply@example.com>".to_string());
        assert!(!mailer.is_enabled());

        let result = mailer
            .send_order_confirmation(
                "customer@example.com",
                "Iva",
                1,
                &[],
                dec!(10.00),
                "1 Main St",
            )
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn confirmation_renders_line_totals_and_escapes_markup() {
        let lines = vec![ConfirmationLine {
            product_name: "Rose <Noir>".to_string(),
            unit_price: dec!(15.50),
            quantity: 2,
        }];

        let html = render_confirmation("Iva & Co", 7, &lines, dec!(31.00), "1 Main St");

        assert!(html.contains("Order #7 confirmed"));
        assert!(html.contains("Rose &lt;Noir&gt;"));
        assert!(html.contains("Iva &amp; Co"));
        assert!(html.contains("31.00"));
    }
}
