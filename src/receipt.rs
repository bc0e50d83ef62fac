//! Printable order receipt.
//!
//! Renders an order into a self-contained HTML document sized for a narrow
//! print dialog. Callers hand the string to a webview or browser window;
//! nothing here talks to a printer.

use chrono::{TimeZone, Utc};

use crate::lifecycle::short_reference;
use crate::model::{CartItem, Order};

/// Store identity printed on every receipt.
#[derive(Debug, Clone)]
pub struct ReceiptBranding {
    pub store_name: String,
    pub tagline: Option<String>,
    pub footer_text: Option<String>,
}

impl Default for ReceiptBranding {
    fn default() -> Self {
        Self {
            store_name: "The Small Storefront".to_string(),
            tagline: None,
            footer_text: Some("Thank you for your order!".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn format_timestamp(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(stamp) => stamp.format("%Y-%m-%d %H:%M").to_string(),
        None => ms.to_string(),
    }
}

fn html_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<title>{}</title>
<style>
body {{ font-family: ui-monospace, SFMono-Regular, Menlo, monospace; width: 300px; margin: 0 auto; padding: 12px; background: #fff; color: #111; }}
.line {{ display: flex; justify-content: space-between; gap: 8px; font-size: 11px; }}
.line strong {{ font-size: 13px; }}
.section {{ margin-top: 8px; border-top: 1px dashed #111; padding-top: 6px; }}
.section h3 {{ margin: 0 0 4px 0; font-size: 11px; text-transform: uppercase; }}
.note {{ color: #666; font-size: 10px; }}
.center {{ text-align: center; }}
.title {{ font-size: 16px; }}
@media print {{ @page {{ margin: 0; }} body {{ margin: 1cm auto; }} }}
</style>
</head>
<body>{}</body>
</html>"#,
        esc(title),
        body
    )
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn append_cart_line(body: &mut String, line: &CartItem) {
    body.push_str(&format!(
        "<div class=\"line\"><span>{}x {}</span><span>{}</span></div>",
        line.quantity,
        esc(&line.menu_item.name),
        money(line.line_total())
    ));
    if !line.selected_extras.is_empty() {
        let extras: Vec<String> = line
            .selected_extras
            .iter()
            .map(|extra| esc(&extra.name))
            .collect();
        body.push_str(&format!(
            "<div class=\"note\">+ {}</div>",
            extras.join(", ")
        ));
    }
    let notes = line.special_notes.trim();
    if !notes.is_empty() {
        body.push_str(&format!("<div class=\"note\">{}</div>", esc(notes)));
    }
}

/// Render an order receipt. `delivery_fee` comes from the current store
/// settings; the order itself carries only the item subtotal.
pub fn render_order_receipt(order: &Order, delivery_fee: f64, branding: &ReceiptBranding) -> String {
    let reference = short_reference(&order.id);

    let mut body = format!(
        "<div class=\"center title\"><strong>{}</strong></div>",
        esc(&branding.store_name)
    );
    if let Some(tagline) = branding
        .tagline
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        body.push_str(&format!("<div class=\"center note\">{}</div>", esc(tagline)));
    }
    body.push_str(&format!("<div class=\"center\">{}</div>", esc(&reference)));

    body.push_str(&format!(
        "<div class=\"section\">\
         <div class=\"line\"><span>Customer</span><span>{}</span></div>\
         <div class=\"line\"><span>Phone</span><span>{}</span></div>\
         <div class=\"line\"><span>Address</span><span>{}</span></div>\
         <div class=\"line\"><span>Date</span><span>{}</span></div>\
         </div>",
        esc(&order.customer_name),
        esc(&order.customer_phone),
        esc(&order.customer_address),
        format_timestamp(order.created_at)
    ));

    body.push_str("<div class=\"section\"><h3>Items</h3>");
    if order.items.is_empty() {
        body.push_str("<div class=\"note\">No items</div>");
    } else {
        for line in &order.items {
            append_cart_line(&mut body, line);
        }
    }
    body.push_str("</div>");

    body.push_str(&format!(
        "<div class=\"section\">\
         <div class=\"line\"><span>Subtotal</span><span>{}</span></div>\
         <div class=\"line\"><span>Delivery fee</span><span>{}</span></div>\
         <div class=\"line\"><strong>Total</strong><strong>{}</strong></div>\
         <div class=\"line\"><span>Payment</span><span>{}</span></div>",
        money(order.total),
        money(delivery_fee),
        money(order.total + delivery_fee),
        esc(order.payment_method.label())
    ));
    if order.receipt_image.is_some() {
        body.push_str("<div class=\"note\">Transfer receipt attached</div>");
    }
    body.push_str("</div>");

    if let Some(footer) = branding
        .footer_text
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        body.push_str(&format!(
            "<div class=\"section center note\">{}</div>",
            esc(footer)
        ));
    }

    html_shell(&format!("Order {reference}"), &body)
}

// ===========================================================================
// Tests
// ===========================================================================
