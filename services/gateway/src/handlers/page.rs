//! Order viewer page
//!
//! Server-rendered HTML. Always answers 200: the page hosts the search
//! form whether or not the queried identifier exists, so a miss renders
//! a notice instead of a 404. All interpolated values are escaped.

use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;

use crate::state::AppState;
use types::order::Order;

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub id: String,
}

const STYLE: &str = "\
body{font-family:system-ui,-apple-system,Segoe UI,Roboto,Arial,sans-serif;margin:24px}\
.card{max-width:900px;margin:0 auto;border:1px solid #ddd;border-radius:8px;padding:16px}\
.row{display:flex;gap:24px;flex-wrap:wrap}.col{flex:1;min-width:260px}.muted{color:#666;font-size:.9em}\
pre{background:#f7f7f7;padding:12px;overflow:auto;border-radius:6px}\
input[type=text]{width:420px;padding:8px}button{padding:8px 12px;cursor:pointer}";

/// `GET /orders?id=...`
pub async fn orders_page(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Html<String> {
    let id = query.id.trim();

    let result = if id.is_empty() {
        String::new()
    } else {
        match state.cache.get(id) {
            Some(payload) => {
                // A cached payload passed validation; anything it lacks
                // beyond the probed structure just renders as defaults.
                let order: Order = serde_json::from_slice(&payload).unwrap_or_default();
                let raw = String::from_utf8_lossy(&payload);
                render_order(&order, &raw)
            }
            None => format!(
                "<hr/><div>Order with id <code>{}</code> not found in cache.</div>",
                escape(id)
            ),
        }
    };

    Html(format!(
        "<!doctype html><html lang=\"en\"><head>\
<meta charset=\"utf-8\"/><meta name=\"viewport\" content=\"width=device-width,initial-scale=1\"/>\
<title>Order Viewer</title>\
<style>{STYLE}</style></head><body><div class=\"card\">\
<h2>Order search</h2>\
<form method=\"GET\" action=\"/orders\">\
  <input name=\"id\" type=\"text\" placeholder=\"order_uid\" value=\"{id}\"/>\
  <button type=\"submit\">Show</button>\
  <span class=\"muted\">example: b563feb7b2b84b6test</span>\
</form>\
{result}\
</div></body></html>",
        id = escape(id),
        result = result,
    ))
}

fn render_order(order: &Order, raw: &str) -> String {
    let items: String = order
        .items
        .iter()
        .map(|item| {
            format!(
                "<li>{} ({}) - {} | status {}</li>",
                escape(&item.name),
                escape(&item.brand),
                item.total_price,
                item.status
            )
        })
        .collect();

    format!(
        "<hr/><h3>Order: <code>{uid}</code></h3>\
<div class=\"row\">\
<div class=\"col\"><h4>Delivery</h4>\
<div class=\"muted\">{name}, {phone}</div>\
<div>{address}, {city} {zip}</div>\
<div>{region}</div>\
<div>{email}</div>\
</div>\
<div class=\"col\"><h4>Payment</h4>\
<div>Provider: {provider}</div>\
<div>Currency: {currency}</div>\
<div>Amount: {amount}</div>\
<div>Delivery cost: {delivery_cost}</div>\
<div>Goods total: {goods_total}</div>\
<div class=\"muted\">Transaction: {transaction}</div>\
</div>\
</div>\
<h4>Items ({count})</h4>\
<ul>{items}</ul>\
<details><summary>Show raw JSON</summary><pre>{raw}</pre></details>",
        uid = escape(&order.order_uid),
        name = escape(&order.delivery.name),
        phone = escape(&order.delivery.phone),
        address = escape(&order.delivery.address),
        city = escape(&order.delivery.city),
        zip = escape(&order.delivery.zip),
        region = escape(&order.delivery.region),
        email = escape(&order.delivery.email),
        provider = escape(&order.payment.provider),
        currency = escape(&order.payment.currency),
        amount = order.payment.amount,
        delivery_cost = order.payment.delivery_cost,
        goods_total = order.payment.goods_total,
        transaction = escape(&order.payment.transaction),
        count = order.items.len(),
        items = items,
        raw = escape(raw),
    )
}

/// Minimal HTML entity escaping for interpolated text.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
