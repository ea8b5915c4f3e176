//! Structural validation of inbound order payloads
//!
//! The pipeline stores payloads verbatim, so validation only probes the
//! structure it depends on: well-formed JSON, a usable `order_uid`, and
//! the three top-level sections every order document carries. Section
//! contents are not inspected.
//!
//! The presence rules are asymmetric on purpose: `delivery` and
//! `payment` must exist (an empty object passes), while `items` must
//! exist AND be non-empty: an order without a single line item is not
//! an order. Absence of nested structure is a hard error; emptiness of
//! its contents is not, except for the list.

use serde::Deserialize;
use serde_json::value::RawValue;
use thiserror::Error;
use types::ids::OrderUid;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("order_uid is missing or empty")]
    MissingIdentifier,

    #[error("missing required sections: delivery, payment and a non-empty items list")]
    MissingRequiredSections,
}

// ── Validation ──────────────────────────────────────────────────────

/// Minimal structural probe over the payload.
///
/// `RawValue` keeps section contents opaque; explicit JSON `null`
/// decodes to `None` exactly like an absent field.
#[derive(Deserialize)]
struct OrderProbe<'a> {
    #[serde(default)]
    order_uid: Option<String>,
    #[serde(default, borrow)]
    delivery: Option<&'a RawValue>,
    #[serde(default, borrow)]
    payment: Option<&'a RawValue>,
    #[serde(default, borrow)]
    items: Option<Vec<&'a RawValue>>,
}

/// Check an incoming payload and extract its order identifier.
///
/// Pure function over the bytes; no side effects.
pub fn validate(payload: &[u8]) -> Result<OrderUid, ValidationError> {
    let probe: OrderProbe<'_> = serde_json::from_slice(payload)
        .map_err(|err| ValidationError::MalformedPayload(err.to_string()))?;

    let uid = probe
        .order_uid
        .and_then(OrderUid::try_new)
        .ok_or(ValidationError::MissingIdentifier)?;

    let has_delivery = probe.delivery.is_some();
    let has_payment = probe.payment.is_some();
    let has_items = probe.items.as_ref().is_some_and(|items| !items.is_empty());
    if !has_delivery || !has_payment || !has_items {
        return Err(ValidationError::MissingRequiredSections);
    }

    Ok(uid)
}
