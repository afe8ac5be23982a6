//! Normalization of raw store documents into typed transactions.
//!
//! Normalization is a total function: every canonical attribute has an
//! ordered list of candidate field names and a defined fallback, so a
//! malformed document never becomes a request error.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::storage::RawRecord;

/// Candidate field names per canonical attribute, resolved first-present.
/// The later names are legacy aliases still found in older documents.
const AMOUNT_FIELDS: &[&str] = &["monto"];
const COMMISSION_FIELDS: &[&str] = &["comision"];
const OPERATOR_FIELDS: &[&str] = &["usuarioCaja", "usuario"];
const REFERENCE_FIELDS: &[&str] = &["referenciaExterna", "referencia"];
const OPERATION_TYPE_FIELDS: &[&str] = &["tipo"];
const EVENT_TIMESTAMP_FIELDS: &[&str] = &["fecha"];
const CREATED_AT_FIELDS: &[&str] = &["createdAt"];
const STATE_FIELDS: &[&str] = &["estado"];

pub const DEFAULT_OPERATION_TYPE: &str = "unknown";
pub const DEFAULT_STATE: &str = "completed";
pub const DEFAULT_OPERATOR: &str = "no_operator";

/// A transaction with every field resolved to a canonical type. Derived
/// per-request and discarded after the response is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTransaction {
    pub id: String,
    pub timestamp: String,
    pub operation_type: String,
    pub amount: f64,
    pub commission: f64,
    pub net_amount: f64,
    pub operator_id: String,
    pub state: String,
    pub external_reference: String,
    pub created_at: String,
}

pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Map a raw document to a `NormalizedTransaction`. Never fails.
    pub fn normalize(record: &RawRecord) -> NormalizedTransaction {
        let amount = numeric(record, AMOUNT_FIELDS);
        let commission = numeric(record, COMMISSION_FIELDS);

        NormalizedTransaction {
            id: record.id.clone(),
            timestamp: event_timestamp(record),
            operation_type: text(record, OPERATION_TYPE_FIELDS, DEFAULT_OPERATION_TYPE),
            amount,
            commission,
            net_amount: amount - commission,
            operator_id: text(record, OPERATOR_FIELDS, DEFAULT_OPERATOR),
            state: text(record, STATE_FIELDS, DEFAULT_STATE),
            external_reference: text(record, REFERENCE_FIELDS, ""),
            created_at: created_at_timestamp(record),
        }
    }
}

fn first_present<'a>(record: &'a RawRecord, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .find_map(|name| record.fields.get(*name))
        .filter(|value| !value.is_null())
}

/// Resolve a numeric attribute; anything unparsable coerces to 0.
pub(crate) fn numeric(record: &RawRecord, candidates: &[&str]) -> f64 {
    match first_present(record, candidates) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Resolve a textual attribute with a fixed fallback.
pub(crate) fn text(record: &RawRecord, candidates: &[&str], default: &str) -> String {
    match first_present(record, candidates) {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}

/// Render a store timestamp value as an ISO-8601 string.
///
/// Store-native datetimes arrive as epoch milliseconds; strings that
/// parse as RFC 3339 are re-emitted normalized, and anything else is
/// preserved verbatim.
fn render_timestamp(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64()?;
            match Utc.timestamp_millis_opt(millis) {
                chrono::LocalResult::Single(dt) => Some(dt.to_rfc3339()),
                _ => None,
            }
        }
        Value::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => Some(dt.with_timezone(&Utc).to_rfc3339()),
            Err(_) => Some(s.clone()),
        },
        _ => None,
    }
}

fn event_timestamp(record: &RawRecord) -> String {
    first_present(record, EVENT_TIMESTAMP_FIELDS)
        .and_then(render_timestamp)
        .unwrap_or_default()
}

/// `created_at` is the only attribute allowed to fall back to the current
/// instant, and only when the field is genuinely absent.
fn created_at_timestamp(record: &RawRecord) -> String {
    first_present(record, CREATED_AT_FIELDS)
        .and_then(render_timestamp)
        .unwrap_or_else(|| Utc::now().to_rfc3339())
}

/// Resolve a timestamp-ish attribute for the plumbing endpoints (cash
/// movements, closures, adjustments) with an empty fallback.
pub(crate) fn timestamp_text(record: &RawRecord, candidates: &[&str]) -> String {
    first_present(record, candidates)
        .and_then(render_timestamp)
        .unwrap_or_default()
}
