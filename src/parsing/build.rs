use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{Direction, Transaction};
use crate::email::EmailMeta;
use crate::error::IngestError;

static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d{2}$").expect("invalid amount regex"));

/// Assembles the canonical transaction from extracted fields plus the
/// template's constants. `account_id` stays unset; resolution needs the
/// external account directory and never happens here.
pub fn build_transaction(
    meta: &EmailMeta,
    fields: &HashMap<&'static str, String>,
    institution: &str,
    currency: &str,
    direction: Direction,
    description: String,
) -> Result<Transaction, IngestError> {
    let raw_date = fields
        .get("txdate")
        .ok_or(IngestError::FieldNotFound("txdate"))?;
    let body_date = parse_body_date(raw_date)?;
    let tx_date = reconcile_dates(parse_transport_date(&meta.date), body_date);

    let raw_amount = fields
        .get("amount")
        .ok_or(IngestError::FieldNotFound("amount"))?;
    let amount = normalize_amount(raw_amount)?;

    Ok(Transaction {
        email_id: meta.id.clone(),
        tx_date,
        institution: institution.to_owned(),
        account_label: fields.get("account").cloned().unwrap_or_default(),
        amount,
        currency: currency.to_owned(),
        direction,
        description,
        category: String::new(),
        user_notes: String::new(),
        account_id: None,
    })
}

/// Strips thousands separators and requires an exact two-decimal form. The
/// result is carried as a string end to end.
pub fn normalize_amount(raw: &str) -> Result<String, IngestError> {
    let amount = raw.replace(',', "");
    if !AMOUNT_RE.is_match(&amount) {
        return Err(IngestError::AmountFormat(raw.to_owned()));
    }

    Ok(amount)
}

/// Body dates look like "June 1, 2025" with no time component.
pub fn parse_body_date(raw: &str) -> Result<NaiveDate, IngestError> {
    NaiveDate::parse_from_str(raw.trim(), "%B %d, %Y")
        .map_err(|_| IngestError::DateFormat(raw.to_owned()))
}

fn parse_transport_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
}

/// A forwarded copy's transport date reflects the forward time, not the
/// original event, so divergence means the body date is authoritative.
/// Agreement means the transport timestamp is strictly more precise.
fn reconcile_dates(transport: Option<DateTime<FixedOffset>>, body: NaiveDate) -> DateTime<Utc> {
    match transport {
        Some(received)
            if received.year() == body.year() && received.ordinal() == body.ordinal() =>
        {
            received.with_timezone(&Utc)
        }
        _ => body.and_time(NaiveTime::default()).and_utc(),
    }
}
