//! Leaf certificate parsing.
//!
//! Works on the raw DER bytes handed back by a handshake. Nothing here checks
//! trust: the chain is never verified, so every record is flagged incomplete.

use chrono::{DateTime, Utc};
use openssl::asn1::Asn1Time;
use openssl::nid::Nid;
use openssl::x509::{X509NameRef, X509};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub issuer: String,
    pub subject_alt_names: Vec<String>,
    pub not_after: DateTime<Utc>,
    pub days_left: i64,
    pub chain_incomplete: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("certificate is not valid DER: {0}")]
    Decode(#[source] openssl::error::ErrorStack),
    #[error("certificate expiry could not be read: {0}")]
    Expiry(String),
}

/// Parses a DER certificate relative to the current time.
pub fn extract(der: &[u8]) -> Result<CertificateRecord, CertificateError> {
    extract_at(der, Utc::now())
}

pub fn extract_at(der: &[u8], now: DateTime<Utc>) -> Result<CertificateRecord, CertificateError> {
    let cert = X509::from_der(der).map_err(CertificateError::Decode)?;
    let not_after = not_after_utc(&cert)?;

    Ok(CertificateRecord {
        issuer: issuer_label(cert.issuer_name()),
        subject_alt_names: dns_names(&cert),
        not_after,
        days_left: days_between(now, not_after),
        chain_incomplete: true,
    })
}

/// Whole days from `now` until `not_after`, rounded toward negative infinity
/// so anything already expired is negative.
pub fn days_between(now: DateTime<Utc>, not_after: DateTime<Utc>) -> i64 {
    (not_after - now)
        .num_seconds()
        .div_euclid(SECONDS_PER_DAY)
}

fn not_after_utc(cert: &X509) -> Result<DateTime<Utc>, CertificateError> {
    // ASN1_TIME_diff validates the UTCTime/GeneralizedTime encoding.
    let epoch = Asn1Time::from_unix(0).map_err(|e| CertificateError::Expiry(e.to_string()))?;
    let diff = epoch
        .diff(cert.not_after())
        .map_err(|e| CertificateError::Expiry(e.to_string()))?;
    let seconds = i64::from(diff.days) * SECONDS_PER_DAY + i64::from(diff.secs);

    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| CertificateError::Expiry(format!("timestamp {seconds} out of range")))
}

fn first_entry(name: &X509NameRef, nid: Nid) -> Option<String> {
    name.entries_by_nid(nid)
        .next()
        .and_then(|entry| entry.data().as_utf8().ok())
        .map(|value| value.to_string())
}

fn issuer_label(name: &X509NameRef) -> String {
    let organization = first_entry(name, Nid::ORGANIZATIONNAME).unwrap_or_default();
    let common_name = first_entry(name, Nid::COMMONNAME).unwrap_or_default();

    let joined = format!("{organization}, {common_name}");
    let trimmed = joined.trim_matches(|c: char| c == ',' || c.is_whitespace());
    if trimmed.is_empty() {
        "Unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

fn dns_names(cert: &X509) -> Vec<String> {
    cert.subject_alt_names()
        .map(|names| {
            names
                .iter()
                .filter_map(|name| name.dnsname().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
