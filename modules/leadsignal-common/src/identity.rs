use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Stable identity for a posting: SHA-256 over the UTF-8 bytes of the
/// canonical URL, hex-encoded, untruncated. The same URL always yields the
/// same id, which is what makes upserts idempotent and cross-run dedup work.
pub fn job_id(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Current UTC time as an ISO 8601 string.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Best-effort normalization of source-provided date text to ISO 8601 UTC.
/// Returns the empty string when the text cannot be parsed; naive timestamps
/// are assumed to be UTC.
pub fn to_iso_date(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return dt
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return naive
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Secs, true);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return naive
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Secs, true);
        }
    }
    String::new()
}

/// Epoch milliseconds to ISO 8601 UTC; empty string for out-of-range values.
pub fn millis_to_iso(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic() {
        let url = "https://example.com/jobs/1";
        assert_eq!(job_id(url), job_id(url));
    }

    #[test]
    fn distinct_urls_get_distinct_ids() {
        assert_ne!(job_id("https://x/1"), job_id("https://x/2"));
    }

    #[test]
    fn id_is_full_sha256_hex() {
        let id = job_id("https://example.com");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn rfc3339_dates_normalize_to_utc() {
        assert_eq!(
            to_iso_date("2024-03-01T12:00:00+02:00"),
            "2024-03-01T10:00:00Z"
        );
    }

    #[test]
    fn bare_dates_get_midnight_utc() {
        assert_eq!(to_iso_date("2024-03-01"), "2024-03-01T00:00:00Z");
    }

    #[test]
    fn garbage_dates_normalize_to_empty() {
        assert_eq!(to_iso_date("soon"), "");
        assert_eq!(to_iso_date(""), "");
        assert_eq!(to_iso_date("   "), "");
    }

    #[test]
    fn epoch_millis_convert() {
        assert_eq!(millis_to_iso(0), "1970-01-01T00:00:00Z");
    }
}
