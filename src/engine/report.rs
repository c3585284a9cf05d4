//! Turns a scan result and its packed chunks into a publishable report.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::config::ReportConfig;
use crate::notify::{ReportField, ScanReport};
use crate::types::DisplayChunk;

/// Placeholder field value when nothing matched.
pub const NO_SETUPS: &str = "No setups detected.";

/// Report formatting resolved once at startup.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub title: String,
    pub description: String,
    pub label: String,
    pub prefix: String,
    pub color: u32,
    pub timezone: Tz,
    pub timezone_label: String,
    pub max_chunk_chars: usize,
    pub max_chunks: usize,
}

impl ReportSettings {
    pub fn from_config(cfg: &ReportConfig, description: String, timezone: Tz) -> Self {
        Self {
            title: cfg.title.clone(),
            description,
            label: cfg.label.clone(),
            prefix: cfg.prefix.clone(),
            color: cfg.color,
            timezone,
            timezone_label: cfg.timezone_label.clone(),
            max_chunk_chars: cfg.max_chunk_chars,
            max_chunks: cfg.max_chunks,
        }
    }
}

/// Build the report for one cycle.
///
/// Chunks become fields in order. More than one chunk gets numbered
/// labels; no chunks at all yields a single placeholder field.
pub fn build_report(
    chunks: &[DisplayChunk],
    settings: &ReportSettings,
    now: DateTime<Utc>,
) -> ScanReport {
    let local = now.with_timezone(&settings.timezone);
    let title = format!(
        "{} - {} {}",
        settings.title,
        local.format("%I:%M:%S %p"),
        settings.timezone_label
    );

    let fields = if chunks.is_empty() {
        vec![ReportField {
            name: settings.label.clone(),
            value: NO_SETUPS.to_string(),
        }]
    } else {
        let numbered = chunks.len() > 1;
        chunks
            .iter()
            .map(|chunk| ReportField {
                name: if numbered {
                    format!("{} (part {})", settings.label, chunk.index + 1)
                } else {
                    settings.label.clone()
                },
                value: chunk.text.clone(),
            })
            .collect()
    };

    ScanReport {
        title,
        description: settings.description.clone(),
        color: settings.color,
        fields,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn settings() -> ReportSettings {
        ReportSettings::from_config(
            &ReportConfig::default(),
            "desc".into(),
            chrono_tz::Asia::Manila,
        )
    }

    fn chunk(index: usize, text: &str) -> DisplayChunk {
        DisplayChunk {
            index,
            text: text.into(),
        }
    }

    #[test]
    fn test_title_in_configured_timezone() {
        // 06:30:15 UTC is 02:30:15 PM in Manila (UTC+8).
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 6, 30, 15).unwrap();
        let report = build_report(&[], &settings(), now);
        assert_eq!(
            report.title,
            "Automated AOTS Spot Setups - 02:30:15 PM Manila Time"
        );
        assert_eq!(report.description, "desc");
        assert_eq!(report.color, 0x00ff00);
    }

    #[test]
    fn test_no_chunks_placeholder() {
        let report = build_report(&[], &settings(), Utc::now());
        assert_eq!(
            report.fields,
            vec![ReportField {
                name: "TIER 2".into(),
                value: NO_SETUPS.into()
            }]
        );
    }

    #[test]
    fn test_single_chunk_unnumbered() {
        let report = build_report(&[chunk(0, "🟢 BTC, ETH")], &settings(), Utc::now());
        assert_eq!(report.fields.len(), 1);
        assert_eq!(report.fields[0].name, "TIER 2");
        assert_eq!(report.fields[0].value, "🟢 BTC, ETH");
    }

    #[test]
    fn test_multiple_chunks_numbered() {
        let chunks = vec![chunk(0, "a"), chunk(1, "b"), chunk(2, "c")];
        let report = build_report(&chunks, &settings(), Utc::now());
        let names: Vec<_> = report.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["TIER 2 (part 1)", "TIER 2 (part 2)", "TIER 2 (part 3)"]
        );
    }
}
