use std::sync::Arc;
use std::time::Duration;

use aots::config::ReportConfig;
use aots::engine::cycle::{CycleTask, ScanCycle};
use aots::engine::packer;
use aots::engine::report::{ReportSettings, NO_SETUPS};
use aots::engine::scanner::Scanner;
use aots::engine::scheduler::Scheduler;

use crate::mock_source::{universe, MockSource, RecordingPublisher};

const WINDOWS: [usize; 3] = [20, 50, 100];
const DELAY: Duration = Duration::from_millis(50);

fn settings(cfg: &ReportConfig) -> ReportSettings {
    ReportSettings::from_config(
        cfg,
        "**🎯 Tier 2 (AOTS)**\n20MA > 50MA > 100MA\nUSDT Spot Market".into(),
        chrono_tz::Asia::Manila,
    )
}

/// Ten rising symbols spread through a 500-symbol universe.
fn ten_rising() -> (MockSource, Vec<String>) {
    let mut source = MockSource::new();
    let mut expected = Vec::new();
    for i in (7..500).step_by(50) {
        let display = format!("C{i:03}");
        source = source.rising(&format!("{display}USDT"));
        expected.push(display);
    }
    (source, expected)
}

fn scan_cycle(
    source: MockSource,
    publisher: RecordingPublisher,
    symbols: usize,
    cfg: &ReportConfig,
) -> ScanCycle {
    ScanCycle::new(
        universe(symbols),
        Arc::new(source),
        Arc::new(publisher),
        Scanner::new(WINDOWS, DELAY),
        settings(cfg),
    )
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_large_universe_keeps_match_order() {
    let (source, expected) = ten_rising();
    let source = Arc::new(source);
    let scanner = Scanner::new(WINDOWS, DELAY);
    let symbols = universe(500);

    let result = scanner.scan(&symbols, source.as_ref()).await;

    assert_eq!(result.symbols, expected);
    assert_eq!(result.scanned, 500);
    assert_eq!(result.unavailable, 0);
    assert_eq!(source.requests(), 500);
    // One pacing delay per symbol.
    assert!(result.elapsed >= DELAY * 500);
}

#[tokio::test(start_paused = true)]
async fn test_failing_and_falling_symbols_excluded() {
    let source = MockSource::new()
        .rising("C000USDT")
        .failing("C001USDT")
        .falling("C002USDT")
        .rising("C003USDT")
        .failing("C004USDT")
        .short_history("C005USDT", 30);
    let scanner = Scanner::new(WINDOWS, DELAY);

    let result = scanner.scan(&universe(6), &source).await;

    assert_eq!(result.symbols, vec!["C000", "C003"]);
    assert_eq!(result.scanned, 6);
    assert_eq!(result.unavailable, 2);
}

#[tokio::test(start_paused = true)]
async fn test_short_history_is_scanned_not_skipped() {
    // 30 rising closes: MA50 and MA100 both average the full series,
    // so they tie and the symbol cannot tier, but it is still available.
    let source = MockSource::new().short_history("C000USDT", 30);
    let result = Scanner::new(WINDOWS, DELAY)
        .scan(&universe(1), &source)
        .await;
    assert!(result.symbols.is_empty());
    assert_eq!(result.unavailable, 0);
}

// ---------------------------------------------------------------------------
// Full cycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_cycle_publishes_single_field() {
    let (source, expected) = ten_rising();
    let publisher = RecordingPublisher::new();
    let cycle = scan_cycle(source, publisher.clone(), 500, &ReportConfig::default());

    let report = cycle.run_cycle(1).await.unwrap();
    assert_eq!(report.matched, 10);
    assert_eq!(report.chunks, 1);
    assert!(report.published);

    let sent = publisher.reports();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].title.starts_with("Automated AOTS Spot Setups - "));
    assert!(sent[0].title.ends_with(" Manila Time"));
    assert_eq!(sent[0].color, 0x00ff00);
    assert_eq!(sent[0].fields.len(), 1);
    assert_eq!(sent[0].fields[0].name, "TIER 2");
    assert_eq!(
        sent[0].fields[0].value,
        format!("🟢 {}", expected.join(packer::SEPARATOR))
    );
}

#[tokio::test(start_paused = true)]
async fn test_cycle_overflow_note_on_last_field() {
    // Two symbols per field, two fields: four shown, six summarised.
    let cfg = ReportConfig {
        max_chunk_chars: 12,
        max_chunks: 2,
        ..ReportConfig::default()
    };
    let (source, expected) = ten_rising();
    let publisher = RecordingPublisher::new();
    let cycle = scan_cycle(source, publisher.clone(), 500, &cfg);

    let report = cycle.run_cycle(1).await.unwrap();
    assert_eq!(report.matched, 10);
    assert_eq!(report.chunks, 2);

    let sent = publisher.reports();
    let fields = &sent[0].fields;
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "TIER 2 (part 1)");
    assert_eq!(fields[1].name, "TIER 2 (part 2)");
    assert_eq!(fields[0].value, format!("🟢 {}, {}", expected[0], expected[1]));
    assert_eq!(
        fields[1].value,
        format!("🟢 {}, {}\n...and 6 more", expected[2], expected[3])
    );
}

#[tokio::test(start_paused = true)]
async fn test_cycle_without_matches_sends_placeholder() {
    let publisher = RecordingPublisher::new();
    let cycle = scan_cycle(
        MockSource::new().falling("C000USDT"),
        publisher.clone(),
        20,
        &ReportConfig::default(),
    );

    let report = cycle.run_cycle(1).await.unwrap();
    assert_eq!(report.matched, 0);
    assert_eq!(report.chunks, 0);

    let sent = publisher.reports();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].fields.len(), 1);
    assert_eq!(sent[0].fields[0].name, "TIER 2");
    assert_eq!(sent[0].fields[0].value, NO_SETUPS);
}

#[tokio::test(start_paused = true)]
async fn test_repeat_cycles_are_identical() {
    let (source, _) = ten_rising();
    let publisher = RecordingPublisher::new();
    let cycle = scan_cycle(source, publisher.clone(), 500, &ReportConfig::default());

    cycle.run_cycle(1).await.unwrap();
    cycle.run_cycle(2).await.unwrap();

    // Titles carry the wall-clock time; everything else must match.
    let sent = publisher.reports();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].description, sent[1].description);
    assert_eq!(sent[0].color, sent[1].color);
    assert_eq!(sent[0].fields, sent[1].fields);
}

#[tokio::test(start_paused = true)]
async fn test_publish_failure_still_completes_cycle() {
    let (source, _) = ten_rising();
    let publisher = RecordingPublisher::failing();
    let cycle = scan_cycle(source, publisher.clone(), 500, &ReportConfig::default());

    let report = cycle.run_cycle(1).await.unwrap();
    assert!(!report.published);
    assert_eq!(report.matched, 10);
    assert_eq!(publisher.reports().len(), 1);
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_scheduler_publishes_every_interval() {
    let interval = Duration::from_secs(3600);
    let publisher = RecordingPublisher::new();
    let cycle = scan_cycle(
        MockSource::new().rising("C001USDT"),
        publisher.clone(),
        3,
        &ReportConfig::default(),
    );

    // Cycle at t=0 and after one interval; shutdown lands in the second sleep.
    let shutdown = tokio::time::sleep(interval + Duration::from_secs(10));
    let cycles = Scheduler::new(Arc::new(cycle), interval)
        .run(shutdown)
        .await;

    assert_eq!(cycles, 2);
    let sent = publisher.reports();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|r| r.fields[0].value == "🟢 C001"));
}
