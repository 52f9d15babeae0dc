use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use wavesignal::application::batch::analyze_batch;
use wavesignal::application::signal_engine::recommendation_counts;
use wavesignal::config::Config;
use wavesignal::domain::signals::SignalConfig;
use wavesignal::infrastructure::{load_series, read_series};

/// Oscillating series around a slow drift, one row per minute
fn csv_fixture(rows: usize) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    let mut prev = 100.0_f64;
    for i in 0..rows {
        let t = i as f64;
        let close = 100.0 + 0.05 * t + 4.0 * (t / 7.0).sin();
        let open = prev;
        let high = open.max(close) + 0.4;
        let low = open.min(close) - 0.4;
        let volume = 1_000.0 + 300.0 * (t / 3.0).cos().abs();
        writeln!(
            out,
            "{},{:.4},{:.4},{:.4},{:.4},{:.2}",
            1_700_000_000_000_i64 + i as i64 * 60_000,
            open,
            high,
            low,
            close,
            volume
        )
        .unwrap();
        prev = close;
    }
    out
}

fn temp_csv(name: &str, rows: usize) -> PathBuf {
    let path = std::env::temp_dir().join(format!("wavesignal_{}_{}.csv", name, std::process::id()));
    fs::write(&path, csv_fixture(rows)).unwrap();
    path
}

#[test]
fn test_csv_to_snapshot_end_to_end() {
    let series = read_series(csv_fixture(180).as_bytes(), "SINE").unwrap();
    let aggregator = Config {
        signal: SignalConfig::default(),
        backend: Default::default(),
    }
    .build_aggregator()
    .unwrap();

    let analysis = aggregator.analyze(&series).unwrap();
    let (buys, sells, waits) = recommendation_counts(&analysis.frame);

    assert_eq!(buys + sells + waits, 180);
    assert_eq!(analysis.snapshot.symbol, "SINE");
    assert_eq!(
        analysis.snapshot.timestamp,
        1_700_000_000_000 + 179 * 60_000
    );
    assert!(analysis.snapshot.atr > 0.0);
}

#[test]
fn test_load_series_from_disk_uses_file_stem() {
    let path = temp_csv("ethusdt", 120);
    let series = load_series(&path, None).unwrap();
    let expected = path
        .file_stem()
        .unwrap()
        .to_string_lossy()
        .to_uppercase();
    assert_eq!(series.symbol(), expected);

    let named = load_series(&path, Some("ETH/USDT")).unwrap();
    assert_eq!(named.symbol(), "ETH/USDT");
    fs::remove_file(path).unwrap();
}

#[test]
fn test_missing_file_reports_path() {
    let err = load_series(&PathBuf::from("/nonexistent/bars.csv"), None).unwrap_err();
    assert!(format!("{:#}", err).contains("bars.csv"));
}

#[test]
fn test_batch_over_files() {
    let long = temp_csv("long", 200);
    let short = temp_csv("short", 60);
    let series = vec![
        load_series(&long, Some("LONG")).unwrap(),
        load_series(&short, Some("SHORT")).unwrap(),
    ];

    let results = analyze_batch(&Default::default(), &series);
    assert_eq!(results.len(), 2);
    assert!(results[0].result.is_ok());
    assert!(results[1].result.is_err());

    let frame_json = serde_json::to_string(&results[0].result.as_ref().unwrap().frame).unwrap();
    assert!(frame_json.contains("\"grid_center\""));

    fs::remove_file(long).unwrap();
    fs::remove_file(short).unwrap();
}
