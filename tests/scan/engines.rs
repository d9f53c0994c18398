//! Engine adapters driven through stand-in shell scripts.

use crate::common::{create_temp_file, fake_engine, hermetic_config};
use filerisk::report::{AvStatus, ClamAvReport, YaraReport};
use filerisk::timeout::CancelToken;
use filerisk::{ScanConfig, ScanReport, ScanRequest, Scanner, ThreatLevel};
use std::path::Path;
use std::time::Duration;

async fn scan_with(cfg: ScanConfig, content: &[u8], name: &str) -> ScanReport {
    let tmp = create_temp_file(content);
    Scanner::new(cfg)
        .unwrap()
        .scan(&ScanRequest::new(tmp.path(), name))
        .await
        .unwrap()
}

fn with_yara(dir: &Path, body: &str) -> ScanConfig {
    let mut cfg = hermetic_config();
    cfg.engines.yara_candidates = vec![fake_engine(dir, "yara", body)];
    cfg
}

#[tokio::test]
async fn antivirus_detection_is_infected_and_heavy() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = hermetic_config();
    cfg.engines.clamav_command = fake_engine(
        dir.path(),
        "clamscan",
        r#"echo "LibClamAV Warning: database is old"; echo "$2: Eicar-Test-Signature FOUND""#,
    );

    let report = scan_with(cfg, b"X5O!P%@AP[4\\PZX54(P^)7CC)7}$EICAR", "eicar.com").await;

    assert_eq!(report.clamav.status(), Some(AvStatus::Infected));
    match &report.clamav {
        ClamAvReport::Status { detail, .. } => {
            let detail = detail.as_deref().unwrap();
            assert!(detail.starts_with("LibClamAV Warning: database is old\n"), "{}", detail);
            assert!(detail.ends_with("Eicar-Test-Signature FOUND"), "{}", detail);
        }
        other => panic!("unexpected clamav report: {:?}", other),
    }
    assert_eq!(report.indicators.clamav_status, Some(AvStatus::Infected));
    assert_eq!(report.risk_score, 40);
    assert_eq!(report.threat_level, ThreatLevel::Low);
    // A detection forces the verdict regardless of the score.
    assert!(report.malicious);
}

#[tokio::test]
async fn clean_antivirus_run_reports_clean() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = hermetic_config();
    cfg.engines.clamav_command = fake_engine(dir.path(), "clamscan", r#"echo "$2: OK""#);

    let report = scan_with(cfg, b"plain", "plain.txt").await;
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["clamav"], serde_json::json!({"status": "clean"}));
    assert_eq!(report.risk_score, 0);
}

#[tokio::test]
async fn rule_matches_plus_detection_is_malicious() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = with_yara(
        dir.path(),
        r#"echo "Trojan_Generic $2"; echo "Packed_UPX $2""#,
    );
    cfg.engines.clamav_command = fake_engine(dir.path(), "clamscan", r#"echo "$2: Win.Trojan FOUND""#);

    let report = scan_with(cfg, b"payload", "payload.bin").await;

    match &report.yara {
        YaraReport::Matches { matches, yara } => {
            assert_eq!(matches, &vec!["Trojan_Generic", "Packed_UPX"]);
            assert!(yara.as_deref().unwrap().ends_with("yara"));
        }
        other => panic!("unexpected yara report: {:?}", other),
    }
    assert_eq!(report.indicators.yara_match_count, 2);
    assert_eq!(report.risk_score, 60);
    assert_eq!(report.threat_level, ThreatLevel::Medium);
    assert!(report.malicious);
}

#[tokio::test]
async fn rule_points_are_capped() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = with_yara(dir.path(), r#"for i in 1 2 3 4 5 6 7 8; do echo "Rule_$i $2"; done"#);

    let report = scan_with(cfg, b"x", "x").await;
    assert_eq!(report.indicators.yara_match_count, 8);
    assert_eq!(report.risk_score, 60);
    assert_eq!(report.threat_level, ThreatLevel::Medium);
}

#[tokio::test]
async fn engine_error_carries_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = with_yara(dir.path(), "echo 'error: could not open rules file' >&2; exit 1");

    let report = scan_with(cfg, b"x", "x").await;
    match &report.yara {
        YaraReport::Error { error, .. } => assert_eq!(error, "error: could not open rules file"),
        other => panic!("unexpected yara report: {:?}", other),
    }
    assert_eq!(report.indicators.yara_match_count, 0);
    assert_eq!(report.risk_score, 0);
}

#[tokio::test]
async fn non_zero_exit_with_matches_depends_on_strictness() {
    let dir = tempfile::tempdir().unwrap();
    let body = r#"echo "Rule_A $2"; echo "warning: slow rule" >&2; exit 1"#;

    let lenient = scan_with(with_yara(dir.path(), body), b"x", "x").await;
    assert_eq!(lenient.indicators.yara_match_count, 1);
    assert_eq!(lenient.risk_score, 10);

    let mut strict_cfg = with_yara(dir.path(), body);
    strict_cfg.engines.strict_exit_status = true;
    let strict = scan_with(strict_cfg, b"x", "x").await;
    assert!(matches!(strict.yara, YaraReport::Error { .. }));
    assert_eq!(strict.risk_score, 0);
}

#[tokio::test]
async fn first_existing_candidate_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let second = fake_engine(dir.path(), "yara64", r#"echo "Found_It $2""#);
    let mut cfg = hermetic_config();
    cfg.engines.yara_candidates = vec![dir.path().join("missing-yara"), second.clone()];

    let report = scan_with(cfg, b"x", "x").await;
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["yara"]["matches"], serde_json::json!(["Found_It"]));
    assert_eq!(json["yara"]["yara"], second.display().to_string());
}

#[tokio::test]
async fn hung_engine_times_out_without_failing_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = with_yara(dir.path(), "exec sleep 10");
    cfg.engines.timeout_secs = 1;

    let started = std::time::Instant::now();
    let report = scan_with(cfg, b"\x00powershell -enc AAAA\x00", "x.ps1").await;
    assert!(started.elapsed() < Duration::from_secs(8));

    match &report.yara {
        YaraReport::Error { error, .. } => {
            assert!(error.starts_with("YARA error:"), "{}", error);
            assert!(error.contains("timed out"), "{}", error);
        }
        other => panic!("unexpected yara report: {:?}", other),
    }
    // Static signals still count.
    assert!(report.indicators.suspicious_strings);
    assert_eq!(report.risk_score, 10);
}

#[tokio::test]
async fn cancellation_stops_engines_and_still_reports() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = with_yara(dir.path(), "exec sleep 10");
    cfg.engines.clamav_command = fake_engine(dir.path(), "clamscan", "exec sleep 10");
    let tmp = create_temp_file(b"data");
    let scanner = Scanner::new(cfg).unwrap();

    let token = CancelToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let report = scanner
        .scan_with_cancel(&ScanRequest::new(tmp.path(), "data"), &token)
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(8));

    match (&report.yara, &report.clamav) {
        (YaraReport::Error { error: y, .. }, ClamAvReport::Error { error: c }) => {
            assert!(y.contains("cancelled"), "{}", y);
            assert!(c.starts_with("ClamAV error:") && c.contains("cancelled"), "{}", c);
        }
        other => panic!("unexpected engine reports: {:?}", other),
    }
    assert_eq!(report.risk_score, 0);
}
