use crate::common::pe_builder::PeBuilder;
use crate::common::{create_temp_file, hermetic_config, random_bytes};
use filerisk::config::ExecutableConfig;
use filerisk::exe::{analyze, ExecutableAnalysis};
use filerisk::report::PeReport;
use filerisk::tables::IndicatorTables;
use filerisk::{ScanRequest, Scanner, ThreatLevel};

fn packed_sample() -> Vec<u8> {
    let mut code = vec![0x90u8; 0x200];
    code[..16].copy_from_slice(b"cmd.exe /c del \0");
    PeBuilder::new()
        .timestamp(0x5F5E_1000)
        .section(".text", code)
        .section("UPX1", random_bytes(64 * 1024, 0xC0FF_EE11))
        .import(
            "KERNEL32.dll",
            &["VirtualAlloc", "WriteProcessMemory", "CreateRemoteThread", "ExitProcess"],
        )
        .import("WS2_32.dll", &["connect"])
        .build()
}

#[test]
fn packed_section_is_flagged() {
    let data = packed_sample();
    let analysis = analyze(&data, &ExecutableConfig::default(), &IndicatorTables::default());
    let findings = match analysis {
        ExecutableAnalysis::Analyzed(f) => f,
        other => panic!("expected PE findings, got {:?}", other),
    };

    let upx = findings
        .sections
        .iter()
        .find(|s| s.name == "UPX1")
        .expect("UPX1 section");
    assert!(upx.entropy >= 7.2, "entropy {}", upx.entropy);
    assert_eq!(upx.size, 64 * 1024);
    assert_eq!(findings.suspicious_sections.len(), 1);
    assert_eq!(findings.suspicious_sections[0].name, "UPX1");
    assert_eq!(findings.packer_hints, vec!["UPX1"]);
    assert_eq!(findings.compile_timestamp_raw, Some(0x5F5E_1000));
}

#[test]
fn imports_are_flattened_and_matched_in_table_order() {
    let data = packed_sample();
    let findings = match analyze(&data, &ExecutableConfig::default(), &IndicatorTables::default())
    {
        ExecutableAnalysis::Analyzed(f) => f,
        other => panic!("expected PE findings, got {:?}", other),
    };
    assert_eq!(
        findings.imports,
        vec![
            "VirtualAlloc",
            "WriteProcessMemory",
            "CreateRemoteThread",
            "ExitProcess",
            "connect"
        ]
    );
    assert_eq!(findings.num_imports, 5);
    assert_eq!(
        findings.suspicious_imports,
        vec!["CreateRemoteThread", "WriteProcessMemory", "VirtualAlloc", "connect"]
    );
    assert_eq!(findings.num_suspicious_imports, 4);
}

#[test]
fn image_without_imports_has_empty_list() {
    let data = PeBuilder::new().section(".text", vec![0xCC; 64]).build();
    match analyze(&data, &ExecutableConfig::default(), &IndicatorTables::default()) {
        ExecutableAnalysis::Analyzed(f) => {
            assert!(f.imports.is_empty());
            assert_eq!(f.sections.len(), 1);
            assert!(f.suspicious_sections.is_empty());
            assert!(f.packer_hints.is_empty());
        }
        other => panic!("expected PE findings, got {:?}", other),
    }
}

#[test]
fn truncated_section_table_is_a_parse_error() {
    let mut data = PeBuilder::new()
        .section(".text", vec![0u8; 16])
        .section(".data", vec![0u8; 16])
        .build();
    // Cut inside the section table, after the optional header.
    data.truncate(0x140);
    match analyze(&data, &ExecutableConfig::default(), &IndicatorTables::default()) {
        ExecutableAnalysis::ParseError(msg) => assert!(msg.starts_with("PE analysis error")),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn packed_dropper_scan_fuses_pe_and_string_signals() {
    let tmp = create_temp_file(&packed_sample());
    let report = Scanner::new(hermetic_config())
        .unwrap()
        .scan(&ScanRequest::new(tmp.path(), "setup.EXE"))
        .await
        .unwrap();

    // 4 suspicious imports (capped at 20) + 1 packed section + dropper string.
    assert_eq!(report.indicators.suspicious_imports_count, 4);
    assert_eq!(report.indicators.suspicious_sections_count, 1);
    assert!(report.indicators.suspicious_strings);
    assert_eq!(report.risk_score, 20 + 5 + 10);
    assert_eq!(report.threat_level, ThreatLevel::Low);
    assert!(!report.malicious);
    assert!(matches!(report.pe_analysis, PeReport::Findings(_)));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["pe_analysis"]["packer_hints"], serde_json::json!(["UPX1"]));
    assert_eq!(json["pe_analysis"]["num_imports"], 5);
}
