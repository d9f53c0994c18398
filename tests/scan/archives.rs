use crate::common::{create_temp_file, hermetic_config};
use filerisk::{ScanReport, ScanRequest, Scanner};
use serde_json::{json, Value};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn zip_of(entries: &[(String, Vec<u8>)], method: CompressionMethod) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(method);
    for (name, body) in entries {
        writer.start_file(name.as_str(), opts).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

async fn scan(content: &[u8], name: &str) -> (ScanReport, Value) {
    let tmp = create_temp_file(content);
    let report = Scanner::new(hermetic_config())
        .unwrap()
        .scan(&ScanRequest::new(tmp.path(), name))
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    (report, json)
}

#[tokio::test]
async fn zip_members_are_listed() {
    let entries = vec![
        ("docs/readme.txt".to_string(), b"read me".to_vec()),
        ("bin/setup.exe".to_string(), vec![0u8; 256]),
        ("run.js".to_string(), b"WScript.Echo(1)".to_vec()),
    ];
    let (_, json) = scan(&zip_of(&entries, CompressionMethod::Deflated), "bundle.zip").await;

    assert_eq!(
        json["zip_listing"],
        json!(["docs/readme.txt", "bin/setup.exe", "run.js"])
    );
    assert_eq!(json["archive_format"], "zip");
    assert!(json.get("zip_error").is_none());
    assert!(json.get("archive_truncated").is_none());
}

#[tokio::test]
async fn long_zip_listing_is_truncated() {
    let entries: Vec<(String, Vec<u8>)> = (0..250)
        .map(|i| (format!("part{:03}.dat", i), vec![i as u8; 8]))
        .collect();
    let (_, json) = scan(&zip_of(&entries, CompressionMethod::Stored), "many.zip").await;

    let listing = json["zip_listing"].as_array().unwrap();
    assert_eq!(listing.len(), 200);
    assert_eq!(listing[0], "part000.dat");
    assert_eq!(listing[199], "part199.dat");
    assert_eq!(json["archive_truncated"], true);
}

#[tokio::test]
async fn corrupt_zip_reports_an_error_and_keeps_scanning() {
    let entries = vec![(
        "a.txt".to_string(),
        b"\x00cmd.exe /c whoami\x00".to_vec(),
    )];
    let mut data = zip_of(&entries, CompressionMethod::Stored);
    // Drop the central directory.
    data.truncate(data.len() / 2);
    let (report, json) = scan(&data, "broken.zip").await;

    assert!(json.get("zip_listing").is_none());
    assert!(json["zip_error"].as_str().is_some_and(|e| !e.is_empty()));
    // The stored member's bytes are still visible to the string pass.
    assert!(report.indicators.suspicious_strings);
}

#[tokio::test]
async fn tar_members_are_listed() {
    let long = format!("{}/run.sh", "payload".repeat(16));
    let mut builder = tar::Builder::new(Vec::new());
    for (name, body) in [(long.as_str(), &b"#!/bin/sh\n"[..]), ("notes.txt", &b"ok"[..])] {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, body).unwrap();
    }
    let data = builder.into_inner().unwrap();

    let (_, json) = scan(&data, "bundle.tar").await;
    assert_eq!(json["zip_listing"], json!([long, "notes.txt"]));
    assert_eq!(json["archive_format"], "tar");
}
