//! Scan orchestration: load once, fan out, fuse.
//!
//! The artifact is read and digested first; failure there is the only fatal
//! path. Static extractors then run on the blocking pool (split with rayon)
//! while the external engines run as concurrent subprocesses. Everything is
//! joined before fusion, so a slow or broken engine only ever degrades its
//! own report field.

use crate::archive::{self, ArchiveListing};
use crate::artifact::FileArtifact;
use crate::config::ScanConfig;
use crate::engines::{clamav, engine_budget, yara};
use crate::entropy::{entropy_of_slice, round3};
use crate::error::{Result, ScanError};
use crate::exe::{self, ExecutableAnalysis};
use crate::filetype::{self, FileTypeInfo};
use crate::indicators::SuspiciousStringMatcher;
use crate::report::{
    AvStatus, ClamAvReport, FileInfo, Indicators, PeReport, ScanOutput, ScanReport, YaraReport,
};
use crate::score::{fuse, Signals};
use crate::strings::{extract_strings, StringScan};
use crate::timeout::CancelToken;
use crate::urls::{extract_urls, UrlScan};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

/// A file to scan and the name to report it under.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub path: PathBuf,
    pub display_name: String,
}

impl ScanRequest {
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }

    /// Use the file name component of `path` as the display name.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(path, name)
    }
}

/// CPU-bound signals computed from the in-memory buffer.
struct StaticSignals {
    strings: StringScan,
    urls: UrlScan,
    suspicious_strings: Vec<String>,
    executable: ExecutableAnalysis,
    archive: ArchiveListing,
    file_type: FileTypeInfo,
    entropy: f64,
}

fn static_signals(
    artifact: &FileArtifact,
    cfg: &ScanConfig,
    matcher: &SuspiciousStringMatcher,
) -> StaticSignals {
    let data = artifact.data();
    let ((strings, urls, suspicious_strings), (executable, (archive, (file_type, entropy)))) =
        rayon::join(
            || {
                let strings = extract_strings(data, &cfg.strings);
                let urls = extract_urls(strings.texts(), &cfg.urls);
                // Only the reported sample feeds the suspicious-strings signal.
                let hits = matcher.matching(strings.texts().take(cfg.report.strings_sample));
                (strings, urls, hits)
            },
            || {
                rayon::join(
                    || exe::analyze(data, &cfg.executable, &cfg.tables),
                    || {
                        rayon::join(
                            || archive::list_members(data, &cfg.archive),
                            || {
                                (
                                    filetype::sniff(data, artifact.name()),
                                    round3(entropy_of_slice(data)),
                                )
                            },
                        )
                    },
                )
            },
        );
    debug!(
        strings = strings.tokens.len(),
        strings_truncated = strings.truncated,
        urls = urls.urls.len(),
        suspicious_strings = suspicious_strings.len(),
        "static signals collected"
    );
    StaticSignals {
        strings,
        urls,
        suspicious_strings,
        executable,
        archive,
        file_type,
        entropy,
    }
}

/// Runs scans against one configuration.
#[derive(Debug, Clone)]
pub struct Scanner {
    config: Arc<ScanConfig>,
    matcher: Arc<SuspiciousStringMatcher>,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let matcher = SuspiciousStringMatcher::new(&config.tables)?;
        Ok(Self {
            config: Arc::new(config),
            matcher: Arc::new(matcher),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan one file. Only an unreadable input is an error.
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanReport> {
        self.scan_with_cancel(request, &CancelToken::new()).await
    }

    /// Scan one file; cancelling `cancel` stops in-flight engines, and
    /// whatever static results exist are still fused.
    pub async fn scan_with_cancel(
        &self,
        request: &ScanRequest,
        cancel: &CancelToken,
    ) -> Result<ScanReport> {
        let span = info_span!("scan", filename = %request.display_name);
        self.run(request, cancel).instrument(span).await
    }

    /// Scan and fold any fatal error into the single-field failure document.
    pub async fn scan_to_output(&self, request: &ScanRequest) -> ScanOutput {
        match self.scan(request).await {
            Ok(report) => ScanOutput::Report(Box::new(report)),
            Err(e) => {
                warn!("scan of {:?} failed: {}", request.path, e);
                ScanOutput::failure(e.to_string())
            }
        }
    }

    async fn run(&self, request: &ScanRequest, cancel: &CancelToken) -> Result<ScanReport> {
        let started = Instant::now();
        let cfg = Arc::clone(&self.config);

        let (artifact, digests) = {
            let path = request.path.clone();
            let name = request.display_name.clone();
            let io = cfg.io.clone();
            tokio::task::spawn_blocking(move || FileArtifact::open(path, name, &io))
                .await
                .map_err(|e| ScanError::Internal(format!("loader task failed: {}", e)))??
        };
        let artifact = Arc::new(artifact);
        info!(size_bytes = artifact.size(), sha256 = %digests.sha256, "artifact loaded");

        let static_task = {
            let artifact = Arc::clone(&artifact);
            let cfg = Arc::clone(&cfg);
            let matcher = Arc::clone(&self.matcher);
            tokio::task::spawn_blocking(move || static_signals(&artifact, &cfg, &matcher))
        };

        let engines = &cfg.engines;
        let scan_deadline = Duration::from_secs(engines.scan_timeout_secs);
        let budget = engine_budget(
            Duration::from_secs(engines.timeout_secs),
            scan_deadline.saturating_sub(started.elapsed()),
        );
        let target = artifact.path();
        let (statics, yara_run, clam_run, description) = tokio::join!(
            static_task,
            yara::scan(target, engines, cancel, budget),
            clamav::scan(target, engines, cancel, budget),
            filetype::describe(target, engines, cancel),
        );
        let statics = statics
            .map_err(|e| ScanError::Internal(format!("static analysis task failed: {}", e)))?;

        let yara_report = YaraReport::from(&yara_run);
        let clamav_report = ClamAvReport::from(&clam_run);
        let av_status = clamav_report.status();

        let signals = Signals {
            rule_matches: yara_run.outcome.matches().len(),
            av_infected: av_status == Some(AvStatus::Infected),
            suspicious_imports: statics.executable.suspicious_import_count(),
            suspicious_sections: statics.executable.suspicious_section_count(),
            suspicious_strings: !statics.suspicious_strings.is_empty(),
            size_bytes: artifact.size(),
        };
        let risk = fuse(&signals, &cfg.scoring);

        let report_cfg = &cfg.report;
        let urls_extracted: Vec<String> = statics
            .urls
            .urls
            .iter()
            .take(report_cfg.urls_sample)
            .cloned()
            .collect();
        let indicators = Indicators {
            yara_match_count: signals.rule_matches,
            clamav_status: av_status,
            suspicious_strings: signals.suspicious_strings,
            suspicious_string_matches: statics
                .suspicious_strings
                .iter()
                .take(report_cfg.strings_sample)
                .cloned()
                .collect(),
            suspicious_imports_count: signals.suspicious_imports,
            suspicious_sections_count: signals.suspicious_sections,
            urls_found: urls_extracted.len(),
        };

        let report = ScanReport {
            filename: request.display_name.clone(),
            sha256: digests.sha256.clone(),
            file_info: FileInfo {
                size_bytes: artifact.size(),
                extension: artifact.extension(),
                entropy: statics.entropy,
            },
            file_type_info: filetype::resolve(statics.file_type, description).into(),
            strings_sample: statics.strings.sample(report_cfg.strings_sample),
            urls_extracted,
            pe_analysis: PeReport::from(&statics.executable),
            yara: yara_report,
            clamav: clamav_report,
            archive: statics.archive.into(),
            hashes: digests,
            risk_score: risk.score(),
            threat_level: risk.threat_level(),
            malicious: risk.malicious(),
            risk_breakdown: risk.breakdown().to_vec(),
            analysis_time_sec: round3(started.elapsed().as_secs_f64()),
            scanned_at: chrono::Utc::now(),
            indicators,
        };
        info!(
            risk_score = report.risk_score,
            threat_level = %report.threat_level,
            malicious = report.malicious,
            tables_version = cfg.tables.version,
            "scan complete"
        );
        Ok(report)
    }
}
