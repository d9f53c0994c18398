//! Risk fusion: signals in, bounded score and verdict out.
//!
//! Each signal contributes at most its own cap, so no single noisy source can
//! dominate, and the sum is clamped to `[0, 100]`. Fusion is pure and
//! independent of the order signals were collected in.

use crate::config::ScoringConfig;
use serde::Serialize;
use std::fmt;

/// Everything the fusion step looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub rule_matches: usize,
    pub av_infected: bool,
    pub suspicious_imports: usize,
    pub suspicious_sections: usize,
    pub suspicious_strings: bool,
    pub size_bytes: u64,
}

/// Categorical threat level, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Safe,
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    pub fn from_score(score: u8, cfg: &ScoringConfig) -> Self {
        if score >= cfg.high_threshold {
            Self::High
        } else if score >= cfg.medium_threshold {
            Self::Medium
        } else if score >= cfg.low_threshold {
            Self::Low
        } else {
            Self::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One signal's share of the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub signal: &'static str,
    pub points: u32,
}

/// Fused verdict. Only [`fuse`] can build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    score: u8,
    threat_level: ThreatLevel,
    malicious: bool,
    breakdown: Vec<Contribution>,
}

impl RiskAssessment {
    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn threat_level(&self) -> ThreatLevel {
        self.threat_level
    }

    pub fn malicious(&self) -> bool {
        self.malicious
    }

    /// Non-zero contributions in fixed signal order.
    pub fn breakdown(&self) -> &[Contribution] {
        &self.breakdown
    }
}

fn per_item(count: usize, points: u32, cap: u32) -> u32 {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    count.saturating_mul(points).min(cap)
}

fn flat(present: bool, points: u32) -> u32 {
    if present {
        points
    } else {
        0
    }
}

/// Combine `signals` into a bounded score, a threat band and a verdict.
pub fn fuse(signals: &Signals, cfg: &ScoringConfig) -> RiskAssessment {
    let parts = [
        (
            "rule_matches",
            per_item(signals.rule_matches, cfg.rule_match_points, cfg.rule_match_cap),
        ),
        ("av_infected", flat(signals.av_infected, cfg.av_infected_points)),
        (
            "suspicious_imports",
            per_item(
                signals.suspicious_imports,
                cfg.suspicious_import_points,
                cfg.suspicious_import_cap,
            ),
        ),
        (
            "suspicious_sections",
            per_item(
                signals.suspicious_sections,
                cfg.suspicious_section_points,
                cfg.suspicious_section_cap,
            ),
        ),
        (
            "suspicious_strings",
            flat(signals.suspicious_strings, cfg.suspicious_strings_points),
        ),
        (
            "large_file",
            flat(signals.size_bytes > cfg.large_file_bytes, cfg.large_file_points),
        ),
    ];

    let total = parts.iter().fold(0u32, |acc, (_, p)| acc.saturating_add(*p));
    let score = total.min(100) as u8;
    let breakdown = parts
        .iter()
        .filter(|(_, p)| *p > 0)
        .map(|(signal, points)| Contribution {
            signal: *signal,
            points: *points,
        })
        .collect();

    RiskAssessment {
        score,
        threat_level: ThreatLevel::from_score(score, cfg),
        malicious: score >= cfg.malicious_threshold
            || signals.av_infected
            || signals.rule_matches > 0,
        breakdown,
    }
}
