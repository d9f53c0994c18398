//! Printable ASCII string extraction.
//!
//! A single linear pass with a run accumulator. A run is closed by the first
//! byte outside `0x20..=0x7E` and kept when its length falls within
//! `[min_len, max_len]`. Over-long runs are dropped, not split, and a run still
//! open at the end of the buffer is never closed, so it is not emitted.

use crate::config::StringsConfig;
use serde::Serialize;
use tracing::debug;

/// A printable run and where it started in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringToken {
    pub text: String,
    pub offset: usize,
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringScan {
    pub tokens: Vec<StringToken>,
    /// Set when the scan stopped at `max_strings`; tokens are still valid.
    pub truncated: bool,
}

impl StringScan {
    /// The first `n` token texts, in file order.
    pub fn sample(&self, n: usize) -> Vec<String> {
        self.tokens.iter().take(n).map(|t| t.text.clone()).collect()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.text.as_str())
    }
}

#[inline]
fn is_printable(b: u8) -> bool {
    (0x20..0x7f).contains(&b)
}

/// Extract printable runs from `data`.
pub fn extract_strings(data: &[u8], cfg: &StringsConfig) -> StringScan {
    let mut out = StringScan::default();
    let mut run_start: Option<usize> = None;

    for (i, &b) in data.iter().enumerate() {
        if is_printable(b) {
            if run_start.is_none() {
                run_start = Some(i);
            }
            continue;
        }
        if let Some(start) = run_start.take() {
            push_run(&mut out, data, start, i, cfg);
            if out.tokens.len() >= cfg.max_strings {
                out.truncated = true;
                debug!("strings: cap of {} reached at offset {}", cfg.max_strings, i);
                return out;
            }
        }
    }
    out
}

fn push_run(out: &mut StringScan, data: &[u8], start: usize, end: usize, cfg: &StringsConfig) {
    let len = end - start;
    if len < cfg.min_len || len > cfg.max_len {
        return;
    }
    // Printable ASCII is valid UTF-8; the lossy path never substitutes.
    let text = String::from_utf8_lossy(&data[start..end]).into_owned();
    out.tokens.push(StringToken {
        text,
        offset: start,
    });
}
