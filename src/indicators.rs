//! Suspicious-string indicators.
//!
//! A token is suspicious when its lowercase form starts with a dangerous tool
//! prefix, or contains a lateral-execution tool name anywhere.

use crate::error::{Result, ScanError};
use crate::tables::IndicatorTables;
use aho_corasick::AhoCorasick;

/// Compiled matcher built from [`IndicatorTables`].
#[derive(Debug, Clone)]
pub struct SuspiciousStringMatcher {
    prefixes: Vec<String>,
    contains: Option<AhoCorasick>,
}

impl SuspiciousStringMatcher {
    pub fn new(tables: &IndicatorTables) -> Result<Self> {
        let prefixes = tables
            .dangerous_tool_prefixes
            .iter()
            .map(|p| p.to_lowercase())
            .collect();
        let contains = if tables.lateral_execution_tools.is_empty() {
            None
        } else {
            let ac = AhoCorasick::builder()
                .ascii_case_insensitive(true)
                .build(&tables.lateral_execution_tools)
                .map_err(|e| ScanError::Config(format!("lateral execution tools: {}", e)))?;
            Some(ac)
        };
        Ok(Self { prefixes, contains })
    }

    pub fn is_suspicious(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        if self.prefixes.iter().any(|p| lower.starts_with(p.as_str())) {
            return true;
        }
        self.contains
            .as_ref()
            .is_some_and(|ac| ac.is_match(token))
    }

    /// Tokens that match, in input order.
    pub fn matching<'a, I>(&self, tokens: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens
            .into_iter()
            .filter(|t| self.is_suspicious(t))
            .map(str::to_string)
            .collect()
    }
}
