use fancy_regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::location::LocationParts;
use crate::platform::{NavigationFilter, Verdict};

/// Always answers with the same verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticFilter(pub Verdict);

impl NavigationFilter for StaticFilter {
    fn check(&self, _url: &str) -> Verdict {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Rule {
    source: String,
    regex: Regex,
}

/// Pattern-based filter. Allow rules win over block rules; URLs matching
/// neither get the default verdict.
#[derive(Debug, Clone)]
pub struct RuleFilter {
    block: Vec<Rule>,
    allow: Vec<Rule>,
    default_verdict: Verdict,
}

impl Default for RuleFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleFilter {
    pub fn new() -> Self {
        Self {
            block: Vec::new(),
            allow: Vec::new(),
            default_verdict: Verdict::Allow,
        }
    }

    pub fn block(mut self, pattern: &str) -> Result<Self> {
        self.block.push(compile_rule(pattern)?);
        Ok(self)
    }

    pub fn allow(mut self, pattern: &str) -> Result<Self> {
        self.allow.push(compile_rule(pattern)?);
        Ok(self)
    }

    pub fn with_default(mut self, verdict: Verdict) -> Self {
        self.default_verdict = verdict;
        self
    }

    pub fn block_patterns(&self) -> Vec<&str> {
        self.block.iter().map(|rule| rule.source.as_str()).collect()
    }

    fn first_match<'a>(rules: &'a [Rule], url: &str) -> Option<&'a Rule> {
        rules.iter().find(|rule| match rule.regex.is_match(url) {
            Ok(matched) => matched,
            Err(err) => {
                tracing::warn!(pattern = %rule.source, %url, "rule evaluation failed: {err}");
                false
            }
        })
    }
}

impl NavigationFilter for RuleFilter {
    fn check(&self, url: &str) -> Verdict {
        let canonical = canonicalize_url(url);
        if let Some(rule) = Self::first_match(&self.allow, &canonical) {
            tracing::debug!(url = %canonical, pattern = %rule.source, "allow rule matched");
            return Verdict::Allow;
        }
        if let Some(rule) = Self::first_match(&self.block, &canonical) {
            tracing::debug!(url = %canonical, pattern = %rule.source, "block rule matched");
            return Verdict::Block;
        }
        self.default_verdict
    }
}

fn compile_rule(pattern: &str) -> Result<Rule> {
    let regex = Regex::new(pattern).map_err(|err| {
        Error::Configuration(format!("invalid filter pattern {pattern:?}: {err}"))
    })?;
    Ok(Rule {
        source: pattern.to_string(),
        regex,
    })
}

/// NFKC-normalizes the URL and lowercases scheme and host so lookalike
/// spellings hit the same rules.
pub fn canonicalize_url(url: &str) -> String {
    let normalized = url.trim().nfkc().collect::<String>();
    match LocationParts::parse(&normalized) {
        Some(mut parts) => {
            if let Some(authority) = parts.authority.as_mut() {
                authority.hostname = authority.hostname.to_lowercase();
            }
            parts.href()
        }
        None => normalized,
    }
}
