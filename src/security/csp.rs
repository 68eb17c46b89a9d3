// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Content Security Policy (CSP) building and analysis
//!
//! [`CspPolicy`] renders the policy injected by the remediator.
//! [`CspAnalyzer`] audits a policy already present in a document and pulls
//! out its nonce so repeated runs keep using it.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Directives that receive the run nonce
const NONCE_DIRECTIVES: [&str; 2] = ["script-src", "style-src"];

lazy_static! {
    static ref CSP_META: Regex = Regex::new(
        r#"(?i)<meta\b[^>]*\bhttp-equiv\s*=\s*["']Content-Security-Policy["'][^>]*\bcontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#
    )
    .unwrap();
}

/// CSP analysis result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CspAnalysis {
    /// Raw CSP policy string
    pub policy: String,
    /// Parsed directives
    pub directives: BTreeMap<String, Vec<String>>,
    /// Identified weaknesses
    pub weaknesses: Vec<CspWeakness>,
    /// Missing security directives
    pub missing_directives: Vec<String>,
    /// Overall security score (0-100)
    pub security_score: u8,
    /// Whether CSP would block inline scripts
    pub blocks_inline: bool,
    /// Whether CSP would block eval
    pub blocks_eval: bool,
    /// Nonce allowed by script-src (or default-src)
    pub nonce: Option<String>,
}

/// CSP weakness type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CspWeakness {
    /// 'unsafe-inline' allows inline scripts
    UnsafeInline,
    /// 'unsafe-eval' allows eval()
    UnsafeEval,
    /// data: URI allows data: URLs
    DataUri,
    /// Wildcard in source list
    WildcardSource(String),
    /// 'unsafe-hashes' present
    UnsafeHashes,
    /// Nonce/hash with unsafe-inline (nonce wins)
    NonceWithUnsafeInline,
    /// Missing base-uri allows base tag injection
    MissingBaseUri,
    /// Missing form-action
    MissingFormAction,
    /// Object-src not restricted
    UnrestrictedObjectSrc,
}

impl CspWeakness {
    /// Get severity (1-10)
    pub fn severity(&self) -> u8 {
        match self {
            CspWeakness::UnsafeInline => 10,
            CspWeakness::UnsafeEval => 8,
            CspWeakness::DataUri => 7,
            CspWeakness::WildcardSource(_) => 6,
            CspWeakness::MissingBaseUri => 5,
            CspWeakness::UnrestrictedObjectSrc => 5,
            CspWeakness::UnsafeHashes => 4,
            CspWeakness::MissingFormAction => 4,
            CspWeakness::NonceWithUnsafeInline => 3,
        }
    }

    /// Get description
    pub fn description(&self) -> String {
        match self {
            CspWeakness::UnsafeInline => "unsafe-inline allows arbitrary inline scripts".to_string(),
            CspWeakness::UnsafeEval => "unsafe-eval allows eval() and similar".to_string(),
            CspWeakness::DataUri => "data: URIs can be used to inject scripts".to_string(),
            CspWeakness::WildcardSource(src) => format!("Wildcard {} allows many origins", src),
            CspWeakness::UnsafeHashes => "unsafe-hashes allows specific inline handlers".to_string(),
            CspWeakness::NonceWithUnsafeInline => {
                "Nonce present with unsafe-inline (nonce takes precedence)".to_string()
            }
            CspWeakness::MissingBaseUri => "Missing base-uri allows base tag hijacking".to_string(),
            CspWeakness::MissingFormAction => "Missing form-action allows form hijacking".to_string(),
            CspWeakness::UnrestrictedObjectSrc => {
                "object-src not restricted, allows plugin content".to_string()
            }
        }
    }
}

/// CSP analyzer
pub struct CspAnalyzer {
    /// Directives a policy should define (directly or through default-src)
    important_directives: Vec<&'static str>,
}

impl Default for CspAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CspAnalyzer {
    /// Create new analyzer
    pub fn new() -> Self {
        Self {
            important_directives: vec![
                "default-src",
                "script-src",
                "style-src",
                "object-src",
                "base-uri",
                "form-action",
            ],
        }
    }

    /// Parse a policy string
    pub fn parse(&self, csp: &str) -> CspAnalysis {
        let mut analysis = CspAnalysis {
            policy: csp.trim().to_string(),
            ..Default::default()
        };

        for directive in csp.split(';') {
            let mut parts = directive.split_whitespace();
            let Some(name) = parts.next() else {
                continue;
            };

            let name = name.to_lowercase();
            let values: Vec<String> = parts.map(str::to_string).collect();

            self.check_unsafe(&name, &values, &mut analysis);

            // First occurrence wins, as in browsers
            analysis.directives.entry(name).or_insert(values);
        }

        self.check_missing(&mut analysis);

        analysis.security_score = self.calculate_score(&analysis);
        analysis.blocks_inline = self.blocks_inline(&analysis);
        analysis.blocks_eval = self.blocks_eval(&analysis);
        analysis.nonce = script_sources(&analysis)
            .and_then(|values| values.iter().find_map(|v| parse_nonce(v)));

        analysis
    }

    /// Extract and parse the CSP meta tag of a document
    pub fn parse_html(&self, html: &str) -> Option<CspAnalysis> {
        extract_csp_from_html(html).map(|csp| self.parse(&csp))
    }

    fn check_unsafe(&self, name: &str, values: &[String], analysis: &mut CspAnalysis) {
        let scripting = name == "script-src" || name == "default-src";

        for value in values {
            match value.to_lowercase().as_str() {
                "'unsafe-inline'" if scripting => analysis.weaknesses.push(CspWeakness::UnsafeInline),
                "'unsafe-eval'" if scripting => analysis.weaknesses.push(CspWeakness::UnsafeEval),
                "'unsafe-hashes'" => analysis.weaknesses.push(CspWeakness::UnsafeHashes),
                "data:" if scripting => analysis.weaknesses.push(CspWeakness::DataUri),
                v if v.contains('*') => analysis
                    .weaknesses
                    .push(CspWeakness::WildcardSource(value.clone())),
                _ => {}
            }
        }

        let has_nonce = values.iter().any(|v| v.starts_with("'nonce-"));
        let has_unsafe_inline = values.iter().any(|v| v == "'unsafe-inline'");
        if has_nonce && has_unsafe_inline {
            analysis.weaknesses.push(CspWeakness::NonceWithUnsafeInline);
        }
    }

    fn check_missing(&self, analysis: &mut CspAnalysis) {
        let has_default = analysis.directives.contains_key("default-src");

        for directive in &self.important_directives {
            if analysis.directives.contains_key(*directive) {
                continue;
            }
            // default-src covers the fetch directives, not base-uri/form-action
            let covered = has_default && directive.ends_with("-src");
            if !covered {
                analysis.missing_directives.push(directive.to_string());
            }
        }

        if !analysis.directives.contains_key("base-uri") {
            analysis.weaknesses.push(CspWeakness::MissingBaseUri);
        }

        if !analysis.directives.contains_key("form-action") {
            analysis.weaknesses.push(CspWeakness::MissingFormAction);
        }

        if !analysis.directives.contains_key("object-src") && !has_default {
            analysis.weaknesses.push(CspWeakness::UnrestrictedObjectSrc);
        }
    }

    fn calculate_score(&self, analysis: &CspAnalysis) -> u8 {
        let mut score: i32 = 100;

        for weakness in &analysis.weaknesses {
            score -= weakness.severity() as i32 * 3;
        }

        score -= (analysis.missing_directives.len() * 5) as i32;

        let has_nonce = analysis.directives.values().any(|v| {
            v.iter()
                .any(|s| s.starts_with("'nonce-") || s.starts_with("'sha256-"))
        });
        if has_nonce {
            score += 10;
        }

        score.clamp(0, 100) as u8
    }

    fn blocks_inline(&self, analysis: &CspAnalysis) -> bool {
        match script_sources(analysis) {
            Some(values) if values.iter().any(|v| v == "'unsafe-inline'") => {
                // nonce/hash takes precedence over unsafe-inline
                values.iter().any(|v| {
                    v.starts_with("'nonce-")
                        || v.starts_with("'sha256-")
                        || v.starts_with("'sha384-")
                        || v.starts_with("'sha512-")
                })
            }
            Some(_) => true,
            None => false,
        }
    }

    fn blocks_eval(&self, analysis: &CspAnalysis) -> bool {
        script_sources(analysis)
            .map(|values| !values.iter().any(|v| v == "'unsafe-eval'"))
            .unwrap_or(false)
    }
}

fn script_sources(analysis: &CspAnalysis) -> Option<&Vec<String>> {
    analysis
        .directives
        .get("script-src")
        .or_else(|| analysis.directives.get("default-src"))
}

/// `'nonce-abc'` -> `abc`
fn parse_nonce(source: &str) -> Option<String> {
    source
        .strip_prefix("'nonce-")
        .and_then(|rest| rest.strip_suffix('\''))
        .filter(|nonce| !nonce.is_empty())
        .map(str::to_string)
}

/// Policy injected into remediated documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspPolicy {
    directives: Vec<(String, Vec<String>)>,
}

impl Default for CspPolicy {
    fn default() -> Self {
        Self::new()
            .directive("default-src", &["'self'"])
            .directive(
                "script-src",
                &[
                    "'self'",
                    "https://cdnjs.cloudflare.com",
                    "https://www.googletagmanager.com",
                ],
            )
            .directive("style-src", &["'self'", "https://fonts.googleapis.com"])
            .directive(
                "img-src",
                &["'self'", "data:", "https://storage.googleapis.com"],
            )
            .directive("font-src", &["'self'", "https://fonts.gstatic.com"])
            .directive(
                "connect-src",
                &[
                    "'self'",
                    "https://api.github.com",
                    "https://www.google-analytics.com",
                ],
            )
            .directive("frame-src", &["'self'", "https://www.googletagmanager.com"])
            .directive("object-src", &["'none'"])
            .directive("base-uri", &["'self'"])
            .directive("form-action", &["'self'"])
    }
}

impl CspPolicy {
    /// Empty policy
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
        }
    }

    /// Add or replace a directive
    pub fn directive(mut self, name: &str, sources: &[&str]) -> Self {
        let sources: Vec<String> = sources.iter().map(|s| s.to_string()).collect();
        match self.directives.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = sources,
            None => self.directives.push((name.to_string(), sources)),
        }
        self
    }

    /// Render the policy, allowing `nonce` for scripts and styles
    pub fn render(&self, nonce: &str) -> String {
        self.directives
            .iter()
            .map(|(name, sources)| {
                let mut parts = vec![name.clone()];
                parts.extend(sources.iter().cloned());
                if NONCE_DIRECTIVES.contains(&name.as_str()) {
                    parts.push(format!("'nonce-{}'", nonce));
                }
                parts.join(" ")
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Extract CSP from HTML meta tag
pub fn extract_csp_from_html(html: &str) -> Option<String> {
    CSP_META
        .captures(html)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csp() {
        let analyzer = CspAnalyzer::new();
        let csp = "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self'";
        let analysis = analyzer.parse(csp);

        assert!(analysis.weaknesses.contains(&CspWeakness::UnsafeInline));
        assert!(!analysis.blocks_inline);
        assert_eq!(analysis.nonce, None);
    }

    #[test]
    fn test_missing_directives() {
        let analyzer = CspAnalyzer::new();
        let analysis = analyzer.parse("script-src 'self'");

        assert!(analysis.missing_directives.contains(&"base-uri".to_string()));
        assert!(analysis.weaknesses.contains(&CspWeakness::MissingBaseUri));
        assert!(analysis.weaknesses.contains(&CspWeakness::UnrestrictedObjectSrc));
    }

    #[test]
    fn test_nonce_with_unsafe_inline() {
        let analyzer = CspAnalyzer::new();
        let analysis = analyzer.parse("script-src 'nonce-abc123' 'unsafe-inline'");

        assert!(analysis.weaknesses.contains(&CspWeakness::NonceWithUnsafeInline));
        assert!(analysis.blocks_inline);
        assert_eq!(analysis.nonce.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_security_score() {
        let analyzer = CspAnalyzer::new();

        let good = "default-src 'self'; script-src 'self'; base-uri 'self'; form-action 'self'; object-src 'none'";
        assert!(analyzer.parse(good).security_score > 70);

        let bad = "script-src 'unsafe-inline' 'unsafe-eval' *";
        assert!(analyzer.parse(bad).security_score < 50);
    }

    #[test]
    fn test_extract_from_html() {
        let html = r#"<html><head><meta http-equiv="Content-Security-Policy" content="default-src 'self'"></head></html>"#;
        assert_eq!(
            extract_csp_from_html(html),
            Some("default-src 'self'".to_string())
        );

        let single = r#"<meta http-equiv='content-security-policy' content='default-src https:'>"#;
        assert_eq!(
            extract_csp_from_html(single),
            Some("default-src https:".to_string())
        );

        assert_eq!(extract_csp_from_html("<head></head>"), None);
    }

    #[test]
    fn test_rendered_default_policy_is_strict() {
        let policy = CspPolicy::default().render("N0nce");
        let analysis = CspAnalyzer::new().parse(&policy);

        assert_eq!(analysis.nonce.as_deref(), Some("N0nce"));
        assert!(analysis.blocks_inline);
        assert!(analysis.blocks_eval);
        assert!(analysis.missing_directives.is_empty());
        assert!(analysis.weaknesses.is_empty());
        assert!(analysis.directives["style-src"].contains(&"'nonce-N0nce'".to_string()));
        assert!(!policy.contains("http://"));
    }

    #[test]
    fn test_policy_builder_replaces_directive() {
        let policy = CspPolicy::new()
            .directive("default-src", &["'self'"])
            .directive("default-src", &["'none'"])
            .render("x");

        assert_eq!(policy, "default-src 'none'");
    }
}
