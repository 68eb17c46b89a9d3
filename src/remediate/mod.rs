// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Automatic remediation
//!
//! Applies a fixed sequence of rewrites to a working copy of the document:
//!
//! 1. nonce injection
//! 2. header normalization (fresh CSP, missing security headers)
//! 3. removal of the snippets the scan flagged as XSS
//! 4. CSRF token script
//! 5. `http://` -> `https://` in URL attributes
//! 6. SRI attributes on external scripts
//!
//! Steps 3-6 are gated by the [`SecurityReport`] passed in, not by a rescan.

mod nonce;
mod rewrite;

pub use nonce::{is_valid_nonce, FixedNonce, NonceSource, RngNonce, NONCE_ALPHABET, NONCE_LEN};
pub use rewrite::{
    add_attribute, csrf_script, excise, excise_tag, has_head, inject_nonces, insert_into_head,
    strip_csp_meta, upgrade_insecure_urls, CSRF_FIELD,
};

use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::patterns::PatternTable;
use crate::report::{ContentFeature, SecurityHeader, SecurityReport};
use crate::security::{resolve_source, CspPolicy, SriHasher};

/// Comment left where a flagged element was removed
pub const DEFAULT_PLACEHOLDER: &str = "<!-- Removed potentially unsafe script -->";

lazy_static! {
    static ref EXTERNAL_SCRIPT: Regex =
        Regex::new(r#"(?i)<script\b[^>]*\ssrc\s*=\s*["']([^"']+)["'][^>]*>"#).unwrap();
    static ref INTEGRITY_ATTR: Regex = Regex::new(r"(?i)\sintegrity\s*=").unwrap();
    static ref CROSSORIGIN_ATTR: Regex = Regex::new(r"(?i)\scrossorigin\b").unwrap();
}

/// Shape of a flagged XSS snippet, in removal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SnippetKind {
    /// Complete element such as `<iframe ...></iframe>`
    Element,
    /// Start of a tag such as `<img src="javascript:`
    TagPrefix,
    /// Attribute-level match such as `onclick="..."`
    Fragment,
}

impl SnippetKind {
    fn of(snippet: &str) -> Self {
        if !snippet.starts_with('<') {
            SnippetKind::Fragment
        } else if snippet.ends_with('>') {
            SnippetKind::Element
        } else {
            SnippetKind::TagPrefix
        }
    }
}

/// Remediation configuration
#[derive(Debug, Clone)]
pub struct RemediationConfig {
    /// Policy injected as the CSP meta tag
    pub policy: CspPolicy,
    /// Replacement for removed elements
    pub placeholder: String,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            policy: CspPolicy::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl RemediationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the injected policy
    pub fn policy(mut self, policy: CspPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the placeholder for removed elements
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

/// What a remediation run changed
#[derive(Debug, Clone, Default)]
pub struct RemediationOutcome {
    /// Nonce used for this run
    pub nonce: String,
    /// Whether the nonce came from the document's existing CSP
    pub nonce_reused: bool,
    /// Tags that received a nonce attribute
    pub nonces_added: usize,
    /// Existing CSP meta tags removed
    pub csp_removed: usize,
    /// Headers written into the head
    pub headers_inserted: Vec<SecurityHeader>,
    /// Document has no head to put headers into
    pub headers_skipped: bool,
    /// Flagged snippet occurrences removed
    pub snippets_removed: usize,
    pub csrf_script_added: bool,
    /// Attribute URLs moved from http to https
    pub urls_upgraded: usize,
    /// Scripts that received integrity attributes
    pub sri_added: usize,
    /// Script sources left without integrity
    pub sri_skipped: Vec<String>,
}

impl fmt::Display for RemediationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== REMEDIATION ===")?;
        writeln!(
            f,
            "Nonce: {}{}",
            self.nonce,
            if self.nonce_reused { " (reused)" } else { "" }
        )?;
        writeln!(f, "Nonce attributes added: {}", self.nonces_added)?;
        if self.headers_skipped {
            writeln!(f, "Security headers: skipped, document has no <head>")?;
        } else {
            let names: Vec<&str> = self.headers_inserted.iter().map(|h| h.name()).collect();
            writeln!(
                f,
                "Security headers written: {} (old CSP tags removed: {})",
                names.join(", "),
                self.csp_removed
            )?;
        }
        writeln!(f, "Unsafe snippets removed: {}", self.snippets_removed)?;
        writeln!(
            f,
            "CSRF token script: {}",
            if self.csrf_script_added { "added" } else { "not needed" }
        )?;
        writeln!(f, "URLs upgraded to https: {}", self.urls_upgraded)?;
        writeln!(f, "SRI attributes added: {}", self.sri_added)?;
        for src in &self.sri_skipped {
            writeln!(f, "   skipped: {}", src)?;
        }
        Ok(())
    }
}

/// Remediated content plus a summary of the changes
#[derive(Debug, Clone)]
pub struct Remediation {
    pub content: String,
    pub outcome: RemediationOutcome,
}

/// Applies the rewrite passes
pub struct Remediator {
    config: RemediationConfig,
    nonces: Box<dyn NonceSource>,
    hasher: Arc<dyn SriHasher>,
    patterns: PatternTable,
}

impl Remediator {
    /// Create a remediator drawing nonces from OS entropy
    pub fn new(config: RemediationConfig, hasher: Arc<dyn SriHasher>) -> Self {
        Self {
            config,
            nonces: Box::new(RngNonce::from_entropy()),
            hasher,
            patterns: PatternTable::default(),
        }
    }

    /// Use a different nonce source
    pub fn with_nonce_source(mut self, source: impl NonceSource + 'static) -> Self {
        self.nonces = Box::new(source);
        self
    }

    /// Use a different pattern table for header presence checks
    pub fn with_patterns(mut self, patterns: PatternTable) -> Self {
        self.patterns = patterns;
        self
    }

    /// Run every pass over `html`, gated by `report`
    pub async fn remediate(&mut self, html: &str, report: &SecurityReport) -> Remediation {
        let mut outcome = RemediationOutcome::default();

        // Keep the nonce of an existing policy so elements carrying it stay valid
        let existing = report
            .existing_policy
            .as_ref()
            .and_then(|p| p.nonce.clone())
            .filter(|n| is_valid_nonce(n));
        outcome.nonce_reused = existing.is_some();
        outcome.nonce = existing.unwrap_or_else(|| self.nonces.next_nonce());

        // 1. nonces
        let (mut content, added) = inject_nonces(html, &outcome.nonce);
        outcome.nonces_added = added;

        // 2. headers
        content = self.normalize_headers(content, &mut outcome);

        // 3. flagged snippets, matched as they look after step 1. Elements
        // go before the attribute fragments they may contain.
        let mut snippets: Vec<&String> = report.xss.iter().collect();
        snippets.sort_by_key(|s| (SnippetKind::of(s), Reverse(s.len())));

        for snippet in snippets {
            let kind = SnippetKind::of(snippet);
            let (rewritten, _) = inject_nonces(snippet, &outcome.nonce);
            let candidates = if rewritten == *snippet {
                vec![snippet.clone()]
            } else {
                vec![rewritten, snippet.clone()]
            };

            for candidate in candidates {
                let placeholder = self.config.placeholder.as_str();
                let (next, removed) = match kind {
                    SnippetKind::Element => excise(&content, &candidate, placeholder),
                    SnippetKind::TagPrefix => excise_tag(&content, &candidate, placeholder),
                    SnippetKind::Fragment => excise(&content, &candidate, ""),
                };
                content = next;
                outcome.snippets_removed += removed;
            }
        }

        // 4. CSRF
        if !report.csrf.is_empty() && !content.contains(CSRF_FIELD) {
            let script = csrf_script(&outcome.nonce);
            content = match insert_into_head(&content, &script) {
                Some(next) => next,
                None => format!("{}\n{}\n", content.trim_end(), script),
            };
            outcome.csrf_script_added = true;
        }

        // 5. https
        if !report.feature(ContentFeature::HttpsOnly) {
            let (next, upgraded) = upgrade_insecure_urls(&content);
            content = next;
            outcome.urls_upgraded = upgraded;
        }

        // 6. SRI
        if !report.feature(ContentFeature::Sri) {
            content = self.add_integrity(content, &mut outcome).await;
        }

        tracing::info!(
            nonces = outcome.nonces_added,
            headers = outcome.headers_inserted.len(),
            snippets = outcome.snippets_removed,
            csrf = outcome.csrf_script_added,
            urls = outcome.urls_upgraded,
            sri = outcome.sri_added,
            "Remediation complete"
        );

        Remediation { content, outcome }
    }

    fn normalize_headers(&self, content: String, outcome: &mut RemediationOutcome) -> String {
        // An existing CSP is only dropped when its replacement has somewhere to go
        if !has_head(&content) {
            tracing::warn!("No <head> element, security headers not inserted");
            outcome.headers_skipped = true;
            return content;
        }

        let (mut content, removed) = strip_csp_meta(&content);
        outcome.csp_removed = removed;

        for header in SecurityHeader::ALL {
            let tag = match header.default_value() {
                Some(value) => {
                    let present = self
                        .patterns
                        .header(header)
                        .map(|re| re.is_match(&content))
                        .unwrap_or(false);
                    if present {
                        continue;
                    }
                    header.meta_tag(value)
                }
                None => header.meta_tag(&self.config.policy.render(&outcome.nonce)),
            };

            match insert_into_head(&content, &tag) {
                Some(next) => {
                    content = next;
                    outcome.headers_inserted.push(header);
                }
                None => {
                    tracing::warn!(header = header.name(), "No <head> element, header not inserted");
                    outcome.headers_skipped = true;
                }
            }
        }

        content
    }

    async fn add_integrity(&self, content: String, outcome: &mut RemediationOutcome) -> String {
        let mut result = String::with_capacity(content.len());
        let mut last = 0;

        for caps in EXTERNAL_SCRIPT.captures_iter(&content) {
            let (Some(whole), Some(src)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let tag = whole.as_str();
            if INTEGRITY_ATTR.is_match(tag) {
                continue;
            }

            let Some(url) = resolve_source(src.as_str()) else {
                tracing::debug!(src = src.as_str(), "Skipping SRI for non-absolute source");
                outcome.sri_skipped.push(src.as_str().to_string());
                continue;
            };

            match self.hasher.integrity(&url).await {
                Ok(hash) => {
                    let mut rewritten = add_attribute(tag, &format!(r#"integrity="{}""#, hash));
                    if !CROSSORIGIN_ATTR.is_match(tag) {
                        rewritten = add_attribute(&rewritten, r#"crossorigin="anonymous""#);
                    }
                    result.push_str(&content[last..whole.start()]);
                    result.push_str(&rewritten);
                    last = whole.end();
                    outcome.sri_added += 1;
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Failed to compute SRI hash");
                    outcome.sri_skipped.push(src.as_str().to_string());
                }
            }
        }

        result.push_str(&content[last..]);
        result
    }
}
