// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Scan report
//!
//! A [`SecurityReport`] is built once per run from the original document
//! content and never mutated afterwards. The remediator consumes it to decide
//! which rewrites to apply; the CLI renders it through `Display`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::security::CspAnalysis;

/// Maximum characters of a CSRF form shown in the report
pub const CSRF_PREVIEW_LEN: usize = 100;

/// Security headers expected as `<meta http-equiv>` tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecurityHeader {
    #[serde(rename = "Content-Security-Policy")]
    ContentSecurityPolicy,
    #[serde(rename = "X-XSS-Protection")]
    XssProtection,
    #[serde(rename = "X-Content-Type-Options")]
    ContentTypeOptions,
    #[serde(rename = "X-Frame-Options")]
    FrameOptions,
    #[serde(rename = "Strict-Transport-Security")]
    StrictTransportSecurity,
}

impl SecurityHeader {
    /// All headers, in report order
    pub const ALL: [SecurityHeader; 5] = [
        SecurityHeader::ContentSecurityPolicy,
        SecurityHeader::XssProtection,
        SecurityHeader::ContentTypeOptions,
        SecurityHeader::FrameOptions,
        SecurityHeader::StrictTransportSecurity,
    ];

    /// Header name as used in `http-equiv`
    pub fn name(&self) -> &'static str {
        match self {
            SecurityHeader::ContentSecurityPolicy => "Content-Security-Policy",
            SecurityHeader::XssProtection => "X-XSS-Protection",
            SecurityHeader::ContentTypeOptions => "X-Content-Type-Options",
            SecurityHeader::FrameOptions => "X-Frame-Options",
            SecurityHeader::StrictTransportSecurity => "Strict-Transport-Security",
        }
    }

    /// Value injected by the remediator.
    ///
    /// The CSP value depends on the run nonce and is built by
    /// [`CspPolicy`](crate::security::CspPolicy) instead.
    pub fn default_value(&self) -> Option<&'static str> {
        match self {
            SecurityHeader::ContentSecurityPolicy => None,
            SecurityHeader::XssProtection => Some("1; mode=block"),
            SecurityHeader::ContentTypeOptions => Some("nosniff"),
            SecurityHeader::FrameOptions => Some("DENY"),
            SecurityHeader::StrictTransportSecurity => Some("max-age=31536000; includeSubDomains"),
        }
    }

    /// Render the header as a meta tag
    pub fn meta_tag(&self, content: &str) -> String {
        format!(r#"<meta http-equiv="{}" content="{}">"#, self.name(), content)
    }

    /// Issue description used in the report
    pub fn missing_description(&self) -> String {
        format!("Missing security header: {}", self.name())
    }
}

impl fmt::Display for SecurityHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Content security features checked over the whole document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentFeature {
    #[serde(rename = "SRI (Subresource Integrity)")]
    Sri,
    #[serde(rename = "CORS Restrictions")]
    Cors,
    #[serde(rename = "HTTPS Resources Only")]
    HttpsOnly,
    #[serde(rename = "No Inline JavaScript")]
    NoInlineScript,
    #[serde(rename = "No Eval Usage")]
    NoEval,
}

impl ContentFeature {
    /// All features, in report order
    pub const ALL: [ContentFeature; 5] = [
        ContentFeature::Sri,
        ContentFeature::Cors,
        ContentFeature::HttpsOnly,
        ContentFeature::NoInlineScript,
        ContentFeature::NoEval,
    ];

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ContentFeature::Sri => "SRI (Subresource Integrity)",
            ContentFeature::Cors => "CORS Restrictions",
            ContentFeature::HttpsOnly => "HTTPS Resources Only",
            ContentFeature::NoInlineScript => "No Inline JavaScript",
            ContentFeature::NoEval => "No Eval Usage",
        }
    }
}

impl fmt::Display for ContentFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Feature -> satisfied
pub type ContentSecurity = BTreeMap<ContentFeature, bool>;

/// Result of one scan over one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReport {
    /// Scanned file
    pub target: String,
    /// When the scan ran
    pub timestamp: DateTime<Utc>,
    /// XSS pattern matches, in pattern-table order
    pub xss: Vec<String>,
    /// SQL-injection-like pattern matches
    pub sql_injection: Vec<String>,
    /// Forms without any CSRF token marker
    pub csrf: Vec<String>,
    /// Security headers with no meta tag
    pub missing_headers: Vec<SecurityHeader>,
    pub content_security: ContentSecurity,
    /// Hex SHA-256 of the scanned bytes
    pub file_hash: String,
    /// Audit of the CSP already present in the document
    pub existing_policy: Option<CspAnalysis>,
}

impl SecurityReport {
    /// Whether a content feature was satisfied. Unknown features count as not satisfied.
    pub fn feature(&self, feature: ContentFeature) -> bool {
        self.content_security.get(&feature).copied().unwrap_or(false)
    }

    /// "Missing security header: ..." descriptions
    pub fn header_issues(&self) -> Vec<String> {
        self.missing_headers
            .iter()
            .map(SecurityHeader::missing_description)
            .collect()
    }

    /// Total number of findings across the vulnerability categories
    pub fn finding_count(&self) -> usize {
        self.xss.len() + self.sql_injection.len() + self.csrf.len() + self.missing_headers.len()
    }

    /// Share of the ten header/feature checks that passed, 0-100
    pub fn security_index(&self) -> u8 {
        let headers_ok = SecurityHeader::ALL
            .iter()
            .filter(|h| !self.missing_headers.contains(h))
            .count();
        let features_ok = ContentFeature::ALL
            .iter()
            .filter(|f| self.feature(**f))
            .count();
        let total = SecurityHeader::ALL.len() + ContentFeature::ALL.len();

        ((headers_ok + features_ok) * 100 / total) as u8
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for SecurityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== SECURITY REPORT ===")?;
        writeln!(f, "File: {}", self.target)?;
        writeln!(f, "Scan time: {}", self.timestamp.to_rfc2822())?;
        writeln!(f, "File hash: {}", self.file_hash)?;

        writeln!(f, "\n1. XSS VULNERABILITIES ({}):", self.xss.len())?;
        write_list(f, &self.xss, "No XSS vulnerabilities found.", None)?;

        writeln!(f, "\n2. SQL INJECTION PATTERNS ({}):", self.sql_injection.len())?;
        write_list(
            f,
            &self.sql_injection,
            "No SQL injection patterns found.",
            None,
        )?;

        writeln!(f, "\n3. CSRF VULNERABILITIES ({}):", self.csrf.len())?;
        write_list(
            f,
            &self.csrf,
            "No CSRF vulnerabilities found.",
            Some(CSRF_PREVIEW_LEN),
        )?;

        writeln!(f, "\n4. SECURITY HEADER ISSUES ({}):", self.missing_headers.len())?;
        write_list(
            f,
            &self.header_issues(),
            "All security headers are present.",
            None,
        )?;

        writeln!(f, "\n5. CONTENT SECURITY:")?;
        for feature in ContentFeature::ALL {
            let status = if self.feature(feature) {
                "✓ Implemented"
            } else {
                "✗ Not implemented"
            };
            writeln!(f, "   [{}] {}", feature, status)?;
        }

        if let Some(ref policy) = self.existing_policy {
            writeln!(
                f,
                "\nExisting CSP (score {}/100): {}",
                policy.security_score, policy.policy
            )?;
            for weakness in &policy.weaknesses {
                writeln!(f, "   - {}", weakness.description())?;
            }
        }

        writeln!(f, "\nSecurity index: {}%", self.security_index())
    }
}

fn write_list(
    f: &mut fmt::Formatter<'_>,
    items: &[String],
    empty: &str,
    preview: Option<usize>,
) -> fmt::Result {
    if items.is_empty() {
        return writeln!(f, "   {}", empty);
    }

    for (i, item) in items.iter().enumerate() {
        match preview {
            Some(max) => writeln!(f, "   [{}] {}", i + 1, truncate(item, max))?,
            None => writeln!(f, "   [{}] {}", i + 1, item)?,
        }
    }
    Ok(())
}

/// Truncate to `max` characters, appending "..." when cut
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
