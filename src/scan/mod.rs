// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Vulnerability detection
//!
//! Detectors are pure functions of the document text. They sit behind the
//! [`Inspector`] trait so the regex implementation can be replaced by a
//! parse-tree based one without touching report assembly.

mod detector;

pub use detector::RegexInspector;

use chrono::Utc;

use crate::document::Document;
use crate::report::{ContentSecurity, SecurityHeader, SecurityReport};
use crate::security::CspAnalyzer;

/// Per-category vulnerability detectors
pub trait Inspector: Send + Sync {
    /// XSS vectors, in pattern order
    fn xss(&self, html: &str) -> Vec<String>;

    /// Text resembling SQL injection payloads
    fn sql_injection(&self, html: &str) -> Vec<String>;

    /// Forms carrying no CSRF token marker
    fn csrf(&self, html: &str) -> Vec<String>;

    /// Security headers without a meta tag
    fn missing_headers(&self, html: &str) -> Vec<SecurityHeader>;

    /// Content security feature status
    fn content_security(&self, html: &str) -> ContentSecurity;
}

/// Builds a [`SecurityReport`] for a document
pub struct Scanner {
    inspector: Box<dyn Inspector>,
    csp: CspAnalyzer,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(RegexInspector::default())
    }
}

impl Scanner {
    /// Create a scanner around an inspector
    pub fn new(inspector: impl Inspector + 'static) -> Self {
        Self {
            inspector: Box::new(inspector),
            csp: CspAnalyzer::new(),
        }
    }

    /// Run every detector over the document
    pub fn scan(&self, document: &Document) -> SecurityReport {
        let html = document.content();

        let report = SecurityReport {
            target: document.path().display().to_string(),
            timestamp: Utc::now(),
            xss: self.inspector.xss(html),
            sql_injection: self.inspector.sql_injection(html),
            csrf: self.inspector.csrf(html),
            missing_headers: self.inspector.missing_headers(html),
            content_security: self.inspector.content_security(html),
            file_hash: document.hash().to_string(),
            existing_policy: self.csp.parse_html(html),
        };

        tracing::info!(
            target_file = %report.target,
            xss = report.xss.len(),
            sql_injection = report.sql_injection.len(),
            csrf = report.csrf.len(),
            missing_headers = report.missing_headers.len(),
            "Scan complete"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ContentFeature;

    struct CleanInspector;

    impl Inspector for CleanInspector {
        fn xss(&self, _: &str) -> Vec<String> {
            vec![]
        }
        fn sql_injection(&self, _: &str) -> Vec<String> {
            vec![]
        }
        fn csrf(&self, _: &str) -> Vec<String> {
            vec![]
        }
        fn missing_headers(&self, _: &str) -> Vec<SecurityHeader> {
            vec![]
        }
        fn content_security(&self, _: &str) -> ContentSecurity {
            ContentFeature::ALL.iter().map(|f| (*f, true)).collect()
        }
    }

    #[test]
    fn test_scan_fills_report() {
        let doc = Document::from_content(
            "site/index.html",
            r#"<html><head><meta http-equiv="Content-Security-Policy" content="script-src 'unsafe-inline'"></head>
<body><script>alert(1)</script></body></html>"#,
        );

        let report = Scanner::default().scan(&doc);

        assert_eq!(report.target, "site/index.html");
        assert_eq!(report.file_hash, doc.hash());
        assert_eq!(report.xss, vec!["<script>alert(1)</script>"]);
        assert_eq!(report.missing_headers.len(), 4);
        assert!(!report.feature(ContentFeature::NoInlineScript));

        let policy = report.existing_policy.unwrap();
        assert_eq!(policy.policy, "script-src 'unsafe-inline'");
        assert!(!policy.blocks_inline);
    }

    #[test]
    fn test_custom_inspector() {
        let doc = Document::from_content("a.html", "<script>alert(1)</script>");
        let report = Scanner::new(CleanInspector).scan(&doc);

        assert_eq!(report.finding_count(), 0);
        assert_eq!(report.security_index(), 100);
    }
}
