// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Kilpi - HTML Security Scanner and Remediator
//!
//! Scans a single HTML document for common web vulnerabilities and rewrites
//! it in place with hardening applied.
//!
//! ## Features
//!
//! - XSS detection: inline scripts, event handlers, javascript: URIs, iframes
//! - SQL injection heuristics over raw page text
//! - CSRF: forms without a token marker
//! - Security header audit via `<meta http-equiv>` tags
//! - Content security checks: SRI, CORS, HTTPS-only, inline scripts, eval
//! - Existing CSP analysis with weakness scoring
//! - Remediation: nonces, strict CSP, header injection, unsafe snippet removal,
//!   CSRF token script, https upgrade, SRI hashes fetched live
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use kilpi::{Document, HttpSriHasher, RemediationConfig, Remediator, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let document = Document::load("index.html")?;
//!     let report = Scanner::default().scan(&document);
//!     println!("{}", report);
//!
//!     let hasher = Arc::new(HttpSriHasher::new()?);
//!     let mut remediator = Remediator::new(RemediationConfig::default(), hasher);
//!     let remediation = remediator.remediate(document.content(), &report).await;
//!     document.save(&remediation.content)?;
//!
//!     Ok(())
//! }
//! ```

pub mod document;
pub mod error;
pub mod patterns;
pub mod remediate;
pub mod report;
pub mod scan;
pub mod security;

// Re-exports for convenience

// Documents
pub use document::{content_hash, write_atomic, Document};

// Errors
pub use error::{Error, Result};

// Detection
pub use patterns::{Pattern, PatternTable};
pub use scan::{Inspector, RegexInspector, Scanner};

// Reporting
pub use report::{ContentFeature, ContentSecurity, SecurityHeader, SecurityReport};

// Remediation
pub use remediate::{
    FixedNonce, NonceSource, Remediation, RemediationConfig, RemediationOutcome, Remediator,
    RngNonce,
};

// Security policies
pub use security::{extract_csp_from_html, CspAnalysis, CspAnalyzer, CspPolicy, CspWeakness};
pub use security::{HttpSriHasher, SriFetchConfig, SriHasher};

/// Kilpi version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
