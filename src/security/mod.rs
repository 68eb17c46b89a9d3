// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Security policy modules
//!
//! - CSP building and analysis
//! - SRI hashing

mod csp;
mod sri;

pub use csp::{extract_csp_from_html, CspAnalysis, CspAnalyzer, CspPolicy, CspWeakness};
pub use sri::{
    resolve_source, sri_digest, HttpSriHasher, SriFetchConfig, SriHasher, DEFAULT_USER_AGENT,
};
