// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Detection pattern table
//!
//! Every detector reads its regular expressions from a [`PatternTable`]. The
//! built-in table is compiled once per process and handed out by clone
//! (compiled regexes share their program, so clones are cheap).

use lazy_static::lazy_static;
use regex::Regex;

use crate::report::SecurityHeader;

/// A labelled detection pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Short name of what the pattern looks for
    pub label: &'static str,
    pub regex: Regex,
}

impl Pattern {
    fn builtin(label: &'static str, pattern: &str) -> Self {
        Self {
            label,
            regex: compile(pattern),
        }
    }
}

/// Ordered patterns per detector category
#[derive(Debug, Clone)]
pub struct PatternTable {
    pub xss: Vec<Pattern>,
    pub sql_injection: Vec<Pattern>,
    /// Matches one whole `<form>...</form>` block
    pub form: Regex,
    /// Lowercase substrings that mark a form as CSRF-protected
    pub csrf_markers: Vec<&'static str>,
    /// One meta-tag pattern per security header
    pub headers: Vec<(SecurityHeader, Regex)>,
    /// `<script>`/`<link>` with an `integrity` attribute
    pub sri: Regex,
    /// `<script>`/`<link>`/`<img>` with a `crossorigin` attribute
    pub cors: Regex,
    /// Resource element loading over plain `http://`
    pub plain_http: Regex,
    /// `<script>` element with a non-empty inline body
    pub inline_script: Regex,
    pub eval: Regex,
}

lazy_static! {
    static ref BUILTIN: PatternTable = PatternTable::compile_builtin();
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

impl PatternTable {
    /// Shared built-in table
    pub fn builtin() -> &'static PatternTable {
        &BUILTIN
    }

    fn compile_builtin() -> Self {
        // Tag patterns are case-insensitive; the SQL patterns stay
        // case-sensitive or plain prose matches "or".
        let xss = vec![
            Pattern::builtin(
                "inline script block",
                r"(?i)<script\b[^>]*>\s*[^\s<].*?</script>",
            ),
            Pattern::builtin(
                "event handler",
                r#"(?i)\bon[a-z]+\s*=\s*(?:"[^"]*"|'[^']*')"#,
            ),
            Pattern::builtin("javascript uri", r"(?i)javascript:\s*[\w.]+\(.*?\)"),
            Pattern::builtin("html data uri", r"(?i)data:\s*text/html.*?base64"),
            Pattern::builtin("iframe block", r"(?i)<iframe\b[^>]*>.*?</iframe>"),
            Pattern::builtin(
                "javascript image source",
                r#"(?i)<img[^>]+src\s*=\s*['"]?\s*javascript:"#,
            ),
        ];

        let sql_injection = vec![
            Pattern::builtin(
                "or condition",
                r#"(\w+)\s*=\s*['"].*?(\s*|\+)\d*\s*OR\s*['"].*?['"].*?['"]"#,
            ),
            Pattern::builtin("comment terminator", r#"(\w+)\s*=\s*['"].*?['"];.*?--"#),
            Pattern::builtin("union select", r#"(\w+)\s*=\s*['"].*?UNION\s+SELECT"#),
            Pattern::builtin("drop table", r#"(\w+)\s*=\s*['"].*?DROP\s+TABLE"#),
            Pattern::builtin("insert into", r#"(\w+)\s*=\s*['"].*?INSERT\s+INTO"#),
            Pattern::builtin("always true", r#"(\w+)\s*=\s*['"].*?1\s*=\s*1"#),
        ];

        let headers = SecurityHeader::ALL
            .iter()
            .map(|header| (*header, compile(&meta_pattern(header.name()))))
            .collect();

        Self {
            xss,
            sql_injection,
            form: compile(r"(?is)<form\b[^>]*>.*?</form>"),
            csrf_markers: vec!["csrf", "token"],
            headers,
            sri: compile(r#"(?i)<(?:script|link)\b[^>]*\bintegrity\s*=\s*["'][^"']*["'][^>]*>"#),
            cors: compile(r"(?i)<(?:script|link|img)\b[^>]*\bcrossorigin\b[^>]*>"),
            plain_http: compile(
                r#"(?i)<(?:script|link|img|iframe)\b[^>]*\s(?:src|href)\s*=\s*["']http://[^"']*["'][^>]*>"#,
            ),
            inline_script: compile(r"(?is)<script\b[^>]*>\s*[^\s<]"),
            eval: compile(r"\beval\s*\("),
        }
    }

    /// Meta-tag pattern for a header
    pub fn header(&self, header: SecurityHeader) -> Option<&Regex> {
        self.headers
            .iter()
            .find(|(h, _)| *h == header)
            .map(|(_, re)| re)
    }
}

/// Pattern matching `<meta http-equiv="NAME" ...>`
pub fn meta_pattern(name: &str) -> String {
    format!(
        r#"(?i)<meta\s+http-equiv\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(name)
    )
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_compiles() {
        let table = PatternTable::builtin();

        assert_eq!(table.xss.len(), 6);
        assert_eq!(table.sql_injection.len(), 6);
        assert_eq!(table.headers.len(), SecurityHeader::ALL.len());
    }

    #[test]
    fn test_event_handler_needs_word_boundary() {
        let table = PatternTable::builtin();
        let handler = &table.xss[1].regex;

        assert!(handler.is_match(r#"<div onclick="alert(1)">"#));
        assert!(!handler.is_match(r#"<meta http-equiv="X-Content-Type-Options" content="nosniff">"#));
    }

    #[test]
    fn test_header_lookup() {
        let table = PatternTable::default();
        let re = table.header(SecurityHeader::FrameOptions).unwrap();

        assert!(re.is_match(r#"<META HTTP-EQUIV='x-frame-options' content="DENY">"#));
        assert!(!re.is_match(r#"<meta name="X-Frame-Options" content="DENY">"#));
    }

    #[test]
    fn test_inline_script_ignores_empty_bodies() {
        let table = PatternTable::builtin();

        assert!(!table.inline_script.is_match(r#"<script src="/app.js"></script>"#));
        assert!(!table.inline_script.is_match("<script>\n  </script>"));
        assert!(table.inline_script.is_match("<script>\n  init();\n</script>"));
    }

    #[test]
    fn test_plain_http_ignores_data_attributes() {
        let table = PatternTable::builtin();

        assert!(table.plain_http.is_match(r#"<img src="http://a.com/x.png">"#));
        assert!(!table.plain_http.is_match(r#"<img data-src="http://a.com/x.png">"#));
    }

    #[test]
    fn test_script_block_skips_external_scripts() {
        let block = &PatternTable::builtin().xss[0].regex;

        assert!(block.is_match("<script>alert(1)</script>"));
        assert!(!block.is_match(r#"<script src="https://cdn.example.com/a.js"></script>"#));
    }
}
