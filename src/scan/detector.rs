// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Regex-driven inspector

use super::Inspector;
use crate::patterns::{Pattern, PatternTable};
use crate::report::{ContentFeature, ContentSecurity, SecurityHeader};

/// Inspector that treats HTML as text and runs a [`PatternTable`] over it
#[derive(Debug, Clone, Default)]
pub struct RegexInspector {
    patterns: PatternTable,
}

impl RegexInspector {
    /// Create an inspector over a custom pattern table
    pub fn new(patterns: PatternTable) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &PatternTable {
        &self.patterns
    }

    fn matches(patterns: &[Pattern], html: &str) -> Vec<String> {
        let mut found = Vec::new();
        for pattern in patterns {
            let before = found.len();
            found.extend(pattern.regex.find_iter(html).map(|m| m.as_str().to_string()));
            if found.len() > before {
                tracing::trace!(pattern = pattern.label, count = found.len() - before, "Pattern matched");
            }
        }
        found
    }
}

impl Inspector for RegexInspector {
    fn xss(&self, html: &str) -> Vec<String> {
        Self::matches(&self.patterns.xss, html)
    }

    fn sql_injection(&self, html: &str) -> Vec<String> {
        Self::matches(&self.patterns.sql_injection, html)
    }

    fn csrf(&self, html: &str) -> Vec<String> {
        self.patterns
            .form
            .find_iter(html)
            .map(|m| m.as_str())
            .filter(|form| {
                let lower = form.to_lowercase();
                !self
                    .patterns
                    .csrf_markers
                    .iter()
                    .any(|marker| lower.contains(marker))
            })
            .map(str::to_string)
            .collect()
    }

    fn missing_headers(&self, html: &str) -> Vec<SecurityHeader> {
        self.patterns
            .headers
            .iter()
            .filter(|(_, re)| !re.is_match(html))
            .map(|(header, _)| *header)
            .collect()
    }

    fn content_security(&self, html: &str) -> ContentSecurity {
        let p = &self.patterns;
        ContentSecurity::from([
            (ContentFeature::Sri, p.sri.is_match(html)),
            (ContentFeature::Cors, p.cors.is_match(html)),
            (ContentFeature::HttpsOnly, !p.plain_http.is_match(html)),
            (ContentFeature::NoInlineScript, !p.inline_script.is_match(html)),
            (ContentFeature::NoEval, !p.eval.is_match(html)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspector() -> RegexInspector {
        RegexInspector::default()
    }

    #[test]
    fn test_script_block_returned_verbatim() {
        let html = "<body><p>hi</p><script>alert(1)</script></body>";
        assert_eq!(inspector().xss(html), vec!["<script>alert(1)</script>"]);
    }

    #[test]
    fn test_xss_vectors_in_table_order() {
        let html = concat!(
            r#"<a href="javascript:steal(document.cookie)">x</a>"#,
            "\n",
            r#"<div onmouseover="go()">y</div>"#,
            "\n",
            r#"<iframe src="https://ads.example.com"></iframe>"#,
            "\n",
            r#"<img src="javascript:alert(1)">"#,
            "\n",
            r#"<object data="data:text/html;base64,PHNjcmlwdD4="></object>"#,
        );

        let found = inspector().xss(html);
        assert_eq!(
            found,
            vec![
                r#"onmouseover="go()""#,
                "javascript:steal(document.cookie)",
                "javascript:alert(1)",
                "data:text/html;base64",
                r#"<iframe src="https://ads.example.com"></iframe>"#,
                r#"<img src="javascript:"#,
            ]
        );
    }

    #[test]
    fn test_multiline_script_is_not_a_block_match() {
        let html = "<script>\n  init();\n</script>";
        assert!(inspector().xss(html).is_empty());
    }

    #[test]
    fn test_sql_injection_patterns() {
        let html = concat!(
            r#"<input value="q" data-query="id='1' OR '1'='1'">"#,
            "\n",
            r#"<p title="x UNION SELECT password FROM users">"#,
            "\n",
            "<p>Plain text or prose is not flagged.</p>",
        );

        let found = inspector().sql_injection(html);
        assert!(found.iter().any(|m| m.contains(" OR '1'='")));
        assert!(found.iter().any(|m| m.ends_with("UNION SELECT")));
        assert!(!found.iter().any(|m| m.contains("prose")));
    }

    #[test]
    fn test_csrf_flags_unprotected_forms_only() {
        let html = r#"
<form action="/login" method="post">
  <input name="user">
</form>
<form action="/transfer" method="post">
  <input type="hidden" name="csrf_token" value="abc">
</form>
<form action="/search"><input name="authenticity_TOKEN"></form>
"#;

        let found = inspector().csrf(html);
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with(r#"<form action="/login""#));
        assert!(found[0].ends_with("</form>"));
    }

    #[test]
    fn test_all_headers_missing() {
        let html = "<html><head><title>t</title></head><body></body></html>";
        assert_eq!(inspector().missing_headers(html), SecurityHeader::ALL.to_vec());
    }

    #[test]
    fn test_present_headers_not_reported() {
        let html = r#"<head>
<meta http-equiv="X-Frame-Options" content="DENY">
<meta http-equiv='Content-Security-Policy' content="default-src 'self'">
</head>"#;

        assert_eq!(
            inspector().missing_headers(html),
            vec![
                SecurityHeader::XssProtection,
                SecurityHeader::ContentTypeOptions,
                SecurityHeader::StrictTransportSecurity,
            ]
        );
    }

    #[test]
    fn test_content_security_https_only_document() {
        let html = r#"<head>
<link rel="stylesheet" href="https://cdn.example.com/a.css" integrity="sha384-abc" crossorigin="anonymous">
<script src="https://cdn.example.com/a.js"></script>
</head>"#;

        let features = inspector().content_security(html);
        assert_eq!(features.len(), 5);
        assert!(features[&ContentFeature::Sri]);
        assert!(features[&ContentFeature::Cors]);
        assert!(features[&ContentFeature::HttpsOnly]);
        assert!(features[&ContentFeature::NoInlineScript]);
        assert!(features[&ContentFeature::NoEval]);
    }

    #[test]
    fn test_content_security_weak_document() {
        let html = r#"<img src="http://example.com/a.png"><script>eval(location.hash)</script>"#;

        let features = inspector().content_security(html);
        assert!(!features[&ContentFeature::Sri]);
        assert!(!features[&ContentFeature::Cors]);
        assert!(!features[&ContentFeature::HttpsOnly]);
        assert!(!features[&ContentFeature::NoInlineScript]);
        assert!(!features[&ContentFeature::NoEval]);
    }
}
