// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Text rewrite passes
//!
//! Each pass is a pure function over the working copy. The async SRI pass
//! lives in the parent module since it needs the hasher.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::patterns::meta_pattern;
use crate::report::SecurityHeader;

/// Hidden input name injected into forms, also the idempotency marker
pub const CSRF_FIELD: &str = "csrf_token";

lazy_static! {
    static ref SCRIPT_OPEN: Regex = Regex::new(r"(?i)<script\b[^>]*>").unwrap();
    static ref STYLE_OPEN: Regex = Regex::new(r"(?i)<style\b[^>]*>").unwrap();
    static ref STYLESHEET_LINK: Regex =
        Regex::new(r#"(?i)<link\b[^>]*\brel\s*=\s*["']?stylesheet\b[^>]*>"#).unwrap();
    static ref NONCE_ATTR: Regex = Regex::new(r"(?i)\snonce\s*=").unwrap();
    static ref CSP_META_LINE: Regex = Regex::new(&format!(
        r"{}(?:\r?\n)?",
        meta_pattern(SecurityHeader::ContentSecurityPolicy.name())
    ))
    .unwrap();
    static ref HEAD_CLOSE: Regex = Regex::new(r"(?i)</head\s*>").unwrap();
    static ref HEAD_OPEN: Regex = Regex::new(r"(?i)<head\b[^>]*>").unwrap();
    static ref INSECURE_URL_ATTR: Regex =
        Regex::new(r#"(?i)(\b(?:src|href|action|poster|data)\s*=\s*["']?\s*)http://"#).unwrap();
}

/// Add ` attr` to an opening tag, keeping a self-closing `/>` in place
pub fn add_attribute(tag: &str, attr: &str) -> String {
    let split = if tag.ends_with("/>") {
        tag.len() - 2
    } else if tag.ends_with('>') {
        tag.len() - 1
    } else {
        tag.len()
    };
    let (head, tail) = tag.split_at(split);
    format!("{} {}{}", head.trim_end(), attr, tail)
}

/// Attach `nonce` to every script, style and stylesheet link without one.
///
/// Returns the rewritten text and how many tags changed.
pub fn inject_nonces(html: &str, nonce: &str) -> (String, usize) {
    let attr = format!(r#"nonce="{}""#, nonce);
    let mut added = 0;
    let mut content = html.to_string();

    for re in [&*SCRIPT_OPEN, &*STYLE_OPEN, &*STYLESHEET_LINK] {
        content = re
            .replace_all(&content, |caps: &Captures| {
                let tag = &caps[0];
                if NONCE_ATTR.is_match(tag) {
                    tag.to_string()
                } else {
                    added += 1;
                    add_attribute(tag, &attr)
                }
            })
            .into_owned();
    }

    (content, added)
}

/// Remove every CSP meta tag. Returns the text and the number removed.
pub fn strip_csp_meta(html: &str) -> (String, usize) {
    let removed = CSP_META_LINE.find_iter(html).count();
    if removed == 0 {
        return (html.to_string(), 0);
    }
    (CSP_META_LINE.replace_all(html, "").into_owned(), removed)
}

/// Whether the document has a head to insert into
pub fn has_head(html: &str) -> bool {
    HEAD_CLOSE.is_match(html) || HEAD_OPEN.is_match(html)
}

/// Insert `snippet` on its own line before `</head>`, or after `<head>` when
/// the document never closes its head. `None` if there is no head at all.
pub fn insert_into_head(html: &str, snippet: &str) -> Option<String> {
    if let Some(m) = HEAD_CLOSE.find(html) {
        return Some(format!(
            "{}{}\n{}",
            &html[..m.start()],
            snippet,
            &html[m.start()..]
        ));
    }

    HEAD_OPEN.find(html).map(|m| {
        format!(
            "{}\n{}{}",
            &html[..m.end()],
            snippet,
            &html[m.end()..]
        )
    })
}

/// Replace every occurrence of `snippet` with `replacement`.
///
/// Returns the text and the number of occurrences replaced.
pub fn excise(html: &str, snippet: &str, replacement: &str) -> (String, usize) {
    if snippet.is_empty() {
        return (html.to_string(), 0);
    }
    let count = html.matches(snippet).count();
    if count == 0 {
        return (html.to_string(), 0);
    }
    (html.replace(snippet, replacement), count)
}

/// Replace every tag that starts with `prefix`, up to and including its
/// closing `>`, with `replacement`.
///
/// Returns the text and the number of tags replaced.
pub fn excise_tag(html: &str, prefix: &str, replacement: &str) -> (String, usize) {
    if prefix.is_empty() {
        return (html.to_string(), 0);
    }

    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut count = 0;
    while let Some(start) = rest.find(prefix) {
        let after = start + prefix.len();
        let end = rest[after..]
            .find('>')
            .map(|i| after + i + 1)
            .unwrap_or(rest.len());
        out.push_str(&rest[..start]);
        out.push_str(replacement);
        rest = &rest[end..];
        count += 1;
    }
    out.push_str(rest);

    (out, count)
}

/// Client-side script adding a hidden CSRF token input to every form
pub fn csrf_script(nonce: &str) -> String {
    format!(
        r#"<script nonce="{nonce}">
  function generateCSRFToken() {{
    const bytes = new Uint8Array(16);
    window.crypto.getRandomValues(bytes);
    return Array.from(bytes, b => b.toString(16).padStart(2, '0')).join('');
  }}
  document.addEventListener('DOMContentLoaded', function() {{
    const csrfToken = generateCSRFToken();
    document.querySelectorAll('form').forEach(form => {{
      if (!form.querySelector('input[name="{field}"]')) {{
        const tokenInput = document.createElement('input');
        tokenInput.type = 'hidden';
        tokenInput.name = '{field}';
        tokenInput.value = csrfToken;
        form.appendChild(tokenInput);
      }}
    }});
  }});
</script>"#,
        nonce = nonce,
        field = CSRF_FIELD,
    )
}

/// Upgrade `http://` to `https://` inside URL-bearing attributes.
///
/// Text content, comments and script bodies are left alone.
pub fn upgrade_insecure_urls(html: &str) -> (String, usize) {
    let count = INSECURE_URL_ATTR.find_iter(html).count();
    if count == 0 {
        return (html.to_string(), 0);
    }
    (
        INSECURE_URL_ATTR
            .replace_all(html, "${1}https://")
            .into_owned(),
        count,
    )
}
