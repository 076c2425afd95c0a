//! Post-processing of renderer markup
//!
//! The generator returns a complete XHTML page whose diagram elements carry
//! an `svg:` prefix. [`xhtml_to_html`] turns that into plain HTML first.
//! Statement diagrams then keep only the first `<svg>` element, the overview
//! keeps the `<body>` contents, and cross-reference anchors are pointed at
//! the grammar page or removed.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

/// Anchor prefix produced by the generator for in-page references.
const LOCAL_LINK: &str = r##"<a xlink:href="#"##;

const GENERATED_BY: &str =
    r#"<p>generated by <a href="http://www.bottlecaps.de/rr/ui">Railroad Diagram Generator</a></p>"#;

static TAG_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9:-]*$").unwrap());

static XML_PROLOG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<\?xml[^>]*\?>\s*").unwrap());

static PREFIXED_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([A-Za-z][\w.-]*):([A-Za-z][\w.-]*)").unwrap());

static PREFIX_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s+xmlns:([A-Za-z][\w.-]*)="[^"]*""#).unwrap());

static SELF_CLOSING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z][\w:.-]*)((?:\s[^<>]*?)?)\s*/>").unwrap());

/// Elements HTML writes without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Rewrite XHTML as HTML: drop the XML prolog, strip element namespace
/// prefixes (`<svg:a>` becomes `<a>`) along with their `xmlns:` declarations,
/// and give self-closed non-void elements an explicit end tag.
pub fn xhtml_to_html(markup: &str) -> String {
    let markup = XML_PROLOG.replace(markup, "");

    let mut prefixes: HashSet<String> = HashSet::new();
    let unprefixed = PREFIXED_ELEMENT.replace_all(&markup, |caps: &Captures| {
        prefixes.insert(caps[2].to_string());
        format!("<{}{}", &caps[1], &caps[3])
    });

    let undeclared = PREFIX_DECLARATION.replace_all(&unprefixed, |caps: &Captures| {
        if prefixes.contains(&caps[1]) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    SELF_CLOSING
        .replace_all(&undeclared, |caps: &Captures| {
            let name = &caps[1];
            if VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()) {
                caps[0].to_string()
            } else {
                format!("<{}{}></{}>", name, &caps[2], name)
            }
        })
        .into_owned()
}

// Byte range of the first `<tag ...>...</tag>` element: (outer start, inner
// start, inner end, outer end). Nested elements with the same tag are
// balanced.
fn locate(markup: &str, tag: &str) -> Option<(usize, usize, usize, usize)> {
    if !TAG_NAME.is_match(tag) {
        return None;
    }
    let pattern = format!(r"(?i)<(/?){}(?:\s[^>]*?)?(/?)>", regex::escape(tag));
    let re = Regex::new(&pattern).ok()?;

    let mut open: Option<(usize, usize)> = None;
    let mut depth = 0usize;
    for caps in re.captures_iter(markup) {
        let whole = caps.get(0)?;
        let closing = caps.get(1).map_or(false, |m| !m.as_str().is_empty());
        let self_closing = caps.get(2).map_or(false, |m| !m.as_str().is_empty());
        match open {
            None if closing => continue,
            None if self_closing => {
                return Some((whole.start(), whole.end(), whole.end(), whole.end()));
            }
            None => {
                open = Some((whole.start(), whole.end()));
                depth = 1;
            }
            Some(_) if self_closing => {}
            Some(_) if !closing => depth += 1,
            Some((outer_start, inner_start)) => {
                depth -= 1;
                if depth == 0 {
                    return Some((outer_start, inner_start, whole.start(), whole.end()));
                }
            }
        }
    }
    None
}

/// Contents of the first `tag` element, without the element's own tags.
pub fn inner_tag<'a>(markup: &'a str, tag: &str) -> Option<&'a str> {
    locate(markup, tag).map(|(_, start, end, _)| &markup[start..end])
}

/// The first `tag` element including its own tags.
pub fn extract_tag<'a>(markup: &'a str, tag: &str) -> Option<&'a str> {
    locate(markup, tag).map(|(start, _, _, end)| &markup[start..end])
}

/// Point in-page anchors at `prefix`.
pub fn rewrite_links(markup: &str, prefix: &str) -> String {
    markup.replace(LOCAL_LINK, &format!(r#"<a xlink:href="{}#"#, prefix))
}

/// Replace anchors to `name` on the `prefix` page with their contents.
pub fn unlink(markup: &str, prefix: &str, name: &str) -> String {
    let pattern = format!(
        r#"<a xlink:href="{}#{}" xlink:title="{}">((?s).*?)</a>"#,
        regex::escape(prefix),
        regex::escape(name),
        regex::escape(name)
    );
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(markup, "$1").into_owned(),
        Err(_) => markup.to_string(),
    }
}

/// Cut a rendered page down to the overview fragment: the `<body>` contents
/// up to the first `<hr/>`, credited and wrapped in a `<div>`.
pub fn overview_fragment(page: &str) -> Option<String> {
    let body = inner_tag(page, "body")?;
    let body = body.split("<hr/>").next().unwrap_or(body);
    Some(format!("<div>{}{}</div>", body, GENERATED_BY))
}
