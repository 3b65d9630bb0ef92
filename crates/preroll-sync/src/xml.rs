//! Attribute scraping for the media server's XML replies.
//!
//! Responses are small `MediaContainer` documents and only a handful of
//! attributes matter, so elements are matched with regexes instead of a full
//! XML parser. Anything malformed simply yields no match.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// One library section from `GET /library/sections`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibrarySection {
    pub key: String,
    pub title: String,
    /// Section type as reported by the server (`movie`, `show`, `artist`...).
    pub kind: String,
}

impl LibrarySection {
    pub fn is_movie(&self) -> bool {
        self.kind.eq_ignore_ascii_case("movie")
    }
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][\w:.-]*)\s*=\s*"([^"]*)""#).expect("attribute regex is valid")
    })
}

fn rating_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"ratingKey\s*=\s*"([^"]+)""#).expect("rating key regex is valid"))
}

/// Attribute maps of every `<tag ...>` element in `xml`.
fn elements(xml: &str, tag: &str) -> Vec<HashMap<String, String>> {
    let pattern = format!(r"<{}\b([^>]*?)/?>", regex::escape(tag));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    re.captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| attributes(m.as_str()))
        .collect()
}

fn attributes(fragment: &str) -> HashMap<String, String> {
    attribute_regex()
        .captures_iter(fragment)
        .map(|c| (c[1].to_string(), unescape(&c[2])))
        .collect()
}

fn unescape(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Sections listed as `<Directory key=".." title=".." type="..">`.
pub fn parse_sections(xml: &str) -> Vec<LibrarySection> {
    elements(xml, "Directory")
        .into_iter()
        .filter_map(|mut attrs| {
            let key = attrs.remove("key")?;
            Some(LibrarySection {
                key,
                title: attrs.remove("title").unwrap_or_default(),
                kind: attrs.remove("type").unwrap_or_default(),
            })
        })
        .collect()
}

/// First `ratingKey` attribute anywhere in the document.
pub fn extract_rating_key(xml: &str) -> Option<String> {
    rating_key_regex()
        .captures(xml)
        .map(|c| c[1].trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Human-readable server name from a `MediaContainer` root.
pub fn server_name(xml: &str) -> Option<String> {
    let container = elements(xml, "MediaContainer").into_iter().next()?;
    ["friendlyName", "name", "title", "machineIdentifier"]
        .iter()
        .filter_map(|k| container.get(*k))
        .find(|v| !v.trim().is_empty())
        .cloned()
}
