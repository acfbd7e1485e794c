//! Best-effort HTML extraction of links and form descriptors.

use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Form submission method. Anything that is not POST is treated as GET,
/// matching what browsers do with unknown methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormMethod {
    Get,
    Post,
}

impl fmt::Display for FormMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormMethod::Get => f.write_str("GET"),
            FormMethod::Post => f.write_str("POST"),
        }
    }
}

/// A form found on a page: where it submits, how, and which named inputs it
/// carries (document order).
#[derive(Debug, Clone)]
pub struct FormDescriptor {
    pub action: String,
    pub method: FormMethod,
    pub inputs: Vec<String>,
}

/// Everything extraction recovers from one page.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Absolute link targets, de-duplicated within the page, first-seen order.
    pub links: Vec<String>,
    pub forms: Vec<FormDescriptor>,
}

/// Decide whether a body should be parsed as HTML. Trusts the content-type
/// when present, sniffs the first bytes when it is not.
pub fn looks_like_html(content_type: Option<&str>, body: &str) -> bool {
    match content_type {
        Some(ct) => ct.to_ascii_lowercase().contains("html"),
        None => {
            let head: String = body.chars().take(512).collect::<String>().to_ascii_lowercase();
            head.contains("<!doctype html") || head.contains("<html")
        }
    }
}

/// Resolve an href-like attribute value against the page URL. Pseudo links
/// and bare fragments are skipped; the fragment is dropped from the result.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    resolved.set_fragment(None);
    Some(resolved)
}

/// Pull links and forms out of an HTML body.
///
/// `Html::parse_document` recovers from malformed markup the way browsers do,
/// so a broken page degrades to whatever anchors and forms are still
/// reachable instead of failing the crawl.
pub fn extract(base: &Url, body: &str) -> Extraction {
    let document = Html::parse_document(body);

    let link_selector = Selector::parse("a[href]").unwrap();
    let form_selector = Selector::parse("form").unwrap();
    let input_selector = Selector::parse("input[name], select[name], textarea[name]").unwrap();

    let mut links = Vec::new();
    let mut seen = HashSet::new();
    for element in document.select(&link_selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(absolute) = resolve_href(base, href)
        {
            let absolute = absolute.to_string();
            if seen.insert(absolute.clone()) {
                links.push(absolute);
            }
        }
    }

    let mut forms = Vec::new();
    for form in document.select(&form_selector) {
        let action = form
            .value()
            .attr("action")
            .filter(|a| !a.is_empty())
            .and_then(|a| resolve_href(base, a))
            .unwrap_or_else(|| {
                // a form without an action submits back to the page itself
                let mut page = base.clone();
                page.set_fragment(None);
                page
            })
            .to_string();

        let method = match form.value().attr("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
            _ => FormMethod::Get,
        };

        let inputs: Vec<String> = form
            .select(&input_selector)
            .filter_map(|input| input.value().attr("name"))
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
            .collect();

        forms.push(FormDescriptor {
            action,
            method,
            inputs,
        });
    }

    Extraction { links, forms }
}
