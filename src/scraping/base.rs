use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break regex"));

/// Trimmed `textContent` of `element`: text nodes joined as-is.
pub fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(text_content)
        .filter(|text| !text.is_empty())
}

pub fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|value| value.trim().to_string())
}

pub fn first_inner_html(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(|el| el.inner_html())
}

/// Plain text of an HTML fragment, with `<br>` variants turned into newlines.
pub fn html_to_text(markup: &str) -> String {
    let with_breaks = LINE_BREAK_RE.replace_all(markup, "\n");
    let fragment = Html::parse_fragment(&with_breaks);
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}

/// Resolve `href` against `base` the way a browser resolves `anchor.href`.
/// Only http(s) targets are kept.
pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => Url::parse(base).ok()?.join(href).ok()?,
    };
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
