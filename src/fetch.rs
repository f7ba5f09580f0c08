use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::classify;
use crate::config::ResolverConfig;
use crate::error::AnalysisError;
use crate::models::{CandidateLink, PageAnalysis};
use crate::normalize::absolutize;

static CHARSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).expect("valid charset regex")
});

// ── Public result type ───────────────────────────────────────────────────────

/// Outcome of a successful static pass.
#[derive(Debug, Clone)]
pub struct StaticAnalysis {
    pub analysis: PageAnalysis,
    pub links: Vec<CandidateLink>,
    /// HTML page, not itself a download, and no candidate links.
    pub needs_browser: bool,
}

// ── Public API ───────────────────────────────────────────────────────────────

pub async fn analyze_static(
    url: &Url,
    config: &ResolverConfig,
) -> Result<StaticAnalysis, AnalysisError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );

    let mut builder = reqwest::ClientBuilder::new()
        .timeout(config.fetch_timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(config.user_agent.as_str())
        .default_headers(headers);

    if config.insecure_ssl {
        builder = builder.danger_accept_invalid_certs(true);
    }

    let client = builder.build()?;

    info!(url = %url, "static fetch");
    let response = client.get(url.as_str()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AnalysisError::Fetch(format!(
            "HTTPError: {} for url: {}",
            status, url
        )));
    }

    let content_type = header_string(&response, reqwest::header::CONTENT_TYPE);
    let content_disposition = header_string(&response, reqwest::header::CONTENT_DISPOSITION);
    let body = response.bytes().await?;

    debug!(
        url = %url,
        status = status.as_u16(),
        size = body.len(),
        content_type = content_type.as_deref().unwrap_or(""),
        "static fetch complete"
    );

    analyze_response(
        url,
        status.as_u16(),
        content_type,
        content_disposition.as_deref(),
        &body,
    )
}

fn header_string(
    response: &reqwest::Response,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    response
        .headers()
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Decode a body using the charset named in `Content-Type`, UTF-8 otherwise.
fn decode_body<'a>(body: &'a [u8], content_type: Option<&str>) -> Cow<'a, str> {
    let encoding = content_type
        .and_then(|ct| CHARSET_RE.captures(ct))
        .and_then(|c| c.get(1))
        .and_then(|label| Encoding::for_label(label.as_str().as_bytes()))
        .unwrap_or(UTF_8);
    let (decoded, _encoding_used, _had_errors) = encoding.decode(body);
    decoded
}

// ── Response classification ──────────────────────────────────────────────────

/// Classify an already-fetched response and pull candidate links out of it.
pub fn analyze_response(
    url: &Url,
    status_code: u16,
    content_type: Option<String>,
    content_disposition: Option<&str>,
    body: &[u8],
) -> Result<StaticAnalysis, AnalysisError> {
    let is_html = content_type
        .as_deref()
        .map(|ct| ct.to_lowercase().contains("text/html"))
        .unwrap_or(false);

    let (is_direct_download, filename) =
        classify::direct_download(url.as_str(), content_disposition);

    let mut title = None;
    let mut links = Vec::new();
    if is_html {
        let html = decode_body(body, content_type.as_deref());
        let document = Html::parse_document(&html);
        title = extract_title(&document)?;
        links = collect_download_links(&document, url)?;
    }

    let needs_browser = is_html && !is_direct_download && links.is_empty();

    Ok(StaticAnalysis {
        analysis: PageAnalysis {
            url: url.to_string(),
            title,
            content_type,
            is_html,
            is_direct_download,
            filename,
            status_code,
            size_bytes: body.len(),
        },
        links,
        needs_browser,
    })
}

// ── HTML scanning ────────────────────────────────────────────────────────────

pub fn extract_download_links(
    html: &str,
    base_url: &Url,
) -> Result<Vec<CandidateLink>, AnalysisError> {
    let document = Html::parse_document(html);
    collect_download_links(&document, base_url)
}

fn collect_download_links(
    document: &Html,
    base_url: &Url,
) -> Result<Vec<CandidateLink>, AnalysisError> {
    let anchor_sel = selector("a[href]")?;

    let links = document
        .select(&anchor_sel)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let label: String = el.text().collect();
            let has_download = el.value().attr("download").is_some();
            if !classify::is_download_anchor(href, &label, has_download) {
                return None;
            }
            let link = CandidateLink {
                url: absolutize(href, base_url),
                label: label.trim().to_string(),
            };
            debug!(link = %link.url, label = %link.label, "candidate link");
            Some(link)
        })
        .collect();

    Ok(links)
}

fn extract_title(document: &Html) -> Result<Option<String>, AnalysisError> {
    let title_sel = selector("title")?;
    Ok(document
        .select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string()))
}

fn selector(css: &str) -> Result<Selector, AnalysisError> {
    Selector::parse(css).map_err(|e| AnalysisError::Parse(e.to_string()))
}
