use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

/// What the static pass learned about the fetched resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAnalysis {
    pub url: String,
    pub title: Option<String>,
    pub content_type: Option<String>,
    pub is_html: bool,
    pub is_direct_download: bool,
    pub filename: Option<String>,
    pub status_code: u16,
    pub size_bytes: usize,
}

/// An absolute link believed to point at downloadable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub url: String,
    /// Anchor text that matched; logged at debug level, not returned.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    pub success: bool,
    pub url: String,
    pub error: Option<String>,
    pub is_direct_download: bool,
    pub download_links: Vec<String>,
    pub recommended_link: Option<String>,
    pub title: Option<String>,
    pub content_type: Option<String>,
}

impl ResolutionResult {
    /// A failed resolution carrying only the error message.
    pub fn failure(url: &str, error: String) -> Self {
        ResolutionResult {
            success: false,
            url: url.to_string(),
            error: Some(error),
            is_direct_download: false,
            download_links: Vec::new(),
            recommended_link: None,
            title: None,
            content_type: None,
        }
    }
}
