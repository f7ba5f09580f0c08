// ── Error type ───────────────────────────────────────────────────────────────

/// Failure of a single pipeline stage.
///
/// The `Display` output is what ends up in `ResolutionResult::error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid URL format")]
    InvalidUrl,
    #[error("Error analyzing URL: {0}")]
    Fetch(String),
    #[error("Error analyzing URL: {0}")]
    Parse(String),
    #[error("Error analyzing URL with browser: {0}")]
    Render(String),
}

impl AnalysisError {
    /// Whether a static-stage failure of this kind should escalate to the browser.
    pub fn triggers_fallback(&self) -> bool {
        matches!(self, AnalysisError::Fetch(_) | AnalysisError::Parse(_))
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AnalysisError::Fetch(format!("TimeoutError: {}", e))
        } else if e.is_connect() {
            AnalysisError::Fetch(format!("ConnectError: {}", e))
        } else if e.is_status() {
            AnalysisError::Fetch(format!("HTTPError: {}", e))
        } else {
            AnalysisError::Fetch(format!("RequestError: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fetch_and_parse_escalate() {
        assert!(AnalysisError::Fetch("x".into()).triggers_fallback());
        assert!(AnalysisError::Parse("x".into()).triggers_fallback());
        assert!(!AnalysisError::InvalidUrl.triggers_fallback());
        assert!(!AnalysisError::Render("x".into()).triggers_fallback());
    }

    #[test]
    fn invalid_url_message() {
        assert_eq!(AnalysisError::InvalidUrl.to_string(), "Invalid URL format");
    }
}
