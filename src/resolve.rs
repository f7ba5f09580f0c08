use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::config::ResolverConfig;
use crate::error::AnalysisError;
use crate::fetch::{self, StaticAnalysis};
use crate::models::ResolutionResult;
use crate::render::{self, ChromeRenderer, PageRenderer, RenderedAnalysis};

// ── Pipeline state ───────────────────────────────────────────────────────────

enum ResolveState {
    Start {
        url: Url,
    },
    StaticAnalyzed {
        url: Url,
        static_pass: Result<StaticAnalysis, AnalysisError>,
    },
    BrowserAnalyzed {
        static_pass: Result<StaticAnalysis, AnalysisError>,
        rendered: Result<RenderedAnalysis, AnalysisError>,
    },
    Finalized(ResolutionResult),
}

/// Where the pipeline goes after the static pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStage {
    Render,
    Finalize,
}

/// Escalate only for an HTML page with no links, or a static failure that
/// warrants a browser retry.
pub fn after_static(
    static_pass: &Result<StaticAnalysis, AnalysisError>,
    browser_available: bool,
) -> NextStage {
    if !browser_available {
        return NextStage::Finalize;
    }
    match static_pass {
        Ok(analysis) if analysis.needs_browser => NextStage::Render,
        Ok(_) => NextStage::Finalize,
        Err(e) if e.triggers_fallback() => NextStage::Render,
        Err(_) => NextStage::Finalize,
    }
}

// ── Resolver ─────────────────────────────────────────────────────────────────

/// Resolves a URL to its best download link.
///
/// Holds no per-request state; one instance can serve concurrent requests.
#[derive(Clone)]
pub struct Resolver {
    config: ResolverConfig,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl Resolver {
    /// Uses headless Chromium for escalation unless the config disables it.
    pub fn new(config: ResolverConfig) -> Self {
        let renderer: Option<Arc<dyn PageRenderer>> = if config.browser_enabled {
            Some(Arc::new(ChromeRenderer::new(&config)))
        } else {
            None
        };
        Resolver { config, renderer }
    }

    pub fn with_renderer(config: ResolverConfig, renderer: Option<Arc<dyn PageRenderer>>) -> Self {
        Resolver { config, renderer }
    }

    pub async fn resolve(&self, raw_url: &str) -> ResolutionResult {
        let mut state = match parse_request_url(raw_url) {
            Ok(url) => ResolveState::Start { url },
            Err(e) => {
                info!(url = raw_url, "rejected: {}", e);
                ResolveState::Finalized(ResolutionResult::failure(raw_url, e.to_string()))
            }
        };

        loop {
            state = match state {
                ResolveState::Finalized(result) => return result,
                ResolveState::Start { url } => self.run_static(url).await,
                ResolveState::StaticAnalyzed { url, static_pass } => {
                    self.escalate_or_finalize(raw_url, url, static_pass).await
                }
                ResolveState::BrowserAnalyzed {
                    static_pass,
                    rendered,
                } => ResolveState::Finalized(finalize(raw_url, static_pass, Some(rendered))),
            };
        }
    }

    async fn run_static(&self, url: Url) -> ResolveState {
        let static_pass = fetch::analyze_static(&url, &self.config).await;
        if let Err(e) = &static_pass {
            warn!(url = %url, "static analysis failed: {}", e);
        }
        ResolveState::StaticAnalyzed { url, static_pass }
    }

    async fn escalate_or_finalize(
        &self,
        raw_url: &str,
        url: Url,
        static_pass: Result<StaticAnalysis, AnalysisError>,
    ) -> ResolveState {
        match (after_static(&static_pass, self.renderer.is_some()), &self.renderer) {
            (NextStage::Render, Some(renderer)) => {
                info!(url = %url, "escalating to headless browser");
                let rendered = render::analyze_rendered(renderer.as_ref(), &url).await;
                ResolveState::BrowserAnalyzed {
                    static_pass,
                    rendered,
                }
            }
            _ => ResolveState::Finalized(finalize(raw_url, static_pass, None)),
        }
    }
}

pub fn parse_request_url(raw: &str) -> Result<Url, AnalysisError> {
    let url = Url::parse(raw).map_err(|_| AnalysisError::InvalidUrl)?;
    let has_host = url.host_str().map(|h| !h.is_empty()).unwrap_or(false);
    if !matches!(url.scheme(), "http" | "https") || !has_host {
        return Err(AnalysisError::InvalidUrl);
    }
    Ok(url)
}

// ── Finalization ─────────────────────────────────────────────────────────────

fn finalize(
    raw_url: &str,
    static_pass: Result<StaticAnalysis, AnalysisError>,
    rendered: Option<Result<RenderedAnalysis, AnalysisError>>,
) -> ResolutionResult {
    let (analysis, mut links, mut error) = match static_pass {
        Ok(pass) => (Some(pass.analysis), pass.links, None),
        Err(e) => (None, Vec::new(), Some(e.to_string())),
    };
    let mut title = analysis.as_ref().and_then(|a| a.title.clone());

    match rendered {
        Some(Ok(pass)) => {
            if !pass.links.is_empty() {
                links = pass.links;
            }
            if title.is_none() {
                title = pass.title;
            }
            error = None;
        }
        Some(Err(e)) if error.is_some() => error = Some(e.to_string()),
        Some(Err(e)) => warn!(url = raw_url, "browser pass failed, keeping static result: {}", e),
        None => {}
    }

    let is_direct_download = analysis.as_ref().map(|a| a.is_direct_download).unwrap_or(false);
    let download_links: Vec<String> = links.into_iter().map(|l| l.url).collect();
    let recommended_link = if is_direct_download {
        Some(raw_url.to_string())
    } else {
        download_links.first().cloned()
    };

    ResolutionResult {
        success: error.is_none(),
        url: raw_url.to_string(),
        error,
        is_direct_download,
        download_links,
        recommended_link,
        title,
        content_type: analysis.and_then(|a| a.content_type),
    }
}
