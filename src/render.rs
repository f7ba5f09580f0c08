use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use serde::Deserialize;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use url::Url;

use crate::classify;
use crate::config::ResolverConfig;
use crate::error::AnalysisError;
use crate::models::CandidateLink;

// ── Scripts ──────────────────────────────────────────────────────────────────

// Resolves once the load event has fired and no new resource timing entries
// have shown up for 500 ms.
const NETWORK_IDLE_SCRIPT: &str = r#"
    new Promise((resolve) => {
        let seen = performance.getEntriesByType('resource').length;
        let quietSince = Date.now();
        const tick = () => {
            const now = performance.getEntriesByType('resource').length;
            if (now !== seen) {
                seen = now;
                quietSince = Date.now();
            }
            if (document.readyState === 'complete' && Date.now() - quietSince >= 500) {
                resolve(true);
                return;
            }
            setTimeout(tick, 100);
        };
        tick();
    })
"#;

const ANCHORS_SCRIPT: &str = r#"
    Array.from(document.querySelectorAll('a[href]'))
        .filter(a => typeof a.href === 'string')
        .map(a => ({ href: a.href, text: a.textContent || '' }))
"#;

// ── Types ────────────────────────────────────────────────────────────────────

/// An anchor as seen in the rendered DOM; `href` is already absolute.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderedAnchor {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedDocument {
    pub title: Option<String>,
    pub anchors: Vec<RenderedAnchor>,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedAnalysis {
    pub title: Option<String>,
    pub links: Vec<CandidateLink>,
}

/// Loads a page in a real browser and reports what the settled DOM contains.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url) -> Result<RenderedDocument, AnalysisError>;
}

// ── Classification of the rendered DOM ──────────────────────────────────────

pub async fn analyze_rendered(
    renderer: &dyn PageRenderer,
    url: &Url,
) -> Result<RenderedAnalysis, AnalysisError> {
    let document = renderer.render(url).await?;

    let links: Vec<CandidateLink> = document
        .anchors
        .into_iter()
        .filter(|a| classify::is_download_anchor(&a.href, &a.text, false))
        .map(|a| CandidateLink {
            url: a.href,
            label: a.text.trim().to_string(),
        })
        .collect();

    for link in &links {
        debug!(link = %link.url, label = %link.label, "rendered candidate link");
    }
    debug!(url = %url, links = links.len(), "rendered page classified");

    Ok(RenderedAnalysis {
        title: document.title,
        links,
    })
}

// ── Chromium ─────────────────────────────────────────────────────────────────

/// Launches a private headless Chromium for every render.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    user_agent: String,
    timeout: Duration,
    executable: Option<PathBuf>,
}

impl ChromeRenderer {
    pub fn new(config: &ResolverConfig) -> Self {
        ChromeRenderer {
            user_agent: config.user_agent.clone(),
            timeout: config.render_timeout,
            executable: config.chrome_executable.clone(),
        }
    }

    fn browser_config(&self, profile: &TempDir) -> Result<BrowserConfig, AnalysisError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile.path())
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--disable-extensions");

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|e| render_error("browser config error", e))
    }

    async fn navigate(&self, browser: &Browser, url: &Url) -> Result<Page, AnalysisError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| render_error("failed to create page", e))?;

        page.execute(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
            .map_err(|e| render_error("failed to set user agent", e))?;

        page.goto(url.as_str())
            .await
            .map_err(|e| render_error("failed to navigate", e))?;

        page.evaluate_expression(NETWORK_IDLE_SCRIPT)
            .await
            .map_err(|e| render_error("failed waiting for network idle", e))?;

        Ok(page)
    }

    async fn read_document(&self, page: &Page) -> Result<RenderedDocument, AnalysisError> {
        let title = page
            .get_title()
            .await
            .map_err(|e| render_error("failed to read title", e))?;

        let anchors: Vec<RenderedAnchor> = page
            .evaluate_expression(ANCHORS_SCRIPT)
            .await
            .map_err(|e| render_error("failed to query anchors", e))?
            .into_value()
            .map_err(|e| render_error("unexpected anchor data", e))?;

        Ok(RenderedDocument { title, anchors })
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &Url) -> Result<RenderedDocument, AnalysisError> {
        let profile = TempDir::new().map_err(|e| render_error("failed to create profile dir", e))?;
        let config = self.browser_config(&profile)?;

        info!(url = %url, "launching headless browser");
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| render_error("failed to launch browser", e))?;

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let outcome = match tokio::time::timeout(self.timeout, self.navigate(&browser, url)).await {
            Ok(Ok(page)) => self.read_document(&page).await,
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AnalysisError::Render(format!(
                "Navigation timeout of {} ms exceeded",
                self.timeout.as_millis()
            ))),
        };

        if let Err(e) = browser.close().await {
            warn!("browser close failed: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!("browser process did not exit cleanly: {}", e);
        }
        handler_task.abort();
        drop(profile);
        debug!(url = %url, "headless browser torn down");

        outcome
    }
}

fn render_error(context: &str, e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::Render(format!("{}: {}", context, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRenderer(Vec<(&'static str, &'static str)>);

    #[async_trait]
    impl PageRenderer for FixedRenderer {
        async fn render(&self, _url: &Url) -> Result<RenderedDocument, AnalysisError> {
            Ok(RenderedDocument {
                title: Some("Rendered".into()),
                anchors: self
                    .0
                    .iter()
                    .map(|(href, text)| RenderedAnchor {
                        href: href.to_string(),
                        text: text.to_string(),
                    })
                    .collect(),
            })
        }
    }

    #[tokio::test]
    async fn keeps_matching_anchors_in_dom_order() {
        let renderer = FixedRenderer(vec![
            ("https://example.com/home", "Home"),
            ("https://example.com/get?id=1", " Descargar "),
            ("https://cdn.example.com/app.dmg", "mac"),
            ("https://example.com/get?id=1", "Download"),
        ]);
        let url = Url::parse("https://example.com/spa").unwrap();
        let analysis = analyze_rendered(&renderer, &url).await.unwrap();

        let urls: Vec<&str> = analysis.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/get?id=1",
                "https://cdn.example.com/app.dmg",
                "https://example.com/get?id=1",
            ]
        );
        assert_eq!(analysis.links[0].label, "Descargar");
        assert_eq!(analysis.title.as_deref(), Some("Rendered"));
    }

    #[test]
    fn anchor_payload_deserializes() {
        let anchors: Vec<RenderedAnchor> =
            serde_json::from_str(r#"[{"href":"https://a.b/c.zip","text":"zip"}]"#).unwrap();
        assert_eq!(anchors[0].href, "https://a.b/c.zip");
    }
}
