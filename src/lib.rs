//! Classifies a URL as a direct file download or a page carrying download
//! links, and picks the single best link to hand back.
//!
//! [`Resolver::resolve`] runs a static fetch-and-parse pass first and falls
//! back to a headless browser only when that pass comes up empty or fails.

pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod render;
pub mod resolve;

pub use config::ResolverConfig;
pub use error::AnalysisError;
pub use models::{AnalyzeRequest, CandidateLink, PageAnalysis, ResolutionResult};
pub use render::{ChromeRenderer, PageRenderer};
pub use resolve::Resolver;
