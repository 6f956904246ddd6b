//! Client abstraction for the external generative recipe service.
//!
//! The [`RecipeAi`] trait covers the three generative calls the pipeline
//! makes: plan skeletons, full recipe details, and shopping-list
//! consolidation. [`HttpRecipeAi`] is the production implementation; tests
//! substitute scripted implementations.

pub mod http;
pub mod trait_def;

pub use http::{AiConfig, HttpRecipeAi};
pub use trait_def::{ConsolidatedList, RecipeAi, RecipeDetails, SkeletonRequest, SynthesisRequest};

/// Errors that can occur while talking to the generative service.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("parse error: {0}")]
    Parse(String),
}
