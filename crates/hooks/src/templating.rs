//! Minijinja rendering for hook argument templates.
//!
//! Templates are parsed once when hooks are configured, so malformed ones are
//! rejected before any feed is fetched. Rendering uses strict undefined
//! behavior: referencing a field the context does not have is an error
//! rather than silently printing nothing.

use feedsync_core::{FeedEntry, FeedInfo};
use minijinja::{Environment, UndefinedBehavior};

use crate::error::HookError;

/// Context data available to argument templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateContext {
    /// Entry title.
    pub title: String,
    /// Entry link.
    pub link: String,
    /// The feed the entry came from.
    pub feed: FeedContext,
}

/// Feed metadata exposed to templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FeedContext {
    pub title: String,
    /// Feed link with a single trailing `/` removed.
    pub link: String,
}

impl TemplateContext {
    pub fn new(feed: &FeedInfo, entry: &FeedEntry) -> Self {
        let feed_link = feed.link.strip_suffix('/').unwrap_or(&feed.link);
        Self {
            title: entry.title.clone(),
            link: entry.link.clone(),
            feed: FeedContext {
                title: feed.title.clone(),
                link: feed_link.to_string(),
            },
        }
    }
}

/// Renders argument templates using a shared minijinja environment.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_function("env", env_function);
        Self { env }
    }

    /// Check that a template parses, without evaluating it.
    pub fn validate(&self, template: &str) -> Result<(), HookError> {
        self.env
            .template_from_str(template)
            .map(|_| ())
            .map_err(|e| HookError::InvalidTemplate {
                template: template.to_string(),
                reason: e.to_string(),
            })
    }

    /// Render a template against `ctx`.
    pub fn render(&self, template: &str, ctx: &TemplateContext) -> Result<String, HookError> {
        self.env
            .render_str(template, ctx)
            .map_err(|e| HookError::Render {
                template: template.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Global function: read an environment variable by name.
///
/// Returns an empty string (and logs a warning) when the variable is unset.
fn env_function(name: String) -> String {
    match std::env::var(&name) {
        Ok(val) => val,
        Err(_) => {
            tracing::warn!(var = %name, "Environment variable not found, returning empty string");
            String::new()
        }
    }
}
