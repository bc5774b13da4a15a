//! Runs configured hooks for newly delivered entries.
//!
//! Every hook is validated when the dispatcher is built. At dispatch time
//! each hook runs on its own: a rendering failure, a non-zero exit or a
//! timeout is logged and the next hook still runs.

use std::time::{Duration, Instant};

use feedsync_core::{FeedEntry, FeedInfo, HookConfig, HooksConfig};
use tracing::{info, warn};

use crate::error::HookError;
use crate::spawn::{self, DEFAULT_TIMEOUT};
use crate::templating::{TemplateContext, TemplateRenderer};

/// Name of the event fired for every delivered entry.
pub const NEW_ARTICLE: &str = "new_article";

/// A validated hook: a program plus its argument templates.
#[derive(Debug, Clone)]
struct SpawnHook {
    command: String,
    arg_templates: Vec<String>,
}

impl SpawnHook {
    fn from_config(
        event: &'static str,
        config: &HookConfig,
        renderer: &TemplateRenderer,
    ) -> Result<Self, HookError> {
        let (command, arg_templates) = config
            .spawn
            .split_first()
            .filter(|(command, _)| !command.trim().is_empty())
            .ok_or(HookError::NoSpawnCommand { event })?;

        for template in arg_templates {
            renderer.validate(template)?;
        }

        Ok(Self {
            command: command.clone(),
            arg_templates: arg_templates.to_vec(),
        })
    }
}

/// Dispatches hook commands for newly delivered entries.
#[derive(Debug)]
pub struct HookDispatcher {
    new_article: Vec<SpawnHook>,
    renderer: TemplateRenderer,
    timeout: Duration,
}

impl HookDispatcher {
    /// Build a dispatcher, rejecting the whole configuration if any hook has
    /// no command or an unparsable argument template.
    pub fn new(config: &HooksConfig) -> Result<Self, HookError> {
        let renderer = TemplateRenderer::new();
        let new_article = config
            .new_article
            .iter()
            .map(|hook| SpawnHook::from_config(NEW_ARTICLE, hook, &renderer))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            new_article,
            renderer,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of `new_article` hooks.
    pub fn len(&self) -> usize {
        self.new_article.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new_article.is_empty()
    }

    /// Run every `new_article` hook for `entry`, one after another.
    ///
    /// Returns once every command has exited or been killed. Failures are
    /// logged, never returned.
    pub async fn new_article(&self, feed: &FeedInfo, entry: &FeedEntry) {
        if self.new_article.is_empty() {
            return;
        }

        let ctx = TemplateContext::new(feed, entry);
        for hook in &self.new_article {
            let args = self.render_args(hook, &ctx);
            self.run(hook, &args, &entry.link).await;
        }
    }

    fn render_args(&self, hook: &SpawnHook, ctx: &TemplateContext) -> Vec<String> {
        hook.arg_templates
            .iter()
            .map(|template| {
                self.renderer.render(template, ctx).unwrap_or_else(|e| {
                    warn!(
                        command = %hook.command,
                        error = %e,
                        "failed to render hook argument, using empty string"
                    );
                    String::new()
                })
            })
            .collect()
    }

    async fn run(&self, hook: &SpawnHook, args: &[String], link: &str) {
        let start = Instant::now();
        let result = spawn::run_command(&hook.command, args, self.timeout).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(output) if output.success() => {
                info!(command = %hook.command, link, duration_ms, "hook command finished");
            }
            Ok(output) => {
                warn!(
                    command = %hook.command,
                    link,
                    status = %output.status,
                    output = %output.output,
                    duration_ms,
                    "hook command failed"
                );
            }
            Err(HookError::Timeout {
                command,
                timeout,
                output,
            }) => {
                warn!(
                    command = %command,
                    link,
                    timeout_secs = timeout.as_secs_f64(),
                    output = %output,
                    "hook command timed out"
                );
            }
            Err(e) => {
                warn!(command = %hook.command, link, error = %e, "hook command failed");
            }
        }
    }
}
