//! Long-running maintenance loops owned by the server process.

use crate::rate_limit::RateLimiter;
use crate::state::AppState;
use crate::sitemap::REGENERATE_INTERVAL;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct BackgroundTasks {
    shutdown: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Spawn the CSRF sweeper, the rate-window purge and the sitemap scheduler
    pub fn start(state: &AppState) -> Self {
        let mut tasks = Self::new();

        let csrf = state
            .csrf
            .spawn_sweeper(state.config.csrf_sweep_interval(), tasks.token());
        tasks.track("csrf-sweeper", csrf);

        let purge = spawn_rate_limit_purge(
            vec![state.auth_rate_limiter.clone(), state.api_rate_limiter.clone()],
            crate::rate_limit::DEFAULT_WINDOW,
            tasks.token(),
        );
        tasks.track("rate-limit-purge", purge);

        let sitemap = state
            .sitemap
            .spawn_scheduler(REGENERATE_INTERVAL, tasks.token());
        tasks.track("sitemap", sitemap);

        tracing::info!(count = tasks.len(), "Background tasks started");
        tasks
    }

    pub fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn track(&mut self, name: &'static str, handle: JoinHandle<()>) {
        self.handles.push((name, handle));
    }

    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.track(name, tokio::spawn(task));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancel every loop and wait for them to finish
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                tracing::warn!(task = name, error = %e, "Background task ended abnormally");
            }
        }
        tracing::info!("Background tasks stopped");
    }
}

pub fn spawn_rate_limit_purge(
    limiters: Vec<RateLimiter>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed: usize = limiters.iter().map(RateLimiter::purge_stale).sum();
                    if removed > 0 {
                        tracing::debug!(removed, "Purged stale rate-limit windows");
                    }
                }
            }
        }
    })
}
