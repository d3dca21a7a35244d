//! RunPanel -- shop-floor run tracking over ON/OFF job records.
//!
//! This crate provides the core library for grouping job records into runs,
//! computing live and finished run durations, and driving the move-to-past
//! lifecycle transition against the backend.

pub mod config;
pub mod jobs;
pub mod lifecycle;
pub mod notify;
pub mod panel;
pub mod runs;
pub mod source;

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

/// Run the live panel loop: wall-clock tick plus periodic snapshot refresh.
pub async fn watch(config: &config::PanelConfig) -> Result<()> {
    // 1. Connect the backend
    let backend = source::http::HttpBackend::new(&config.source)?;
    let mut panel = panel::WorkPanel::new(backend, config.panel.clone());

    // 2. First snapshot; an unreachable backend shows up on the panel itself
    if let Err(e) = panel.refresh().await {
        tracing::warn!(error = %e, "initial snapshot fetch failed");
    }

    // 3. Tick loop: the clock moves every tick, the snapshot on its own cadence
    let mut ticker = tokio::time::interval(Duration::from_millis(config.panel.tick_ms.max(1)));
    let refresh_every = Duration::from_secs(config.panel.refresh_secs.max(1));
    let mut last_refresh = tokio::time::Instant::now();

    loop {
        ticker.tick().await;
        panel.tick(Utc::now());

        if last_refresh.elapsed() >= refresh_every {
            if let Err(e) = panel.refresh().await {
                tracing::warn!(error = %e, "snapshot refresh failed");
            }
            last_refresh = tokio::time::Instant::now();
        }

        let mut stdout = std::io::stdout().lock();
        write!(stdout, "\x1b[2J\x1b[H{}", panel.render())?;
        stdout.flush()?;
    }
}
