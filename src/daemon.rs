//! Foreground daemon that keeps the rankings fresh.
//!
//! A periodic [`IntervalTrigger`] fires `ensure_fresh` on the coordinator.
//! After every check the trigger is re-armed from the stored refresh
//! interval, so changing the interval with `novelrank settings set` takes
//! effect without restarting the daemon.

use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::app::{AppContext, Result};
use crate::config::DaemonConfig;
use crate::refresh::RefreshOutcome;

/// Longest accepted check interval (one year). Keeps the timer's deadline
/// arithmetic in range.
pub const MAX_INTERVAL_MINUTES: u64 = 366 * 1440;

fn period_of(minutes: u64) -> Duration {
    Duration::from_secs(minutes.clamp(1, MAX_INTERVAL_MINUTES) * 60)
}

/// Periodic timer: `schedule` arms it, `fired` waits for the next tick.
pub struct IntervalTrigger {
    timer: Interval,
    period: Duration,
}

impl IntervalTrigger {
    pub fn new(minutes: u64) -> Self {
        Self::every(period_of(minutes))
    }

    pub fn every(period: Duration) -> Self {
        Self {
            timer: Self::timer(period),
            period,
        }
    }

    /// Re-arm with a new period; the next fire is one full period away.
    pub fn schedule(&mut self, minutes: u64) {
        self.schedule_every(period_of(minutes));
    }

    pub fn schedule_every(&mut self, period: Duration) {
        self.timer = Self::timer(period);
        self.period = period;
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub async fn fired(&mut self) {
        self.timer.tick().await;
    }

    fn timer(period: Duration) -> Interval {
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer
    }
}

/// Minutes between checks: the configured check interval, but never longer
/// than the refresh interval itself.
pub fn trigger_period_minutes(check_interval_minutes: u64, refresh_interval_hours: u64) -> u64 {
    check_interval_minutes
        .min(refresh_interval_hours.saturating_mul(60))
        .clamp(1, MAX_INTERVAL_MINUTES)
}

/// Parse a duration like "1h", "30m", "1d" into minutes. A bare number is
/// taken as minutes.
pub fn parse_minutes(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();

    let minutes = if let Some(hours) = s.strip_suffix('h') {
        hours
            .parse::<u64>()
            .map_err(|_| format!("Invalid hours: {}", hours))?
            .checked_mul(60)
            .ok_or_else(too_large)?
    } else if let Some(days) = s.strip_suffix('d') {
        days.parse::<u64>()
            .map_err(|_| format!("Invalid days: {}", days))?
            .checked_mul(1440)
            .ok_or_else(too_large)?
    } else if let Some(minutes) = s.strip_suffix('m') {
        minutes
            .parse::<u64>()
            .map_err(|_| format!("Invalid minutes: {}", minutes))?
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '30m', '1h', '1d'", s))?
    };

    if minutes == 0 {
        return Err("Interval must be at least one minute".to_string());
    }
    if minutes > MAX_INTERVAL_MINUTES {
        return Err(too_large());
    }
    Ok(minutes)
}

fn too_large() -> String {
    format!("Interval too large (at most {}d)", MAX_INTERVAL_MINUTES / 1440)
}

/// Format minutes for display
pub fn format_minutes(minutes: u64) -> String {
    if minutes >= 1440 && minutes % 1440 == 0 {
        format!("{}d", minutes / 1440)
    } else if minutes >= 60 && minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}m", minutes)
    }
}

pub struct Daemon {
    ctx: Arc<AppContext>,
    config: DaemonConfig,
}

impl Daemon {
    pub fn new(ctx: Arc<AppContext>, config: DaemonConfig) -> Self {
        Self { ctx, config }
    }

    /// Log a message with timestamp
    fn log(&self, msg: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{}] {}", timestamp, msg);

        if let Some(ref log_path) = self.config.log_file {
            if let Ok(mut file) = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
            {
                let _ = writeln!(file, "{}", line);
            }
        } else {
            println!("{}", line);
        }
    }

    async fn current_period(&self) -> u64 {
        let settings = self.ctx.settings.resolve().await;
        trigger_period_minutes(
            self.config.check_interval_minutes,
            settings.refresh_interval_hours,
        )
    }

    /// Run until SIGINT/SIGTERM.
    pub async fn run(&self) -> Result<()> {
        let shutdown = shutdown_signal()?;
        tokio::pin!(shutdown);

        let mut trigger = IntervalTrigger::new(self.current_period().await);

        self.log(&format!(
            "novelrank daemon started (check interval: {}, PID: {})",
            format_minutes(trigger.period().as_secs() / 60),
            std::process::id()
        ));

        if self.config.update_on_start {
            self.check().await;
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = trigger.fired() => {
                    self.check().await;

                    let period = self.current_period().await;
                    if period_of(period) != trigger.period() {
                        self.log(&format!("Check interval changed to {}", format_minutes(period)));
                        trigger.schedule(period);
                    }
                }
            }
        }

        self.log("Daemon shutting down...");
        Ok(())
    }

    /// One trigger fire: refresh if the rankings are absent or stale.
    pub async fn check(&self) -> Option<RefreshOutcome> {
        let start = Utc::now();

        match self.ctx.coordinator.ensure_fresh().await {
            Ok(RefreshOutcome::AlreadyFresh) => {
                tracing::debug!("Rankings still fresh");
                Some(RefreshOutcome::AlreadyFresh)
            }
            Ok(RefreshOutcome::Refreshed(snapshot)) => {
                let elapsed = Utc::now().signed_duration_since(start);
                self.log(&format!(
                    "Rankings refreshed: {} novels ({:.1}s)",
                    snapshot.items.len(),
                    elapsed.num_milliseconds() as f64 / 1000.0
                ));
                Some(RefreshOutcome::Refreshed(snapshot))
            }
            Err(e) => {
                self.log(&format!("Refresh failed, will retry on next check: {}", e));
                None
            }
        }
    }
}

#[cfg(unix)]
fn shutdown_signal() -> Result<impl std::future::Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl std::future::Future<Output = ()>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
    })
}
