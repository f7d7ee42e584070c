//! Daily digest scheduler.
//!
//! Polls the wall clock on a short interval and fires one digest run when
//! the configured time of day has passed. The run is awaited inside the
//! loop, so at most one digest is ever in flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::config::DigestConfig;
use crate::digest::{self, DigestOutcome, Mailer};
use crate::error::{Error, Result};

/// A fixed local time of day, parsed from "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyAt(NaiveTime);

impl DailyAt {
    pub fn parse(s: &str) -> Result<Self> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .map_err(|e| Error::InvalidConfig(format!("send_at {s:?}: {e}")))
    }

    /// Today's slot if it is still ahead of `now`, otherwise tomorrow's.
    pub fn next_run_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.0);
        if today > now {
            today
        } else {
            today + TimeDelta::days(1)
        }
    }
}

pub struct DigestScheduler {
    config: DigestConfig,
    log_path: PathBuf,
    mailer: Arc<dyn Mailer>,
    at: DailyAt,
    next_run: NaiveDateTime,
}

impl DigestScheduler {
    pub fn new(config: DigestConfig, log_path: PathBuf, mailer: Arc<dyn Mailer>) -> Result<Self> {
        let at = DailyAt::parse(&config.send_at)?;
        let next_run = at.next_run_after(Local::now().naive_local());
        Ok(Self {
            config,
            log_path,
            mailer,
            at,
            next_run,
        })
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    /// Run the digest if its slot has passed. Returns `None` when nothing was due.
    pub async fn poll(&mut self, now: NaiveDateTime) -> Option<Result<DigestOutcome>> {
        if now < self.next_run {
            return None;
        }

        info!("Digest due (scheduled {}), running", self.next_run);
        let result = digest::run_digest(&self.config, &self.log_path, self.mailer.as_ref()).await;
        self.next_run = self.at.next_run_after(now);
        info!("Next digest at {}", self.next_run);
        Some(result)
    }

    /// Poll until `shutdown` flips to true.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let period = Duration::from_secs(self.config.poll_interval_secs.max(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Digest scheduler started, first run at {}", self.next_run());

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.poll(Local::now().naive_local()).await {
                        Some(Ok(outcome)) => info!(
                            "Digest run complete: {} lines, {} bytes of HTML, sent={}",
                            outcome.lines,
                            outcome.html.len(),
                            outcome.sent
                        ),
                        Some(Err(e)) => error!("Digest run failed: {e}"),
                        None => {}
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Digest scheduler: shutdown signal received");
                        break;
                    }
                }
            }
        }
    }
}
