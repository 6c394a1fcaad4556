use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use offerwatch_core::{diff, PhaseTracker, RunPhase, StateSnapshot};
use offerwatch_logging::{watch_error, watch_info, watch_warn};

use crate::browser::{Browser, BrowserSession, PageStep, ReadyCondition};
use crate::extract::OfferExtractor;
use crate::notify::Notifier;
use crate::store::StateStore;
use crate::types::{RunError, RunOutcome};

/// Configuration bundle for one check cycle.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub target_url: String,
    pub ready: ReadyCondition,
    /// Total navigation attempts before aborting (1 = no retry).
    pub nav_retry_limit: u32,
    /// Base backoff between navigation attempts; grows linearly.
    pub nav_retry_backoff: Duration,
    /// Scripted interactions after the ready condition, before extraction.
    pub setup_steps: Vec<PageStep>,
    /// Per-step deadline for `setup_steps`.
    pub step_timeout: Duration,
    /// Commit an empty extraction over a non-empty baseline. Off by
    /// default: an empty page usually means a broken selector, and a
    /// wrongly erased baseline re-notifies everything on recovery.
    pub trust_empty_results: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            ready: ReadyCondition {
                selector: "body".to_owned(),
                timeout: Duration::from_secs(30),
            },
            nav_retry_limit: 3,
            nav_retry_backoff: Duration::from_secs(2),
            setup_steps: Vec::new(),
            step_timeout: Duration::from_secs(10),
            trust_empty_results: false,
        }
    }
}

/// Externally requested cancellation, honored at phase boundaries.
/// Session teardown still runs.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Orchestrates one check cycle: open session, render, extract, diff,
/// notify the delta, commit the new baseline, close session. Owns the
/// retry and error policy for the whole cycle.
pub struct RunCoordinator {
    browser: Arc<dyn Browser>,
    extractor: Arc<dyn OfferExtractor>,
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
    settings: RunSettings,
    // The load/diff/save sequence is not safe under concurrent writers,
    // so at most one run may be active at a time.
    in_flight: Mutex<()>,
}

impl RunCoordinator {
    pub fn new(
        browser: Arc<dyn Browser>,
        extractor: Arc<dyn OfferExtractor>,
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
        settings: RunSettings,
    ) -> Self {
        Self {
            browser,
            extractor,
            store,
            notifier,
            settings,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one check. Never panics across this boundary; every failure
    /// is converted into a structured outcome.
    pub async fn run_once(&self, cancel: &CancelFlag) -> RunOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            watch_warn!("check requested while another is in flight; rejecting");
            return RunOutcome::aborted(RunError::AlreadyRunning);
        };

        let mut phases = PhaseTracker::new();
        match self.drive(cancel, &mut phases).await {
            Ok(outcome) => outcome,
            Err(err) => {
                if let Err(phase_err) = phases.abort() {
                    watch_warn!("abort bookkeeping failed: {phase_err}");
                }
                watch_error!("check aborted: {err}");
                RunOutcome::aborted(err)
            }
        }
    }

    async fn drive(
        &self,
        cancel: &CancelFlag,
        phases: &mut PhaseTracker,
    ) -> Result<RunOutcome, RunError> {
        check_cancel(cancel)?;

        let mut session = self.browser.open().await?;
        phases.advance(RunPhase::SessionOpen)?;

        // From here on the session must be closed exactly once, on every
        // path, before the result leaves this function.
        let result = self.run_with_session(session.as_mut(), cancel, phases).await;
        if let Err(err) = session.close().await {
            watch_warn!("browser session close failed: {err}");
        }
        result
    }

    async fn run_with_session(
        &self,
        session: &mut dyn BrowserSession,
        cancel: &CancelFlag,
        phases: &mut PhaseTracker,
    ) -> Result<RunOutcome, RunError> {
        self.navigate_with_retry(session, cancel).await?;
        phases.advance(RunPhase::PageReady)?;
        check_cancel(cancel)?;

        let html = session.page_html().await?;
        let extraction = self.extractor.extract(&html)?;
        phases.advance(RunPhase::Extracted)?;
        if extraction.skipped_rows > 0 {
            watch_warn!(
                "skipped {} listing rows with missing required fields",
                extraction.skipped_rows
            );
        }
        check_cancel(cancel)?;

        let prior = self.store.load()?;
        let prior_count = prior.as_ref().map_or(0, |p| p.offer_ids.len());
        if extraction.offers.is_empty() && prior_count > 0 && !self.settings.trust_empty_results {
            return Err(RunError::SuspiciousEmptyExtraction { prior_count });
        }

        let result = diff(&extraction.offers, prior.as_ref());
        phases.advance(RunPhase::Diffed)?;
        watch_info!(
            "diff: {} new, {} unchanged, {} removed",
            result.new_offers.len(),
            result.unchanged_ids.len(),
            result.removed_ids.len()
        );
        check_cancel(cancel)?;

        let mut notify_error = None;
        if result.first_run {
            watch_info!(
                "first run: baseline of {} offers recorded, notification suppressed",
                result.new_offers.len()
            );
        } else if !result.new_offers.is_empty() {
            phases.advance(RunPhase::Notified)?;
            if let Err(err) = self.notifier.notify(&result.new_offers).await {
                // A lost notification is logged, not a scrape failure.
                watch_error!("notification failed for {} offers: {err}", result.new_offers.len());
                notify_error = Some(RunError::Notification(err));
            }
        }

        let snapshot = StateSnapshot::from_offers(&extraction.offers, Utc::now());
        self.store.save(&snapshot)?;
        phases.advance(RunPhase::Committed)?;

        Ok(RunOutcome::committed(result.new_offers.len(), notify_error))
    }

    /// Navigate and satisfy the ready condition plus setup steps,
    /// retrying recoverable timeouts within the configured bound.
    async fn navigate_with_retry(
        &self,
        session: &mut dyn BrowserSession,
        cancel: &CancelFlag,
    ) -> Result<(), RunError> {
        let attempts = self.settings.nav_retry_limit.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            check_cancel(cancel)?;
            match self.navigate(session).await {
                Ok(()) => return Ok(()),
                Err(err @ RunError::NavigationTimeout(_)) if attempt < attempts => {
                    let backoff = self.settings.nav_retry_backoff * attempt;
                    watch_warn!(
                        "navigation attempt {attempt}/{attempts} failed ({err}); retrying in {backoff:?}"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn navigate(&self, session: &mut dyn BrowserSession) -> Result<(), RunError> {
        session.goto(&self.settings.target_url).await?;
        session
            .wait_for(&self.settings.ready.selector, self.settings.ready.timeout)
            .await?;
        for step in &self.settings.setup_steps {
            match step {
                PageStep::Click { selector } => {
                    session.click(selector, self.settings.step_timeout).await?;
                }
                PageStep::WaitFor { selector } => {
                    session
                        .wait_for(selector, self.settings.step_timeout)
                        .await?;
                }
            }
        }
        Ok(())
    }
}

fn check_cancel(cancel: &CancelFlag) -> Result<(), RunError> {
    if cancel.is_cancelled() {
        Err(RunError::Cancelled)
    } else {
        Ok(())
    }
}
