use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::machine::{gallery_batches, RevealMachine, RevealOutcome, RevealPhase, TickOutcome};
use crate::core::config::defaults::{DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE, DEFAULT_TICK_MS};
use crate::core::config::{Config, ConfigError};
use crate::core::markup::parse_fragment;
use crate::core::message::SenderLabel;
use crate::core::sink::{lock_sink, MessageSink, RowId, SharedSink};
use crate::core::split::{ReplySplitter, SplitReply};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealConfig {
    pub tick: Duration,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub cancel_previous: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
            cancel_previous: false,
        }
    }
}

/// A running reveal. Dropping the handle does not stop it.
#[derive(Debug)]
pub struct RevealHandle {
    cancel: CancellationToken,
    task: JoinHandle<RevealOutcome>,
}

impl RevealHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the reveal to reach `Done` or `Cancelled`.
    pub async fn wait(self) -> RevealOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                warn!(error = %err, "reveal task aborted");
                RevealOutcome {
                    phase: RevealPhase::Cancelled,
                    revealed_units: 0,
                    batches_inserted: 0,
                }
            }
        }
    }
}

pub struct RevealScheduler {
    config: RevealConfig,
    splitter: Arc<ReplySplitter>,
    previous: Mutex<Option<CancellationToken>>,
}

impl RevealScheduler {
    pub fn new(config: RevealConfig, splitter: ReplySplitter) -> Self {
        Self {
            config,
            splitter: Arc::new(splitter),
            previous: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let splitter = ReplySplitter::new(&config.split_config())?;
        Ok(Self::new(config.reveal_config(), splitter))
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// Start revealing `text` on the current tokio runtime.
    ///
    /// Reveals are independent: two replies started on the same sink
    /// interleave their writes unless `cancel_previous` is set.
    pub fn start<S>(
        &self,
        sender: SenderLabel,
        text: impl Into<String>,
        sink: SharedSink<S>,
    ) -> RevealHandle
    where
        S: MessageSink + 'static,
    {
        let cancel = self.register();
        let split = self.splitter.split(&text.into());
        let config = self.config.clone();
        let task = tokio::spawn(drive(config, split, sender, sink, cancel.clone()));
        RevealHandle { cancel, task }
    }

    /// Reveal `text` and wait for it in the calling task.
    pub async fn run<S>(
        &self,
        sender: SenderLabel,
        text: &str,
        sink: SharedSink<S>,
    ) -> RevealOutcome
    where
        S: MessageSink + 'static,
    {
        let cancel = self.register();
        let split = self.splitter.split(text);
        drive(self.config.clone(), split, sender, sink, cancel).await
    }

    fn register(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if self.config.cancel_previous {
            let mut previous = self
                .previous
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(old) = previous.replace(token.clone()) {
                if !old.is_cancelled() {
                    debug!("cancelling previous reveal");
                }
                old.cancel();
            }
        }
        token
    }
}

/// Run `f` against the sink if `row` is still attached.
fn with_attached<S, T>(sink: &SharedSink<S>, row: RowId, f: impl FnOnce(&mut S) -> T) -> Option<T>
where
    S: MessageSink,
{
    let mut guard = lock_sink(sink);
    if !guard.is_attached(row) {
        return None;
    }
    Some(f(&mut *guard))
}

fn stop(machine: &mut RevealMachine, reason: &str) -> RevealOutcome {
    debug!(row = machine.row().0, reason, "reveal cancelled");
    machine.cancel();
    machine.outcome()
}

async fn drive<S>(
    config: RevealConfig,
    split: SplitReply,
    sender: SenderLabel,
    sink: SharedSink<S>,
    cancel: CancellationToken,
) -> RevealOutcome
where
    S: MessageSink,
{
    let row = {
        let mut guard = lock_sink(&sink);
        let row = guard.append_row(&sender);
        guard.scroll_to_bottom();
        row
    };
    let mut machine = RevealMachine::new(split, row);
    debug!(
        row = row.0,
        units = machine.unit_count(),
        markup_bytes = machine.markup().len(),
        "reveal started"
    );

    let mut ticker = time::interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return stop(&mut machine, "token"),
            _ = ticker.tick() => {}
        }
        match with_attached(&sink, row, |s| machine.tick(s)) {
            None => return stop(&mut machine, "row detached"),
            Some(TickOutcome::Revealed) => {}
            Some(TickOutcome::TypingFinished | TickOutcome::Idle) => break,
        }
    }

    if *machine.phase() != RevealPhase::MarkupPending {
        return machine.outcome();
    }

    let Some(fragment) = parse_fragment(machine.markup()) else {
        debug!(row = row.0, "markup part rendered empty");
        machine.finish();
        return machine.outcome();
    };

    let images = fragment.gallery().to_vec();
    let html = if images.is_empty() {
        fragment.to_html()
    } else {
        fragment.shell_html()
    };
    let Some(fragment_id) = with_attached(&sink, row, |s| {
        let id = s.insert_after(row, &html);
        s.scroll_to_bottom();
        id
    }) else {
        return stop(&mut machine, "row detached");
    };

    let batches = gallery_batches(images.len(), config.batch_size);
    if !batches.is_empty() {
        machine.begin_batches(batches.len());
    }
    for (index, range) in batches.into_iter().enumerate() {
        if index > 0 {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return stop(&mut machine, "token"),
                _ = time::sleep(config.batch_delay) => {}
            }
        }

        debug!(row = row.0, batch = index, images = range.len(), "gallery batch");
        let Some(settle) = with_attached(&sink, row, |s| {
            s.append_gallery_batch(fragment_id, &images[range])
        }) else {
            return stop(&mut machine, "row detached");
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return stop(&mut machine, "token"),
            _ = settle => {}
        }
        machine.batch_inserted();
    }

    if with_attached(&sink, row, |s| s.scroll_to_bottom()).is_none() {
        return stop(&mut machine, "row detached");
    }
    machine.finish();
    debug!(
        row = row.0,
        batches = machine.outcome().batches_inserted,
        "reveal done"
    );
    machine.outcome()
}
