use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::core::markup::escape_html;
use crate::core::sink::{MessageSink, RowId};
use crate::core::split::SplitReply;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealPhase {
    /// Revealing prose; `position` counts units already shown.
    Typing { position: usize },
    /// Prose is exhausted and the markup part still has to be inserted.
    MarkupPending,
    BatchLoading {
        next_batch: usize,
        total_batches: usize,
    },
    Done,
    Cancelled,
}

impl RevealPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RevealPhase::Done | RevealPhase::Cancelled)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// One unit was appended and more prose remains.
    Revealed,
    /// The timer should stop; the phase moved to `MarkupPending` or `Done`.
    TypingFinished,
    /// The machine is no longer typing.
    Idle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealOutcome {
    pub phase: RevealPhase,
    pub revealed_units: usize,
    pub batches_inserted: usize,
}

/// Per-reply reveal state. One reveal unit is one extended grapheme cluster,
/// so combining marks and emoji sequences appear whole.
#[derive(Debug)]
pub struct RevealMachine {
    prose: String,
    markup: String,
    units: Vec<Range<usize>>,
    row: RowId,
    phase: RevealPhase,
    revealed: usize,
    batches_inserted: usize,
}

impl RevealMachine {
    pub fn new(split: SplitReply, row: RowId) -> Self {
        let units = split
            .prose
            .grapheme_indices(true)
            .map(|(start, unit)| start..start + unit.len())
            .collect();
        Self {
            prose: split.prose,
            markup: split.markup,
            units,
            row,
            phase: RevealPhase::Typing { position: 0 },
            revealed: 0,
            batches_inserted: 0,
        }
    }

    pub fn row(&self) -> RowId {
        self.row
    }

    pub fn phase(&self) -> &RevealPhase {
        &self.phase
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Run one timer tick.
    ///
    /// The tick that appends the last unit also ends typing, so a prose part
    /// of `n` units needs exactly `n` ticks (one for empty prose).
    pub fn tick<S: MessageSink + ?Sized>(&mut self, sink: &mut S) -> TickOutcome {
        let RevealPhase::Typing { mut position } = self.phase else {
            return TickOutcome::Idle;
        };

        if let Some(range) = self.units.get(position) {
            sink.append_text(self.row, &escape_html(&self.prose[range.clone()]));
            sink.scroll_to_bottom();
            position += 1;
            self.revealed = position;
        }

        if position >= self.units.len() {
            self.phase = if self.markup.is_empty() {
                RevealPhase::Done
            } else {
                RevealPhase::MarkupPending
            };
            return TickOutcome::TypingFinished;
        }

        self.phase = RevealPhase::Typing { position };
        TickOutcome::Revealed
    }

    pub fn begin_batches(&mut self, total_batches: usize) {
        self.phase = RevealPhase::BatchLoading {
            next_batch: 0,
            total_batches,
        };
    }

    pub fn batch_inserted(&mut self) {
        self.batches_inserted += 1;
        if let RevealPhase::BatchLoading { next_batch, .. } = &mut self.phase {
            *next_batch += 1;
        }
    }

    pub fn finish(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = RevealPhase::Done;
        }
    }

    pub fn cancel(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = RevealPhase::Cancelled;
        }
    }

    pub fn outcome(&self) -> RevealOutcome {
        RevealOutcome {
            phase: self.phase.clone(),
            revealed_units: self.revealed,
            batches_inserted: self.batches_inserted,
        }
    }
}

/// Index ranges of the gallery batches, in document order.
pub fn gallery_batches(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    let size = batch_size.max(1);
    (0..total)
        .step_by(size)
        .map(|start| start..(start + size).min(total))
        .collect()
}
