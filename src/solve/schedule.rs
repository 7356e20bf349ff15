use crate::overlay::OverlayEntry;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
struct ScheduledReveal {
    due: Instant,
    generation: u64,
    entry: OverlayEntry,
}

/// Timed overlay reveals tagged with the session generation that created them.
///
/// Reset bumps the generation instead of cancelling anything; a reveal whose
/// generation is no longer current is skipped when it comes due.
#[derive(Debug, Default)]
pub struct RevealScheduler {
    generation: u64,
    pending: Vec<ScheduledReveal>,
}

impl RevealScheduler {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        tracing::debug!(generation = self.generation, "reveal generation advanced");
        self.generation
    }

    pub fn schedule(&mut self, entry: OverlayEntry, due: Instant, generation: u64) {
        tracing::debug!(generation, text = %entry.text, "reveal scheduled");
        self.pending.push(ScheduledReveal {
            due,
            generation,
            entry,
        });
    }

    /// Takes every reveal due at `now`, earliest first. Stale reveals are
    /// dropped and never returned.
    pub fn due_entries(&mut self, now: Instant) -> Vec<OverlayEntry> {
        let mut due = Vec::new();
        let mut waiting = Vec::with_capacity(self.pending.len());
        for reveal in self.pending.drain(..) {
            if reveal.due <= now {
                due.push(reveal);
            } else {
                waiting.push(reveal);
            }
        }
        self.pending = waiting;

        due.sort_by_key(|reveal| reveal.due);
        let generation = self.generation;
        due.into_iter()
            .filter_map(|reveal| {
                if reveal.generation == generation {
                    Some(reveal.entry)
                } else {
                    tracing::warn!(
                        stale = reveal.generation,
                        current = generation,
                        "suppressing reveal scheduled before reset"
                    );
                    None
                }
            })
            .collect()
    }

    /// Reveals that will still appear.
    pub fn pending_len(&self) -> usize {
        self.pending
            .iter()
            .filter(|reveal| reveal.generation == self.generation)
            .count()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .iter()
            .filter(|reveal| reveal.generation == self.generation)
            .map(|reveal| reveal.due)
            .min()
    }
}
