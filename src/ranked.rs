//! Score-ordered index of entries keyed by name.
//!
//! Keeps one entry per key and the full set sorted by descending score while
//! entries are being updated, so the ranking can be read at any point without
//! a final sort.

use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry<P> {
    pub key: String,
    pub score: u64,
    pub payload: P,
}

#[derive(Debug)]
struct Slot<P> {
    entry: RankEntry<P>,
    seq: u64,
}

/// Order position: highest score first, then earliest upsert among ties.
type Position = (Reverse<u64>, u64);

/// Not internally synchronized; callers serialize mutation.
#[derive(Debug)]
pub struct RankedIndex<P> {
    order: BTreeSet<Position>,
    by_seq: FxHashMap<u64, String>,
    slots: FxHashMap<String, Slot<P>>,
    next_seq: u64,
}

impl<P> Default for RankedIndex<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> RankedIndex<P> {
    pub fn new() -> Self {
        Self {
            order: BTreeSet::new(),
            by_seq: FxHashMap::default(),
            slots: FxHashMap::default(),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Inserts `key`, or replaces its score and payload and moves it to its
    /// new rank. A replaced entry ranks after entries already holding the same
    /// score.
    pub fn upsert(&mut self, key: impl Into<String>, score: u64, payload: P) {
        let key = key.into();
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(slot) = self.slots.get_mut(&key) {
            self.order.remove(&(Reverse(slot.entry.score), slot.seq));
            self.by_seq.remove(&slot.seq);
            slot.entry.score = score;
            slot.entry.payload = payload;
            slot.seq = seq;
        } else {
            self.slots.insert(
                key.clone(),
                Slot {
                    entry: RankEntry {
                        key: key.clone(),
                        score,
                        payload,
                    },
                    seq,
                },
            );
        }

        self.order.insert((Reverse(score), seq));
        self.by_seq.insert(seq, key);
    }

    pub fn get(&self, key: &str) -> Option<&RankEntry<P>> {
        self.slots.get(key).map(|slot| &slot.entry)
    }

    pub fn peek_max(&self) -> Option<&RankEntry<P>> {
        self.iter_ordered().next()
    }

    /// Entries by descending score without consuming the index.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &RankEntry<P>> + '_ {
        self.order.iter().filter_map(move |(_, seq)| {
            let key = self.by_seq.get(seq)?;
            self.slots.get(key).map(|slot| &slot.entry)
        })
    }

    /// Consumes the index, returning every entry by descending score.
    pub fn extract_ordered(mut self) -> Vec<RankEntry<P>> {
        let mut ordered = Vec::with_capacity(self.slots.len());
        for (_, seq) in std::mem::take(&mut self.order) {
            if let Some(slot) = self
                .by_seq
                .remove(&seq)
                .and_then(|key| self.slots.remove(&key))
            {
                ordered.push(slot.entry);
            }
        }
        ordered
    }
}
