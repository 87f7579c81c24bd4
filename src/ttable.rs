/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Move, Score, ZobristKey};

/// Number of bytes in a megabyte.
const BYTES_IN_MB: usize = 1024 * 1024;

/// The key stored in never-written slots; no position hashes to it in practice.
const EMPTY_KEY: u64 = u64::MAX;

/// What a stored score means relative to the true minimax value.
///
/// See [CPW](https://www.chessprogramming.org/Node_Types) for more.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Bound {
    /// The score is the true value: some move raised alpha without failing high.
    Exact,

    /// The score is at most the true value: a beta-cutoff occurred.
    Lower,

    /// The score is at least the true value: no move raised alpha.
    Upper,
}

impl Bound {
    /// Classifies `score` against the window it was searched in:
    ///
    /// ```text
    /// if score <= alpha_original:
    ///     UPPERBOUND
    /// else if score >= beta:
    ///     LOWERBOUND
    /// else:
    ///     EXACT
    /// ```
    #[inline(always)]
    pub fn new(score: Score, alpha_original: Score, beta: Score) -> Self {
        if score <= alpha_original {
            Self::Upper
        } else if score >= beta {
            Self::Lower
        } else {
            Self::Exact
        }
    }
}

/// An entry into the transposition table.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct TTableEntry {
    /// Zobrist key of the position this entry describes.
    pub key: ZobristKey,

    /// Score found for this position, mate-normalized while in the table.
    pub score: Score,

    /// Depth of the search that produced this entry.
    pub depth: u8,

    /// What `score` means relative to the true value.
    pub bound: Bound,

    /// Best move found for this position, if any move raised alpha.
    pub bestmove: Option<Move>,
}

impl TTableEntry {
    /// Creates a new [`TTableEntry`], classifying its [`Bound`] from the
    /// original search window.
    #[inline(always)]
    pub fn new(
        key: ZobristKey,
        score: Score,
        depth: u8,
        alpha_original: Score,
        beta: Score,
        bestmove: Option<Move>,
    ) -> Self {
        Self {
            key,
            score,
            depth,
            bound: Bound::new(score, alpha_original, beta),
            bestmove,
        }
    }
}

/// Transposition Table: a fixed-size, power-of-two cache of search results,
/// indexed by the low bits of the position's Zobrist key.
///
/// Each slot holds one entry. On a collision the newcomer wins if the slot is
/// empty or the newcomer's depth is at least the occupant's (depth-preferred
/// replacement).
#[derive(Debug)]
pub struct TTable {
    entries: Vec<TTableEntry>,

    /// Number of slots that have ever been written since the last clear.
    used: usize,
}

impl TTable {
    /// Default size of the table, in megabytes.
    pub const DEFAULT_SIZE_MB: usize = 64;

    /// Create a new [`TTable`] occupying roughly `size_mb` megabytes, rounded
    /// down to a power-of-two entry count.
    pub fn new(size_mb: usize) -> Self {
        let count = (size_mb * BYTES_IN_MB / size_of::<TTableEntry>()).max(1);

        // Round down to a power of two
        let capacity = if count.is_power_of_two() {
            count
        } else {
            count.next_power_of_two() / 2
        };

        Self::from_capacity(capacity)
    }

    /// Create a new [`TTable`] that holds exactly `capacity` entries.
    ///
    /// `capacity` must be a power of two, since indexing masks the key.
    pub fn from_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());

        let empty = TTableEntry {
            key: ZobristKey::default(),
            score: Score::DRAW,
            depth: 0,
            bound: Bound::Upper,
            bestmove: None,
        };

        let mut table = Self {
            entries: vec![empty; capacity],
            used: 0,
        };
        table.clear();
        table
    }

    /// Resets every slot to empty and zeroes the fill statistics.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.key = ZobristKey::default();
            entry.key.hash(EMPTY_KEY);
            entry.depth = 0;
            entry.bestmove = None;
        }
        self.used = 0;
    }

    /// Returns the number of entries this table can hold.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns an estimate of the table's fill rate, in permille, as reported
    /// by `info hashfull`.
    #[inline(always)]
    pub fn hashfull(&self) -> usize {
        self.used * 1000 / self.capacity()
    }

    /// Maps `key` to this table's index space.
    #[inline(always)]
    fn index(&self, key: ZobristKey) -> usize {
        key.inner() as usize & (self.capacity() - 1)
    }

    /// Looks up the entry for `key`, un-normalizing mate scores to be
    /// relative to the probing node's `ply`.
    ///
    /// Returns `None` when the slot holds a different position.
    #[inline(always)]
    pub fn probe(&self, key: ZobristKey, ply: usize) -> Option<TTableEntry> {
        let entry = self.entries[self.index(key)];

        (entry.key == key).then(|| TTableEntry {
            score: from_tt_score(entry.score, ply),
            ..entry
        })
    }

    /// Fetches the stored best move for `key`, if the position has one cached.
    #[inline(always)]
    pub fn bestmove(&self, key: ZobristKey) -> Option<Move> {
        let entry = self.entries[self.index(key)];
        (entry.key == key).then_some(entry.bestmove).flatten()
    }

    /// Stores `entry`, normalizing mate scores by the storing node's `ply` so
    /// the entry remains valid when probed from a different ply.
    ///
    /// The entry is dropped if the slot holds a deeper search of some position.
    #[inline(always)]
    pub fn store(&mut self, mut entry: TTableEntry, ply: usize) {
        entry.score = to_tt_score(entry.score, ply);

        let index = self.index(entry.key);
        let slot = &mut self.entries[index];

        if slot.key.inner() == EMPTY_KEY {
            self.used += 1;
            *slot = entry;
        } else if entry.depth >= slot.depth {
            *slot = entry;
        }
    }
}

impl Default for TTable {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE_MB)
    }
}

/// Converts a root-relative mate score into a mate-distance-from-node score
/// for storage.
#[inline(always)]
fn to_tt_score(score: Score, ply: usize) -> Score {
    if score > Score::CHECKMATE_THRESHOLD {
        score + ply as i32
    } else if score < -Score::CHECKMATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

/// Converts a stored mate-distance-from-node score back into a root-relative
/// score at the probing node's ply.
#[inline(always)]
fn from_tt_score(score: Score, ply: usize) -> Score {
    if score > Score::CHECKMATE_THRESHOLD {
        score - ply as i32
    } else if score < -Score::CHECKMATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with_key(key: ZobristKey, depth: u8) -> TTableEntry {
        TTableEntry::new(
            key,
            Score::new(17),
            depth,
            Score::ALPHA,
            Score::BETA,
            None,
        )
    }

    fn key_of(bits: u64) -> ZobristKey {
        let mut key = ZobristKey::default();
        key.hash(bits);
        key
    }

    #[test]
    fn test_probe_returns_only_matching_keys() {
        let mut tt = TTable::from_capacity(4);

        let stored = key_of(8); // Indexes slot 0
        tt.store(entry_with_key(stored, 3), 0);

        assert!(tt.probe(stored, 0).is_some());
        // Same slot, different key
        assert!(tt.probe(key_of(16), 0).is_none());
        assert_eq!(tt.hashfull(), 250);
    }

    #[test]
    fn test_depth_preferred_replacement() {
        let mut tt = TTable::from_capacity(4);

        // Both keys map to slot 1
        let deep = key_of(1);
        let shallow = key_of(5);

        tt.store(entry_with_key(deep, 6), 0);
        // A shallower entry must not evict a deeper one
        tt.store(entry_with_key(shallow, 2), 0);
        assert!(tt.probe(deep, 0).is_some());
        assert!(tt.probe(shallow, 0).is_none());

        // An equal-or-deeper entry replaces the occupant
        tt.store(entry_with_key(shallow, 6), 0);
        assert!(tt.probe(shallow, 0).is_some());
        assert!(tt.probe(deep, 0).is_none());
    }

    #[test]
    fn test_mate_scores_are_ply_portable() {
        let mut tt = TTable::from_capacity(4);
        let key = key_of(2);

        // A mate found 5 plies below a node at ply 3 scores CHECKMATE - 8
        let score = Score::CHECKMATE - 8;
        tt.store(
            TTableEntry::new(key, score, 4, Score::ALPHA, Score::BETA, None),
            3,
        );

        // Probed from ply 3, the score is unchanged
        assert_eq!(tt.probe(key, 3).unwrap().score, score);

        // Probed from ply 1, the same mate is 5 plies below: CHECKMATE - 6
        assert_eq!(tt.probe(key, 1).unwrap().score, Score::CHECKMATE - 6);
    }
}
