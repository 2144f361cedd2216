/*
 * This file is part of kvd, an in-memory key-value server.
 *
 * Copyright (c) 2024, the kvd authors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! An ordered set: a name-keyed hash index over an order-statistic AVL tree
//! keyed by `(score, name)` (§4.C). The hash index gives O(1) point lookup
//! by name; the tree gives O(log n) rank/offset/range queries by order.
//!
//! The two structures share nothing but an arena slot number. A node's slot
//! is stable for its entire lifetime — [`AvlTree::delete`] swaps a
//! successor's key in rather than relocating anything — so the hash index
//! never needs fixing up after a delete it didn't itself cause.

use crate::avl::AvlTree;
use crate::hash::HMap;

use super::znode::ZKey;

#[derive(Default)]
pub struct ZSet {
    index: HMap<usize>,
    tree: AvlTree<ZKey>,
}

impl ZSet {
    pub fn new() -> Self {
        Self {
            index: HMap::new(),
            tree: AvlTree::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Insert `name` with `score`, or re-score it if already present.
    /// Re-scoring is a delete-then-reinsert: the tree is keyed on
    /// `(score, name)`, so a changed score means a new position.
    pub fn insert(&mut self, name: &[u8], score: f64) {
        if let Some(idx) = self.index.remove(name) {
            self.tree.delete(idx);
        }
        let new_idx = self.tree.insert(ZKey::new(score, name.to_vec()));
        self.index.insert(name, new_idx);
    }

    pub fn remove(&mut self, name: &[u8]) -> bool {
        let Some(idx) = self.index.remove(name) else {
            return false;
        };
        self.tree.delete(idx);
        true
    }

    pub fn score(&mut self, name: &[u8]) -> Option<f64> {
        let &idx = self.index.get(name)?;
        Some(self.tree.key(idx).score)
    }

    /// 0-based position of `name` in ascending `(score, name)` order.
    pub fn rank(&mut self, name: &[u8]) -> Option<usize> {
        let &idx = self.index.get(name)?;
        Some(self.tree.rank(idx))
    }

    /// Up to `count` members starting at rank `offset`, ascending.
    pub fn range(&self, offset: usize, count: usize) -> Vec<(&[u8], f64)> {
        let mut out = Vec::new();
        let Some(first) = self.tree.first() else {
            return out;
        };
        let Some(mut cur) = self.tree.offset(first, offset as i64) else {
            return out;
        };
        for i in 0..count {
            let key = self.tree.key(cur);
            out.push((key.name.as_slice(), key.score));
            if i + 1 == count {
                break;
            }
            match self.tree.offset(cur, 1) {
                Some(next) => cur = next,
                None => break,
            }
        }
        out
    }

    /// The smallest member with `score >= min_score`, name-ordered among
    /// ties (§4.C `seek_ge`).
    pub fn seek_ge(&self, min_score: f64) -> Option<(&[u8], f64)> {
        let probe = ZKey::new(min_score, Vec::new());
        let idx = self.tree.seek_ge(&probe)?;
        let key = self.tree.key(idx);
        Some((key.name.as_slice(), key.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_score_remove_roundtrip() {
        let mut z = ZSet::new();
        z.insert(b"alice", 10.0);
        z.insert(b"bob", 5.0);
        z.insert(b"carol", 20.0);
        assert_eq!(z.len(), 3);
        assert_eq!(z.score(b"alice"), Some(10.0));
        assert_eq!(z.rank(b"bob"), Some(0));
        assert_eq!(z.rank(b"alice"), Some(1));
        assert_eq!(z.rank(b"carol"), Some(2));
        assert!(z.remove(b"alice"));
        assert_eq!(z.score(b"alice"), None);
        assert_eq!(z.len(), 2);
        assert!(!z.remove(b"alice"));
    }

    #[test]
    fn rescoring_moves_rank() {
        let mut z = ZSet::new();
        z.insert(b"a", 1.0);
        z.insert(b"b", 2.0);
        z.insert(b"c", 3.0);
        assert_eq!(z.rank(b"a"), Some(0));
        z.insert(b"a", 100.0);
        assert_eq!(z.rank(b"a"), Some(2));
        assert_eq!(z.score(b"a"), Some(100.0));
        assert_eq!(z.len(), 3);
    }

    #[test]
    fn range_reads_ascending_window() {
        let mut z = ZSet::new();
        for i in 0..20 {
            z.insert(format!("m{i}").as_bytes(), i as f64);
        }
        let window = z.range(5, 3);
        let names: Vec<Vec<u8>> = window.iter().map(|(n, _)| n.to_vec()).collect();
        assert_eq!(names, vec![b"m5".to_vec(), b"m6".to_vec(), b"m7".to_vec()]);
        assert!(z.range(100, 3).is_empty());
        assert_eq!(z.range(18, 10).len(), 2);
    }

    #[test]
    fn seek_ge_finds_boundary() {
        let mut z = ZSet::new();
        z.insert(b"low", 1.0);
        z.insert(b"mid", 5.0);
        z.insert(b"high", 9.0);
        let (name, score) = z.seek_ge(4.0).unwrap();
        assert_eq!(name, b"mid");
        assert_eq!(score, 5.0);
        assert!(z.seek_ge(100.0).is_none());
    }

    #[test]
    fn many_rescores_and_removals_keep_index_consistent() {
        let mut z = ZSet::new();
        for i in 0..500 {
            z.insert(format!("k{i}").as_bytes(), (i % 37) as f64);
        }
        for i in 0..500 {
            if i % 2 == 0 {
                z.insert(format!("k{i}").as_bytes(), ((i * 13) % 97) as f64);
            }
        }
        for i in (0..500).step_by(3) {
            z.remove(format!("k{i}").as_bytes());
        }
        let mut expect_score = std::collections::HashMap::new();
        for i in 0..500 {
            if i % 3 == 0 {
                continue;
            }
            let score = if i % 2 == 0 {
                ((i * 13) % 97) as f64
            } else {
                (i % 37) as f64
            };
            expect_score.insert(format!("k{i}"), score);
        }
        let mut remaining = 0;
        for i in 0..500 {
            let key = format!("k{i}");
            let present = z.score(key.as_bytes()).is_some();
            assert_eq!(present, i % 3 != 0);
            if present {
                remaining += 1;
                // the value must be correct, not merely present: a node
                // that relocates without repointing the index would still
                // answer `Some`, just with another member's stale data.
                assert_eq!(z.score(key.as_bytes()), Some(expect_score[&key]));
                assert!(z.rank(key.as_bytes()).is_some());
            }
        }
        assert_eq!(z.len(), remaining);
        // every surviving member's rank must match its score ordering too.
        let mut by_score: Vec<(String, f64)> = expect_score.into_iter().collect();
        by_score.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        for (pos, (key, _)) in by_score.iter().enumerate() {
            assert_eq!(z.rank(key.as_bytes()), Some(pos));
        }
    }

    /// Reproduces the exact three-member tree shape from a two-children
    /// removal: inserting scores 1, 2, 3 builds a root (score 2) with both
    /// children present, so removing it exercises `AvlTree::delete`'s
    /// two-children branch. The surviving members must keep their own
    /// score and rank, not inherit the removed member's stale data.
    #[test]
    fn two_children_removal_preserves_surviving_members() {
        let mut z = ZSet::new();
        z.insert(b"a", 1.0);
        z.insert(b"b", 2.0);
        z.insert(b"c", 3.0);
        assert!(z.remove(b"b"));
        assert_eq!(z.len(), 2);
        assert_eq!(z.score(b"a"), Some(1.0));
        assert_eq!(z.score(b"c"), Some(3.0));
        assert_eq!(z.rank(b"a"), Some(0));
        assert_eq!(z.rank(b"c"), Some(1));
        // a re-score of a surviving member must not disturb the other.
        z.insert(b"a", 10.0);
        assert_eq!(z.score(b"a"), Some(10.0));
        assert_eq!(z.score(b"c"), Some(3.0));
        assert_eq!(z.rank(b"c"), Some(0));
        assert_eq!(z.rank(b"a"), Some(1));
    }
}
