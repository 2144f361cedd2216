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

//! # Order-statistic AVL tree (component B, §4.B)

pub mod node;
pub mod tree;

pub use tree::AvlTree;

#[cfg(test)]
mod tests {
    use super::*;

    struct Rng(u64);
    impl Rng {
        fn next(&mut self) -> u64 {
            // xorshift64*, deterministic and dependency-free for this test
            self.0 ^= self.0 >> 12;
            self.0 ^= self.0 << 25;
            self.0 ^= self.0 >> 27;
            self.0.wrapping_mul(0x2545F4914F6CDD1D)
        }
        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }
    }

    #[test]
    fn insert_keeps_in_order_and_balanced() {
        let mut t: AvlTree<i64> = AvlTree::new();
        let mut rng = Rng(12345);
        let mut values = Vec::new();
        for _ in 0..2000 {
            let v = rng.below(1_000_000) as i64;
            if !values.contains(&v) {
                values.push(v);
                t.insert(v);
                assert!(t.check_invariants());
            }
        }
        let order: Vec<i64> = t.in_order().into_iter().map(|i| *t.key(i)).collect();
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    #[test]
    fn rank_matches_in_order_position() {
        let mut t: AvlTree<i64> = AvlTree::new();
        for v in [5, 2, 8, 1, 3, 7, 9, 4, 6, 0] {
            t.insert(v);
        }
        let order = t.in_order();
        for (pos, &idx) in order.iter().enumerate() {
            assert_eq!(t.rank(idx), pos);
        }
    }

    #[test]
    fn offset_matches_rank_arithmetic() {
        let mut t: AvlTree<i64> = AvlTree::new();
        for v in 0..50 {
            t.insert(v);
        }
        let order = t.in_order();
        for i in 0..order.len() {
            for j in 0..order.len() {
                let k = j as i64 - i as i64;
                assert_eq!(t.offset(order[i], k), Some(order[j]));
            }
        }
        assert_eq!(t.offset(order[0], -1), None);
        assert_eq!(t.offset(order[order.len() - 1], 1), None);
    }

    #[test]
    fn random_insert_delete_preserves_invariants() {
        let mut t: AvlTree<i64> = AvlTree::new();
        let mut rng = Rng(987654321);
        let mut live: Vec<(i64, usize)> = Vec::new();
        for step in 0..10_000 {
            if live.is_empty() || rng.below(3) != 0 {
                let v = (step * 2654435761u64 % 10_000_000) as i64 ^ (rng.below(1 << 20) as i64);
                if live.iter().any(|(k, _)| *k == v) {
                    continue;
                }
                let idx = t.insert(v);
                live.push((v, idx));
            } else {
                let pick = rng.below(live.len() as u64) as usize;
                let (_, idx) = live.swap_remove(pick);
                // every other live index stays valid across this call: a
                // deleted node's arena slot is never reused by a survivor.
                let freed = t.delete(idx);
                debug_assert!(live.iter().all(|(_, i)| *i != freed));
            }
            assert!(t.check_invariants());
        }
        let mut expect: Vec<i64> = live.iter().map(|(k, _)| *k).collect();
        expect.sort();
        let order: Vec<i64> = t.in_order().into_iter().map(|i| *t.key(i)).collect();
        assert_eq!(order, expect);
    }
}
