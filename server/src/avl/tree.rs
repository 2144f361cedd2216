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

//! # Order-statistic AVL tree
//!
//! A balanced BST augmented with subtree-size counters, giving O(log n)
//! rank/offset in addition to the usual insert/delete (§4.B). Arena-indexed
//! (see [`super::node`]) rather than pointer-linked, so the implementation
//! needs no `unsafe`.

use super::node::{AvlNode, Link};
use std::cmp::Ordering;

pub struct AvlTree<K> {
    nodes: Vec<AvlNode<K>>,
    free: Vec<usize>,
    pub root: Link,
}

impl<K: Ord> Default for AvlTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> AvlTree<K> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    pub fn key(&self, idx: usize) -> &K {
        &self.nodes[idx].key
    }

    pub fn len(&self) -> usize {
        self.count(self.root) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn height(&self, idx: Link) -> u32 {
        idx.map_or(0, |i| self.nodes[i].height)
    }

    fn count(&self, idx: Link) -> u32 {
        idx.map_or(0, |i| self.nodes[i].count)
    }

    fn update(&mut self, idx: usize) {
        let (l, r) = (self.nodes[idx].left, self.nodes[idx].right);
        self.nodes[idx].height = 1 + self.height(l).max(self.height(r));
        self.nodes[idx].count = 1 + self.count(l) + self.count(r);
    }

    fn alloc(&mut self, node: AvlNode<K>) -> usize {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            slot
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn set_parent(&mut self, child: Link, parent: Link) {
        if let Some(c) = child {
            self.nodes[c].parent = parent;
        }
    }

    /// Replaces `old` with `new_sub` in `old`'s parent (or as the tree
    /// root). Does not touch `old`'s own fields.
    fn transplant(&mut self, old: usize, new_sub: Link) {
        let parent = self.nodes[old].parent;
        match parent {
            None => self.root = new_sub,
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new_sub;
                } else {
                    self.nodes[p].right = new_sub;
                }
            }
        }
        self.set_parent(new_sub, parent);
    }

    fn rotate_left(&mut self, x: usize) -> usize {
        let y = self.nodes[x].right.expect("rotate_left needs a right child");
        let beta = self.nodes[y].left;
        self.nodes[x].right = beta;
        self.set_parent(beta, Some(x));
        self.transplant(x, Some(y));
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
        self.update(x);
        self.update(y);
        y
    }

    fn rotate_right(&mut self, x: usize) -> usize {
        let y = self.nodes[x].left.expect("rotate_right needs a left child");
        let beta = self.nodes[y].right;
        self.nodes[x].left = beta;
        self.set_parent(beta, Some(x));
        self.transplant(x, Some(y));
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
        self.update(x);
        self.update(y);
        y
    }

    /// Rebalances the subtree rooted at `idx`, whose children are already
    /// known to differ in height by at most 2, and returns the new subtree
    /// root.
    fn rebalance(&mut self, idx: usize) -> usize {
        self.update(idx);
        let (l, r) = (self.nodes[idx].left, self.nodes[idx].right);
        let balance = self.height(l) as i64 - self.height(r) as i64;
        if balance > 1 {
            let l = l.unwrap();
            if self.height(self.nodes[l].left) < self.height(self.nodes[l].right) {
                let new_l = self.rotate_left(l);
                self.nodes[idx].left = Some(new_l);
                self.nodes[new_l].parent = Some(idx);
            }
            self.rotate_right(idx)
        } else if balance < -1 {
            let r = r.unwrap();
            if self.height(self.nodes[r].right) < self.height(self.nodes[r].left) {
                let new_r = self.rotate_right(r);
                self.nodes[idx].right = Some(new_r);
                self.nodes[new_r].parent = Some(idx);
            }
            self.rotate_left(idx)
        } else {
            idx
        }
    }

    /// Walks from `start` to the root, recomputing height/count and
    /// rebalancing at every step.
    fn fixup_from(&mut self, start: Link) {
        let mut cur = start;
        while let Some(idx) = cur {
            let parent = self.nodes[idx].parent;
            let new_root = self.rebalance(idx);
            if parent.is_none() {
                self.root = Some(new_root);
            }
            cur = self.nodes[new_root].parent;
        }
    }

    pub fn insert(&mut self, key: K) -> usize {
        let new_idx = self.alloc(AvlNode::leaf(key));
        let Some(root) = self.root else {
            self.root = Some(new_idx);
            return new_idx;
        };
        let mut cur = root;
        loop {
            match self.nodes[new_idx].key.cmp(&self.nodes[cur].key) {
                Ordering::Less => match self.nodes[cur].left {
                    Some(next) => cur = next,
                    None => {
                        self.nodes[cur].left = Some(new_idx);
                        break;
                    }
                },
                _ => match self.nodes[cur].right {
                    Some(next) => cur = next,
                    None => {
                        self.nodes[cur].right = Some(new_idx);
                        break;
                    }
                },
            }
        }
        self.nodes[new_idx].parent = Some(cur);
        self.fixup_from(Some(cur));
        new_idx
    }

    fn leftmost(&self, mut idx: usize) -> usize {
        while let Some(l) = self.nodes[idx].left {
            idx = l;
        }
        idx
    }

    /// The smallest node in the tree, or `None` if it's empty.
    pub fn first(&self) -> Option<usize> {
        self.root.map(|r| self.leftmost(r))
    }

    /// Deletes the node at `idx` and returns the arena slot that was freed
    /// — always `idx` itself. A node that survives the delete keeps the
    /// slot it already had: in the two-children case, the in-order
    /// successor is detached from its own spot and relinked into the
    /// victim's position (adopting its parent and both children) rather
    /// than having its key copied anywhere. A caller indexing nodes by
    /// arena slot (e.g. [`crate::zset::ZSet`]'s hash index) never needs to
    /// repoint a surviving node's entry after this call.
    pub fn delete(&mut self, idx: usize) -> usize {
        let (left, right) = (self.nodes[idx].left, self.nodes[idx].right);
        if left.is_none() || right.is_none() {
            let child = left.or(right);
            let parent = self.nodes[idx].parent;
            self.transplant(idx, child);
            self.free.push(idx);
            self.fixup_from(parent);
            return idx;
        }
        let succ = self.leftmost(right.unwrap());
        let fixup_start = if self.nodes[succ].parent == Some(idx) {
            // succ is idx's direct right child: it slides into idx's spot
            // as-is, keeping its own right subtree, and adopts idx's left
            // child.
            self.transplant(idx, Some(succ));
            self.nodes[succ].left = left;
            self.set_parent(left, Some(succ));
            Some(succ)
        } else {
            let succ_parent = self.nodes[succ].parent;
            let succ_right = self.nodes[succ].right;
            // succ has no left child (it's leftmost), so its right child
            // takes its place under succ's former parent.
            self.transplant(succ, succ_right);
            self.transplant(idx, Some(succ));
            self.nodes[succ].left = left;
            self.nodes[succ].right = right;
            self.set_parent(left, Some(succ));
            self.set_parent(right, Some(succ));
            succ_parent
        };
        self.free.push(idx);
        self.fixup_from(fixup_start);
        idx
    }

    /// 0-based position of `idx` in sorted (in-order) order.
    pub fn rank(&self, idx: usize) -> usize {
        let mut pos = self.count(self.nodes[idx].left) as i64;
        let mut cur = idx;
        while let Some(parent) = self.nodes[cur].parent {
            if self.nodes[parent].right == Some(cur) {
                pos += self.count(self.nodes[parent].left) as i64 + 1;
            }
            cur = parent;
        }
        pos as usize
    }

    /// The node `k` positions away from `idx` in sorted order (`k` may be
    /// negative), or `None` if that would fall outside the tree.
    pub fn offset(&self, idx: usize, k: i64) -> Option<usize> {
        let mut pos: i64 = 0;
        let mut cur = idx;
        while pos != k {
            let right_count = self.count(self.nodes[cur].right) as i64;
            if pos < k && pos + right_count >= k {
                cur = self.nodes[cur].right.unwrap();
                pos += self.count(self.nodes[cur].left) as i64 + 1;
                continue;
            }
            let left_count = self.count(self.nodes[cur].left) as i64;
            if pos > k && pos - left_count <= k {
                cur = self.nodes[cur].left.unwrap();
                pos -= self.count(self.nodes[cur].right) as i64 + 1;
                continue;
            }
            let parent = self.nodes[cur].parent?;
            if self.nodes[parent].right == Some(cur) {
                pos -= self.count(self.nodes[cur].left) as i64 + 1;
            } else {
                pos += self.count(self.nodes[cur].right) as i64 + 1;
            }
            cur = parent;
        }
        Some(cur)
    }

    /// Descend the tree, keeping the most recent right-biased candidate:
    /// the smallest node whose key is `>= probe` (§4.C `seek_ge`).
    pub fn seek_ge(&self, probe: &K) -> Option<usize> {
        let mut cur = self.root;
        let mut candidate = None;
        while let Some(idx) = cur {
            if &self.nodes[idx].key < probe {
                cur = self.nodes[idx].right;
            } else {
                candidate = Some(idx);
                cur = self.nodes[idx].left;
            }
        }
        candidate
    }

    #[cfg(test)]
    pub fn in_order(&self) -> Vec<usize> {
        fn walk<K>(t: &AvlTree<K>, idx: Link, out: &mut Vec<usize>) {
            if let Some(i) = idx {
                walk(t, t.nodes[i].left, out);
                out.push(i);
                walk(t, t.nodes[i].right, out);
            }
        }
        let mut out = Vec::new();
        walk(self, self.root, &mut out);
        out
    }

    #[cfg(test)]
    pub fn check_invariants(&self) -> bool
    where
        K: Clone,
    {
        fn walk<K: Ord + Clone>(t: &AvlTree<K>, idx: Link) -> Option<(u32, u32)> {
            match idx {
                None => Some((0, 0)),
                Some(i) => {
                    let (lh, lc) = walk(t, t.nodes[i].left)?;
                    let (rh, rc) = walk(t, t.nodes[i].right)?;
                    if (lh as i64 - rh as i64).abs() > 1 {
                        return None;
                    }
                    let h = 1 + lh.max(rh);
                    let c = 1 + lc + rc;
                    if h != t.nodes[i].height || c != t.nodes[i].count {
                        return None;
                    }
                    if let Some(l) = t.nodes[i].left {
                        if t.nodes[l].parent != Some(i) || t.nodes[l].key >= t.nodes[i].key {
                            return None;
                        }
                    }
                    if let Some(r) = t.nodes[i].right {
                        if t.nodes[r].parent != Some(i) || t.nodes[r].key <= t.nodes[i].key {
                            return None;
                        }
                    }
                    Some((h, c))
                }
            }
        }
        walk(self, self.root).is_some()
    }
}
