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

//! A single fixed-capacity bucket array with chaining. [`super::HMap`] owns
//! two of these and drives growth; this type knows nothing about resizing.
//!
//! Chains are plain owned lists (`Option<Box<HNode<V>>>`). A `&mut
//! Option<Box<HNode<V>>>` standing in for any link in a chain (a bucket head
//! or some node's `next`) is this table's "indirect cursor": `.take()` on it
//! detaches the node in O(1) without a second walk to find the predecessor.

/// A stored key/value pair plus its cached hash and chain link.
pub struct HNode<V> {
    hash: u64,
    key: Box<[u8]>,
    pub value: V,
    next: Option<Box<HNode<V>>>,
}

impl<V> HNode<V> {
    fn new(hash: u64, key: Box<[u8]>, value: V) -> Box<Self> {
        Box::new(Self {
            hash,
            key,
            value,
            next: None,
        })
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }
}

pub struct HTab<V> {
    buckets: Vec<Option<Box<HNode<V>>>>,
    mask: u64,
    count: usize,
}

impl<V> HTab<V> {
    /// `cap` must be a power of two.
    pub fn with_capacity(cap: usize) -> Self {
        debug_assert!(cap.is_power_of_two());
        let mut buckets = Vec::with_capacity(cap);
        buckets.resize_with(cap, || None);
        Self {
            buckets,
            mask: (cap - 1) as u64,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    fn slot(&self, hash: u64) -> usize {
        (hash & self.mask) as usize
    }

    /// Returns the indirect cursor addressing the matching node, or `None`.
    pub fn lookup(&mut self, hash: u64, key: &[u8]) -> Option<&mut Option<Box<HNode<V>>>> {
        use crate::util::compiler::likely;

        let idx = self.slot(hash);
        let mut link = &mut self.buckets[idx];
        while link.is_some() {
            let node = link.as_ref().unwrap();
            if likely(node.hash == hash) && &*node.key == key {
                return Some(link);
            }
            link = &mut link.as_mut().unwrap().next;
        }
        None
    }

    pub fn insert(&mut self, hash: u64, key: Box<[u8]>, value: V) {
        let idx = self.slot(hash);
        let mut node = HNode::new(hash, key, value);
        node.next = self.buckets[idx].take();
        self.buckets[idx] = Some(node);
        self.count += 1;
    }

    pub fn insert_node(&mut self, mut node: Box<HNode<V>>) {
        let idx = self.slot(node.hash);
        node.next = self.buckets[idx].take();
        self.buckets[idx] = Some(node);
        self.count += 1;
    }

    /// Unlinks and returns the node addressed by `cursor`.
    pub fn detach(cursor: &mut Option<Box<HNode<V>>>) -> Box<HNode<V>> {
        let mut node = cursor.take().expect("detach called on an empty cursor");
        *cursor = node.next.take();
        node
    }

    pub fn remove(&mut self, hash: u64, key: &[u8]) -> Option<Box<HNode<V>>> {
        let node = {
            let cursor = self.lookup(hash, key)?;
            Self::detach(cursor)
        };
        self.count -= 1;
        Some(node)
    }

    /// Drains up to `n` entries from the bucket at `pos` onward, moving each
    /// into `into`, starting the scan at `*pos` and leaving `*pos` at the
    /// first not-yet-drained bucket. Returns the number of entries moved.
    pub fn migrate_into(&mut self, pos: &mut usize, into: &mut HTab<V>, n: usize) -> usize {
        let mut moved = 0;
        while moved < n && *pos < self.buckets.len() {
            match self.buckets[*pos].take() {
                Some(node) => {
                    let rest = node.next.take();
                    // splice `rest` back so the bucket keeps draining next call
                    self.buckets[*pos] = rest;
                    self.count -= 1;
                    into.insert_node(node);
                    moved += 1;
                }
                None => *pos += 1,
            }
        }
        moved
    }

    pub fn iter(&self) -> impl Iterator<Item = &HNode<V>> {
        self.buckets.iter().flat_map(|head| {
            let mut cur = head.as_deref();
            std::iter::from_fn(move || {
                let node = cur?;
                cur = node.next.as_deref();
                Some(node)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::fnv::fnv1a;

    #[test]
    fn insert_lookup_remove() {
        let mut t: HTab<i32> = HTab::with_capacity(4);
        let k: Box<[u8]> = b"foo".to_vec().into_boxed_slice();
        let h = fnv1a(&k);
        t.insert(h, k.clone(), 42);
        assert_eq!(t.len(), 1);
        assert_eq!(t.lookup(h, &k).map(|c| c.as_ref().unwrap().value), Some(42));
        let removed = t.remove(h, &k);
        assert_eq!(removed.map(|n| n.value), Some(42));
        assert_eq!(t.len(), 0);
        assert!(t.lookup(h, &k).is_none());
    }

    #[test]
    fn chains_share_a_bucket() {
        let mut t: HTab<i32> = HTab::with_capacity(1);
        for i in 0..10 {
            let k = i.to_string().into_bytes().into_boxed_slice();
            let h = fnv1a(&k);
            t.insert(h, k, i);
        }
        assert_eq!(t.len(), 10);
        for i in 0..10 {
            let k = i.to_string().into_bytes();
            let h = fnv1a(&k);
            assert_eq!(t.lookup(h, &k).map(|c| c.as_ref().unwrap().value), Some(i));
        }
    }
}
