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

//! Progressively-rehashing hash map: the primary key space's index, and the
//! engine backing every [`crate::zset::ZSet`]'s name index.
//!
//! `newer` always receives new inserts; `older` only exists while a resize
//! is draining. Every call pays a bounded amount of migration work first, so
//! growing the table never produces a user-visible latency spike.

use super::fnv::fnv1a;
use super::htab::HTab;

/// Load factor threshold: resize triggers once `newer.len() >= capacity *
/// K_LOAD`. The spec leaves the exact constant to the implementer (2..8);
/// 8 is chosen here to keep the common case cheap to grow since a chain of
/// ~8 is still a handful of pointer-chases on a lookup miss.
const K_LOAD: usize = 8;
/// Bucket-by-bucket migration budget per user-visible operation.
const K_WORK: usize = 128;
const INITIAL_CAPACITY: usize = 4;

pub struct HMap<V> {
    newer: HTab<V>,
    older: Option<HTab<V>>,
    migrate_pos: usize,
}

impl<V> Default for HMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HMap<V> {
    pub fn new() -> Self {
        Self {
            newer: HTab::with_capacity(INITIAL_CAPACITY),
            older: None,
            migrate_pos: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.newer.len() + self.older.as_ref().map_or(0, HTab::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move up to `K_WORK` entries out of `older`, freeing it once drained.
    /// Called at the top of every lookup/insert/delete (§4.A).
    fn help_rehash(&mut self) {
        let Some(older) = self.older.as_mut() else {
            return;
        };
        older.migrate_into(&mut self.migrate_pos, &mut self.newer, K_WORK);
        if older.len() == 0 {
            self.older = None;
            self.migrate_pos = 0;
        }
    }

    fn maybe_trigger_resize(&mut self) {
        if self.older.is_some() {
            return;
        }
        if self.newer.len() < self.newer.capacity() * K_LOAD {
            return;
        }
        let bigger = HTab::with_capacity(self.newer.capacity() * 2);
        let old = std::mem::replace(&mut self.newer, bigger);
        self.older = Some(old);
        self.migrate_pos = 0;
    }

    pub fn get(&mut self, key: &[u8]) -> Option<&V> {
        self.get_mut(key).map(|v| &*v)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        self.help_rehash();
        let hash = fnv1a(key);
        // `newer` is checked first, then `older`, during migration (§4.A).
        if self.newer.lookup(hash, key).is_some() {
            return self
                .newer
                .lookup(hash, key)
                .and_then(|c| c.as_mut())
                .map(|n| &mut n.value);
        }
        self.older
            .as_mut()
            .and_then(|t| t.lookup(hash, key))
            .and_then(|c| c.as_mut())
            .map(|n| &mut n.value)
    }

    pub fn contains(&mut self, key: &[u8]) -> bool {
        self.help_rehash();
        let hash = fnv1a(key);
        self.newer.lookup(hash, key).is_some()
            || self
                .older
                .as_mut()
                .map_or(false, |t| t.lookup(hash, key).is_some())
    }

    /// Upsert. Returns the previous value if `key` already existed.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        self.help_rehash();
        let hash = fnv1a(key);
        if let Some(cursor) = self.newer.lookup(hash, key) {
            let node = cursor.as_mut().unwrap();
            return Some(std::mem::replace(&mut node.value, value));
        }
        if let Some(older) = self.older.as_mut() {
            if older.lookup(hash, key).is_some() {
                // The key is still draining out of `older`. Remove it there
                // and let the insert below land it in `newer`, same as any
                // other insert during migration (§4.A: "insert during
                // migration always goes into newer").
                let old_value = older.remove(hash, key).map(|n| n.value);
                self.newer
                    .insert(hash, key.to_vec().into_boxed_slice(), value);
                return old_value;
            }
        }
        self.newer.insert(hash, key.to_vec().into_boxed_slice(), value);
        self.maybe_trigger_resize();
        None
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        self.help_rehash();
        let hash = fnv1a(key);
        if let Some(node) = self.newer.remove(hash, key) {
            return Some(node.value);
        }
        if let Some(older) = self.older.as_mut() {
            if let Some(node) = older.remove(hash, key) {
                return Some(node.value);
            }
        }
        None
    }

    /// Iterates every live entry: `newer`'s chains, then `older`'s (§4.G
    /// `keys`). Because command execution is single-threaded, this is a
    /// consistent snapshot at the moment of the call.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &V)> {
        let older_iter = self.older.iter().flat_map(HTab::iter);
        self.newer
            .iter()
            .chain(older_iter)
            .map(|node| (node.key(), &node.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_roundtrip() {
        let mut m: HMap<Vec<u8>> = HMap::new();
        assert_eq!(m.insert(b"a", b"1".to_vec()), None);
        assert_eq!(m.get(b"a"), Some(&b"1".to_vec()));
        assert_eq!(m.insert(b"a", b"2".to_vec()), Some(b"1".to_vec()));
        assert_eq!(m.get(b"a"), Some(&b"2".to_vec()));
        assert_eq!(m.remove(b"a"), Some(b"2".to_vec()));
        assert_eq!(m.get(b"a"), None);
        assert_eq!(m.remove(b"a"), None);
    }

    #[test]
    fn grows_and_keeps_every_key_reachable() {
        let mut m: HMap<usize> = HMap::new();
        const N: usize = 5000;
        for i in 0..N {
            m.insert(i.to_string().as_bytes(), i);
            // every key inserted so far must remain reachable at every
            // intermediate step of a resize (§8 hash table properties)
            for j in 0..=i {
                assert_eq!(m.get(j.to_string().as_bytes()), Some(&j));
            }
        }
        assert_eq!(m.len(), N);
        for i in 0..N {
            assert_eq!(m.get(i.to_string().as_bytes()), Some(&i));
        }
    }

    #[test]
    fn insertion_order_does_not_affect_reachability() {
        let mut keys: Vec<usize> = (0..2000).collect();
        // simple deterministic shuffle
        for i in 0..keys.len() {
            keys.swap(i, (i * 7 + 3) % keys.len());
        }
        let mut m: HMap<usize> = HMap::new();
        for &k in &keys {
            m.insert(k.to_string().as_bytes(), k);
        }
        for &k in &keys {
            assert_eq!(m.get(k.to_string().as_bytes()), Some(&k));
        }
    }
}
