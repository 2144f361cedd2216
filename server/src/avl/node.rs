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

//! The intrusive AVL node, arena-indexed.
//!
//! §9 notes two safe ways to give a node a cyclic parent/child link: raw
//! pointers confined to the subsystem, or an arena with stable indices
//! standing in for pointers. This takes the arena route so the tree never
//! needs `unsafe`.

pub type Link = Option<usize>;

pub struct AvlNode<K> {
    pub parent: Link,
    pub left: Link,
    pub right: Link,
    /// 1 for a leaf; a null child contributes height 0.
    pub height: u32,
    /// Subtree cardinality, including this node.
    pub count: u32,
    pub key: K,
}

impl<K> AvlNode<K> {
    pub fn leaf(key: K) -> Self {
        Self {
            parent: None,
            left: None,
            right: None,
            height: 1,
            count: 1,
            key,
        }
    }
}
