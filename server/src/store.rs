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

//! The in-memory keyspace (§3 Entry, §4.A/§4.C).
//!
//! `main` is the primary key space, indexed by the custom progressively
//! rehashing hash table. The zset directory is a second, independent table
//! keyed by zset name; it's plain `std::collections::HashMap` since nothing
//! in the spec requires the primary key space's table for this bookkeeping
//! layer — only the zsets' own members are order-statistic-indexed.

use std::collections::HashMap;

use crate::hash::HMap;
use crate::zset::ZSet;

#[derive(Default)]
pub struct Store {
    pub main: HMap<Vec<u8>>,
    pub zsets: HashMap<Vec<u8>, ZSet>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            main: HMap::new(),
            zsets: HashMap::new(),
        }
    }
}
