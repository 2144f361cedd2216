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

//! An in-memory, single-threaded, TCP key-value server (§2 SYSTEM OVERVIEW).
//!
//! `serve` is the library-level entry point (§6): it binds, then runs the
//! event loop until a fatal error. Everything this server does happens on
//! that one thread — the hash table, the AVL tree, the zset layer, and the
//! wire codec are all written without locks because nothing here is shared
//! across threads.

pub mod avl;
pub mod config;
pub mod dispatch;
pub mod hash;
pub mod net;
pub mod protocol;
pub mod store;
pub mod util;
pub mod zset;

use std::net::IpAddr;

use kvd_core::SResult;

/// Binds `address:port` and runs the event loop until a fatal error.
pub fn serve(address: IpAddr, port: u16) -> SResult<()> {
    net::run(address, port)
}
