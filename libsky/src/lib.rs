/*
 * Created on Mon Jul 20 2020
 *
 * This file is a part of Skytable
 * Skytable (formerly known as TerrabaseDB or Skybase) is a free and open-source
 * NoSQL database written by Sayan Nandan ("the Author") with the
 * vision to provide flexibility in data modelling without compromising
 * on performance, queryability or scalability.
 *
 * Copyright (c) 2020, Sayan Nandan <ohsayan@outlook.com>
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

//! The core library for the server crate.
//!
//! This contains items that are shared across the server binary: the top-level
//! error type used to unwind a bootstrap failure to `main`, and a handful of
//! wire-level size constants that the protocol, connection, and config layers
//! all need to agree on.

use std::{fmt, io};

/// The size of a single readable chunk pulled off a socket in one go (§4.E).
pub const READ_CHUNK_SIZE: usize = 64 * 1024;
/// Maximum permitted request body size, in bytes (§4.D/§6): 32 MiB.
pub const K_MAX_MSG: usize = 32 * 1024 * 1024;
/// Maximum permitted number of strings in a request's argv (§4.E/§6).
pub const K_MAX_ARGS: usize = 200_000;
/// Default bind port (§6).
pub const DEFAULT_PORT: u16 = 1234;

/// Top-level error type for bootstrap and fatal I/O failures.
///
/// Command-level and protocol-level errors never reach this type: they're
/// encoded onto the wire by the dispatcher/codec and never unwind (§7).
/// This type exists for failures that have no connection to report them on,
/// e.g. a failed bind or a `poll()` syscall failure.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("fatal: {0}")]
    Fatal(String),
}

pub type SResult<T> = Result<T, ServerError>;

/// Exit the process with a non-zero status after logging `e`.
#[cold]
#[inline(never)]
pub fn bail(e: impl fmt::Display) -> ! {
    log::error!("{e}");
    std::process::exit(1)
}
