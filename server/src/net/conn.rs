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

//! The per-connection state machine (§4.E): an fd plus accumulated
//! incoming/outgoing buffers and the three readiness flags the event loop
//! reads every iteration to build its `pollfd` table.

use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};

use kvd_core::READ_CHUNK_SIZE;

use crate::protocol::{parse_request_body, read_frame_len, ProtoError, Request};

pub struct Conn {
    stream: std::net::TcpStream,
    incoming: Vec<u8>,
    outgoing: Vec<u8>,
    outgoing_sent: usize,
    pub want_close: bool,
}

impl Conn {
    pub fn new(fd: RawFd) -> Self {
        Self {
            // SAFETY: `fd` came from a just-accepted, not-yet-owned socket;
            // this is the sole owner from here on.
            stream: unsafe { std::net::TcpStream::from_raw_fd(fd) },
            incoming: Vec::new(),
            outgoing: Vec::new(),
            outgoing_sent: 0,
            want_close: false,
        }
    }

    pub fn fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    /// Never true while output is pending — at most one of `want_read` and
    /// `want_write` is asserted to the event loop at a time (§3).
    pub fn want_read(&self) -> bool {
        !self.want_close && !self.want_write()
    }

    pub fn want_write(&self) -> bool {
        self.outgoing_sent < self.outgoing.len()
    }

    /// Reads whatever is available into `incoming`. `Ok(false)` means the
    /// peer shut down its write side (clean EOF); the caller should close.
    pub fn try_fill_buffer(&mut self) -> io::Result<bool> {
        loop {
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            match self.stream.read(&mut chunk) {
                Ok(0) => return Ok(false),
                Ok(n) => self.incoming.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(true),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Flushes as much of `outgoing` as the socket will currently take.
    pub fn try_flush_buffer(&mut self) -> io::Result<()> {
        while self.outgoing_sent < self.outgoing.len() {
            match self.stream.write(&self.outgoing[self.outgoing_sent..]) {
                Ok(0) => break,
                Ok(n) => self.outgoing_sent += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        if self.outgoing_sent == self.outgoing.len() {
            self.outgoing.clear();
            self.outgoing_sent = 0;
        }
        Ok(())
    }

    pub fn queue_frame(&mut self, frame: Vec<u8>) {
        self.outgoing.extend_from_slice(&frame);
    }

    /// Pulls at most one complete request out of `incoming`, leaving any
    /// leftover bytes (the start of the next request) in place for the next
    /// call — this server is pipelined implicitly: a client may have several
    /// requests queued up before any response comes back.
    pub fn try_one_request(&mut self) -> Result<Option<Request>, ProtoError> {
        let Some(body_len) = read_frame_len(&self.incoming)? else {
            return Ok(None);
        };
        let total = 4 + body_len as usize;
        if self.incoming.len() < total {
            return Ok(None);
        }
        let body = &self.incoming[4..total];
        let request = parse_request_body(body)?;
        self.incoming.drain(0..total);
        Ok(Some(request))
    }
}
