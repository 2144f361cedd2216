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

//! The single-threaded readiness loop (component F, §4.F): one `poll()`
//! call per iteration, covering the listener and every live connection.

use std::collections::HashMap;
use std::net::IpAddr;
use std::os::unix::io::RawFd;

use kvd_core::SResult;

use crate::dispatch;
use crate::net::conn::Conn;
use crate::net::listener::Listener;
use crate::protocol::ProtoError;
use crate::store::Store;

/// Runs the event loop forever. Returns only on a fatal, unrecoverable
/// error (a failed bind, or `poll()` itself erroring out).
pub fn run(host: IpAddr, port: u16) -> SResult<()> {
    let listener = Listener::bind(host, port)?;
    log::info!("listening on {host}:{port}");
    let mut conns: HashMap<RawFd, Conn> = HashMap::new();
    let mut store = Store::new();

    loop {
        let mut pollfds = Vec::with_capacity(conns.len() + 1);
        pollfds.push(libc::pollfd {
            fd: listener.fd,
            events: libc::POLLIN,
            revents: 0,
        });
        for conn in conns.values() {
            let mut events = 0;
            if conn.want_read() {
                events |= libc::POLLIN;
            }
            if conn.want_write() {
                events |= libc::POLLOUT;
            }
            pollfds.push(libc::pollfd {
                fd: conn.fd(),
                events,
                revents: 0,
            });
        }

        let ready = unsafe { libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, -1) };
        if ready < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err.into());
        }

        if pollfds[0].revents & libc::POLLIN != 0 {
            accept_all(&listener, &mut conns);
        }

        let mut to_close = Vec::new();
        for pfd in pollfds.iter().skip(1) {
            if pfd.revents == 0 {
                continue;
            }
            let fd = pfd.fd;
            let Some(conn) = conns.get_mut(&fd) else {
                continue;
            };
            if pfd.revents & (libc::POLLERR | libc::POLLHUP) != 0 {
                conn.want_close = true;
            }
            if pfd.revents & libc::POLLIN != 0 {
                service_readable(conn, &mut store);
            }
            if pfd.revents & libc::POLLOUT != 0 {
                if let Err(e) = conn.try_flush_buffer() {
                    log::warn!("write error on fd {fd}: {e}");
                    conn.want_close = true;
                }
            }
            if conn.want_close {
                to_close.push(fd);
            }
        }
        for fd in to_close {
            conns.remove(&fd);
            unsafe {
                libc::close(fd);
            }
        }
    }
}

fn accept_all(listener: &Listener, conns: &mut HashMap<RawFd, Conn>) {
    loop {
        match listener.accept() {
            Ok(Some(fd)) => {
                conns.insert(fd, Conn::new(fd));
            }
            Ok(None) => break,
            Err(e) => {
                log::error!("accept failed: {e}");
                break;
            }
        }
    }
}

fn service_readable(conn: &mut Conn, store: &mut Store) {
    match conn.try_fill_buffer() {
        Ok(false) => {
            conn.want_close = true;
            return;
        }
        Ok(true) => {}
        Err(e) => {
            log::warn!("read error: {e}");
            conn.want_close = true;
            return;
        }
    }
    loop {
        match conn.try_one_request() {
            Ok(Some(argv)) => {
                let reply = dispatch::execute(store, &argv);
                conn.queue_frame(reply.encode_frame());
            }
            Ok(None) => break,
            Err(e) => {
                log::warn!("protocol error: {e}");
                conn.queue_frame(proto_error_frame(&e));
                conn.want_close = true;
                break;
            }
        }
    }
}

fn proto_error_frame(e: &ProtoError) -> Vec<u8> {
    crate::protocol::Value::err(format!("ERR {e}")).encode_frame()
}
