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

//! The bound, listening socket (§4.F). A thin wrapper over the raw `libc`
//! socket calls: `socket`/`setsockopt`/`bind`/`listen`, plus the
//! `O_NONBLOCK` toggle every accepted connection also needs.

use std::io;
use std::mem;
use std::net::IpAddr;
use std::os::unix::io::RawFd;

pub struct Listener {
    pub fd: RawFd,
}

fn check(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

/// Flips `O_NONBLOCK` on, via `fcntl`. Applied to both the listening socket
/// and every accepted connection.
pub fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    unsafe {
        let flags = check(libc::fcntl(fd, libc::F_GETFL, 0))?;
        check(libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK))?;
    }
    Ok(())
}

impl Listener {
    pub fn bind(host: IpAddr, port: u16) -> io::Result<Self> {
        let fd = unsafe { check(libc::socket(libc::AF_INET, libc::SOCK_STREAM, 0))? };
        unsafe {
            let on: libc::c_int = 1;
            check(libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_REUSEADDR,
                &on as *const _ as *const libc::c_void,
                mem::size_of_val(&on) as libc::socklen_t,
            ))?;
        }
        let addr = match host {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(_) => return Err(io::Error::new(io::ErrorKind::Unsupported, "IPv6 is not supported")),
        };
        let sockaddr = libc::sockaddr_in {
            sin_family: libc::AF_INET as libc::sa_family_t,
            sin_port: port.to_be(),
            sin_addr: libc::in_addr {
                s_addr: u32::from_ne_bytes(addr.octets()),
            },
            sin_zero: [0; 8],
        };
        unsafe {
            check(libc::bind(
                fd,
                &sockaddr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            ))?;
            check(libc::listen(fd, 128))?;
        }
        set_nonblocking(fd)?;
        Ok(Self { fd })
    }

    /// Accepts one pending connection. `Ok(None)` means the non-blocking
    /// accept would have blocked — not an error, just nothing waiting yet.
    pub fn accept(&self) -> io::Result<Option<RawFd>> {
        let client_fd = unsafe { libc::accept(self.fd, std::ptr::null_mut(), std::ptr::null_mut()) };
        if client_fd < 0 {
            let err = io::Error::last_os_error();
            return match err.kind() {
                io::ErrorKind::WouldBlock => Ok(None),
                _ => Err(err),
            };
        }
        set_nonblocking(client_fd)?;
        Ok(Some(client_fd))
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
