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

//! The request grammar (§4.D): `u32 body_len | u32 nstr | (u32 len | bytes){nstr}`.
//!
//! Parsing is split across two steps so [`crate::net::Conn`] can drive it
//! incrementally as bytes trickle in off a non-blocking socket, the same way
//! the length-then-payload state machine works, just specialized to this
//! server's single frame shape instead of a resumable multi-state one.

use std::fmt;

use kvd_core::{K_MAX_ARGS, K_MAX_MSG};

#[derive(Debug, PartialEq, Eq)]
pub enum ProtoError {
    /// The declared body length exceeds `K_MAX_MSG`.
    BodyTooBig,
    /// `nstr` exceeds `K_MAX_ARGS`.
    TooManyArgs,
    /// The body ended before a declared string's bytes did, or before
    /// `nstr`/a length prefix could even be read.
    Truncated,
    /// The body had bytes left over after `nstr` strings were consumed.
    TrailingGarbage,
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ProtoError::BodyTooBig => "request body too big",
            ProtoError::TooManyArgs => "too many arguments",
            ProtoError::Truncated => "truncated request",
            ProtoError::TrailingGarbage => "trailing bytes after request",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ProtoError {}

/// A fully-parsed request: the flat list of argument strings, first of
/// which is the command name (§4.G).
pub type Request = Vec<Vec<u8>>;

/// Reads the 4-byte little-endian body length prefix from the front of
/// `buf`, if enough bytes have arrived. Validates it against `K_MAX_MSG`
/// before the caller commits to buffering that many bytes.
pub fn read_frame_len(buf: &[u8]) -> Result<Option<u32>, ProtoError> {
    if buf.len() < 4 {
        return Ok(None);
    }
    let len = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    if len as usize > K_MAX_MSG {
        return Err(ProtoError::BodyTooBig);
    }
    Ok(Some(len))
}

/// Parses a complete frame body (everything after the 4-byte length
/// prefix) into its argument strings.
pub fn parse_request_body(body: &[u8]) -> Result<Request, ProtoError> {
    let mut cursor = 0usize;
    let nstr = read_u32(body, &mut cursor)? as usize;
    if nstr > K_MAX_ARGS {
        return Err(ProtoError::TooManyArgs);
    }
    let mut args = Vec::with_capacity(nstr);
    for _ in 0..nstr {
        let len = read_u32(body, &mut cursor)? as usize;
        let end = cursor
            .checked_add(len)
            .filter(|&end| end <= body.len())
            .ok_or(ProtoError::Truncated)?;
        args.push(body[cursor..end].to_vec());
        cursor = end;
    }
    if cursor != body.len() {
        return Err(ProtoError::TrailingGarbage);
    }
    Ok(args)
}

fn read_u32(body: &[u8], cursor: &mut usize) -> Result<u32, ProtoError> {
    let end = cursor.checked_add(4).filter(|&e| e <= body.len()).ok_or(ProtoError::Truncated)?;
    let n = u32::from_le_bytes(body[*cursor..end].try_into().unwrap());
    *cursor = end;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_request(args: &[&[u8]]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&(args.len() as u32).to_le_bytes());
        for a in args {
            body.extend_from_slice(&(a.len() as u32).to_le_bytes());
            body.extend_from_slice(a);
        }
        let mut frame = Vec::new();
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.extend_from_slice(&body);
        frame
    }

    #[test]
    fn parses_a_well_formed_request() {
        let frame = encode_request(&[b"set", b"k", b"v"]);
        let len = read_frame_len(&frame).unwrap().unwrap() as usize;
        let body = &frame[4..4 + len];
        let req = parse_request_body(body).unwrap();
        assert_eq!(req, vec![b"set".to_vec(), b"k".to_vec(), b"v".to_vec()]);
    }

    #[test]
    fn needs_more_bytes_for_short_prefix() {
        assert_eq!(read_frame_len(&[1, 2]), Ok(None));
    }

    #[test]
    fn rejects_a_body_over_the_cap() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&(K_MAX_MSG as u32 + 1).to_le_bytes());
        assert_eq!(read_frame_len(&frame), Err(ProtoError::BodyTooBig));
    }

    #[test]
    fn rejects_too_many_args() {
        let mut body = Vec::new();
        body.extend_from_slice(&(K_MAX_ARGS as u32 + 1).to_le_bytes());
        assert_eq!(parse_request_body(&body), Err(ProtoError::TooManyArgs));
    }

    #[test]
    fn rejects_truncated_string_payload() {
        let mut body = Vec::new();
        body.extend_from_slice(&1u32.to_le_bytes());
        body.extend_from_slice(&10u32.to_le_bytes());
        body.extend_from_slice(b"short");
        assert_eq!(parse_request_body(&body), Err(ProtoError::Truncated));
    }

    #[test]
    fn rejects_trailing_garbage() {
        let mut body = Vec::new();
        body.extend_from_slice(&0u32.to_le_bytes());
        body.push(0xff);
        assert_eq!(parse_request_body(&body), Err(ProtoError::TrailingGarbage));
    }

    #[test]
    fn empty_request_is_valid() {
        let frame = encode_request(&[]);
        let len = read_frame_len(&frame).unwrap().unwrap() as usize;
        let req = parse_request_body(&frame[4..4 + len]).unwrap();
        assert!(req.is_empty());
    }
}
