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

//! # Command dispatcher (component G, §4.G)
//!
//! Validates argv against each command's arity and invokes components A-C
//! to produce a TLV response. A malformed or unknown command never unwinds
//! — it becomes an `ERR` value, same as any other reply.

use crate::protocol::Value;
use crate::store::Store;
use crate::zset::ZSet;

const BAD_COMMAND: &str = "ERR bad command";

/// Executes one already-parsed request against `store`.
pub fn execute(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    let Some(cmd) = argv.first() else {
        return Value::err(BAD_COMMAND);
    };
    match cmd.to_ascii_lowercase().as_slice() {
        b"get" => get(store, argv),
        b"set" => set(store, argv),
        b"del" => del(store, argv),
        b"keys" => keys(store, argv),
        b"exists" => exists(store, argv),
        b"dbsize" => dbsize(store, argv),
        b"zadd" => zadd(store, argv),
        b"zrem" => zrem(store, argv),
        b"zscore" => zscore(store, argv),
        b"zrank" => zrank(store, argv),
        b"zrange" => zrange(store, argv),
        _ => Value::err(BAD_COMMAND),
    }
}

fn get(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 2 {
        return Value::err(BAD_COMMAND);
    }
    match store.main.get(&argv[1]) {
        Some(v) => Value::Str(v.clone()),
        None => Value::Nil,
    }
}

fn set(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 3 {
        return Value::err(BAD_COMMAND);
    }
    store.main.insert(&argv[1], argv[2].clone());
    Value::Nil
}

fn del(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 2 {
        return Value::err(BAD_COMMAND);
    }
    match store.main.remove(&argv[1]) {
        Some(_) => Value::Int(1),
        None => Value::Int(0),
    }
}

fn keys(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 1 {
        return Value::err(BAD_COMMAND);
    }
    let items = store.main.iter().map(|(k, _)| Value::Str(k.to_vec())).collect();
    Value::Arr(items)
}

fn exists(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 2 {
        return Value::err(BAD_COMMAND);
    }
    Value::Int(store.main.contains(&argv[1]) as i64)
}

fn dbsize(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 1 {
        return Value::err(BAD_COMMAND);
    }
    Value::Int(store.main.len() as i64)
}

fn parse_f64(bytes: &[u8]) -> Option<f64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn zadd(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 4 {
        return Value::err(BAD_COMMAND);
    }
    let Some(score) = parse_f64(&argv[2]) else {
        return Value::err("ERR bad score");
    };
    store
        .zsets
        .entry(argv[1].clone())
        .or_insert_with(ZSet::new)
        .insert(&argv[3], score);
    Value::Nil
}

fn zrem(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 3 {
        return Value::err(BAD_COMMAND);
    }
    let removed = store
        .zsets
        .get_mut(&argv[1])
        .map(|z| z.remove(&argv[2]))
        .unwrap_or(false);
    Value::Int(removed as i64)
}

fn zscore(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 3 {
        return Value::err(BAD_COMMAND);
    }
    match store.zsets.get_mut(&argv[1]).and_then(|z| z.score(&argv[2])) {
        Some(score) => Value::Dbl(score),
        None => Value::Nil,
    }
}

fn zrank(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 3 {
        return Value::err(BAD_COMMAND);
    }
    match store.zsets.get_mut(&argv[1]).and_then(|z| z.rank(&argv[2])) {
        Some(rank) => Value::Int(rank as i64),
        None => Value::Nil,
    }
}

fn zrange(store: &mut Store, argv: &[Vec<u8>]) -> Value {
    if argv.len() != 4 {
        return Value::err(BAD_COMMAND);
    }
    let (Some(offset), Some(count)) = (parse_usize(&argv[2]), parse_usize(&argv[3])) else {
        return Value::err("ERR bad range");
    };
    let Some(zset) = store.zsets.get(&argv[1]) else {
        return Value::Arr(Vec::new());
    };
    let items = zset
        .range(offset, count)
        .into_iter()
        .flat_map(|(name, score)| [Value::Str(name.to_vec()), Value::Dbl(score)])
        .collect();
    Value::Arr(items)
}

fn parse_usize(bytes: &[u8]) -> Option<usize> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_del_roundtrip() {
        let mut store = Store::new();
        assert_eq!(execute(&mut store, &[b"get".to_vec(), b"k".to_vec()]), Value::Nil);
        assert_eq!(
            execute(&mut store, &[b"set".to_vec(), b"k".to_vec(), b"v".to_vec()]),
            Value::Nil
        );
        assert_eq!(
            execute(&mut store, &[b"get".to_vec(), b"k".to_vec()]),
            Value::Str(b"v".to_vec())
        );
        assert_eq!(execute(&mut store, &[b"del".to_vec(), b"k".to_vec()]), Value::Int(1));
        assert_eq!(execute(&mut store, &[b"del".to_vec(), b"k".to_vec()]), Value::Int(0));
    }

    #[test]
    fn bad_arity_is_an_error() {
        let mut store = Store::new();
        assert_eq!(
            execute(&mut store, &[b"get".to_vec()]),
            Value::Err(b"ERR bad command".to_vec())
        );
        assert_eq!(
            execute(&mut store, &[b"nonsense".to_vec()]),
            Value::Err(b"ERR bad command".to_vec())
        );
    }

    #[test]
    fn keys_reflects_live_set() {
        let mut store = Store::new();
        execute(&mut store, &[b"set".to_vec(), b"a".to_vec(), b"1".to_vec()]);
        execute(&mut store, &[b"set".to_vec(), b"b".to_vec(), b"2".to_vec()]);
        let Value::Arr(items) = execute(&mut store, &[b"keys".to_vec()]) else {
            panic!("expected an array")
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn exists_and_dbsize() {
        let mut store = Store::new();
        execute(&mut store, &[b"set".to_vec(), b"a".to_vec(), b"1".to_vec()]);
        assert_eq!(execute(&mut store, &[b"exists".to_vec(), b"a".to_vec()]), Value::Int(1));
        assert_eq!(execute(&mut store, &[b"exists".to_vec(), b"z".to_vec()]), Value::Int(0));
        assert_eq!(execute(&mut store, &[b"dbsize".to_vec()]), Value::Int(1));
    }

    #[test]
    fn zset_commands() {
        let mut store = Store::new();
        execute(
            &mut store,
            &[b"zadd".to_vec(), b"z".to_vec(), b"1.5".to_vec(), b"m1".to_vec()],
        );
        execute(
            &mut store,
            &[b"zadd".to_vec(), b"z".to_vec(), b"0.5".to_vec(), b"m2".to_vec()],
        );
        assert_eq!(
            execute(&mut store, &[b"zscore".to_vec(), b"z".to_vec(), b"m1".to_vec()]),
            Value::Dbl(1.5)
        );
        assert_eq!(
            execute(&mut store, &[b"zrank".to_vec(), b"z".to_vec(), b"m2".to_vec()]),
            Value::Int(0)
        );
        let Value::Arr(items) = execute(
            &mut store,
            &[b"zrange".to_vec(), b"z".to_vec(), b"0".to_vec(), b"10".to_vec()],
        ) else {
            panic!("expected an array")
        };
        assert_eq!(items.len(), 4);
        assert_eq!(
            execute(&mut store, &[b"zrem".to_vec(), b"z".to_vec(), b"m1".to_vec()]),
            Value::Int(1)
        );
        assert_eq!(
            execute(&mut store, &[b"zscore".to_vec(), b"z".to_vec(), b"m1".to_vec()]),
            Value::Nil
        );
    }
}
