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

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

use kvd::config::{self, ServerConfig};

/// An in-memory, single-threaded, TCP key-value server.
#[derive(Parser, Debug)]
#[command(name = "kvd", version)]
struct Args {
    /// Address to bind to.
    #[arg(long)]
    host: Option<IpAddr>,
    /// Port to bind to.
    #[arg(long)]
    port: Option<u16>,
    /// YAML config file. CLI flags above still take priority over it.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn resolve_config(args: &Args) -> ServerConfig {
    let file = args.config.as_ref().map(|path| match config::load_file(path) {
        Ok(f) => f,
        Err(e) => kvd_core::bail(e),
    });
    config::resolve(file, args.host, args.port)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let cfg = resolve_config(&args);
    log::info!("starting kvd on {}:{}", cfg.host, cfg.port);
    if let Err(e) = kvd::serve(cfg.host, cfg.port) {
        kvd_core::bail(e);
    }
}
