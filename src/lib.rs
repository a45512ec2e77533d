//! Serve a directory over HTTP on the first free port
//!
//! The heavy lifting (port selection, dual-stack sockets, the file server)
//! lives in [`file_serve`]; this crate holds what the `hostdir` binary needs on
//! top of it.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod local_addr;
pub mod urls;

pub use config::ServerConfig;
