//! sandpack-lib: staging, archiving, and task scheduling for sandpack
//!
//! This crate provides the pieces of a small build pipeline:
//! - `graph`: named tasks with dependency edges, validated and ordered
//! - `execute`: runs a task graph concurrently, each task exactly once
//! - `stage`: copies file sets into the shared sandbox directory
//! - `archive`: merges file sets into one reproducible tar archive
//! - `pipeline`: wires a project's configuration into a task graph

pub mod archive;
pub mod config;
pub mod consts;
pub mod execute;
pub mod fileset;
pub mod graph;
pub mod init;
pub mod pipeline;
pub mod stage;
pub mod tools;
pub mod util;
