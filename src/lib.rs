//! # machinecfg Library
//!
//! This library resolves and validates layered machine documents: YAML files
//! that declare the packages, repositories, files, binaries and desktop
//! settings a workstation should have. It is designed to be used by the
//! `machinecfg` command-line tool, which hands the merged document to the
//! tools that actually deploy it.
//!
//! ## Quick Example
//!
//! ```
//! use machinecfg::config;
//! use machinecfg::flags::resolve_all;
//! use machinecfg::merge::merge_all;
//!
//! let base = config::parse(r#"
//! version: "1.0"
//! packages:
//!   apt: [git, curl]
//! "#).unwrap();
//! let laptop = config::parse(r#"
//! package_defaults:
//!   apt: ["-y"]
//! packages:
//!   apt: [curl, vim]
//! "#).unwrap();
//!
//! let merged = merge_all([base, laptop]).unwrap();
//! let names: Vec<_> = resolve_all(&merged).into_iter().map(|p| p.name).collect();
//! assert_eq!(names, ["git", "curl", "vim"]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Documents (`config`)**: The typed document model and YAML parsing.
//! - **Loading (`loader`)**: Depth-first include traversal. Includes may be
//!   conditional (`condition`, evaluated against `facts`), may name globs or
//!   directories (`resolve`), and may not form cycles. Diamonds are allowed.
//! - **Merging (`merge`)**: Lists are deduplicated by name with the first
//!   occurrence winning; keyed maps are last-merged-wins. `merge::inherit`
//!   offers a rule-driven alternative for template composition.
//! - **Flags (`flags`)**: Effective package flags from the entry, the user
//!   defaults, or the built-in defaults, in that order.
//! - **Validation (`validation`, `position`, `diagnostics`)**: Non-fatal
//!   findings located by line and column and rendered compiler-style.

pub mod condition;
pub mod config;
pub mod defaults;
pub mod diagnostics;
pub mod error;
pub mod facts;
pub mod flags;
pub mod loader;
pub mod merge;
pub mod output;
pub mod position;
pub mod resolve;
pub mod suggestions;
pub mod validation;

#[cfg(test)]
mod merge_proptest;
