//! autoupgrade - dependency upgrade orchestrator library
//!
//! This library provides the core functionality for upgrading Node.js
//! dependencies one package at a time:
//! - npm (package-lock.json)
//! - yarn (yarn.lock)
//! - pnpm (pnpm-lock.yaml)
//!
//! Every upgrade is validated with a check command and reverted if the
//! check fails.

pub mod cli;
pub mod command;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod operator;
pub mod outdated;
pub mod output;
pub mod package_manager;
pub mod progress;
pub mod session;
pub mod transaction;
pub mod vcs;

#[cfg(test)]
pub(crate) mod test_support;
