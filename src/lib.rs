//! # burger - shared build, clean and packaging helpers
//!
//! The routines used by the makeprojects, cleanme and buildme family of
//! tools: finding developer toolchains on every host, read-only aware file
//! operations, path and string canonicalization, typed properties, version
//! headers from source control and `setup.py` generation.
//!
//! ## Quick Start
//!
//! ```bash
//! # Where is git?
//! burger where git
//!
//! # Stamp the current git commit into a header
//! burger git-header . include/version.h
//! ```
//!
//! ## Module Organization
//!
//! - [`locators`] - Tool lookup with caching (git, p4, Visual Studio, ...)
//! - [`fileutils`] - Copying, deleting and comparing files
//! - [`strutils`] - Path, quoting and parsing helpers
//! - [`vcs`] - Version headers from Perforce and git
//! - [`rules`] - `build_rules.toml` command dispatch

/// Cleaners for IDE and Python build droppings.
pub mod clean;

/// Build rules file parsing (`build_rules.toml`).
pub mod config;

/// File and directory operations.
pub mod fileutils;

/// Tool and SDK lookup.
pub mod locators;

/// Build rule commands.
pub mod rules;

/// Child process execution.
pub mod run;

/// `setup.py` generation from `pyproject.toml`.
pub mod setuputils;

/// String, path and host helpers.
pub mod strutils;

/// Tree rendering.
pub mod tree;

/// Terminal UI utilities (tables).
pub mod ui;

/// Type enforcing properties.
pub mod validators;

/// Source control version headers.
pub mod vcs;
