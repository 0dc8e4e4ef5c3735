//! Incremental commit ledger for a set of git repositories, plus activity reports over it.
//!
//! [`sync`] pulls recent history through a [`git::RepositoryAdapter`] into a bounded,
//! deduplicated [`model::ProjectRecord`] per project kept in a [`store::LedgerStore`].
//! [`report`] turns a slice of that ledger into Markdown, decorated text or HTML.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod model;
pub mod projects;
pub mod report;
pub mod store;
pub mod sync;
pub mod util;
