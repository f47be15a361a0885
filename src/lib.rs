//! # Personas Query
//!
//! Natural-language queries over stored personas, answered by a language
//! model.
//!
//! A query is reduced to lower-case terms, the first matching records (at
//! most `matching.cap`, default 5) are selected from the record store, and
//! the query plus those records are sent to the configured generation
//! service. The pure logic lives in the `personas-core` crate; this crate
//! provides the native backends, the CLI, and the HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌───────────────┐   ┌──────────────────┐
//! │  RecordStore  │──▶│  TermMatcher  │──▶│  AnswerComposer  │──▶ OpenAI / Gemini
//! │ SQLite/Memory │   │  (cap = 5)    │   │  (temperature 0) │
//! └───────────────┘   └───────────────┘   └────────┬─────────┘
//!                                                  │
//!                              ┌───────────────────┤
//!                              ▼                   ▼
//!                        ┌──────────┐        ┌──────────┐
//!                        │   CLI    │        │   HTTP   │
//!                        │(personas)│        │ /query/  │
//!                        └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! personas init                          # create database
//! personas import ./personas.json        # load records
//! personas query "quien es maria?"       # one-off query
//! personas serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema (idempotent) |
//! | [`sqlite_store`] | SQLite `RecordStore` with pushed-down term filter |
//! | [`generation`] | OpenAI and Gemini generation clients |
//! | [`event_log`] | Best-effort audit log client |
//! | [`import`] | JSON bulk import |
//! | [`services`] | Startup wiring of store, generator, and pipeline |
//! | [`query`] | `personas query` command |
//! | [`get`] | Record retrieval by id |
//! | [`server`] | HTTP server (Axum) with CORS |

pub mod config;
pub mod db;
pub mod event_log;
pub mod generation;
pub mod get;
pub mod import;
pub mod migrate;
pub mod query;
pub mod server;
pub mod services;
pub mod sqlite_store;
