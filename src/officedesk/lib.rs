//! # Officedesk Architecture
//!
//! Officedesk is the data layer of a small-business back-office console
//! (people, clients, projects, communications, sales opportunities,
//! expenses) that talks to a JSON REST backend. It is a library first; the
//! `officedesk` binary is one terminal client on top of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, renders tables and boards              │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Hands out services and resources per entity              │
//! │  - Applies configured endpoints and resource options        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Resource Layer (resource/, filter.rs, board.rs)            │
//! │  - Cached collection + loading/error/success state          │
//! │  - Client-side filtering and board grouping                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Service Layer (service.rs, payload.rs)                     │
//! │  - Maps CRUD verbs onto endpoint paths                      │
//! │  - Decodes every response body once                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  HTTP Layer (http/, session.rs)                             │
//! │  - Abstract Transport trait                                 │
//! │  - ReqwestTransport (production), InMemoryBackend (testing) │
//! │  - Bearer token, 401 handling, error normalization          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never writes to stdout/stderr, never exits the
//! process and never assumes a terminal. The only I/O below the CLI is the
//! network (through [`http::Transport`]) and the config/token files.
//!
//! ## Testing Strategy
//!
//! 1. **Filter, board, payload, model**: plain unit tests on Rust values.
//! 2. **Resources and services**: driven against [`http::memory::InMemoryBackend`],
//!    which emulates the REST backend including odd response shapes, scripted
//!    failures and delays.
//! 3. **CLI**: binary tests with an isolated config directory.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`resource`]: Cached resources and view scopes
//! - [`service`]: Per-entity REST services and endpoint configuration
//! - [`payload`]: Response body decoding
//! - [`http`]: Transport trait, HTTP client wrapper and implementations
//! - [`session`]: Token storage and login redirects
//! - [`filter`]: Client-side filter engine
//! - [`board`]: Kanban grouping
//! - [`entities`]: Entity presets
//! - [`model`]: Records and identifiers
//! - [`config`]: Configuration management
//! - [`init`]: Startup wiring
//! - [`error`]: Error types
//! - `cli`: Argument parsing and terminal rendering for the binary (not part of the lib API)

pub mod api;
pub mod board;
pub mod config;
pub mod entities;
pub mod error;
pub mod filter;
pub mod http;
pub mod init;
pub mod model;
pub mod payload;
pub mod resource;
pub mod service;
pub mod session;
