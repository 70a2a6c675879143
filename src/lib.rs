#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Ledger Sync
//!
//! > **Local mirrors of a remote ledger, kept consistent under concurrent user actions.**
//!
//! This crate is the client-side data layer of a personal ledger: it loads paginated,
//! searchable collections (transactions, categories) from a REST API, reflects
//! loading/success/error states, debounces search input, and deletes optimistically with
//! exact rollback when the server says no.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Why an actor per collection?
//!
//! A mirror is touched by many things at once: keystrokes, page clicks, in-flight list
//! responses, delete confirmations, notice timers. Putting the mirror behind one message
//! loop means:
//! - **No interleaving**: every transition is the result of exactly one message.
//! - **No locks**: background tasks never touch the mirror, they post completions back.
//! - **Observable**: every transition is published on a watch channel.
//!
//! ## 🚀 Core Concepts
//!
//! ### Generics: One Loop, Every Collection
//! You'll see `ResourceSync<T: SyncEntity>` everywhere. The debounce, pagination, request
//! tagging and rollback logic is written **once** and works for any record with an id.
//!
//! ### Stale Responses
//! List requests are tagged with a strictly increasing number. Only the response to the
//! latest request is applied; older ones are dropped when they arrive. Nothing is aborted
//! on the wire.
//!
//! ### Mocking: Testing without a Server
//! See the [`framework::mock`] module: a scripted `MockRemote` and a `ChannelRemote` that
//! parks every request until the test answers it, which is how races are reproduced.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Typed Error Taxonomy
//! [`SyncError`](framework::SyncError) distinguishes network, server (status + message) and
//! validation failures. Validation runs before anything is sent and is returned to the
//! caller directly; network outcomes surface as notices and states.
//!
//! ### 2. One Auth Gate
//! The bearer token lives in a single [`AuthGate`](auth::AuthGate). Every request reads it,
//! and every `401` goes through [`AuthGate::invalidate`](auth::AuthGate::invalidate).
//!
//! ### 3. Observability
//! `tracing` everywhere with an `entity_type` field. See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: The generic sync actor, its handle, the aggregate loader and the remote contract.
//! - **Key items**: [`ResourceSync`](framework::ResourceSync), [`SyncHandle`](framework::SyncHandle),
//!   [`AggregateLoader`](framework::AggregateLoader).
//!
//! ### 2. The Wire ([`http`], [`auth`])
//! - **Role**: reqwest-backed collections, dashboard and report queries, the profile,
//!   and the shared bearer token.
//! - **Key items**: [`ApiClient`](http::ApiClient), [`HttpCollection`](http::HttpCollection).
//!
//! ### 3. The Records ([`model`])
//! - **Role**: `Transaction` and `Category`, with their payloads and validation hooks.
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! - **Role**: Wires everything together and shuts it down.
//! - **Key items**: [`LedgerSystem`](lifecycle::LedgerSystem).
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo against a local API
//! RUST_LOG=info cargo run
//!
//! # Tests
//! cargo test
//! ```

pub mod auth;
pub mod config;
pub mod framework;
pub mod http;
pub mod lifecycle;
pub mod model;
