//! # Sidekick
//!
//! A local-first, editor-integrated completion and retrieval assistant
//! for on-device language models.
//!
//! Sidekick decides *what* source text to send to an inference engine,
//! *when* to send it, how to cancel stale in-flight work, and how to
//! bound retrieval corpora — independent of which engine answers. The
//! engine is a black box behind the `ChatBackend` trait; this crate
//! supplies concrete backends, configuration, workspace enumeration, and
//! the host-facing event surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌─────────────┐
//! │ Host events  │──▶│   Assistant     │──▶│ ChatBackend │
//! │ edit/explain │   │ extract→admit→ │   │ local HTTP  │
//! │ /search      │   │ call→deliver   │   │ or scripted │
//! └──────────────┘   └──────┬─────────┘   └─────────────┘
//!                           ▼
//!                     ┌──────────┐
//!                     │RenderSink│
//!                     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! echo "fn main() {" | sk complete      # inline completion from stdin
//! sk explain "zpool create tank"        # explain a snippet
//! sk search "where is the config parsed"
//! sk profile                            # show the resolved platform profile
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`backend`] | Concrete `ChatBackend` implementations |
//! | [`workspace`] | File-enumeration collaborator |
//! | [`assist`] | Host-facing pipeline surface |

pub mod assist;
pub mod backend;
pub mod config;
pub mod workspace;
