//! # Retouch
//!
//! Upload images from a browser, get back upscaled and sharpened copies, and
//! hand-correct them by painting an overlay that the server burns into the
//! result file in place.
//!
//! # Architecture
//!
//! ```text
//! browser ──multipart──▶ /upload ──▶ uploads/  ──enhance──▶ results/
//!    │                                                        ▲
//!    └──{targetFilename, overlay}──▶ /reprocess ──composite───┘
//! ```
//!
//! Everything that touches pixels or the filesystem lives behind
//! [`service::ProcessingService`], which is generic over an
//! [`imaging::ImageBackend`]. The HTTP layer in [`server`] only parses
//! requests, moves blocking work off the runtime, and maps errors to status
//! codes. The CLI in `main.rs` drives the same service without a server.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Enhancement pipeline: params, pure calculations, backend trait, `image` crate backend |
//! | [`naming`] | Upload/result filename rules, sanitizing, cache-busted URLs |
//! | [`store`] | The uploads and results directories: reserve, find, rename, list |
//! | [`overlay`] | Decode a base64 PNG data URL and alpha-composite it onto a result |
//! | [`bundle`] | Zip every result into one archive |
//! | [`service`] | Upload validation and the upload / reprocess / rename / bundle operations |
//! | [`server`] | axum router, handlers, error mapping, the index page |
//! | [`client`] | reqwest client for a running server |
//! | [`editor`] | Zoom, pan, brush and eraser state plus the submit round trip |
//! | [`config`] | `retouch.toml` loading, merging with stock defaults, validation |
//! | [`types`] | JSON request and response bodies shared by server and client |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Reprocess Overwrites In Place
//!
//! A reprocess writes back to the same result filename. Browsers would serve
//! the stale copy from cache, so every reprocess answers with a URL carrying a
//! `?t=<ms>` query that changes per call.
//!
//! ## Names Are Never Reused
//!
//! Upload and result names embed a millisecond timestamp. Two uploads landing
//! in the same millisecond would still collide, so [`store::FileStore::reserve`]
//! claims a hidden staging file exclusively and bumps the timestamp until it
//! wins. Content is written under the staging name and renamed into place, so
//! listings and bundles never see a half-written file.
//!
//! ## The Editor Is Plain State
//!
//! [`editor::Editor`] holds no toolkit types. Pointer, wheel and key events go
//! in as values and the viewport transform, cursor and stroke layer come out,
//! so the whole gesture state machine is unit-testable.

pub mod bundle;
pub mod client;
pub mod config;
pub mod editor;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod overlay;
pub mod server;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
