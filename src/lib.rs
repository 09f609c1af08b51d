//! Paginating news feed client.
//!
//! Loads a feed one time window at a time and merges every page into a
//! single newest-first list:
//!
//! - [`feed`] - the pagination engine (window math, shared state, fetch
//!   coordinator, notifications to the display)
//! - [`source`] - where pages come from ([`source::FeedSource`] and the
//!   HTTP implementation)
//! - [`display`] - the display-side list and row rendering
//! - [`config`] - optional TOML configuration
//! - [`util`] - endpoint validation, text helpers, task helpers

pub mod config;
pub mod display;
pub mod feed;
pub mod source;
pub mod util;
