//! Transports for the two ranking sources.
//!
//! | Source | Module | Method | Payload |
//! |--------|--------|--------|---------|
//! | Ranking API | [`api`] | Direct HTTP request | Decoded JSON |
//! | Ranking page | [`page`] | Headless browser rendering | Rendered HTML |
//!
//! Both implement [`crate::fetch::Transport`] and perform a single attempt;
//! retries are applied by [`crate::fetch::Retrying`].

pub mod api;
pub mod page;
