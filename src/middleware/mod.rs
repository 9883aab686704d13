//! Request-processing middleware.
//!
//! Layered outside-in as: request logging, then [`identity`] (attaches the
//! resolved role, never rejects), then [`admission`] (rate limiting, bot and
//! shield protection). [`auth`] and [`role`] provide extractors for handlers
//! behind the pipeline.

pub mod admission;
pub mod auth;
pub mod identity;
pub mod role;
