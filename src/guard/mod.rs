//! Request admission control.
//!
//! The pieces the admission middleware composes, in dependency order:
//!
//! - [`policy`]: pure mapping from (role, method, path, config) to a
//!   [`policy::RateLimitPolicy`]
//! - [`decision`]: the [`decision::DecisionService`] seam, verdict
//!   classification and the [`decision::AdmissionOutcome`] taxonomy
//! - [`client`]: the production HTTP decision client

pub mod client;
pub mod decision;
pub mod policy;

pub use client::HttpDecisionService;
pub use decision::{AdmissionOutcome, DecisionService, RequestDescriptor, Verdict};
pub use policy::{RateLimitPolicy, RequestRole, resolve_policy};
