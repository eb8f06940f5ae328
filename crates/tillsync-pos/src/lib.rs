//! HTTP client and record shaping for the remote POS API.
//!
//! The POS exposes a sign-in endpoint (credential blob in, short-lived bearer
//! token out) and three time-windowed fetch endpoints: sale orders, sale
//! products (line items), and cash-register sessions. This crate wraps them
//! with typed responses, restricts each record to its persisted field set,
//! and shifts timestamps from the POS's UTC reporting time into local time.

pub mod client;
pub mod error;
pub mod normalize;
pub mod project;
pub mod types;

pub use client::PosClient;
pub use error::PosError;
pub use normalize::to_local_time;
pub use project::{project_order, project_product_line, project_session};
pub use types::{
    OrderRecord, ProductLineRecord, RawOrder, RawProductLine, RawSession, SessionRecord,
};
