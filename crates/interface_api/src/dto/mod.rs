//! Request/response data transfer objects
//!
//! Identifiers travel as bare UUIDs and amounts as decimal strings with a
//! separate ISO currency code.

pub mod rules;
pub mod commissions;
pub mod payouts;
