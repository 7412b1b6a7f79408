//! Payout Domain
//!
//! Agents convert approved commission into money transfers through payout
//! requests. Administrators approve, reject and finally mark payouts as paid.
//!
//! # Payout Lifecycle
//!
//! ```text
//! Requested -> Approved -> Paid
//!     |
//!     +------> Rejected
//! ```
//!
//! Approving a payout settles every approved commission of the agent, not
//! a subset matching the requested amount.

pub mod payout;
pub mod ports;
pub mod manager;
pub mod notification;
pub mod memory;
pub mod error;

pub use payout::{PayoutRequest, PayoutStatus, PaymentMethod, generate_payout_number};
pub use ports::PayoutStore;
pub use manager::PayoutManager;
pub use notification::{
    PayoutNotifier, PayoutNotice, LoggingNotifier, RetryingNotifier, RetryPolicy,
};
pub use memory::InMemoryPayoutStore;
pub use error::PayoutError;
