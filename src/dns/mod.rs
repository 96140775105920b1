//! DNS state handling.
//!
//! - [`snapshot`]: save/restore of the native DNS server slots around
//!   connection-lifecycle calls that clear them
//! - [`resolver`]: bounded-wait hostname resolution on top of the native
//!   callback-based resolver

mod resolver;
mod snapshot;

pub use resolver::{Completion, Expiry, HostResolver, LookupPhase};
pub use snapshot::DnsSnapshot;
