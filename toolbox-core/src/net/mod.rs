//! Network related utilities.

pub mod ipv4;

pub use ipv4::{describe, is_valid, Address, Ipv4Network, NetworkSummary, Subnet};
