//! Directory domain module (customers and their addresses).
//!
//! This crate contains the directory's records and value objects, implemented
//! purely as deterministic domain logic (no IO, no storage of its own;
//! persistence goes through `berth-session`).

pub mod address;
pub mod customer;

pub use address::Address;
pub use customer::Customer;
