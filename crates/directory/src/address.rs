//! Address: an embeddable value object with a shared process-wide default.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use berth_core::Embeddable;

/// The shared default address. Created once, never written to.
static DEFAULT_ADDRESS: Lazy<Address> = Lazy::new(|| Address::new("london"));

/// A customer's address.
///
/// Pure value holder: no identity, equality by field values. Embedded inside
/// [`Customer`](crate::Customer); it has no row of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    city: String,
}

impl Address {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into() }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// The shared process-wide default address.
    ///
    /// Constructors copy their initial state from it; nothing may ever write
    /// through it. Its city is "london" for the life of the process.
    pub fn default_address() -> &'static Address {
        &DEFAULT_ADDRESS
    }
}

impl Default for Address {
    /// Copies the shared default (it is never handed out mutably).
    fn default() -> Self {
        DEFAULT_ADDRESS.clone()
    }
}

impl Embeddable for Address {}
