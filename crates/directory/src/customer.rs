//! Customer: a root record with a generated identity and an embedded address.

use serde::{Deserialize, Serialize};

use berth_core::{DomainError, DomainResult, Entity, RecordId};
use berth_session::PersistentRecord;

use crate::address::Address;

/// A customer in the directory.
///
/// Identity is generated: a freshly constructed customer is transient until a
/// session persists or merges it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    id: Option<RecordId>,
    name: String,
    address: Address,
}

impl Customer {
    /// New customer with the shared default address.
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        Self::with_address(name, Address::default())
    }

    /// New customer with a caller-supplied address.
    pub fn with_address(name: impl Into<String>, address: Address) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self {
            id: None,
            name,
            address,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Replace this customer's address.
    pub fn relocate(&mut self, address: Address) {
        self.address = address;
    }

    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        self.name = name;
        Ok(())
    }
}

impl Entity for Customer {
    type Id = RecordId;

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl PersistentRecord for Customer {
    fn record_type() -> &'static str {
        "directory.customer"
    }

    fn assign_record_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_customer_uses_the_shared_default_address() {
        let customer = Customer::new("Thames Shipping").unwrap();
        assert_eq!(customer.address().city(), "london");
        assert!(customer.id().is_none());
    }

    #[test]
    fn with_address_uses_the_caller_supplied_value() {
        let customer =
            Customer::with_address("Compagnie de Paris", Address::new("paris")).unwrap();
        assert_eq!(customer.address().city(), "paris");
    }

    #[test]
    fn empty_names_are_rejected() {
        let err = Customer::new("   ").unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn relocate_replaces_the_address_without_touching_the_default() {
        let mut customer = Customer::new("Thames Shipping").unwrap();
        customer.relocate(Address::new("paris"));

        assert_eq!(customer.address().city(), "paris");
        assert_eq!(Address::default_address().city(), "london");
    }

    #[test]
    fn rename_rejects_empty_names() {
        let mut customer = Customer::new("Thames Shipping").unwrap();
        assert!(customer.rename("").is_err());
        assert_eq!(customer.name(), "Thames Shipping");
    }

    #[test]
    fn record_type_is_stable() {
        assert_eq!(Customer::record_type(), "directory.customer");
    }
}
