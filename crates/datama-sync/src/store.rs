//! # Store
//!
//! The five entity collections plus the current-user slot.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               Store                                     │
//! │                                                                         │
//! │   user       watch<Option<User>>   set once at construction             │
//! │   customers  Collection(customer)  ┐                                    │
//! │   employees  Collection(employee)  │                                    │
//! │   items      Collection(item)      ├─ replaced by fetch_all             │
//! │   receipts   Collection(receipt)   │                                    │
//! │   payments   Collection(payment)   ┘                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use datama_core::{Table, User};
use tokio::sync::watch;

use crate::collection::Collection;

#[derive(Debug)]
pub struct Store {
    user: watch::Sender<Option<User>>,
    customers: Collection,
    employees: Collection,
    items: Collection,
    receipts: Collection,
    payments: Collection,
}

impl Store {
    /// Creates empty collections and fixes the current user.
    pub fn new(user: Option<User>) -> Self {
        let (user, _) = watch::channel(user);
        Store {
            user,
            customers: Collection::new(Table::Customer),
            employees: Collection::new(Table::Employee),
            items: Collection::new(Table::Item),
            receipts: Collection::new(Table::Receipt),
            payments: Collection::new(Table::Payment),
        }
    }

    /// The collection fed by `table`.
    pub fn collection(&self, table: Table) -> &Collection {
        match table {
            Table::Customer => &self.customers,
            Table::Employee => &self.employees,
            Table::Item => &self.items,
            Table::Receipt => &self.receipts,
            Table::Payment => &self.payments,
        }
    }

    pub fn customers(&self) -> &Collection {
        &self.customers
    }

    pub fn employees(&self) -> &Collection {
        &self.employees
    }

    pub fn items(&self) -> &Collection {
        &self.items
    }

    pub fn receipts(&self) -> &Collection {
        &self.receipts
    }

    pub fn payments(&self) -> &Collection {
        &self.payments
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn subscribe_user(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_lookup_matches_table() {
        let store = Store::default();
        for table in Table::ALL {
            assert_eq!(store.collection(table).table(), table);
            assert!(store.collection(table).is_empty());
        }
        assert_eq!(store.receipts().table(), Table::Receipt);
    }

    #[test]
    fn test_user_slot() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "6f1c2d9e-8a4b-4c4e-9f7a-2b3c4d5e6f70",
            "email": "owner@example.com"
        }))
        .unwrap();

        let store = Store::new(Some(user.clone()));
        assert_eq!(store.current_user(), Some(user));
        assert!(store.subscribe_user().borrow().is_some());

        assert!(Store::default().current_user().is_none());
    }
}
