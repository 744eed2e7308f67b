//! In-process contact store with failure injection

use chrono::Utc;
use std::cell::Cell;

use super::{ContactStore, StoreError};
use crate::core::identity::{ContactId, Owner};
use crate::entities::contact::{Contact, NewContact};

/// Keeps contacts in a `Vec` and counts every call so tests can assert on
/// how the pipeline batches its work.
///
/// `fail_insert_call(n)` makes the n-th insert call (1-based) fail without
/// writing anything, mirroring a rolled-back transaction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contacts: Vec<Contact>,
    insert_calls: usize,
    delete_calls: usize,
    select_calls: Cell<usize>,
    failing_inserts: Vec<usize>,
    failing_deletes: Vec<usize>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the n-th call to `insert_contacts` fail
    pub fn fail_insert_call(&mut self, n: usize) -> &mut Self {
        self.failing_inserts.push(n);
        self
    }

    /// Make the n-th call to `delete_contacts` fail
    pub fn fail_delete_call(&mut self, n: usize) -> &mut Self {
        self.failing_deletes.push(n);
        self
    }

    /// Fail every operation
    pub fn set_unavailable(&mut self, unavailable: bool) -> &mut Self {
        self.unavailable = unavailable;
        self
    }

    /// Insert contacts directly, bypassing call counting
    pub fn seed(&mut self, owner: &Owner, contacts: impl IntoIterator<Item = NewContact>) {
        let now = Utc::now();
        for new in contacts {
            self.contacts
                .push(Contact::from_new(ContactId::new(), owner.clone(), new, now));
        }
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls
    }

    pub fn select_calls(&self) -> usize {
        self.select_calls.get()
    }

    /// Every stored contact regardless of owner
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    fn email_taken(&self, owner: &Owner, email: &str, pending: &[Contact]) -> bool {
        self.contacts
            .iter()
            .chain(pending)
            .filter(|c| &c.owner == owner)
            .filter_map(|c| c.email.as_deref())
            .any(|e| e.eq_ignore_ascii_case(email))
    }
}

impl ContactStore for MemoryStore {
    fn insert_contacts(
        &mut self,
        owner: &Owner,
        batch: &[NewContact],
    ) -> Result<Vec<Contact>, StoreError> {
        self.insert_calls += 1;
        self.check_available()?;
        if self.failing_inserts.contains(&self.insert_calls) {
            return Err(StoreError::Unavailable(format!(
                "injected failure on insert call {}",
                self.insert_calls
            )));
        }

        let now = Utc::now();
        let mut created: Vec<Contact> = Vec::with_capacity(batch.len());
        for new in batch {
            if let Some(email) = new.email.as_deref() {
                if self.email_taken(owner, email, &created) {
                    return Err(StoreError::DuplicateEmail(email.to_string()));
                }
            }
            created.push(Contact::from_new(
                ContactId::new(),
                owner.clone(),
                new.clone(),
                now,
            ));
        }

        self.contacts.extend(created.iter().cloned());
        Ok(created)
    }

    fn existing_emails(&self, owner: &Owner, emails: &[String]) -> Result<Vec<String>, StoreError> {
        self.select_calls.set(self.select_calls.get() + 1);
        self.check_available()?;

        Ok(self
            .contacts
            .iter()
            .filter(|c| &c.owner == owner)
            .filter_map(|c| c.email.as_ref())
            .filter(|stored| emails.iter().any(|e| e.eq_ignore_ascii_case(stored)))
            .cloned()
            .collect())
    }

    fn delete_contacts(&mut self, owner: &Owner, ids: &[ContactId]) -> Result<usize, StoreError> {
        self.delete_calls += 1;
        self.check_available()?;
        if self.failing_deletes.contains(&self.delete_calls) {
            return Err(StoreError::Unavailable(format!(
                "injected failure on delete call {}",
                self.delete_calls
            )));
        }

        let before = self.contacts.len();
        self.contacts
            .retain(|c| !(&c.owner == owner && ids.contains(&c.id)));
        Ok(before - self.contacts.len())
    }

    fn list_contacts(&self, owner: &Owner) -> Result<Vec<Contact>, StoreError> {
        self.select_calls.set(self.select_calls.get() + 1);
        self.check_available()?;

        let mut contacts: Vec<Contact> = self
            .contacts
            .iter()
            .filter(|c| &c.owner == owner)
            .cloned()
            .collect();
        contacts.sort_by_key(|c| c.name.to_lowercase());
        Ok(contacts)
    }
}
