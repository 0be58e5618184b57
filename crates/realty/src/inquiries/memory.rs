use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;

use super::domain::{Inquiry, InquiryId, NewInquiry};
use super::repository::InquiryRepository;
use crate::store::{poisoned, RepositoryError};

#[derive(Default)]
struct InquiryTable {
    rows: BTreeMap<InquiryId, Inquiry>,
    last_id: u64,
}

/// Process-local inquiry store.
#[derive(Default)]
pub struct InMemoryInquiryRepository {
    table: Mutex<InquiryTable>,
}

impl InquiryRepository for InMemoryInquiryRepository {
    fn insert(&self, inquiry: NewInquiry) -> Result<Inquiry, RepositoryError> {
        let mut table = self.table.lock().map_err(poisoned)?;
        table.last_id += 1;
        let id = InquiryId(table.last_id);
        let stored = inquiry.into_inquiry(id, Utc::now());
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    fn update(&self, id: InquiryId, inquiry: NewInquiry) -> Result<Inquiry, RepositoryError> {
        let mut table = self.table.lock().map_err(poisoned)?;
        let row = table.rows.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        *row = inquiry.into_inquiry(id, row.created_at);
        Ok(row.clone())
    }

    fn fetch(&self, id: InquiryId) -> Result<Option<Inquiry>, RepositoryError> {
        let table = self.table.lock().map_err(poisoned)?;
        Ok(table.rows.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Inquiry>, RepositoryError> {
        let table = self.table.lock().map_err(poisoned)?;
        let mut rows: Vec<Inquiry> = table.rows.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    fn delete(&self, id: InquiryId) -> Result<(), RepositoryError> {
        let mut table = self.table.lock().map_err(poisoned)?;
        table
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}
