//! Contact person update, persisted to the workbook

use crate::store::Store;
use crate::workbook::{CellEdit, cells, read_workbook, save_edits};

use super::{QueryError, Selection};

/// Outcome of a successful contact update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactUpdate {
    pub organization: String,
    pub previous: String,
    pub current: String,
}

/// Replace the contact person of the customer at `customer_key`.
///
/// Only the cell the customer was loaded from is rewritten. The workbook is
/// re-read from disk, checked against the store, and saved over the same
/// path. A blank contact may sit outside the sheet's used range; that cell is
/// created. The store itself is not modified; reload it afterwards.
pub fn update_contact_person(
    store: &Store,
    customer_key: usize,
    new_name: &str,
) -> Result<ContactUpdate, QueryError> {
    let customer = store
        .customers()
        .get(&customer_key)
        .ok_or(QueryError::InvalidSelection {
            kind: Selection::Customer,
            key: customer_key,
        })?;

    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(QueryError::EmptyContactName);
    }

    let sheets = read_workbook(store.path()).map_err(QueryError::Workbook)?;

    let at = &customer.origin;
    let sheet = sheets.iter().find(|sheet| sheet.name == at.sheet);
    let found = match sheet.map(|sheet| sheet.cell(at.row, at.col)) {
        Some(Some(cell)) => Some(cells::text(cell)),
        // Outside the used range reads as blank
        Some(None) => Some(String::new()),
        None => None,
    };
    if found.as_deref() != Some(customer.contact_person.as_str()) {
        return Err(QueryError::StaleRecord {
            at: at.clone(),
            expected: customer.contact_person.clone(),
            found,
        });
    }

    let edit = CellEdit {
        at: at.clone(),
        value: new_name.to_string(),
    };
    save_edits(store.path(), &sheets, &[edit]).map_err(QueryError::Workbook)?;

    log::info!(
        "Contact person of '{}' changed from '{}' to '{}' at {}",
        customer.organization,
        customer.contact_person,
        new_name,
        at
    );

    Ok(ContactUpdate {
        organization: customer.organization.clone(),
        previous: customer.contact_person.clone(),
        current: new_name.to_string(),
    })
}
