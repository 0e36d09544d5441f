//! Interactive session: load a workbook, then serve the main menu

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;

use super::render::{self, ListEntry};
use crate::config::Config;
use crate::query::{self, ContactUpdate, QueryError};
use crate::store::{LoadError, Store};

/// Main menu entries, chosen by typing their number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    CustomersByProduct,
    UpdateContact,
    GoldenCustomer,
    Exit,
}

impl FromStr for MenuOption {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(MenuOption::CustomersByProduct),
            "2" => Ok(MenuOption::UpdateContact),
            "3" => Ok(MenuOption::GoldenCustomer),
            "4" => Ok(MenuOption::Exit),
            _ => Err(()),
        }
    }
}

struct Session<'a> {
    config: &'a Config,
    theme: ColorfulTheme,
}

/// Run until the user picks Exit
pub fn run(config: &Config, initial_file: Option<PathBuf>) -> Result<()> {
    let session = Session {
        config,
        theme: ColorfulTheme::default(),
    };

    let mut store = session.open_store(initial_file)?;

    loop {
        render::main_menu();
        let input: String = Input::with_theme(&session.theme)
            .with_prompt("Option")
            .allow_empty(true)
            .interact_text()?;

        match input.parse::<MenuOption>() {
            Ok(MenuOption::CustomersByProduct) => session.customers_by_product(&store)?,
            Ok(MenuOption::UpdateContact) => {
                if let Some(reopened) = session.update_contact(&mut store)? {
                    store = reopened;
                }
            }
            Ok(MenuOption::GoldenCustomer) => session.golden_customer(&store)?,
            Ok(MenuOption::Exit) => return Ok(()),
            Err(()) => render::invalid_choice(&input),
        }
    }
}

impl Session<'_> {
    /// Try `initial` first, then prompt for a path until a workbook loads
    fn open_store(&self, initial: Option<PathBuf>) -> Result<Store> {
        let mut candidate = initial;
        loop {
            let path = match candidate.take() {
                Some(path) => path,
                None => {
                    let input: String = Input::with_theme(&self.theme)
                        .with_prompt("Path to the data workbook")
                        .interact_text()?;
                    PathBuf::from(input.trim().trim_matches('"'))
                }
            };

            match Store::load(&path, &self.config.sheets) {
                Ok(store) => {
                    render::loaded(&store);
                    return Ok(store);
                }
                Err(err) => {
                    log::warn!("Load of {} failed: {}", path.display(), err);
                    render::load_failed(&err);
                }
            }
        }
    }

    /// Prompt for a store key; 0 means back to the main menu
    fn pick_key(&self, prompt: &str) -> Result<Option<usize>> {
        let key: usize = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_text()?;
        Ok((key != 0).then_some(key))
    }

    fn customers_by_product(&self, store: &Store) -> Result<()> {
        let entries: Vec<_> = store
            .products()
            .iter()
            .map(|(key, product)| ListEntry {
                key: *key,
                label: &product.name,
                detail: format!("{} per {}", product.price, product.units),
            })
            .collect();
        render::selection_list("Products", &entries);

        let Some(key) = self.pick_key("Product")? else {
            return Ok(());
        };

        match query::customers_by_product(store, key) {
            Ok(result) => render::product_orders(&result, &self.config.display.date_format),
            Err(err) => {
                log::warn!("Customers by product failed: {}", err);
                render::error(&err);
            }
        }
        Ok(())
    }

    /// Returns a newly opened store when the workbook could not be reloaded
    /// after the update and the user had to pick a file again
    fn update_contact(&self, store: &mut Store) -> Result<Option<Store>> {
        let entries: Vec<_> = store
            .customers()
            .iter()
            .map(|(key, customer)| ListEntry {
                key: *key,
                label: &customer.organization,
                detail: customer.contact_person.clone(),
            })
            .collect();
        render::selection_list("Customers", &entries);

        let Some(key) = self.pick_key("Customer")? else {
            return Ok(None);
        };
        if !store.customers().contains_key(&key) {
            render::error(&query::QueryError::InvalidSelection {
                kind: query::Selection::Customer,
                key,
            });
            return Ok(None);
        }

        let new_name: String = Input::with_theme(&self.theme)
            .with_prompt("New contact person (full name)")
            .interact_text()?;

        let outcome = query::update_contact_person(store, key, &new_name);
        match &outcome {
            Ok(update) => render::contact_updated(update),
            Err(err) => {
                log::warn!("Contact update failed: {}", err);
                render::error(err);
            }
        }

        match resync_after_update(store, &outcome) {
            Ok(true) if outcome.is_err() => render::loaded(store),
            Ok(_) => {}
            Err(err) => {
                log::error!("Reload after contact update failed: {}", err);
                render::load_failed(&err);
                return self.open_store(None).map(Some);
            }
        }
        Ok(None)
    }

    fn golden_customer(&self, store: &Store) -> Result<()> {
        let year: i32 = Input::with_theme(&self.theme)
            .with_prompt("Year")
            .interact_text()?;
        let month: u32 = Input::with_theme(&self.theme)
            .with_prompt("Month")
            .validate_with(|month: &u32| -> Result<(), &'static str> {
                if (1..=12).contains(month) {
                    Ok(())
                } else {
                    Err("Month must be between 1 and 12")
                }
            })
            .interact_text()?;

        let golden = query::golden_customer(store, year, month);
        render::golden_customer(golden.as_ref(), year, month);
        Ok(())
    }
}

/// Reload `store` when the update was written or the workbook turned out to
/// have changed on disk. Returns whether a reload happened.
///
/// A failed reload leaves the store empty.
fn resync_after_update(
    store: &mut Store,
    outcome: &Result<ContactUpdate, QueryError>,
) -> Result<bool, LoadError> {
    let reload = match outcome {
        Ok(_) => true,
        Err(err) => err.needs_reload(),
    };
    if !reload {
        return Ok(false);
    }

    if let Err(err) = store.reload() {
        store.clear();
        return Err(err);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetMarkers;
    use crate::query::Selection;
    use crate::test_support::example_workbook;
    use crate::workbook::{CellEdit, CellRef, read_workbook, save_edits};

    #[test]
    fn test_menu_option_parsing() {
        assert_eq!("1".parse::<MenuOption>(), Ok(MenuOption::CustomersByProduct));
        assert_eq!(" 2 ".parse::<MenuOption>(), Ok(MenuOption::UpdateContact));
        assert_eq!("3".parse::<MenuOption>(), Ok(MenuOption::GoldenCustomer));
        assert_eq!("4".parse::<MenuOption>(), Ok(MenuOption::Exit));
        assert_eq!("5".parse::<MenuOption>(), Err(()));
        assert_eq!("".parse::<MenuOption>(), Err(()));
        assert_eq!("exit".parse::<MenuOption>(), Err(()));
    }

    #[test]
    fn test_stale_update_reloads_store() {
        let fixture = example_workbook();
        let mut store = Store::load(fixture.path(), &SheetMarkers::default()).unwrap();

        let sheets = read_workbook(fixture.path()).unwrap();
        let edit = CellEdit {
            at: CellRef::new("Клиенты", 1, 3),
            value: "Somebody Else".to_string(),
        };
        save_edits(fixture.path(), &sheets, &[edit]).unwrap();

        let outcome = query::update_contact_person(&store, 1, "John Roe");
        assert!(matches!(outcome, Err(QueryError::StaleRecord { .. })));
        assert!(resync_after_update(&mut store, &outcome).unwrap());
        assert_eq!(store.customers()[&1].contact_person, "Somebody Else");

        // The retry goes through against the reloaded store
        let outcome = query::update_contact_person(&store, 1, "John Roe");
        assert!(outcome.is_ok());
        assert!(resync_after_update(&mut store, &outcome).unwrap());
        assert_eq!(store.customers()[&1].contact_person, "John Roe");
    }

    #[test]
    fn test_rejected_update_keeps_store() {
        let fixture = example_workbook();
        let mut store = Store::load(fixture.path(), &SheetMarkers::default()).unwrap();
        std::fs::write(fixture.path(), "corrupted").unwrap();

        let outcome = Err(QueryError::InvalidSelection {
            kind: Selection::Customer,
            key: 7,
        });
        assert!(!resync_after_update(&mut store, &outcome).unwrap());
        assert_eq!(store.customers().len(), 1);
    }

    #[test]
    fn test_failed_resync_clears_store() {
        let fixture = example_workbook();
        let mut store = Store::load(fixture.path(), &SheetMarkers::default()).unwrap();
        std::fs::write(fixture.path(), "corrupted").unwrap();

        let outcome = Ok(ContactUpdate {
            organization: "Acme".to_string(),
            previous: "Jane Doe".to_string(),
            current: "John Roe".to_string(),
        });
        assert!(resync_after_update(&mut store, &outcome).is_err());
        assert!(store.products().is_empty());
        assert!(store.customers().is_empty());
        assert!(store.orders().is_empty());
        assert_eq!(store.path(), fixture.path());
    }
}
