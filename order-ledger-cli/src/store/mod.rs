//! In-memory store of products, customers and orders
//!
//! A [`Store`] is always the complete contents of one workbook. Loading builds
//! a fresh store and only hands it out once every sheet parsed, so a failed
//! load leaves whatever store the caller already had untouched.

mod parse;
mod records;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::SheetMarkers;
use crate::workbook::cells::CellError;
use crate::workbook::read_workbook;

pub use parse::SheetKind;
pub use records::{Customer, Order, Product};

/// Why a workbook could not be loaded
#[derive(Debug)]
pub enum LoadError {
    /// Path does not point at an existing file
    FileNotFound { path: PathBuf },
    /// Workbook could not be opened or a sheet could not be read
    Open { path: PathBuf, source: anyhow::Error },
    /// A cell did not hold the expected type
    Parse {
        sheet: String,
        /// 1-based spreadsheet row number
        row: u32,
        source: CellError,
    },
    /// Two sheets matched the same keyed record kind
    DuplicateSheet {
        kind: SheetKind,
        first: String,
        second: String,
    },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::FileNotFound { path } => {
                write!(f, "File not found: {}", path.display())
            }
            LoadError::Open { path, .. } => {
                write!(f, "Failed to load workbook: {}", path.display())
            }
            LoadError::Parse { sheet, row, source } => {
                write!(f, "Sheet '{}', row {}: {}", sheet, row, source)
            }
            LoadError::DuplicateSheet { kind, first, second } => {
                write!(
                    f,
                    "Sheets '{}' and '{}' both hold {} - keep only one",
                    first, second, kind
                )
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Open { source, .. } => Some(&**source),
            LoadError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Records of one workbook.
///
/// Products and customers are keyed by store key (their 1-based position
/// among the data rows of their sheet), orders keep load order.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    markers: SheetMarkers,
    products: BTreeMap<usize, Product>,
    customers: BTreeMap<usize, Customer>,
    orders: Vec<Order>,
}

impl Store {
    /// Empty store bound to a workbook path
    pub fn new(path: impl Into<PathBuf>, markers: SheetMarkers) -> Self {
        Store {
            path: path.into(),
            markers,
            products: BTreeMap::new(),
            customers: BTreeMap::new(),
            orders: Vec::new(),
        }
    }

    /// Load every record sheet of a workbook.
    ///
    /// Sheets whose names contain no marker are ignored. Order sheets may
    /// repeat; a second products or customers sheet is an error because store
    /// keys restart on every sheet.
    pub fn load(path: impl AsRef<Path>, markers: &SheetMarkers) -> Result<Store, LoadError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LoadError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let sheets = read_workbook(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut store = Store::new(path, markers.clone());
        let mut seen: Vec<(SheetKind, &str)> = Vec::new();

        for sheet in &sheets {
            let Some(kind) = SheetKind::classify(&sheet.name, markers) else {
                log::debug!("Skipping sheet '{}' - no marker matched", sheet.name);
                continue;
            };

            if kind != SheetKind::Orders {
                if let Some((_, first)) = seen.iter().find(|(k, _)| *k == kind) {
                    return Err(LoadError::DuplicateSheet {
                        kind,
                        first: first.to_string(),
                        second: sheet.name.clone(),
                    });
                }
            }
            seen.push((kind, sheet.name.as_str()));

            let count = parse::load_sheet(sheet, kind, &mut store)?;
            log::debug!("Sheet '{}': {} {} rows", sheet.name, count, kind);
        }

        for kind in SheetKind::ALL {
            if !seen.iter().any(|(k, _)| *k == kind) {
                log::warn!(
                    "No sheet name contains '{}' - {} list is empty",
                    kind.marker(markers),
                    kind
                );
            }
        }

        log::info!(
            "Loaded {} products, {} customers, {} orders from {}",
            store.products.len(),
            store.customers.len(),
            store.orders.len(),
            path.display()
        );
        Ok(store)
    }

    /// Replace the contents with a fresh load of the same workbook.
    ///
    /// On failure the current contents are kept.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        let fresh = Store::load(&self.path, &self.markers)?;
        *self = fresh;
        Ok(())
    }

    /// Drop all records, keeping the path and markers
    pub fn clear(&mut self) {
        self.products.clear();
        self.customers.clear();
        self.orders.clear();
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn products(&self) -> &BTreeMap<usize, Product> {
        &self.products
    }

    pub fn customers(&self) -> &BTreeMap<usize, Customer> {
        &self.customers
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn insert_product(&mut self, key: usize, product: Product) {
        self.products.insert(key, product);
    }

    pub fn insert_customer(&mut self, key: usize, customer: Customer) {
        self.customers.insert(key, customer);
    }

    pub fn push_order(&mut self, order: Order) {
        self.orders.push(order);
    }
}
