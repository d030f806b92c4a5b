//! Row loading with per-row failure isolation

use crate::record::{NormalizedRow, SchemaVariant};
use crate::storage::traits::{RowStore, StorageError, StorageResult};

/// What happened to one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Inserted,
    /// The store refused the values; the run goes on
    Rejected { detail: String },
}

/// Inserts one row, absorbing data-validity rejections
///
/// A rejection is logged with the row's values and the store's detail and
/// reported as [`LoadOutcome::Rejected`]. Every other store failure is
/// returned to the caller.
pub fn load_row<S>(store: &mut S, row: &NormalizedRow, variant: SchemaVariant) -> StorageResult<LoadOutcome>
where
    S: RowStore + ?Sized,
{
    match store.insert_row(row) {
        Ok(()) => Ok(LoadOutcome::Inserted),
        Err(StorageError::DataValidity(detail)) => {
            tracing::warn!(
                "Row rejected by the store (cnpj {}): {}; values: {:?}",
                row.cnpj.as_deref().unwrap_or("-"),
                detail,
                row.values_for(variant)
            );
            Ok(LoadOutcome::Rejected { detail })
        }
        Err(e) => Err(e),
    }
}
