use std::collections::BTreeMap;
use tracing::debug;

use crate::catalog::{Catalog, Category};
use crate::errors::{Result, ScanError};
use crate::results::{MatchRecord, PartialResult};

/// Concatenates per-chunk records into one list per active category.
///
/// Partials may arrive in any order; they are sorted by chunk index and must
/// then cover `0..n` exactly once. Every active category gets an entry, even
/// without matches.
pub fn merge(
    catalog: &Catalog,
    mut partials: Vec<PartialResult>,
) -> Result<BTreeMap<Category, Vec<MatchRecord>>> {
    partials.sort_by_key(|p| p.chunk_index);

    let mut merged: BTreeMap<Category, Vec<MatchRecord>> =
        catalog.categories().map(|c| (c, Vec::new())).collect();

    let chunk_count = partials.len();
    for (expected, partial) in partials.into_iter().enumerate() {
        if partial.chunk_index != expected {
            return Err(ScanError::ChunkSequence {
                expected,
                found: partial.chunk_index,
            });
        }
        for (category, records) in partial.records {
            let bucket = merged
                .get_mut(&category)
                .ok_or_else(|| ScanError::category_mismatch(category))?;
            bucket.extend(records);
        }
    }

    debug!(
        "Merged {} chunks into {} categories",
        chunk_count,
        merged.len()
    );
    Ok(merged)
}
