//! Offline scan: which ids lack a valid file on disk.

use crate::storage::FileCheck;
use crate::url_model::{Locate, Resource};

/// A resource whose local file is missing or too small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incomplete {
    pub resource: Resource,
    pub check: FileCheck,
}

/// Scans ids `1..=total_count` without touching the network.
pub fn find_incomplete(locator: &dyn Locate, total_count: u32, min_valid_bytes: u64) -> Vec<Incomplete> {
    (1..=total_count)
        .map(|id| locator.locate(id))
        .filter_map(|resource| {
            let check = FileCheck::inspect(&resource.path);
            (!check.is_valid(min_valid_bytes)).then_some(Incomplete { resource, check })
        })
        .collect()
}
