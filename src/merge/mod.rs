// src/merge/mod.rs

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::parse::{parse_table, ParsedRows};
use crate::{FolderMap, SectionMap};

pub mod identifier;

use identifier::combined_identifier;

/// Key under which the composite identifier is injected into every record.
pub const IDENTIFIER_KEY: &str = "No_Pedimento";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// Batch-fatal: every input file was skipped and no section code was
    /// resolved anywhere. The one case that aborts the pipeline.
    #[error("no valid section data found in any input file")]
    NoData,
}

/// Merge every file from every folder into one section code → record list
/// map.
///
/// File names are prefixed with their folder of origin so identical names in
/// different folders stay distinct. Parses run on the rayon pool; results are
/// folded sequentially in input order, so the output map does not depend on
/// completion order.
#[tracing::instrument(level = "info", skip(folders), fields(folders = folders.len()))]
pub fn aggregate(folders: &FolderMap) -> Result<SectionMap, MergeError> {
    let flattened: Vec<(String, &str)> = folders
        .iter()
        .flat_map(|(folder, files)| {
            files
                .iter()
                .map(move |(name, content)| (format!("{}/{}", folder, name), content.as_str()))
        })
        .collect();
    info!(files = flattened.len(), "aggregating flat files");

    let parsed: Vec<Option<ParsedRows>> = flattened
        .par_iter()
        .map(|(name, content)| parse_table(name, content))
        .collect();

    let mut sections = SectionMap::new();
    for outcome in parsed.into_iter().flatten() {
        if let Some(code) = outcome.empty_section {
            sections.entry(code).or_default();
        }
        for (code, mut record) in outcome.records {
            let id = combined_identifier(&record);
            // Prepend so the identifier becomes the sheet's first column.
            record.shift_insert(0, IDENTIFIER_KEY.to_string(), id);
            sections.entry(code).or_default().push(record);
        }
    }

    if sections.is_empty() {
        return Err(MergeError::NoData);
    }
    debug!(sections = sections.len(), "aggregation complete");
    Ok(sections)
}
