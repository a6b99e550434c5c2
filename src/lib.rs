pub mod extract;
pub mod merge;
pub mod parse;
pub mod workbook;

use indexmap::IndexMap;

/// One parsed data row: column name → trimmed value, in header order.
/// No fixed schema; columns vary per section code.
pub type Record = IndexMap<String, String>;

/// Section code → ordered record list, in file-then-row processing order.
/// Encounter order is preserved so unknown codes serialize deterministically.
pub type SectionMap = IndexMap<String, Vec<Record>>;

/// Folder name → (file name → decoded text). Folder "main" holds files found
/// directly in the top-level archive.
pub type FolderMap = IndexMap<String, IndexMap<String, String>>;
