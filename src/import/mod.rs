//! Spreadsheet-to-store reconciliation pipeline
//!
//! file -> sheets -> (site mapping, editable) -> normalized rows -> preview -> batched commit

pub mod commit;
pub mod dates;
pub mod documents;
pub mod normalizer;
pub mod preview;
pub mod session;
pub mod site_matcher;
pub mod template;
pub mod workbook;

pub use commit::{BatchProgress, CommitError, CommitReport, DEFAULT_BATCH_SIZE, commit_records};
pub use dates::coerce_date;
pub use documents::{DocumentKind, DocumentStatus, DocumentSummary, document_status};
pub use normalizer::{NormalizeContext, NormalizedRecord, RowRejection, normalize_row};
pub use preview::{MappingStatus, Preview, PreviewOptions, SheetMapping, compute_preview};
pub use session::ImportSession;
pub use site_matcher::{Site, SiteAlias, SiteMatcher};
pub use template::{template_bytes, write_template};
pub use workbook::{CellValue, Row, Sheet, read_workbook_bytes, read_workbook_file};
