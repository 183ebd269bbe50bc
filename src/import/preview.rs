use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::normalizer::{NormalizeContext, NormalizedRecord, normalize_row};
use super::workbook::Sheet;

pub const DEFAULT_MAX_ERRORS: usize = 5;

/// Operator-editable association between a sheet and its target site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMapping {
    pub sheet_name: String,
    pub target_site_id: Option<String>,
    pub ignored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MappingStatus {
    Ready,
    Unmapped,
    Ignored,
}

impl MappingStatus {
    pub fn badge(&self) -> &'static str {
        match self {
            MappingStatus::Ready => "READY",
            MappingStatus::Unmapped => "UNMAPPED",
            MappingStatus::Ignored => "IGNORED",
        }
    }
}

impl SheetMapping {
    pub fn new(sheet_name: impl Into<String>, target_site_id: Option<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            target_site_id,
            ignored: false,
        }
    }

    /// Target site id, treating a blank id as unmapped
    pub fn target(&self) -> Option<&str> {
        self.target_site_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn status(&self) -> MappingStatus {
        if self.ignored {
            MappingStatus::Ignored
        } else if self.target().is_some() {
            MappingStatus::Ready
        } else {
            MappingStatus::Unmapped
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    pub max_errors: usize,
    pub today: NaiveDate,
}

impl PreviewOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            max_errors: DEFAULT_MAX_ERRORS,
            today,
        }
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

/// Derived summary of what a commit would insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: Vec<String>,
    pub records: Vec<NormalizedRecord>,
}

impl Preview {
    pub fn can_commit(&self) -> bool {
        self.valid > 0
    }
}

/// Recompute the preview from the sheets and their current mappings.
///
/// Pure: only ready sheets contribute, and the same inputs always give the same output.
pub fn compute_preview(sheets: &[Sheet], mappings: &[SheetMapping], options: &PreviewOptions) -> Preview {
    let by_sheet: HashMap<&str, &SheetMapping> = mappings
        .iter()
        .map(|mapping| (mapping.sheet_name.as_str(), mapping))
        .collect();
    let ctx = NormalizeContext::new(options.today);

    let mut preview = Preview::default();

    for sheet in sheets {
        let Some(mapping) = by_sheet.get(sheet.name.as_str()) else {
            debug!("Sheet '{}' has no mapping, skipped", sheet.name);
            continue;
        };
        if mapping.ignored {
            continue;
        }
        let Some(site_id) = mapping.target() else {
            continue;
        };

        for row in &sheet.rows {
            preview.total += 1;
            match normalize_row(row, &sheet.name, site_id, &ctx) {
                Ok(record) => {
                    debug_assert!(record.is_valid());
                    preview.valid += 1;
                    preview.records.push(record);
                }
                Err(rejection) => {
                    preview.invalid += 1;
                    let message = rejection.message();
                    if preview.errors.len() < options.max_errors && !preview.errors.contains(&message) {
                        preview.errors.push(message);
                    }
                }
            }
        }
    }

    debug!(
        "Preview: {} total, {} valid, {} invalid",
        preview.total, preview.valid, preview.invalid
    );
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::workbook::{CellValue, Row};

    fn options() -> PreviewOptions {
        PreviewOptions::new(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap())
    }

    fn vehicle(plate: &str, make: &str) -> Row {
        let mut row = Row::new();
        row.insert("PLACA".to_string(), CellValue::from(plate));
        row.insert("MARCA".to_string(), CellValue::from(make));
        row
    }

    fn sheet(name: &str, rows: Vec<Row>) -> Sheet {
        Sheet {
            name: name.to_string(),
            headers: vec!["PLACA".to_string(), "MARCA".to_string()],
            rows,
        }
    }

    #[test]
    fn test_mapping_status() {
        let mut mapping = SheetMapping::new("Lima", Some("1".to_string()));
        assert_eq!(mapping.status(), MappingStatus::Ready);

        mapping.target_site_id = Some("  ".to_string());
        assert_eq!(mapping.status(), MappingStatus::Unmapped);

        mapping.ignored = true;
        assert_eq!(mapping.status(), MappingStatus::Ignored);
    }

    #[test]
    fn test_only_ready_sheets_count() {
        let sheets = vec![
            sheet("Lima", vec![vehicle("A1", "Toyota"), vehicle("A2", "Kia")]),
            sheet("Random Sheet 7", vec![vehicle("B1", "Hyundai")]),
            sheet("Ica", vec![vehicle("C1", "Nissan")]),
            sheet("No mapping", vec![vehicle("D1", "Volvo")]),
        ];
        let mut ica = SheetMapping::new("Ica", Some("2".to_string()));
        ica.ignored = true;
        let mappings = vec![
            SheetMapping::new("Lima", Some("1".to_string())),
            SheetMapping::new("Random Sheet 7", None),
            ica,
        ];

        let preview = compute_preview(&sheets, &mappings, &options());

        assert_eq!(preview.total, 2);
        assert_eq!(preview.valid, 2);
        assert_eq!(preview.invalid, 0);
        assert!(preview.records.iter().all(|r| r.site_id == "1"));
        assert!(preview.can_commit());
    }

    #[test]
    fn test_errors_are_deduplicated_and_capped() {
        let sheets: Vec<Sheet> = (0..7)
            .map(|i| sheet(&format!("Hoja {}", i), vec![vehicle("X", ""), vehicle("", "Kia")]))
            .collect();
        let mappings: Vec<SheetMapping> = sheets
            .iter()
            .map(|s| SheetMapping::new(s.name.clone(), Some("1".to_string())))
            .collect();

        let preview = compute_preview(&sheets, &mappings, &options());

        assert_eq!(preview.total, 14);
        assert_eq!(preview.invalid, 14);
        assert_eq!(preview.errors.len(), DEFAULT_MAX_ERRORS);
        assert!(preview.errors[0].contains("Hoja 0"));
        assert!(!preview.can_commit());

        let capped = compute_preview(&sheets, &mappings, &options().with_max_errors(2));
        assert_eq!(capped.errors.len(), 2);
    }

    #[test]
    fn test_preview_is_idempotent() {
        let sheets = vec![sheet("Lima", vec![vehicle("A1", "Toyota"), vehicle("A2", "")])];
        let mappings = vec![SheetMapping::new("Lima", Some("1".to_string()))];

        let first = compute_preview(&sheets, &mappings, &options());
        let second = compute_preview(&sheets, &mappings, &options());
        assert_eq!(first, second);
    }
}
