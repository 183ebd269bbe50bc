use anyhow::{Result, anyhow, bail};
use log::{debug, info};

use super::preview::{MappingStatus, Preview, PreviewOptions, SheetMapping, compute_preview};
use super::site_matcher::{Site, SiteMatcher};
use super::workbook::Sheet;

/// Loaded workbook plus the operator's sheet-to-site mapping.
///
/// Every mutation is followed by an explicit `preview()` call; nothing is cached.
#[derive(Debug, Clone)]
pub struct ImportSession {
    sheets: Vec<Sheet>,
    sites: Vec<Site>,
    mappings: Vec<SheetMapping>,
}

impl ImportSession {
    /// Start a session with every sheet mapped to the matcher's best guess
    pub fn new(sheets: Vec<Sheet>, sites: Vec<Site>, matcher: &SiteMatcher) -> Self {
        let mappings: Vec<SheetMapping> = sheets
            .iter()
            .map(|sheet| SheetMapping::new(sheet.name.clone(), matcher.match_site(&sheet.name, &sites)))
            .collect();

        let matched = mappings.iter().filter(|m| m.target().is_some()).count();
        info!("Auto-mapped {}/{} sheet(s)", matched, mappings.len());

        Self {
            sheets,
            sites,
            mappings,
        }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn mappings(&self) -> &[SheetMapping] {
        &self.mappings
    }

    pub fn mapping(&self, sheet_name: &str) -> Option<&SheetMapping> {
        self.mappings.iter().find(|m| m.sheet_name == sheet_name)
    }

    pub fn site_name(&self, site_id: &str) -> Option<&str> {
        self.sites
            .iter()
            .find(|site| site.id == site_id)
            .map(|site| site.name.as_str())
    }

    pub fn row_count(&self, sheet_name: &str) -> usize {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == sheet_name)
            .map(Sheet::row_count)
            .unwrap_or(0)
    }

    /// Point a sheet at a registered site, or clear its target with `None`
    pub fn set_target(&mut self, sheet_name: &str, site_id: Option<&str>) -> Result<()> {
        if let Some(id) = site_id {
            if !self.sites.iter().any(|site| site.id == id) {
                bail!("Unknown site id '{}'", id);
            }
        }

        let mapping = self.mapping_mut(sheet_name)?;
        mapping.target_site_id = site_id.map(str::to_string);
        debug!("Sheet '{}' target set to {:?}", sheet_name, site_id);
        Ok(())
    }

    pub fn set_ignored(&mut self, sheet_name: &str, ignored: bool) -> Result<()> {
        self.mapping_mut(sheet_name)?.ignored = ignored;
        debug!("Sheet '{}' ignored = {}", sheet_name, ignored);
        Ok(())
    }

    /// Flip the ignore flag and return the new value
    pub fn toggle_ignored(&mut self, sheet_name: &str) -> Result<bool> {
        let mapping = self.mapping_mut(sheet_name)?;
        mapping.ignored = !mapping.ignored;
        Ok(mapping.ignored)
    }

    pub fn unmapped_sheets(&self) -> Vec<&str> {
        self.mappings
            .iter()
            .filter(|m| m.status() == MappingStatus::Unmapped)
            .map(|m| m.sheet_name.as_str())
            .collect()
    }

    pub fn preview(&self, options: &PreviewOptions) -> Preview {
        compute_preview(&self.sheets, &self.mappings, options)
    }

    fn mapping_mut(&mut self, sheet_name: &str) -> Result<&mut SheetMapping> {
        self.mappings
            .iter_mut()
            .find(|m| m.sheet_name == sheet_name)
            .ok_or_else(|| anyhow!("Sheet '{}' not found in workbook", sheet_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::workbook::{CellValue, Row};
    use chrono::NaiveDate;

    fn options() -> PreviewOptions {
        PreviewOptions::new(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap())
    }

    fn sheet(name: &str, plates: &[&str]) -> Sheet {
        let rows = plates
            .iter()
            .map(|plate| {
                let mut row = Row::new();
                row.insert("PLACA".to_string(), CellValue::from(*plate));
                row.insert("MARCA".to_string(), CellValue::from("Toyota"));
                row
            })
            .collect();
        Sheet {
            name: name.to_string(),
            headers: vec!["PLACA".to_string(), "MARCA".to_string()],
            rows,
        }
    }

    fn session() -> ImportSession {
        ImportSession::new(
            vec![sheet("SCP ICA", &["A1", "A2"]), sheet("Random Sheet 7", &["B1"])],
            vec![
                Site::new("1", "Sede Central Lima"),
                Site::new("2", "San Cristobal del Peru Ica"),
            ],
            &SiteMatcher::new(),
        )
    }

    #[test]
    fn test_initial_guess() {
        let session = session();
        assert_eq!(session.mapping("SCP ICA").unwrap().target(), Some("2"));
        assert_eq!(session.mapping("Random Sheet 7").unwrap().target(), None);
        assert_eq!(session.unmapped_sheets(), vec!["Random Sheet 7"]);
        assert_eq!(session.preview(&options()).total, 2);
    }

    #[test]
    fn test_assigning_a_site_brings_rows_in() {
        let mut session = session();
        session.set_target("Random Sheet 7", Some("1")).unwrap();

        let preview = session.preview(&options());
        assert_eq!(preview.total, 3);
        assert_eq!(preview.valid, 3);
        assert_eq!(session.site_name("1"), Some("Sede Central Lima"));
    }

    #[test]
    fn test_ignore_toggle() {
        let mut session = session();
        assert!(session.toggle_ignored("SCP ICA").unwrap());
        assert_eq!(session.preview(&options()), Preview::default());

        assert!(!session.toggle_ignored("SCP ICA").unwrap());
        assert_eq!(session.preview(&options()).valid, 2);
    }

    #[test]
    fn test_rejects_unknown_sheet_or_site() {
        let mut session = session();
        assert!(session.set_target("Nope", Some("1")).is_err());
        assert!(session.set_target("SCP ICA", Some("99")).is_err());
        assert!(session.set_ignored("Nope", true).is_err());
        // failed update leaves the mapping untouched
        assert_eq!(session.mapping("SCP ICA").unwrap().target(), Some("2"));
    }

    #[test]
    fn test_clearing_target_excludes_sheet() {
        let mut session = session();
        session.set_target("SCP ICA", None).unwrap();
        assert_eq!(session.preview(&options()).total, 0);
        assert_eq!(session.row_count("SCP ICA"), 2);
    }
}
