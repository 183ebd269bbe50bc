use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashSet;
use std::path::Path;

use super::normalizer::TEMPLATE_HEADERS;
use super::site_matcher::Site;

/// Sheet name used when no site is registered
pub const FALLBACK_SHEET_NAME: &str = "Vehiculos";

const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Write an import template with one sheet per site
pub fn write_template<P: AsRef<Path>>(sites: &[Site], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = build_template(sites)?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to write template {}", path.display()))?;
    info!("Wrote import template to {}", path.display());
    Ok(())
}

/// Same template as [`write_template`], kept in memory
pub fn template_bytes(sites: &[Site]) -> Result<Vec<u8>> {
    let mut workbook = build_template(sites)?;
    workbook
        .save_to_buffer()
        .context("Failed to build template workbook")
}

fn build_template(sites: &[Site]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for sheet_name in template_sheet_names(sites) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet_name)?;
        for (col, header) in TEMPLATE_HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        worksheet.set_column_width(0, 12)?;
    }

    Ok(workbook)
}

/// Excel-safe, unique sheet names in site order
pub fn template_sheet_names(sites: &[Site]) -> Vec<String> {
    let mut used = HashSet::new();
    let mut names = Vec::new();

    for site in sites {
        let base = sanitize_sheet_name(&site.name);
        let base = if base.is_empty() {
            format!("Sede {}", site.id)
        } else {
            base
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while !used.insert(candidate.to_uppercase()) {
            let tail = format!(" ({})", suffix);
            let keep = MAX_SHEET_NAME_LEN.saturating_sub(tail.chars().count());
            candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), tail);
            suffix += 1;
        }
        names.push(candidate);
    }

    if names.is_empty() {
        names.push(FALLBACK_SHEET_NAME.to_string());
    }
    names
}

fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '-' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');
    cleaned.chars().take(MAX_SHEET_NAME_LEN).collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_names_are_sanitized_and_unique() {
        let sites = vec![
            Site::new("1", "San Cristobal del Peru Ica / Planta Norte"),
            Site::new("2", "Lima"),
            Site::new("3", "LIMA"),
            Site::new("4", "  "),
        ];

        let names = template_sheet_names(&sites);
        assert_eq!(names[0], "San Cristobal del Peru Ica - Pl");
        assert_eq!(names[1], "Lima");
        assert_eq!(names[2], "LIMA (2)");
        assert_eq!(names[3], "Sede 4");
        assert!(names.iter().all(|n| n.chars().count() <= MAX_SHEET_NAME_LEN));
    }

    #[test]
    fn test_no_sites_gives_single_sheet() {
        assert_eq!(template_sheet_names(&[]), vec![FALLBACK_SHEET_NAME]);
    }
}
