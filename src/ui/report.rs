//! Terminal rendering of the mapping table, preview counters and document summary

use colored::*;

use crate::import::{
    BatchProgress, DocumentSummary, ImportSession, MappingStatus, Preview, Site,
};

pub fn print_mapping_table(session: &ImportSession) {
    let sheet_width = session
        .mappings()
        .iter()
        .map(|m| m.sheet_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Sheet".len());

    println!(
        "{:<width$}  {:>6}  {:<10}  {}",
        "Sheet".bold(),
        "Rows".bold(),
        "Status".bold(),
        "Target site".bold(),
        width = sheet_width
    );

    for mapping in session.mappings() {
        let status = mapping.status();
        let badge = match status {
            MappingStatus::Ready => status.badge().green(),
            MappingStatus::Unmapped => status.badge().yellow(),
            MappingStatus::Ignored => status.badge().dimmed(),
        };
        let target = match mapping.target() {
            Some(id) => session
                .site_name(id)
                .map(|name| format!("{} (id {})", name, id))
                .unwrap_or_else(|| format!("id {}", id)),
            None => "-".to_string(),
        };

        println!(
            "{:<width$}  {:>6}  {:<10}  {}",
            mapping.sheet_name,
            session.row_count(&mapping.sheet_name),
            badge,
            target,
            width = sheet_width
        );
    }
}

pub fn print_unmapped_sheets(session: &ImportSession) {
    let unmapped = session.unmapped_sheets();
    if unmapped.is_empty() {
        return;
    }
    println!();
    println!(
        "{} {}",
        "Sheets without a site (not imported):".yellow(),
        unmapped.join(", ")
    );
}

pub fn print_preview(preview: &Preview) {
    println!();
    println!(
        "Total: {}   Valid: {}   Invalid: {}",
        preview.total.to_string().bold(),
        preview.valid.to_string().green().bold(),
        if preview.invalid > 0 {
            preview.invalid.to_string().red().bold()
        } else {
            preview.invalid.to_string().bold()
        }
    );

    if !preview.errors.is_empty() {
        println!("{}", "Validation problems:".red());
        for message in &preview.errors {
            println!("  • {}", message);
        }
    }
}

pub fn print_document_summary(summary: &DocumentSummary) {
    if !summary.needs_attention() {
        return;
    }

    println!();
    println!("{}", "Documents needing attention:".yellow());
    for (kind, counts) in &summary.entries {
        if counts.expired == 0 && counts.expiring_soon == 0 {
            continue;
        }
        println!(
            "  • {}: {} expired, {} expiring soon",
            kind.label(),
            counts.expired.to_string().red(),
            counts.expiring_soon.to_string().yellow()
        );
    }
}

pub fn print_sites(sites: &[Site]) {
    if sites.is_empty() {
        println!("{}", "No sites registered.".yellow());
        return;
    }

    let id_width = sites
        .iter()
        .map(|site| site.id.chars().count())
        .max()
        .unwrap_or(0)
        .max("Id".len());

    println!("{:<width$}  {}", "Id".bold(), "Name".bold(), width = id_width);
    for site in sites {
        println!("{:<width$}  {}", site.id, site.name, width = id_width);
    }
}

pub fn print_batch_progress(progress: &BatchProgress) {
    println!(
        "  batch {}/{} committed ({}/{} records)",
        progress.batch, progress.total_batches, progress.committed_records, progress.total_records
    );
}
