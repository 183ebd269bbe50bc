//! Import command: read, map, preview, then commit in batches

use anyhow::{Context, Result, anyhow, bail};
use colored::*;
use is_terminal::IsTerminal;
use log::{info, warn};

use super::ImportCommands;
use crate::cli::commands::sites::resolve_sites;
use crate::config::Config;
use crate::import::{
    DocumentSummary, ImportSession, Preview, PreviewOptions, Site, commit_records,
    read_workbook_file,
};
use crate::store::RestStore;
use crate::ui::prompts::{self, ImportAction};
use crate::ui::report;

pub async fn handle_import_command(args: ImportCommands, config: &Config) -> Result<()> {
    println!("📄 Reading workbook: {}", args.file.display().to_string().cyan());
    let sheets = read_workbook_file(&args.file)?;
    if sheets.is_empty() {
        bail!("The workbook has no sheets with data");
    }

    let sites = resolve_sites(args.sites.as_deref(), config).await?;
    if sites.is_empty() {
        warn!("Site registry is empty; every sheet will be unmapped");
    }

    let mut session = ImportSession::new(sheets, sites, &config.matcher());
    apply_overrides(&mut session, &args.map, &args.ignore)?;

    let options = PreviewOptions::new(chrono::Local::now().date_naive())
        .with_max_errors(config.import.max_error_messages);
    let batch_size = args.batch_size.unwrap_or(config.import.batch_size);
    let interactive = !args.yes && std::io::stdin().is_terminal();

    loop {
        let preview = session.preview(&options);
        println!();
        report::print_mapping_table(&session);
        report::print_unmapped_sheets(&session);
        report::print_preview(&preview);
        report::print_document_summary(&DocumentSummary::compute(
            &preview.records,
            options.today,
            config.import.expiry_warning_days,
        ));
        println!();

        if args.dry_run && !interactive {
            println!("{}", "Dry run: nothing was written.".dimmed());
            return Ok(());
        }

        if !interactive {
            if !args.yes {
                println!("Not running in a terminal; re-run with --yes to commit.");
                return Ok(());
            }
            return commit(&preview, config, batch_size).await;
        }

        let can_commit = preview.can_commit() && !args.dry_run;
        match prompts::prompt_import_action(can_commit)? {
            ImportAction::Commit => {
                if prompts::prompt_commit_confirmation(preview.valid, &config.store.vehicles_table)? {
                    return commit(&preview, config, batch_size).await;
                }
            }
            ImportAction::ChangeSite => {
                if let Some(sheet) = prompts::prompt_sheet(&session)? {
                    if let Some(site_id) = prompts::prompt_site(&session, &sheet)? {
                        session.set_target(&sheet, site_id.as_deref())?;
                    }
                }
            }
            ImportAction::ToggleIgnore => {
                if let Some(sheet) = prompts::prompt_sheet(&session)? {
                    let ignored = session.toggle_ignored(&sheet)?;
                    info!("Sheet '{}' ignored: {}", sheet, ignored);
                }
            }
            ImportAction::Cancel => {
                println!("{}", "Import cancelled.".yellow());
                return Ok(());
            }
        }
    }
}

async fn commit(preview: &Preview, config: &Config, batch_size: usize) -> Result<()> {
    if !preview.can_commit() {
        bail!("Nothing to import: there are no valid records");
    }

    let store = RestStore::from_settings(&config.store)?;
    let table = &config.store.vehicles_table;
    println!(
        "🚀 Importing {} vehicle(s) into '{}'...",
        preview.valid,
        table.cyan()
    );

    match commit_records(&store, table, &preview.records, batch_size, |progress| {
        report::print_batch_progress(&progress)
    })
    .await
    {
        Ok(report) => {
            println!(
                "{} {} vehicle(s) imported in {} batch(es)",
                "✓".green(),
                report.records.to_string().bold(),
                report.batches
            );
            Ok(())
        }
        Err(e) => {
            if e.committed_records > 0 {
                println!(
                    "{}",
                    format!(
                        "Batch {} failed; {} record(s) from earlier batches were already saved.",
                        e.batch_index, e.committed_records
                    )
                    .yellow()
                );
            }
            Err(e.into())
        }
    }
}

/// Apply `--map SHEET=SITE` and `--ignore SHEET` on top of the automatic mapping
fn apply_overrides(session: &mut ImportSession, maps: &[String], ignores: &[String]) -> Result<()> {
    for assignment in maps {
        let (sheet, site) = parse_assignment(assignment)?;
        ensure_sheet(session, sheet)?;
        let site_id = resolve_site_id(session.sites(), site)?;
        session.set_target(sheet, Some(&site_id))?;
        info!("Sheet '{}' mapped to site {} from the command line", sheet, site_id);
    }

    for sheet in ignores {
        ensure_sheet(session, sheet)?;
        session.set_ignored(sheet, true)?;
    }
    Ok(())
}

fn parse_assignment(assignment: &str) -> Result<(&str, &str)> {
    let (sheet, site) = assignment
        .rsplit_once('=')
        .with_context(|| format!("Invalid mapping '{}': expected SHEET=SITE", assignment))?;
    let (sheet, site) = (sheet.trim(), site.trim());
    if sheet.is_empty() || site.is_empty() {
        bail!("Invalid mapping '{}': expected SHEET=SITE", assignment);
    }
    Ok((sheet, site))
}

fn ensure_sheet(session: &ImportSession, sheet: &str) -> Result<()> {
    if session.mapping(sheet).is_none() {
        let names: Vec<&str> = session.mappings().iter().map(|m| m.sheet_name.as_str()).collect();
        bail!("Sheet '{}' not found. Sheets: {}", sheet, names.join(", "));
    }
    Ok(())
}

/// Accept either a site id or a site name (case-insensitive)
fn resolve_site_id(sites: &[Site], site: &str) -> Result<String> {
    sites
        .iter()
        .find(|s| s.id == site)
        .or_else(|| sites.iter().find(|s| s.name.trim().eq_ignore_ascii_case(site)))
        .map(|s| s.id.clone())
        .ok_or_else(|| anyhow!("Unknown site '{}'", site))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{CellValue, MappingStatus, Sheet, SiteMatcher};
    use std::collections::HashMap;

    fn session() -> ImportSession {
        let sheet = |name: &str| Sheet {
            name: name.to_string(),
            headers: vec!["PLACA".to_string()],
            rows: vec![HashMap::from([(
                "PLACA".to_string(),
                CellValue::from("ABC-123"),
            )])],
        };
        ImportSession::new(
            vec![sheet("Random Sheet 7"), sheet("Resumen")],
            vec![Site::new("3", "Arequipa"), Site::new("4", "Ica")],
            &SiteMatcher::new(),
        )
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("Hoja 1 = 3").unwrap(), ("Hoja 1", "3"));
        assert_eq!(parse_assignment("a=b=4").unwrap(), ("a=b", "4"));
        assert!(parse_assignment("no separator").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn test_resolve_site_by_id_or_name() {
        let sites = vec![Site::new("3", "Arequipa")];
        assert_eq!(resolve_site_id(&sites, "3").unwrap(), "3");
        assert_eq!(resolve_site_id(&sites, "arequipa").unwrap(), "3");
        assert!(resolve_site_id(&sites, "Lima").is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut session = session();
        apply_overrides(
            &mut session,
            &["Random Sheet 7=Ica".to_string()],
            &["Resumen".to_string()],
        )
        .unwrap();

        assert_eq!(session.mapping("Random Sheet 7").unwrap().target(), Some("4"));
        assert_eq!(session.mapping("Resumen").unwrap().status(), MappingStatus::Ignored);
    }

    #[test]
    fn test_override_for_unknown_sheet_fails() {
        let mut session = session();
        assert!(apply_overrides(&mut session, &["Nope=3".to_string()], &[]).is_err());
        assert!(apply_overrides(&mut session, &[], &["Nope".to_string()]).is_err());
    }
}
