use anyhow::Result;
use dialoguer::Select;

use crate::import::ImportSession;

/// Interactive confirmation prompt using arrow-key navigable selection
///
/// # Arguments
/// * `prompt` - The question to ask the user
/// * `default_yes` - Whether "Yes" should be the default selection (index 0)
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

pub fn prompt_commit_confirmation(records: usize, table: &str) -> Result<bool> {
    prompt_confirmation(
        &format!("Insert {} vehicle(s) into '{}'?", records, table),
        false,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    Commit,
    ChangeSite,
    ToggleIgnore,
    Cancel,
}

/// Main menu shown under the mapping table
pub fn prompt_import_action(can_commit: bool) -> Result<ImportAction> {
    let mut actions = Vec::new();
    if can_commit {
        actions.push((ImportAction::Commit, "Import valid records"));
    }
    actions.push((ImportAction::ChangeSite, "Change the site of a sheet"));
    actions.push((ImportAction::ToggleIgnore, "Ignore / include a sheet"));
    actions.push((ImportAction::Cancel, "Cancel"));

    let labels: Vec<&str> = actions.iter().map(|(_, label)| *label).collect();
    let selection = Select::new()
        .with_prompt("What next?")
        .items(&labels)
        .default(0)
        .interact_opt()?;

    Ok(selection
        .map(|idx| actions[idx].0)
        .unwrap_or(ImportAction::Cancel))
}

/// Pick one of the workbook's sheets; `None` when the operator backs out
pub fn prompt_sheet(session: &ImportSession) -> Result<Option<String>> {
    let labels: Vec<String> = session
        .mappings()
        .iter()
        .map(|mapping| {
            format!(
                "{} [{}] ({} rows)",
                mapping.sheet_name,
                mapping.status().badge(),
                session.row_count(&mapping.sheet_name)
            )
        })
        .collect();

    let selection = Select::new()
        .with_prompt("Sheet")
        .items(&labels)
        .default(0)
        .interact_opt()?;

    Ok(selection.map(|idx| session.mappings()[idx].sheet_name.clone()))
}

/// Pick a target site for `sheet_name`.
///
/// Returns `Some(None)` when the operator chooses to leave the sheet unmapped.
pub fn prompt_site(session: &ImportSession, sheet_name: &str) -> Result<Option<Option<String>>> {
    let current = session.mapping(sheet_name).and_then(|m| m.target());

    let mut labels: Vec<String> = session
        .sites()
        .iter()
        .map(|site| format!("{} (id {})", site.name, site.id))
        .collect();
    labels.push("(no site)".to_string());

    let default_index = current
        .and_then(|id| session.sites().iter().position(|site| site.id == id))
        .unwrap_or(labels.len() - 1);

    let selection = Select::new()
        .with_prompt(format!("Site for '{}'", sheet_name))
        .items(&labels)
        .default(default_index)
        .interact_opt()?;

    Ok(selection.map(|idx| session.sites().get(idx).map(|site| site.id.clone())))
}
