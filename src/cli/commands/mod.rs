pub mod import;
pub mod settings;
pub mod sites;
pub mod template;

pub use import::{ImportCommands, handle_import_command};
pub use settings::{SettingsCommands, handle_settings_command};
pub use sites::{SitesCommands, handle_sites_command};
pub use template::{TemplateCommands, handle_template_command};
