//! Data model - login methods, site preferences and settings

mod method;
mod preference;
mod settings;

pub use method::{LoginMethod, UnknownMethod};
pub use preference::{apply_login, HistoryEntry, SitePreference, HISTORY_LIMIT};
pub use settings::{AppSettings, HintPosition, SettingsError};
