//! Reusable widgets for the console TUI

pub mod data_table;
pub mod form_field;
pub mod status_display;

pub use data_table::DataTable;
pub use form_field::{FormField, FormFieldType};
pub use status_display::{StatusDisplay, StatusMessage, StatusType};
