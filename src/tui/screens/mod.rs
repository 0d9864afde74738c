pub mod crud_view;
pub mod help;

pub use crud_view::{CrudView, ViewAction, ViewContext};
pub use help::HelpScreen;
