pub mod json_loader;
pub mod toml_loader;

pub use json_loader::{load_grading_response, load_uploaded_essays};
pub use toml_loader::{load_all_overrides, load_override};
