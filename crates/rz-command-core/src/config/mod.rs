mod settings;
mod validation;

pub use settings::{CommandConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_RENDER, DEFAULT_QUERY_PARAM};
pub use validation::{warn_unknown_attributes, warn_unknown_fields};
