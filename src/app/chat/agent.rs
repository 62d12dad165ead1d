pub mod actions;
pub mod json;

pub use actions::{ActionIntent, action_schema, dispatch};
pub use json::{ExtractedAction, extract_action, extract_json_object};
