mod form;

pub use form::{validate_original_url, validate_slug, FieldResult, FormField};
