pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{clean_display_name, collapse_whitespace, safe_truncate_chars};
pub use url_utils::{host_of, is_valid_url, normalize_profile_url, resolve_link};
