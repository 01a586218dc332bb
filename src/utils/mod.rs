//! Shared utility functions.
//!
//! - `format`: human-readable sizes
//! - `mime`: content sniffing for downloaded bodies
//! - `sanitize`: file and directory names derived from titles, HTML stripping

mod format;
mod mime;
mod sanitize;

pub use format::format_size;
pub use mime::{describe_body, normalize_content_type};
pub use sanitize::{sanitize_dir_name, sanitize_title, strip_html_tags};
