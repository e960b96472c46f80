//! Report rendering and Links Notation support.

pub mod generator;
pub mod lino;
pub mod validate;

pub use generator::{format_console_summary, generate_json_report, generate_markdown_report};
pub use lino::generate_lino_report;
pub use validate::error_context;
