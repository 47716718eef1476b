//! Output generation for the aggregated summary.
//!
//! # Submodules
//!
//! - [`json`]: Writes the `Summary` to a JSON file for other tools
//! - [`markdown`]: Renders the `Summary` as a readable ranking
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── summary.json
//!
//! markdown_output_dir/
//! └── summary.md
//! ```
//!
//! Both files are rewritten on every successful run; a failed run leaves the
//! previous ones untouched.

pub mod json;
pub mod markdown;
