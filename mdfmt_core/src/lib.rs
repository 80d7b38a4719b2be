//! `mdfmt_core` is the library behind the [mdfmt](https://github.com/ifiokjr/mdfmt) markdown formatter. It parses CommonMark (with GitHub flavored extensions and front matter) into a syntax tree, renders the tree back into canonical markdown, and checks that the result renders to the same HTML as the input.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Path arguments
//!   → Targets (expand directories, skip excluded files, `-` for stdin)
//!   → Parser (markdown text → mdast tree)
//!   → Renderer (tree + options → markdown text)
//!   → Validation (HTML of input and output must match)
//!   → Write back, echo to stdout, or report as unformatted
//! ```
//!
//! ## Modules
//!
//! - [`config`]: loading `mdfmt.toml` with exclude patterns, validation and default renderer options.
//! - [`options`]: typed `-e key=value` renderer options.
//! - [`targets`]: turning path arguments into formatting targets.
//!
//! ## Key Types
//!
//! - [`Renderer`]: the seam between parsing and output. [`MdRenderer`] is the built-in implementation.
//! - [`FormatEngine`]: parses, renders and validates one target at a time.
//! - [`OptionSet`]: renderer options keyed by name.
//! - [`MdfmtConfig`]: configuration loaded from `mdfmt.toml`.
//!
//! ## Quick Start
//!
//! ```rust
//! use mdfmt_core::OptionSet;
//! use mdfmt_core::format_markdown;
//!
//! let formatted = format_markdown("Title\n=====\n\n* one\n* two\n", &OptionSet::new()).unwrap();
//! assert_eq!(formatted, "# Title\n\n- one\n- two\n");
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use escape::could_start_block;
pub use escape::escape_text;
pub use options::*;
pub use parser::*;
pub use renderer::*;
pub use targets::*;

pub mod config;
mod engine;
#[allow(unused_assignments)]
mod error;
mod escape;
mod inline;
pub mod options;
mod parser;
mod renderer;
pub mod targets;

#[cfg(test)]
mod __tests;
