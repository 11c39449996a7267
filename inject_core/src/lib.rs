//! `inject_core` rewrites tagged regions of template documents with
//! references to other files. A document declares injection points with
//! paired comment tags:
//!
//! ```html
//! <!-- inject:css -->
//! <!-- endinject -->
//! ```
//!
//! Every source file resolves a start and end tag for the target, files
//! sharing a tag pair form a group, and each group's rendered fragments
//! replace the content between its tags.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source files + target document
//!   -> Tag resolver (per source: start/end template for target and source type)
//!   -> Grouping (sources with identical resolved tags share one group)
//!   -> Region matcher (whitespace tolerant, case-insensitive tag patterns)
//!   -> Fragment renderer (per-target table, closure or minijinja template)
//!   -> Engine (splices fragments joined by the region indentation)
//! ```
//!
//! ## Modules
//!
//! - [`config`] loads `inject.toml` and turns each `[[inject]]` entry into
//!   [`InjectOptions`].
//! - [`project`] discovers targets and sources with glob patterns and runs
//!   every configured injection over a directory tree.
//! - [`transform`] holds the built-in fragment tables.
//!
//! ## Quick Start
//!
//! ```rust
//! use inject_core::InjectOptions;
//! use inject_core::SourceFile;
//! use inject_core::TargetDocument;
//! use inject_core::inject;
//!
//! let target = TargetDocument::new(
//! 	"/app",
//! 	"index.html",
//! 	"<head>\n  <!-- inject:css -->\n  <!-- endinject -->\n</head>",
//! );
//! let sources = vec![SourceFile::new("/app", "styles/site.css")];
//!
//! let outcome = inject(&target, &sources, &InjectOptions::default()).unwrap();
//! assert!(outcome.contents.contains("<link rel=\"stylesheet\" href=\"/styles/site.css\">"));
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use filepath::*;
pub use matcher::*;
pub use project::*;
pub use source::*;
pub use tags::*;
pub use transform::*;

pub mod config;
mod engine;
#[allow(unused_assignments)]
mod error;
mod filepath;
mod matcher;
pub mod project;
mod source;
mod tags;
pub mod transform;

#[cfg(test)]
mod __fixtures;
