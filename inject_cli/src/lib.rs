use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Keep generated file references in sync with the files on disk.",
	long_about = "inject rewrites tagged regions of html, jsx, pug, slim, haml and stylesheet \
	              templates with references to the files matched by your `inject.toml` \
	              patterns.\n\nA target declares injection points with paired comment \
	              tags:\n\n  <!-- inject:js -->\n  <!-- endinject -->\n\nQuick start:\n  inject \
	              init    Create a sample inject.toml\n  inject update  Rewrite every \
	              target\n  inject check   Verify every target is up to date\n  inject list    \
	              Show the injection points of every target"
)]
pub struct InjectCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output, including debug logs.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Suppress the per-target injection reports.
	#[arg(long, short, global = true, default_value_t = false)]
	pub quiet: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize inject in a project by creating a sample `inject.toml`.
	///
	/// If a config file already exists in any supported location, this
	/// command is a no-op and exits successfully.
	Init,
	/// Rewrite every configured target.
	///
	/// Collects the source files of each `[[inject]]` entry, renders their
	/// fragments and replaces the content between matching tags in each
	/// target. Use `--dry-run` to preview which targets would change, or
	/// `--watch` to re-run whenever files change.
	Update {
		/// Print which targets would be modified without writing them.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Watch for file changes and re-run updates automatically.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Check that every target is up to date.
	///
	/// Exits with status 1 when any target would change. Ideal for CI
	/// pipelines.
	Check {
		/// Show a unified diff for each stale target.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Output format for check results.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List the injection points found in every configured target.
	List,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Each stale entry includes
	/// the target path, current content and expected content.
	Json,
}
