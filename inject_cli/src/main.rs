use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use inject_cli::Commands;
use inject_cli::InjectCli;
use inject_cli::OutputFormat;
use inject_core::CONFIG_FILE_CANDIDATES;
use inject_core::InjectConfig;
use inject_core::InjectError;
use inject_core::ProjectUpdate;
use inject_core::TargetReport;
use inject_core::check_project;
use inject_core::list_project;
use inject_core::run_project;
use inject_core::write_updates;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

const SAMPLE_CONFIG: &str = "# inject configuration\n#\n# Each [[inject]] entry injects the files \
                             matched by `sources` into the\n# regions of every file matched by \
                             `targets`. Patterns starting with `!` exclude.\n\n# name = \
                             \"inject\"\n# relative = false\n# ignore_path = \"dist\"\n# \
                             add_suffix = \"?v=1\"\n# empty = false\n\n[[inject]]\ntargets = \
                             [\"src/index.html\"]\nsources = [\"dist/**/*.css\", \
                             \"dist/**/*.js\"]\n";

fn main() {
	let args = InjectCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(&args, use_color);

	let result = match args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Update { dry_run, watch }) => run_update(&args, dry_run, watch),
		Some(Commands::Check { diff, format }) => run_check(&args, diff, format),
		Some(Commands::List) => run_list(&args),
		None => {
			eprintln!("No subcommand specified. Run `inject --help` for usage.");
			process::exit(2);
		}
	};

	if let Err(e) = result {
		print_error(e);
		process::exit(2);
	}
}

fn init_tracing(args: &InjectCli, use_color: bool) {
	let default_filter = if args.verbose { "debug" } else { "info" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.init();
}

fn print_error(e: Box<dyn std::error::Error>) {
	// Try to render through miette for rich diagnostics with help text and
	// error codes.
	match e.downcast::<InjectError>() {
		Ok(inject_err) => {
			let report: miette::Report = (*inject_err).into();
			eprintln!("{report:?}");
		}
		Err(e) => {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn resolve_root(args: &InjectCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_config(args: &InjectCli) -> Result<InjectConfig, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let Some(mut config) = InjectConfig::load(&root)? else {
		return Err(format!(
			"no inject.toml found in {}. Run `inject init` to create one.",
			root.display()
		)
		.into());
	};

	if args.quiet {
		config.quiet = true;
	}

	Ok(config)
}

fn run_init(args: &InjectCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);

	if let Some(existing) = InjectConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created {}", make_relative(&config_path, &root));
	println!();
	println!("Next steps:");
	println!("  1. Point `targets` and `sources` in inject.toml at your files");
	println!("  2. Add injection tags to your targets:");
	println!("     <!-- inject:js -->");
	println!("     <!-- endinject -->");
	println!("  3. Run `inject update` to fill them");

	Ok(())
}

fn run_update(args: &InjectCli, dry_run: bool, watch: bool) -> Result<(), Box<dyn std::error::Error>> {
	// Run the initial update.
	run_update_once(args, dry_run)?;

	if !watch || dry_run {
		return Ok(());
	}

	// Watch mode
	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let root = resolve_root(args);
	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_)
						| notify::EventKind::Create(_)
						| notify::EventKind::Remove(_)
				) {
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&root, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms. Our own writes
		// land in the same window.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, updating...");
		if let Err(e) = run_update_once(args, false) {
			print_error(e);
		}
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}
	}
}

fn run_update_once(args: &InjectCli, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
	let config = load_config(args)?;
	let root = resolve_root(args);
	let update = run_project(&root, &config)?;

	let mut paths: Vec<_> = update.updated_files.keys().collect();
	paths.sort();

	if paths.is_empty() {
		println!("All targets are already up to date.");
	} else if dry_run {
		println!("Dry run: would update {} target(s):", paths.len());
		for path in paths {
			println!("  {}", make_relative(path, &root));
		}
	} else {
		write_updates(&update)?;
		println!("Updated {} target(s)", paths.len());

		if args.verbose {
			for path in paths {
				println!("  {}", make_relative(path, &root));
			}
		}
	}

	fail_on_target_errors(&update)
}

fn fail_on_target_errors(update: &ProjectUpdate) -> Result<(), Box<dyn std::error::Error>> {
	let failures: Vec<(&TargetReport, &InjectError)> = update.failures().collect();
	if failures.is_empty() {
		return Ok(());
	}

	for (report, error) in &failures {
		eprintln!(
			"{} {}: {error}",
			colored!("error:", red),
			report.target.display()
		);
	}

	Err(format!("{} target(s) could not be injected", failures.len()).into())
}

fn run_check(
	args: &InjectCli,
	show_diff: bool,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let config = load_config(args)?;
	let root = resolve_root(args);
	let result = check_project(&root, &config)?;

	let errors: Vec<(&TargetReport, &InjectError)> = result
		.reports
		.iter()
		.filter_map(|report| report.outcome.as_ref().err().map(|error| (report, error)))
		.collect();

	match format {
		OutputFormat::Json => {
			let stale: Vec<serde_json::Value> = result
				.stale
				.iter()
				.map(|entry| {
					serde_json::json!({
						"target": make_relative(&entry.path, &root),
						"current": entry.current,
						"expected": entry.expected,
					})
				})
				.collect();
			let error_entries: Vec<serde_json::Value> = errors
				.iter()
				.map(|(report, error)| {
					serde_json::json!({
						"target": report.target.display().to_string(),
						"message": error.to_string(),
					})
				})
				.collect();
			let output = serde_json::json!({
				"ok": result.is_ok() && errors.is_empty(),
				"stale": stale,
				"errors": error_entries,
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			for (report, error) in &errors {
				eprintln!(
					"{} {}: {error}",
					colored!("error:", red),
					report.target.display()
				);
			}

			if result.is_ok() {
				println!("All targets are up to date.");
			} else {
				eprintln!("Check failed.");
				eprintln!();
				eprintln!("Stale targets:");
				for entry in &result.stale {
					eprintln!("  {}", make_relative(&entry.path, &root));
					if show_diff {
						print_diff(&entry.current, &entry.expected);
					}
				}
				eprintln!();
				eprintln!(
					"{} target(s) are out of date. Run `inject update` to fix.",
					result.stale.len()
				);
			}
		}
	}

	if !errors.is_empty() {
		process::exit(2);
	}
	if !result.is_ok() {
		process::exit(1);
	}

	Ok(())
}

fn run_list(args: &InjectCli) -> Result<(), Box<dyn std::error::Error>> {
	let config = load_config(args)?;
	let root = resolve_root(args);
	let listed = list_project(&root, &config)?;

	if listed.is_empty() {
		println!("No targets matched.");
		return Ok(());
	}

	let mut total = 0;
	for entry in &listed {
		println!(
			"{} [inject #{}]",
			colored!(entry.target.display().to_string(), bold),
			entry.entry + 1
		);
		if entry.points.is_empty() {
			println!("  (no injection points)");
		}
		for point in &entry.points {
			println!("  {}: {}", point.line, point.tag);
		}
		total += entry.points.len();
	}

	println!(
		"\n{total} injection point(s) in {} target(s)",
		listed.len()
	);

	Ok(())
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
