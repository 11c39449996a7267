use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobMatcher;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::WalkBuilder;

use crate::InjectConfig;
use crate::InjectError;
use crate::InjectResult;
use crate::InjectionPoint;
use crate::SourceFile;
use crate::TargetDocument;
use crate::inject_all;
use crate::injection_points;
use crate::source::unixify;

/// A list of glob patterns where `!` prefixed entries exclude.
///
/// Positive patterns keep their order so that matched files can be ranked
/// by the first pattern they satisfy.
#[derive(Debug, Clone)]
pub struct PatternSet {
	includes: Vec<GlobMatcher>,
	excludes: GlobSet,
}

impl PatternSet {
	pub fn new(patterns: &[String]) -> InjectResult<Self> {
		let mut includes = Vec::new();
		let mut excludes = GlobSetBuilder::new();

		for pattern in patterns {
			let (negated, glob) = match pattern.strip_prefix('!') {
				Some(rest) => (true, rest),
				None => (false, pattern.as_str()),
			};
			let glob = Glob::new(glob.trim_start_matches("./")).map_err(|e| {
				InjectError::InvalidGlob {
					pattern: pattern.clone(),
					reason: e.to_string(),
				}
			})?;

			if negated {
				excludes.add(glob);
			} else {
				includes.push(glob.compile_matcher());
			}
		}

		let excludes = excludes.build().map_err(|e| {
			InjectError::InvalidGlob {
				pattern: patterns.join(", "),
				reason: e.to_string(),
			}
		})?;

		Ok(Self { includes, excludes })
	}

	/// Index of the first positive pattern matching `path`, or `None` when
	/// the path is excluded or unmatched.
	pub fn rank(&self, path: &Path) -> Option<usize> {
		if self.excludes.is_match(path) {
			return None;
		}
		self.includes.iter().position(|glob| glob.is_match(path))
	}

	/// Select matching paths ordered by pattern rank, then by path.
	pub fn select(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
		let mut ranked: Vec<(usize, &PathBuf)> = paths
			.iter()
			.filter_map(|path| self.rank(path).map(|rank| (rank, path)))
			.collect();
		ranked.sort();
		ranked.into_iter().map(|(_, path)| path.clone()).collect()
	}
}

/// Collect every file below `root` as a path relative to `root`, sorted.
///
/// Hidden entries are skipped. When `disable_gitignore` is false,
/// `.gitignore` rules are honoured even outside a git repository.
pub fn walk_files(root: &Path, disable_gitignore: bool) -> InjectResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let walker = WalkBuilder::new(root)
		.standard_filters(false)
		.hidden(true)
		.parents(false)
		.ignore(false)
		.git_ignore(!disable_gitignore)
		.git_exclude(!disable_gitignore)
		.require_git(false)
		.build();

	for entry in walker {
		let entry = entry.map_err(|e| InjectError::Walk(e.to_string()))?;
		if !entry.file_type().is_some_and(|kind| kind.is_file()) {
			continue;
		}

		if let Ok(relative) = entry.path().strip_prefix(root) {
			files.push(PathBuf::from(unixify(&relative.to_string_lossy()).as_ref()));
		}
	}

	files.sort();
	Ok(files)
}

/// The outcome of one `[[inject]]` entry on one target.
#[derive(Debug)]
pub struct TargetReport {
	/// Target path relative to the project root.
	pub target: PathBuf,
	/// Index of the `[[inject]]` entry.
	pub entry: usize,
	/// Files injected, or the error that aborted this target.
	pub outcome: InjectResult<usize>,
}

/// Result of running every configured injection over a project.
#[derive(Debug, Default)]
pub struct ProjectUpdate {
	/// Absolute paths of targets whose content changed, with the new content.
	pub updated_files: HashMap<PathBuf, String>,
	/// Files injected across all targets and entries.
	pub injected_count: usize,
	pub reports: Vec<TargetReport>,
}

impl ProjectUpdate {
	/// Reports of targets that failed.
	pub fn failures(&self) -> impl Iterator<Item = (&TargetReport, &InjectError)> {
		self.reports.iter().filter_map(|report| {
			match &report.outcome {
				Ok(_) => None,
				Err(error) => Some((report, error)),
			}
		})
	}

	pub fn has_failures(&self) -> bool {
		self.failures().next().is_some()
	}
}

/// Run every `[[inject]]` entry over the project at `root`.
///
/// All source sets are collected before any target is rewritten. Entries
/// run in order, so a later entry sees the output of an earlier one. A
/// failing target keeps its previous content and is recorded in
/// [`ProjectUpdate::reports`].
pub fn run_project(root: &Path, config: &InjectConfig) -> InjectResult<ProjectUpdate> {
	let files = walk_files(root, config.disable_gitignore)?;

	let mut source_sets = Vec::with_capacity(config.inject.len());
	for entry in &config.inject {
		let read = config.needs_contents(entry);
		let paths = PatternSet::new(&entry.sources)?.select(&files);
		tracing::debug!(sources = paths.len(), "collected sources");
		source_sets.push(
			paths
				.into_iter()
				.map(|path| load_source(root, path, read))
				.collect::<Vec<_>>(),
		);
	}

	let mut documents: HashMap<PathBuf, TargetDocument> = HashMap::new();
	let mut originals: HashMap<PathBuf, String> = HashMap::new();
	let mut update = ProjectUpdate::default();

	for (index, (entry, sources)) in config.inject.iter().zip(&source_sets).enumerate() {
		let options = config.options_for(entry)?;
		let target_paths = PatternSet::new(&entry.targets)?.select(&files);

		let mut targets = Vec::with_capacity(target_paths.len());
		for path in target_paths {
			let document = match documents.remove(&path) {
				Some(document) => document,
				None => {
					let contents = std::fs::read_to_string(root.join(&path))?;
					originals.insert(path.clone(), contents.clone());
					TargetDocument::new(root, path, contents)
				}
			};
			targets.push(document);
		}

		let outcomes = inject_all(&targets, sources, &options);
		for (mut document, outcome) in targets.into_iter().zip(outcomes) {
			let outcome = outcome.map(|outcome| {
				document.contents = outcome.contents;
				outcome.injected
			});
			if let Ok(injected) = &outcome {
				update.injected_count += injected;
			}
			update.reports.push(TargetReport {
				target: document.path.clone(),
				entry: index,
				outcome,
			});
			documents.insert(document.path.clone(), document);
		}
	}

	for (path, document) in documents {
		if originals.get(&path) != Some(&document.contents) {
			update
				.updated_files
				.insert(root.join(&path), document.contents);
		}
	}

	Ok(update)
}

fn load_source(root: &Path, path: PathBuf, read: bool) -> SourceFile {
	let mut source = SourceFile::new(root, path);
	if read {
		match std::fs::read_to_string(source.absolute_path()) {
			Ok(contents) => source = source.with_contents(contents),
			Err(error) => {
				tracing::warn!(path = %source.path.display(), %error, "could not read source contents");
			}
		}
	}
	source
}

/// A target whose content differs from what the injections produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleTarget {
	/// Absolute path of the target.
	pub path: PathBuf,
	pub current: String,
	pub expected: String,
}

/// Result of checking a project for stale targets.
#[derive(Debug, Default)]
pub struct CheckResult {
	pub stale: Vec<StaleTarget>,
	pub reports: Vec<TargetReport>,
}

impl CheckResult {
	/// Returns true if every target is up to date.
	pub fn is_ok(&self) -> bool {
		self.stale.is_empty()
	}
}

/// Report targets whose content would change, without writing anything.
pub fn check_project(root: &Path, config: &InjectConfig) -> InjectResult<CheckResult> {
	let update = run_project(root, config)?;
	let mut stale = Vec::with_capacity(update.updated_files.len());

	for (path, expected) in update.updated_files {
		let current = std::fs::read_to_string(&path)?;
		stale.push(StaleTarget {
			path,
			current,
			expected,
		});
	}
	stale.sort_by(|a, b| a.path.cmp(&b.path));

	Ok(CheckResult {
		stale,
		reports: update.reports,
	})
}

/// Write updated content back to disk.
pub fn write_updates(update: &ProjectUpdate) -> InjectResult<()> {
	for (path, content) in &update.updated_files {
		std::fs::write(path, content)?;
	}
	Ok(())
}

/// Injection points found in one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPoints {
	/// Target path relative to the project root.
	pub target: PathBuf,
	pub entry: usize,
	pub points: Vec<InjectionPoint>,
}

/// List the injection points of every configured target.
pub fn list_project(root: &Path, config: &InjectConfig) -> InjectResult<Vec<TargetPoints>> {
	let files = walk_files(root, config.disable_gitignore)?;
	let mut listed = Vec::new();

	for (index, entry) in config.inject.iter().enumerate() {
		let options = config.options_for(entry)?;
		for path in PatternSet::new(&entry.targets)?.select(&files) {
			let contents = std::fs::read_to_string(root.join(&path))?;
			let document = TargetDocument::new(root, path.clone(), contents);
			listed.push(TargetPoints {
				target: path,
				entry: index,
				points: injection_points(&document, &options)?,
			});
		}
	}

	Ok(listed)
}
