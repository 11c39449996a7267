use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Deserialize;

use crate::InjectError;
use crate::InjectResult;
use crate::SourceFile;
use crate::TargetDocument;
use crate::filepath::PathOptions;
use crate::filepath::shape_filepath;
use crate::matcher::MatchRegion;
use crate::matcher::TagPair;
use crate::matcher::TagPattern;
use crate::matcher::next_region;
use crate::tags::DEFAULT_NAME;
use crate::tags::EXT_PLACEHOLDER;
use crate::tags::Placeholders;
use crate::tags::TagKind;
use crate::tags::TagOverride;
use crate::tags::tag_template;
use crate::transform::FragmentRequest;
use crate::transform::RenderOptions;
use crate::transform::Transform;

/// Orders the files of an injection group before rendering.
pub type SortFn = Arc<dyn Fn(&SourceFile, &SourceFile) -> Ordering + Send + Sync>;

/// What the injected-files count reported for a document measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum CountMode {
	/// Every file of a group counts once per matched region, including
	/// files whose transform produced no fragment.
	#[default]
	Files,
	/// Only rendered fragments count.
	Fragments,
}

/// Options for one injection pass.
#[derive(Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct InjectOptions {
	/// Substituted for `{{name}}` in tags.
	pub name: String,
	pub starttag: Option<TagOverride>,
	pub endtag: Option<TagOverride>,
	pub transform: Transform,
	/// Reorders the files within each group. Insertion order is kept when
	/// absent.
	pub sort: Option<SortFn>,
	pub paths: PathOptions,
	/// Drop the tags and keep only the injected fragments.
	pub remove_tags: bool,
	/// Clear regions that received no files in this pass.
	pub empty: bool,
	pub self_closing_tag: bool,
	/// Injection points have no end tag. `endtag` is ignored.
	pub single_tag: bool,
	/// Suppress the per-document report.
	pub quiet: bool,
	/// Fail the document when nothing was injected.
	pub throw_error_if_no_inject: bool,
	pub count: CountMode,
}

impl Default for InjectOptions {
	fn default() -> Self {
		Self {
			name: DEFAULT_NAME.to_string(),
			starttag: None,
			endtag: None,
			transform: Transform::Default,
			sort: None,
			paths: PathOptions::default(),
			remove_tags: false,
			empty: false,
			self_closing_tag: false,
			single_tag: false,
			quiet: false,
			throw_error_if_no_inject: false,
			count: CountMode::default(),
		}
	}
}

impl fmt::Debug for InjectOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InjectOptions")
			.field("name", &self.name)
			.field("starttag", &self.starttag)
			.field("endtag", &self.endtag)
			.field("transform", &self.transform)
			.field("sort", &self.sort.as_ref().map(|_| ".."))
			.field("paths", &self.paths)
			.field("remove_tags", &self.remove_tags)
			.field("empty", &self.empty)
			.field("self_closing_tag", &self.self_closing_tag)
			.field("single_tag", &self.single_tag)
			.field("quiet", &self.quiet)
			.field("throw_error_if_no_inject", &self.throw_error_if_no_inject)
			.field("count", &self.count)
			.finish()
	}
}

impl InjectOptions {
	/// Reject contradictory options before any document is touched.
	pub fn validate(&self) -> InjectResult<()> {
		if self.name.trim().is_empty() {
			return Err(InjectError::InvalidOption {
				option: "name".to_string(),
				reason: "the injection name must not be empty".to_string(),
			});
		}

		for (kind, custom) in [(TagKind::Start, &self.starttag), (TagKind::End, &self.endtag)] {
			if let Some(TagOverride::Literal(tag)) = custom {
				if tag.trim().is_empty() {
					return Err(InjectError::EmptyTag(kind.as_str()));
				}
			}
		}

		Ok(())
	}

	pub fn render_options(&self) -> RenderOptions {
		RenderOptions {
			self_closing_tag: self.self_closing_tag,
		}
	}
}

/// A source file prepared for one target.
#[derive(Debug, Clone)]
pub struct PreparedFile<'a> {
	pub source: &'a SourceFile,
	/// The shaped path handed to the renderer.
	pub filepath: String,
	pub ext: String,
}

/// Source files sharing one resolved tag pair.
#[derive(Debug, Clone)]
pub struct InjectionGroup<'a> {
	/// Resolved start tag text.
	pub start_tag: String,
	/// Resolved end tag text, absent in single tag mode.
	pub end_tag: Option<String>,
	pub pair: TagPair,
	pub files: Vec<PreparedFile<'a>>,
}

impl InjectionGroup<'_> {
	/// The grouping key: the resolved start and end tag text, lowercased
	/// since tags match case-insensitively.
	pub fn key(&self) -> String {
		group_key(&self.start_tag, self.end_tag.as_deref())
	}
}

fn group_key(start: &str, end: Option<&str>) -> String {
	match end {
		Some(end) => format!("{start}\u{0}{end}").to_lowercase(),
		None => start.to_lowercase(),
	}
}

/// Partition `sources` by their resolved tag pair for `target`.
///
/// Groups appear in the order their first file was seen. Within a group the
/// input order is kept unless `options.sort` is set.
pub fn group_sources<'a>(
	target: &TargetDocument,
	sources: &'a [SourceFile],
	options: &InjectOptions,
) -> InjectResult<Vec<InjectionGroup<'a>>> {
	let target_ext = target.ext();
	let mut groups: Vec<InjectionGroup<'a>> = Vec::new();
	let mut index_by_key: HashMap<String, usize> = HashMap::new();

	for source in sources {
		let ext = source.ext();
		let filepath = shape_filepath(source, target, &options.paths);
		let placeholders = Placeholders::new(options.name.as_str())
			.ext(ext.as_str())
			.path(filepath.as_str());

		let start_template =
			tag_template(TagKind::Start, &target_ext, &ext, options.starttag.as_ref());
		let end_template = (!options.single_tag)
			.then(|| tag_template(TagKind::End, &target_ext, &ext, options.endtag.as_ref()));

		let start_tag = placeholders.substitute(&start_template);
		let end_tag = end_template
			.as_deref()
			.map(|template| placeholders.substitute(template));
		let key = group_key(&start_tag, end_tag.as_deref());

		let file = PreparedFile {
			source,
			filepath,
			ext,
		};

		if let Some(&idx) = index_by_key.get(&key) {
			groups[idx].files.push(file);
			continue;
		}

		let start = TagPattern::compile(TagKind::Start, &start_template, &placeholders)?;
		let end = end_template
			.as_deref()
			.map(|template| TagPattern::compile(TagKind::End, template, &placeholders))
			.transpose()?;

		tracing::debug!(start = %start_tag, end = ?end_tag, "new injection group");
		index_by_key.insert(key, groups.len());
		groups.push(InjectionGroup {
			start_tag,
			end_tag,
			pair: TagPair::new(start, end),
			files: vec![file],
		});
	}

	if let Some(sort) = &options.sort {
		for group in &mut groups {
			group.files.sort_by(|a, b| sort(a.source, b.source));
		}
	}

	Ok(groups)
}

/// The text produced by an injection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
	pub contents: String,
	/// Files injected across all groups, measured by [`CountMode`].
	pub injected: usize,
	/// Number of regions that were rewritten, including emptied ones.
	pub regions: usize,
}

/// Splice the rendered fragments of every group into `text`.
///
/// Groups are processed one after another against the latest text, so
/// offsets are always found from the current document state.
pub fn inject_groups(
	text: &str,
	target: &TargetDocument,
	groups: &[InjectionGroup<'_>],
	options: &InjectOptions,
) -> InjectResult<Spliced> {
	let mut contents = text.to_string();
	let mut matched_starts: HashSet<String> = HashSet::new();
	let mut injected = 0;
	let mut regions = 0;

	for group in groups {
		let mut fragments: Option<Vec<String>> = None;
		let mut position = 0;

		while let Some(region) = next_region(&contents, &group.pair, position)? {
			tracing::debug!(tag = region.start_tag(&contents), offset = region.start.start, "matched region");
			matched_starts.insert(region.start_tag(&contents).to_string());

			if fragments.is_none() {
				fragments = Some(render_group(group, target, options)?);
			}
			let rendered = fragments.as_deref().unwrap_or_default();

			injected += match options.count {
				CountMode::Files => group.files.len(),
				CountMode::Fragments => rendered.len(),
			};
			regions += 1;

			let (next, replaced) = splice(&contents, &region, rendered, options.remove_tags);
			contents = replaced;
			position = next;
		}
	}

	if options.empty {
		let (cleared, count) = clear_unmatched(&contents, target, options, &matched_starts)?;
		contents = cleared;
		regions += count;
	}

	Ok(Spliced {
		contents,
		injected,
		regions,
	})
}

fn render_group(
	group: &InjectionGroup<'_>,
	target: &TargetDocument,
	options: &InjectOptions,
) -> InjectResult<Vec<String>> {
	let total = group.files.len();
	let render_options = options.render_options();
	let mut fragments = Vec::with_capacity(total);

	for (index, file) in group.files.iter().enumerate() {
		let request = FragmentRequest {
			filepath: &file.filepath,
			source: file.source,
			index,
			total,
			target,
		};

		if let Some(fragment) = options.transform.render(&request, render_options)? {
			fragments.push(fragment);
		}
	}

	Ok(fragments)
}

/// Replace `region` with its tags (unless removed) and the fragments joined
/// by the region's indentation. Returns the offset just after the
/// replacement together with the new text.
fn splice(
	text: &str,
	region: &MatchRegion,
	fragments: &[String],
	remove_tags: bool,
) -> (usize, String) {
	let indent = region.indent(text);
	let mut pieces: Vec<&str> = Vec::with_capacity(fragments.len() + 2);

	if !remove_tags {
		pieces.push(region.start_tag(text));
	}
	pieces.extend(fragments.iter().map(String::as_str));
	if !remove_tags {
		if let Some(end) = region.end_tag(text) {
			pieces.push(end);
		}
	}

	let replacement = pieces.join(indent.as_str());
	let span = region.span();

	let mut buf = String::with_capacity(text.len() - span.len() + replacement.len());
	buf.push_str(&text[..span.start]);
	buf.push_str(&replacement);
	let next = buf.len();
	buf.push_str(&text[span.end..]);

	(next, buf)
}

/// A tag pair matching every injection region of `target` regardless of
/// source extension or path.
pub fn wildcard_pair(target: &TargetDocument, options: &InjectOptions) -> InjectResult<TagPair> {
	let target_ext = target.ext();
	let placeholders = Placeholders::new(options.name.as_str()).any();

	let start_template = tag_template(
		TagKind::Start,
		&target_ext,
		EXT_PLACEHOLDER,
		options.starttag.as_ref(),
	);
	let start = TagPattern::compile(TagKind::Start, &start_template, &placeholders)?;
	let end = if options.single_tag {
		None
	} else {
		let end_template =
			tag_template(TagKind::End, &target_ext, EXT_PLACEHOLDER, options.endtag.as_ref());
		Some(TagPattern::compile(TagKind::End, &end_template, &placeholders)?)
	};

	Ok(TagPair::new(start, end))
}

/// Empty every region whose start tag text was not matched by a group.
fn clear_unmatched(
	text: &str,
	target: &TargetDocument,
	options: &InjectOptions,
	matched_starts: &HashSet<String>,
) -> InjectResult<(String, usize)> {
	let pair = wildcard_pair(target, options)?;

	let mut contents = text.to_string();
	let mut position = 0;
	let mut cleared = 0;

	while let Some(region) = next_region(&contents, &pair, position)? {
		if matched_starts.contains(region.start_tag(&contents)) {
			position = region.start.end;
			continue;
		}

		let (next, replaced) = splice(&contents, &region, &[], options.remove_tags);
		contents = replaced;
		position = next;
		cleared += 1;
	}

	Ok((contents, cleared))
}

/// A start tag found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
	/// One based line of the start tag.
	pub line: usize,
	/// Byte offset of the start tag.
	pub offset: usize,
	pub tag: String,
}

/// Every start tag in `target` that an injection with `options` could fill.
pub fn injection_points(
	target: &TargetDocument,
	options: &InjectOptions,
) -> InjectResult<Vec<InjectionPoint>> {
	let pair = wildcard_pair(target, options)?;
	let text = target.contents.as_str();
	let mut points = Vec::new();
	let mut position = 0;

	while let Some(start) = pair.start.find_at(text, position) {
		points.push(InjectionPoint {
			line: text[..start.start].matches('\n').count() + 1,
			offset: start.start,
			tag: text[start.clone()].to_string(),
		});
		position = start.end;
	}

	Ok(points)
}

/// The result of injecting into one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionOutcome {
	/// The rewritten document text.
	pub contents: String,
	/// Files injected, measured by [`CountMode`].
	pub injected: usize,
	/// Whether `contents` differs from the input document.
	pub changed: bool,
}

/// Inject `sources` into `target`, returning the rewritten text.
///
/// The target itself is never modified; on error the caller keeps the
/// original text.
pub fn inject(
	target: &TargetDocument,
	sources: &[SourceFile],
	options: &InjectOptions,
) -> InjectResult<InjectionOutcome> {
	options.validate()?;

	let groups = group_sources(target, sources, options)?;
	let spliced = inject_groups(&target.contents, target, &groups, options)?;
	report(target, spliced.injected, options)?;

	Ok(InjectionOutcome {
		changed: spliced.contents != target.contents,
		contents: spliced.contents,
		injected: spliced.injected,
	})
}

/// Inject the same buffered `sources` into every target in parallel. Each
/// document succeeds or fails on its own. Results keep the order of
/// `targets`.
pub fn inject_all(
	targets: &[TargetDocument],
	sources: &[SourceFile],
	options: &InjectOptions,
) -> Vec<InjectResult<InjectionOutcome>> {
	if targets.is_empty() {
		return Vec::new();
	}

	let workers = std::thread::available_parallelism()
		.map_or(1, NonZeroUsize::get)
		.min(targets.len());
	let chunk_size = targets.len().div_ceil(workers);

	std::thread::scope(|scope| {
		let handles: Vec<_> = targets
			.chunks(chunk_size)
			.map(|chunk| {
				scope.spawn(move || {
					chunk
						.iter()
						.map(|target| inject(target, sources, options))
						.collect::<Vec<_>>()
				})
			})
			.collect();

		handles
			.into_iter()
			.flat_map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
			.collect()
	})
}

fn report(target: &TargetDocument, count: usize, options: &InjectOptions) -> InjectResult<()> {
	if count == 0 && options.throw_error_if_no_inject {
		return Err(InjectError::NothingToInject {
			target: target.relative(),
		});
	}

	if options.quiet {
		return Ok(());
	}

	if count == 0 {
		tracing::info!("Nothing to inject into {}.", target.relative());
	} else {
		let plural = if count > 1 { "s" } else { "" };
		tracing::info!("{count} file{plural} into {}.", target.relative());
	}

	Ok(())
}
