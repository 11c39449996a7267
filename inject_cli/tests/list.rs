use inject_core::AnyEmptyResult;

mod common;

use common::CONFIG;
use common::INDEX;
use common::inject_cmd;
use common::write_files;

#[test]
fn list_shows_injection_points() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_files(tmp.path(), &[("inject.toml", CONFIG), ("src/index.html", INDEX)])?;

	inject_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("src/index.html [inject #1]"))
		.stdout(predicates::str::contains("  2: <!-- inject:css -->"))
		.stdout(predicates::str::contains("  6: <!-- inject:js -->"))
		.stdout(predicates::str::contains("2 injection point(s) in 1 target(s)"));

	Ok(())
}

#[test]
fn list_without_matching_targets() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_files(tmp.path(), &[("inject.toml", CONFIG)])?;

	inject_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No targets matched."));

	Ok(())
}
