#![no_main]

//! Fuzz target for option validation and directory filtering
//!
//! Arbitrary command-line values and changed-file lists must never panic,
//! and a filter without a target directory must keep commits with no files.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use refspan::config::Config;

#[derive(Debug, Arbitrary)]
struct Input {
    repository: Option<String>,
    from: Option<String>,
    to: Option<String>,
    target_dir: Option<String>,
    exclude: Vec<String>,
    batch_size: Option<usize>,
    max_commits: Option<usize>,
    files: Vec<String>,
}

fuzz_target!(|input: Input| {
    let config = Config {
        repository: input.repository,
        from: input.from,
        to: input.to,
        target_dir: input.target_dir,
        exclude: input.exclude,
        batch_size: input.batch_size,
        max_commits: input.max_commits,
        ..Default::default()
    };

    let Ok(options) = config.to_options() else {
        return;
    };
    assert!(options.batch_size > 0);
    assert!(options.coordinate().is_ok());

    let criteria = options.filter_criteria();
    let _ = criteria.include(&input.files);
    if !criteria.requires_target() {
        assert!(criteria.include::<String>(&[]));
    }
});
