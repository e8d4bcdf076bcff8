#![no_main]

//! Fuzz target for repository URL parsing

use libfuzzer_sys::fuzz_target;
use refspan_git::RepositoryCoordinate;

fuzz_target!(|url: &str| {
    if let Ok(coord) = RepositoryCoordinate::parse(url) {
        // A parsed coordinate must survive its own display form
        let again = RepositoryCoordinate::parse(&coord.to_string()).expect("re-parse");
        assert_eq!(coord, again);
    }
});
