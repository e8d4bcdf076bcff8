#![no_main]

//! Fuzz target for commit message parsing
//!
//! The parser is total: any UTF-8 message must parse without panicking and
//! any classifier it reports must come from the vocabulary.

use libfuzzer_sys::fuzz_target;
use refspan_git::message::{CLASSIFIERS, parse_message};

fuzz_target!(|message: &str| {
    let info = parse_message(message);
    if let Some(kind) = info.classifier.as_deref() {
        assert!(CLASSIFIERS.contains(&kind));
    }
});
