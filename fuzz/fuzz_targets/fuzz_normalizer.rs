// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fuzz target for canonical <-> backend path translation

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sagfs_core::path::{base_name, PathNormalizer};

#[derive(Debug, Arbitrary)]
struct Input {
    root: String,
    path: String,
}

fuzz_target!(|input: Input| {
    let norm = PathNormalizer::new(&input.root);
    assert!(!norm.dataset_root().ends_with('/'));
    let _ = norm.root_backend_path();

    let backend = norm.to_backend_path(&input.path);
    let _ = norm.to_canonical_path(&input.path);
    let _ = base_name(&backend);

    // Absolute canonical paths outside the root survive the round trip
    if input.path.starts_with('/') && !input.path.starts_with(norm.dataset_root()) {
        assert_eq!(norm.to_canonical_path(&backend), input.path);
    }
});
