// Tests for wildcard expansion and path helpers

use std::path::Path;

use yamanifest::manifest::path_utils::{clean_path, realpath, rekey};
use yamanifest::manifest::wildcard::{contains_wildcard, expand_inputs, expand_pattern, find_files};
use yamanifest::ManifestError;

use super::{scratch, write_file};

#[test]
fn test_contains_wildcard() {
    assert!(contains_wildcard("*.nc"));
    assert!(contains_wildcard("file?.bin"));
    assert!(contains_wildcard("file[12].bin"));
    assert!(!contains_wildcard("data/file.bin"));
}

#[test]
fn test_literal_pattern_is_kept() {
    let expanded = expand_pattern("does/not/exist.bin").unwrap();
    assert_eq!(expanded, vec!["does/not/exist.bin".to_string()]);
}

#[test]
fn test_expand_pattern_sorted() {
    let (_dir, root) = scratch();
    let b = write_file(&root, "b.nc", b"b");
    let a = write_file(&root, "a.nc", b"a");
    write_file(&root, "c.txt", b"c");

    let pattern = format!("{}/*.nc", root.display());
    assert_eq!(expand_pattern(&pattern).unwrap(), vec![a, b]);
}

#[test]
fn test_expand_pattern_without_matches() {
    let (_dir, root) = scratch();
    let pattern = format!("{}/*.none", root.display());
    assert!(matches!(
        expand_pattern(&pattern),
        Err(ManifestError::InvalidArguments { .. })
    ));
}

#[test]
fn test_expand_inputs_keeps_pattern_order() {
    let (_dir, root) = scratch();
    let z = write_file(&root, "z.bin", b"z");
    let a = write_file(&root, "a.nc", b"a");

    let inputs = vec![z.clone(), format!("{}/*.nc", root.display())];
    assert_eq!(expand_inputs(&inputs).unwrap(), vec![z, a]);
}

#[test]
fn test_find_files_recurses() {
    let (_dir, root) = scratch();
    write_file(&root, "top.yaml", b"");
    write_file(&root, "deep/er/inner.yml", b"");
    write_file(&root, "deep/skip.txt", b"");

    let found = find_files(&root, &["*.yml", "*.yaml"]);
    assert_eq!(
        found,
        vec![root.join("deep/er/inner.yml"), root.join("top.yaml")]
    );
}

#[test]
fn test_rekey() {
    assert_eq!(rekey("test/file1", Path::new(".")), "file1");
    assert_eq!(rekey("file1", Path::new("test")), "test/file1");
    assert_eq!(rekey("/abs/dir/file1", Path::new("other")), "other/file1");
}

#[test]
fn test_clean_path() {
    assert_eq!(clean_path(Path::new("a/./b/../c")), Path::new("a/c"));
    assert_eq!(clean_path(Path::new("./")), Path::new("."));
}

#[test]
fn test_realpath_resolves_existing_files() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "sub/file.bin", b"x");
    let indirect = format!("{}/sub/../sub/file.bin", root.display());

    assert_eq!(realpath(&indirect), file);
}
