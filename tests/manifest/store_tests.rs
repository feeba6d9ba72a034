// Tests for the manifest store
// add, get, find, delete and conflict handling

use indexmap::IndexMap;
use yamanifest::{
    AddOptions, ConflictPolicy, HashKind, Manifest, ManifestConfig, ManifestEntry, ManifestError,
    StoredHash,
};

use super::{scratch, write_file};

fn entry(fullpath: &str, hashes: &[(&str, &str)]) -> ManifestEntry {
    ManifestEntry {
        fullpath: fullpath.to_string(),
        hashes: hashes
            .iter()
            .map(|(k, v)| (HashKind::from(*k), v.to_string()))
            .collect::<IndexMap<_, _>>(),
    }
}

#[test]
fn test_default_kinds() {
    let manifest = Manifest::in_memory();
    let kinds: Vec<&HashKind> = manifest.default_kinds().iter().collect();
    assert_eq!(kinds, vec![&HashKind::Binhash, &HashKind::Md5]);
    assert_eq!(ManifestConfig::default().hashmax, None);
}

#[test]
fn test_add_records_default_kinds() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "hello.txt", b"hello world");

    let mut manifest = Manifest::in_memory();
    manifest.add(&[file.as_str()], &AddOptions::new()).unwrap();

    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.fullpath(&file), Some(file.as_str()));
    let entry = manifest.entry(&file).unwrap();
    let kinds: Vec<&HashKind> = entry.hashes.keys().collect();
    assert_eq!(kinds, vec![&HashKind::Binhash, &HashKind::Md5]);
    assert_eq!(
        manifest.get(&file, &HashKind::Md5),
        Some(StoredHash::Valid("5eb63bbbe01eeed093cb22bb8f5acdc3"))
    );
}

#[test]
fn test_add_with_named_kinds_extends_defaults() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "hello.txt", b"hello world");

    let mut manifest = Manifest::in_memory();
    manifest.add(&[file.as_str()], &AddOptions::new().kind("sha1")).unwrap();

    let entry = manifest.entry(&file).unwrap();
    assert_eq!(entry.hashes.len(), 1);
    assert!(entry.hashes.contains_key(&HashKind::Sha1));
    assert!(manifest.default_kinds().contains(&HashKind::Sha1));
    assert!(manifest.default_kinds().contains(&HashKind::Binhash));
}

#[test]
fn test_add_is_idempotent() {
    let (_dir, root) = scratch();
    let a = write_file(&root, "a.txt", b"alpha");
    let b = write_file(&root, "b.txt", b"beta");

    let mut manifest = Manifest::in_memory();
    manifest.add(&[a.as_str(), b.as_str()], &AddOptions::new()).unwrap();
    let first = manifest.to_yaml().unwrap();

    manifest.add(&[a.as_str(), b.as_str()], &AddOptions::new()).unwrap();
    assert_eq!(manifest.to_yaml().unwrap(), first);
}

#[test]
fn test_add_prunes_paths_without_hashes() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "hello.txt", b"hello world");
    let missing = root.join("missing.txt").to_string_lossy().into_owned();

    let mut manifest = Manifest::in_memory();
    manifest
        .add(&[file.as_str()], &AddOptions::new().kind("nosuch"))
        .unwrap();
    assert!(manifest.is_empty());

    manifest.add(&[missing.as_str()], &AddOptions::new()).unwrap();
    assert!(!manifest.contains(&missing));

    // Only the kinds that produced a value are recorded
    manifest
        .add(&[file.as_str()], &AddOptions::new().kinds(["nosuch", "md5"]))
        .unwrap();
    let entry = manifest.entry(&file).unwrap();
    assert_eq!(entry.hashes.len(), 1);
    assert!(entry.hashes.contains_key(&HashKind::Md5));
}

#[test]
fn test_add_shortcircuit_stops_at_first_value() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "hello.txt", b"hello world");

    let mut manifest = Manifest::in_memory();
    let options = AddOptions::new()
        .kinds(["nosuch", "md5", "sha256"])
        .shortcircuit(true);
    manifest.add(&[file.as_str()], &options).unwrap();

    let kinds: Vec<&HashKind> = manifest.entry(&file).unwrap().hashes.keys().collect();
    assert_eq!(kinds, vec![&HashKind::Md5]);
}

#[test]
fn test_add_with_explicit_fullpaths() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "test/file1", b"one");

    let mut manifest = Manifest::in_memory();
    manifest
        .add(&["file1"], &AddOptions::new().kind("md5").fullpaths([file.as_str()]))
        .unwrap();
    assert_eq!(manifest.fullpath("file1"), Some(file.as_str()));

    let err = manifest
        .add(&["file1", "file2"], &AddOptions::new().fullpaths([file.as_str()]))
        .unwrap_err();
    assert!(matches!(err, ManifestError::InvalidArguments { .. }));
}

#[test]
fn test_add_existing_hashes_every_recorded_path() {
    let (_dir, root) = scratch();
    let a = write_file(&root, "a.txt", b"alpha");
    let b = write_file(&root, "b.txt", b"beta");

    let mut manifest = Manifest::in_memory();
    manifest
        .add(&[a.as_str(), b.as_str()], &AddOptions::new().kind("md5"))
        .unwrap();
    manifest.add_existing(&AddOptions::new().kind("sha256")).unwrap();

    for path in [&a, &b] {
        let entry = manifest.entry(path).unwrap();
        assert!(entry.hashes.contains_key(&HashKind::Md5));
        assert!(entry.hashes.contains_key(&HashKind::Sha256));
    }
}

#[test]
fn test_changed_file_is_skipped_without_force() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "data.txt", b"original");

    let mut manifest = Manifest::in_memory();
    manifest.add(&[file.as_str()], &AddOptions::new().kind("md5")).unwrap();
    let recorded = manifest.entry(&file).unwrap().hashes[&HashKind::Md5].clone();

    write_file(&root, "data.txt", b"modified");
    manifest.add(&[file.as_str()], &AddOptions::new().kind("md5")).unwrap();
    assert_eq!(manifest.entry(&file).unwrap().hashes[&HashKind::Md5], recorded);

    manifest
        .add(&[file.as_str()], &AddOptions::new().kind("md5").force(true))
        .unwrap();
    assert_ne!(manifest.entry(&file).unwrap().hashes[&HashKind::Md5], recorded);
}

#[test]
fn test_strict_conflict_fails_without_mutation() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "data.txt", b"original");
    let other = write_file(&root, "other.txt", b"other");

    let mut manifest = Manifest::in_memory();
    manifest.add(&[file.as_str()], &AddOptions::new().kind("md5")).unwrap();
    let before = manifest.to_yaml().unwrap();

    write_file(&root, "data.txt", b"modified");
    let options = AddOptions::new().kind("md5").conflict(ConflictPolicy::Strict);
    let err = manifest
        .add(&[other.as_str(), file.as_str()], &options)
        .unwrap_err();

    match err {
        ManifestError::HashExists { path, kind } => {
            assert_eq!(path, file);
            assert_eq!(kind, "md5");
        }
        other => panic!("expected HashExists, got {:?}", other),
    }
    assert_eq!(manifest.to_yaml().unwrap(), before);
    assert!(!manifest.contains(&other));
}

#[test]
fn test_strict_conflict_accepts_unchanged_files() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "data.txt", b"stable");

    let mut manifest = Manifest::in_memory();
    let options = AddOptions::new().kind("md5").conflict(ConflictPolicy::Strict);
    manifest.add(&[file.as_str()], &options).unwrap();
    manifest.add(&[file.as_str()], &options).unwrap();
    assert_eq!(manifest.len(), 1);
}

#[test]
fn test_get_distinguishes_blank_and_absent() {
    let mut manifest = Manifest::in_memory();
    manifest.insert("file1", entry("/data/file1", &[("md5", "  "), ("sha1", "abc")]));

    assert_eq!(manifest.get("file1", &HashKind::Md5), Some(StoredHash::Blank));
    assert_eq!(manifest.get("file1", &HashKind::Sha1), Some(StoredHash::Valid("abc")));
    assert_eq!(manifest.get("file1", &HashKind::Sha256), None);
    assert_eq!(manifest.get("file2", &HashKind::Md5), None);
    assert_eq!(StoredHash::Blank.as_valid(), None);
}

#[test]
fn test_find_returns_first_in_manifest_order() {
    let mut manifest = Manifest::in_memory();
    manifest.insert("zeta", entry("/z", &[("md5", "same")]));
    manifest.insert("alpha", entry("/a", &[("md5", "same")]));
    manifest.insert("blank", entry("/b", &[("md5", "")]));

    assert_eq!(manifest.find(&HashKind::Md5, "same"), Some("zeta"));
    assert_eq!(manifest.find(&HashKind::Md5, "other"), None);
    assert_eq!(manifest.find(&HashKind::Sha1, "same"), None);
    assert_eq!(manifest.find(&HashKind::Md5, ""), None);
}

#[test]
fn test_insert_empty_entry_removes_path() {
    let mut manifest = Manifest::in_memory();
    manifest.insert("file1", entry("/f", &[("md5", "abc")]));
    assert!(manifest.contains("file1"));

    let previous = manifest.insert("file1", entry("/f", &[]));
    assert!(previous.is_some());
    assert!(!manifest.contains("file1"));
}

#[test]
fn test_delete() {
    let mut manifest = Manifest::in_memory();
    manifest.insert("file1", entry("/f1", &[("md5", "abc")]));
    manifest.insert("file2", entry("/f2", &[("md5", "def")]));

    let removed = manifest.delete("file1").unwrap();
    assert_eq!(removed.fullpath, "/f1");
    assert_eq!(manifest.paths().collect::<Vec<_>>(), vec!["file2"]);

    let err = manifest.delete("file1").unwrap_err();
    assert!(matches!(err, ManifestError::PathNotFound { .. }));
    assert_eq!(err.to_string(), "file1 does not exist in manifest");
}
