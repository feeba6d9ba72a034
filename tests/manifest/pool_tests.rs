// Tests for the concurrent batch hasher

use yamanifest::hash::{parallel_map, ConcurrentHasher, HashJob};
use yamanifest::HashKind;

use super::{scratch, write_file};

#[test]
fn test_run_batch_keys_by_logical_path() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "hello.txt", b"hello world");

    let jobs = vec![
        HashJob::new("hello", file.as_str(), HashKind::Md5),
        HashJob::new("hello", file.as_str(), HashKind::Sha256),
    ];
    let results = ConcurrentHasher::new().run_batch(&jobs);

    assert_eq!(results.len(), 2);
    assert_eq!(
        results.value("hello", &HashKind::Md5),
        Some("5eb63bbbe01eeed093cb22bb8f5acdc3")
    );
    assert!(results.contains("hello", &HashKind::Sha256));
    assert!(!results.contains("hello", &HashKind::Sha1));
    assert_eq!(results.get("hello", &HashKind::Sha1), None);
}

#[test]
fn test_failed_job_does_not_affect_siblings() {
    let (_dir, root) = scratch();
    let good = write_file(&root, "good.txt", b"hello world");
    let missing = root.join("missing.txt");

    let jobs = vec![
        HashJob::new("good", good.as_str(), HashKind::Md5),
        HashJob::new("missing", missing.clone(), HashKind::Md5),
        HashJob::new("good", good.as_str(), HashKind::from("nosuch")),
    ];
    let results = ConcurrentHasher::new().with_workers(2).run_batch(&jobs);

    assert_eq!(results.len(), 3);
    assert!(results.value("good", &HashKind::Md5).is_some());
    assert_eq!(results.get("missing", &HashKind::Md5), Some(None));
    assert_eq!(results.get("good", &HashKind::from("nosuch")), Some(None));
}

#[test]
fn test_worker_counts_agree() {
    let (_dir, root) = scratch();
    let jobs: Vec<HashJob> = (0..20)
        .map(|i| {
            let file = write_file(&root, &format!("f{}.bin", i), format!("content {}", i).as_bytes());
            HashJob::new(format!("f{}", i), file, HashKind::Sha1)
        })
        .collect();

    let single = ConcurrentHasher::new().with_workers(1).run_batch(&jobs);
    let many = ConcurrentHasher::new().with_workers(8).run_batch(&jobs);

    assert_eq!(single.len(), 20);
    for i in 0..20 {
        let path = format!("f{}", i);
        assert!(single.value(&path, &HashKind::Sha1).is_some());
        assert_eq!(
            single.value(&path, &HashKind::Sha1),
            many.value(&path, &HashKind::Sha1)
        );
    }
}

#[test]
fn test_duplicate_jobs_collapse() {
    let (_dir, root) = scratch();
    let file = write_file(&root, "dup.txt", b"dup");

    let jobs = vec![
        HashJob::new("dup", file.as_str(), HashKind::Md5),
        HashJob::new("dup", file.as_str(), HashKind::Md5),
    ];
    let results = ConcurrentHasher::new().run_batch(&jobs);
    assert_eq!(results.len(), 1);
}

#[test]
fn test_empty_batch() {
    let results = ConcurrentHasher::new().run_batch(&[]);
    assert!(results.is_empty());
}

#[test]
fn test_zero_workers_is_clamped() {
    assert_eq!(ConcurrentHasher::new().with_workers(0).workers(), 1);
    assert!(ConcurrentHasher::new().workers() >= 1);
}

#[test]
fn test_parallel_map_collects_every_job() {
    let jobs: Vec<u64> = (0..100).collect();
    let table = parallel_map(4, &jobs, |n| (*n, n * n));

    assert_eq!(table.len(), 100);
    assert_eq!(table[&9], 81);
}
