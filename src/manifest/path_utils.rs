// Path utilities for logical and full manifest paths
// Resolves full paths and rekeys logical paths under a new directory

use std::env;
use std::path::{Component, Path, PathBuf};

/// Resolve a logical path to the absolute full path recorded beside it
///
/// Existing files are canonicalized so symlinks resolve; paths that do not
/// exist yet are made absolute against the current directory and cleaned.
pub fn realpath(path: &str) -> String {
    let path = Path::new(path);

    if let Ok(canonical) = path.canonicalize() {
        return canonical.to_string_lossy().into_owned();
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    clean_path(&absolute).to_string_lossy().into_owned()
}

/// Replace the directory part of a logical path with `newpath`, keeping the file name
///
/// `rekey("test/file1", ".")` is `"file1"`; `rekey("file1", "test")` is
/// `"test/file1"`.
pub fn rekey(logical: &str, newpath: &Path) -> String {
    let basename = Path::new(logical)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_default();
    clean_path(&newpath.join(basename)).to_string_lossy().into_owned()
}

/// Clean a path by removing redundant components like "." and ".."
/// This provides a normalized form without requiring the path to exist
pub fn clean_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // ".." at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    let result: PathBuf = components.iter().collect();

    // If the result is empty, return current directory
    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}
