//! Finding the concrete file for a certified-safe path.

use std::path::{Path, PathBuf};

/// Picks the file to serve for `candidate`.
///
/// A request path with a trailing slash is a directory request and goes
/// straight to the `index.html` fallback; otherwise the exact file wins and
/// `index.html` is the fallback for paths that exist only as directories.
/// Anything else is a miss. Directory contents are never listed and no other
/// fallback is tried.
///
/// The caller must have certified `candidate` against the serving root
/// already; this function only decides existence.
pub async fn locate(candidate: &Path, wants_dir: bool) -> Option<PathBuf> {
    if !wants_dir && is_file(candidate).await {
        return Some(candidate.to_path_buf());
    }

    let fallback = candidate.join("index.html");
    if is_file(&fallback).await {
        return Some(fallback);
    }

    None
}

async fn is_file(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.is_file(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html>root</html>").unwrap();
        fs::write(dir.path().join("test.txt"), "Hello World").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("subdir/index.html"), "<html>sub</html>").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        dir
    }

    #[tokio::test]
    async fn exact_file_wins() {
        let dir = site();
        let found = locate(&dir.path().join("test.txt"), false).await;
        assert_eq!(found, Some(dir.path().join("test.txt")));
    }

    #[tokio::test]
    async fn directory_request_falls_back_to_index() {
        let dir = site();
        let found = locate(&dir.path().join("subdir"), true).await;
        assert_eq!(found, Some(dir.path().join("subdir/index.html")));
    }

    #[tokio::test]
    async fn directory_without_slash_falls_back_too() {
        let dir = site();
        let found = locate(&dir.path().join("subdir"), false).await;
        assert_eq!(found, Some(dir.path().join("subdir/index.html")));
    }

    #[tokio::test]
    async fn root_resolves_to_index() {
        let dir = site();
        let found = locate(dir.path(), true).await;
        assert_eq!(found, Some(dir.path().join("index.html")));
    }

    #[tokio::test]
    async fn missing_file_is_none() {
        let dir = site();
        assert_eq!(locate(&dir.path().join("missing.txt"), false).await, None);
    }

    #[tokio::test]
    async fn directory_without_index_is_none() {
        let dir = site();
        assert_eq!(locate(&dir.path().join("empty"), false).await, None);
        assert_eq!(locate(&dir.path().join("empty"), true).await, None);
    }

    #[tokio::test]
    async fn file_with_trailing_slash_is_a_directory_request() {
        // "/test.txt/" asks for a directory named test.txt; the exact file
        // must not be served for it
        let dir = site();
        assert_eq!(locate(&dir.path().join("test.txt"), true).await, None);
    }
}
