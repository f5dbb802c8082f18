//! Finding workflow documents on disk

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Where the CLI looks for workflows when none is given
pub const DEFAULT_WORKFLOW: &str = "./workflows/simple-example.json";

/// JSON files directly inside `dir`, sorted by name
pub fn workflow_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect()
}

/// Directory to list when `workflow` does not exist
pub fn search_dir(workflow: &Path) -> PathBuf {
    match workflow.parent() {
        Some(parent) if parent.is_dir() => parent.to_path_buf(),
        _ => PathBuf::from("./workflows"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_lists_json_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("login.json"), "{}").unwrap();
        fs::write(dir.path().join("checkout.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();
        fs::write(dir.path().join("nested.json/inner.json"), "{}").unwrap();

        let names: Vec<String> = workflow_files(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["checkout.json", "login.json"]);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        assert!(workflow_files(Path::new("/no/such/dir")).is_empty());
    }

    #[test]
    fn test_search_dir_prefers_existing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.json");
        assert_eq!(search_dir(&missing), dir.path());
        assert_eq!(
            search_dir(Path::new("/no/such/dir/flow.json")),
            PathBuf::from("./workflows")
        );
    }
}
