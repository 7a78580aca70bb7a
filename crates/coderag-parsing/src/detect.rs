//! Project-type detector (spec.md §4.1).
//!
//! Marker-file based classification: we collect every archetype whose
//! markers are present before deciding, then resolve ties by priority
//! order, falling back to `Mixed` / `Unknown`.

use std::path::Path;

/// One of the fixed set of project archetypes the indexer can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectType {
    DotNetCore,
    DotNetFramework,
    WebForms,
    Python,
    NodeJs,
    Angular,
    React,
    Vue,
    Java,
    SqlDatabase,
    Mixed,
    Unknown,
}

fn exists(root: &Path, relative: &str) -> bool {
    root.join(relative).exists()
}

fn read_to_string_lossy(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not read marker file, treating as absent");
            None
        }
    }
}

fn count_sql_files(root: &Path) -> usize {
    let mut count = 0usize;
    for entry in walk(root) {
        if entry
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
        {
            count += 1;
        }
    }
    count
}

/// Minimal recursive walk used only by the detector (the crawler has its
/// own, richer traversal via `ignore::WalkBuilder`). I/O errors during the
/// walk are logged and treated as "no more entries here", per §4.1.
fn walk(root: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "could not read directory during detection");
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out
}

/// Classify `root` into exactly one `ProjectType`.
#[must_use]
pub fn detect_project_type(root: &Path) -> ProjectType {
    let mut matches = Vec::new();

    if exists(root, "Properties") && exists(root, "Program.cs") {
        matches.push(ProjectType::DotNetCore);
    }
    if exists(root, "packages.config") || exists(root, "App.config") {
        matches.push(ProjectType::DotNetFramework);
    }
    if exists(root, "App_Code") || exists(root, "App_Data") || exists(root, "Web.config") {
        matches.push(ProjectType::WebForms);
    }
    if exists(root, "requirements.txt") || exists(root, "setup.py") || exists(root, "Pipfile") {
        matches.push(ProjectType::Python);
    }

    let package_json = root.join("package.json");
    let has_package_json = package_json.exists();
    let has_angular_json = exists(root, "angular.json");
    let has_vue_config = exists(root, "vue.config.js") || exists(root, "nuxt.config.js");

    if has_package_json && !has_angular_json && !has_vue_config {
        matches.push(ProjectType::NodeJs);
    }
    if has_angular_json {
        matches.push(ProjectType::Angular);
    }
    if has_package_json {
        if let Some(text) = read_to_string_lossy(&package_json)
            && (text.contains("react") || text.contains("react-dom"))
        {
            matches.push(ProjectType::React);
        }
    }
    if has_vue_config {
        matches.push(ProjectType::Vue);
    }
    if exists(root, "pom.xml") || exists(root, "build.gradle") {
        matches.push(ProjectType::Java);
    }
    if count_sql_files(root) > 5 || exists(root, "database.sql") || exists(root, "schema.sql") {
        matches.push(ProjectType::SqlDatabase);
    }

    resolve(&matches)
}

fn resolve(matches: &[ProjectType]) -> ProjectType {
    if matches.is_empty() {
        return ProjectType::Unknown;
    }
    if matches.len() == 1 {
        return matches[0];
    }
    for priority in [
        ProjectType::WebForms,
        ProjectType::DotNetCore,
        ProjectType::Angular,
        ProjectType::React,
    ] {
        if matches.contains(&priority) {
            return priority;
        }
    }
    ProjectType::Mixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tempdir_with(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("mkdir");
            }
            fs::write(path, content).expect("write");
        }
        dir
    }

    #[test]
    fn empty_dir_is_unknown() {
        let dir = TempDir::new().expect("tempdir");
        assert_eq!(detect_project_type(dir.path()), ProjectType::Unknown);
    }

    #[test]
    fn dotnet_core_requires_both_markers() {
        let dir = tempdir_with(&[("Program.cs", "")]);
        assert_eq!(detect_project_type(dir.path()), ProjectType::Unknown);

        let dir = tempdir_with(&[("Program.cs", ""), ("Properties/launchSettings.json", "{}")]);
        assert_eq!(detect_project_type(dir.path()), ProjectType::DotNetCore);
    }

    #[test]
    fn node_js_excludes_angular_and_vue() {
        let dir = tempdir_with(&[("package.json", "{}")]);
        assert_eq!(detect_project_type(dir.path()), ProjectType::NodeJs);

        let dir = tempdir_with(&[("package.json", "{}"), ("angular.json", "{}")]);
        assert_eq!(detect_project_type(dir.path()), ProjectType::Angular);

        let dir = tempdir_with(&[("package.json", "{}"), ("vue.config.js", "")]);
        assert_eq!(detect_project_type(dir.path()), ProjectType::Vue);
    }

    #[test]
    fn react_detected_from_package_json_contents() {
        let dir = tempdir_with(&[("package.json", r#"{"dependencies":{"react-dom":"18.0.0"}}"#)]);
        assert_eq!(detect_project_type(dir.path()), ProjectType::React);
    }

    #[test]
    fn priority_order_web_forms_beats_dotnet_core() {
        let dir = tempdir_with(&[
            ("Program.cs", ""),
            ("Properties/launchSettings.json", "{}"),
            ("Web.config", ""),
        ]);
        assert_eq!(detect_project_type(dir.path()), ProjectType::WebForms);
    }

    #[test]
    fn unrelated_markers_resolve_to_mixed() {
        let dir = tempdir_with(&[("requirements.txt", ""), ("pom.xml", "")]);
        assert_eq!(detect_project_type(dir.path()), ProjectType::Mixed);
    }

    #[test]
    fn sql_database_from_file_count() {
        let files: Vec<(&str, &str)> = (0..6)
            .map(|i| (Box::leak(format!("s{i}.sql").into_boxed_str()) as &str, ""))
            .collect();
        let dir = tempdir_with(&files);
        assert_eq!(detect_project_type(dir.path()), ProjectType::SqlDatabase);
    }

    #[test]
    fn sql_database_from_schema_marker() {
        let dir = tempdir_with(&[("schema.sql", "")]);
        assert_eq!(detect_project_type(dir.path()), ProjectType::SqlDatabase);
    }
}
