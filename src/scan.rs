//! Input-folder enumeration.
//!
//! Recursive walk over the source folder, keeping files whose extension
//! matches the configured alternation (case-insensitive). Entries are
//! sorted by name per directory so the placement order is deterministic.

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::config::Patterns;
use crate::errors::EngineError;
use crate::resolve::SourceFile;

pub fn collect_files(root: &Path, patterns: &Patterns) -> Result<Vec<SourceFile>, EngineError> {
    if !root.is_dir() {
        return Err(EngineError::NoSourceFolder(root.display().to_string()));
    }
    let mut files = Vec::new();
    walk(root, root, patterns, &mut files)?;
    if files.is_empty() {
        return Err(EngineError::NoInputFiles);
    }
    Ok(files)
}

fn walk(
    dir: &Path,
    root: &Path,
    patterns: &Patterns,
    out: &mut Vec<SourceFile>,
) -> io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, root, patterns, out)?;
        } else {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if patterns.input_filter.is_match(&name) {
                out.push(SourceFile::new(path, root));
            } else {
                debug!(file = %name, "skipped: extension not in input formats");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use std::fs::File;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap();
    }

    #[test]
    fn collects_matching_files_recursively() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("01 cover.pdf"));
        touch(&root.join("@tmpl-A").join("02 body.JPG"));
        touch(&root.join("@tmpl-A").join("notes.txt"));
        touch(&root.join("misc").join("03 back.tiff"));

        let patterns = Settings::default().compile().unwrap();
        let files = collect_files(root, &patterns).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(names, vec!["01 cover.pdf", "02 body.JPG", "03 back.tiff"]);

        let body = files.iter().find(|f| f.display_name == "02 body.JPG").unwrap();
        assert_eq!(body.ancestors, vec!["@tmpl-A".to_string()]);
    }

    #[test]
    fn empty_folder_is_a_fatal_error() {
        let tmp = tempfile::tempdir().unwrap();
        let patterns = Settings::default().compile().unwrap();
        assert!(matches!(
            collect_files(tmp.path(), &patterns),
            Err(EngineError::NoInputFiles)
        ));
    }

    #[test]
    fn missing_folder_is_a_fatal_error() {
        let patterns = Settings::default().compile().unwrap();
        assert!(matches!(
            collect_files(Path::new("/nonexistent/input"), &patterns),
            Err(EngineError::NoSourceFolder(_))
        ));
    }
}
