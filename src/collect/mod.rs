//! Turns paths on disk into [`Document`]s
//!
//! Directories are walked with the `ignore` crate so `.gitignore` rules apply; hidden files are
//! included (dotenv files are prime scan targets) but `.git` itself is not. Files are read in
//! parallel with rayon.
//!
//! A file reachable from several roots (`.` and `src`, or a directory and a file inside it) is
//! collected once. Document paths are relative to the base directory, or to the parent of the
//! root they were found under when they lie outside it, and always use `/` separators; they
//! double as zip entry names.

use ignore::WalkBuilder;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::batch::Document;

/// Why a file was left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TooLarge { size: u64 },
    NotUtf8,
    Unreadable(String),
    Walk(String),
}

#[derive(Debug, Clone)]
pub struct Warning {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct CollectedDocuments {
    /// Sorted by path
    pub documents: Vec<Document>,
    pub warnings: Vec<Warning>,
}

enum FileRead {
    Document(Document),
    Skipped(Warning),
}

/// A walked file: where it lives on disk and the name it is uploaded under
struct Candidate {
    canonical: PathBuf,
    name: String,
}

/// Collect every readable UTF-8 file under `paths` that is at most `max_file_size` bytes,
/// naming documents relative to the current directory
pub fn collect_documents(paths: &[PathBuf], max_file_size: u64) -> CollectedDocuments {
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    collect_documents_relative_to(&base, paths, max_file_size)
}

/// Same as [`collect_documents`] with an explicit base directory for document names
pub fn collect_documents_relative_to(
    base: &Path,
    paths: &[PathBuf],
    max_file_size: u64,
) -> CollectedDocuments {
    let base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let mut warnings = Vec::new();
    let mut walked: Vec<(PathBuf, PathBuf)> = Vec::new(); // (root, file)

    for root in paths {
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file()) {
                        walked.push((root.clone(), entry.into_path()));
                    }
                }
                Err(e) => warnings.push(Warning {
                    path: root.clone(),
                    reason: SkipReason::Walk(e.to_string()),
                }),
            }
        }
    }

    let resolved: Vec<Result<Candidate, Warning>> = walked
        .par_iter()
        .map(|(root, file)| resolve(&base, root, file))
        .collect();

    // First root wins for files reachable from several roots
    let mut seen = HashSet::new();
    let mut candidates = Vec::with_capacity(resolved.len());
    for candidate in resolved {
        match candidate {
            Ok(candidate) => {
                if seen.insert(candidate.canonical.clone()) {
                    candidates.push(candidate);
                } else {
                    tracing::trace!("Already collected {}", candidate.canonical.display());
                }
            }
            Err(warning) => warnings.push(warning),
        }
    }
    candidates.sort_by(|a, b| a.name.cmp(&b.name));

    let reads: Vec<FileRead> = candidates
        .par_iter()
        .map(|candidate| read_document(candidate, max_file_size))
        .collect();

    let mut documents = Vec::with_capacity(reads.len());
    for read in reads {
        match read {
            FileRead::Document(document) => documents.push(document),
            FileRead::Skipped(warning) => {
                tracing::warn!("Skipping {}: {:?}", warning.path.display(), warning.reason);
                warnings.push(warning);
            }
        }
    }

    tracing::debug!(
        "Collected {} documents ({} skipped)",
        documents.len(),
        warnings.len()
    );
    CollectedDocuments {
        documents,
        warnings,
    }
}

fn resolve(base: &Path, root: &Path, file: &Path) -> Result<Candidate, Warning> {
    let canonical = file.canonicalize().map_err(|e| Warning {
        path: file.to_path_buf(),
        reason: SkipReason::Unreadable(e.to_string()),
    })?;

    let relative = match canonical.strip_prefix(base) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => {
            // Outside the base: keep the root's own name as the first component
            let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
            root.parent()
                .and_then(|parent| canonical.strip_prefix(parent).ok())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| canonical.clone())
        }
    };

    Ok(Candidate {
        name: document_name(&relative),
        canonical,
    })
}

/// `/`-joined normal components; prefixes, roots and `.` are dropped
fn document_name(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn read_document(candidate: &Candidate, max_file_size: u64) -> FileRead {
    let path = candidate.canonical.as_path();
    let skipped = |reason| {
        FileRead::Skipped(Warning {
            path: path.to_path_buf(),
            reason,
        })
    };

    match std::fs::metadata(path) {
        Ok(metadata) if metadata.len() > max_file_size => {
            return skipped(SkipReason::TooLarge {
                size: metadata.len(),
            });
        }
        Ok(_) => {}
        Err(e) => return skipped(SkipReason::Unreadable(e.to_string())),
    }

    match std::fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(content) => FileRead::Document(Document::new(candidate.name.clone(), content)),
            Err(_) => skipped(SkipReason::NotUtf8),
        },
        Err(e) => skipped(SkipReason::Unreadable(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchLimits, split_documents_into_batches};
    use crate::client::archive::InMemoryZip;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn names(collected: &CollectedDocuments) -> Vec<&str> {
        collected.documents.iter().map(|doc| doc.path()).collect()
    }

    #[test]
    fn test_collects_sorted_utf8_documents() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/b.rs"), "fn b() {}").unwrap();
        fs::write(root.join("a.txt"), "hello").unwrap();
        fs::write(root.join(".env"), "TOKEN=abc").unwrap();

        let collected = collect_documents_relative_to(root, &[root.to_path_buf()], 1024);

        assert_eq!(names(&collected), vec![".env", "a.txt", "src/b.rs"]);
        assert!(collected.warnings.is_empty());
    }

    #[test]
    fn test_skips_large_and_binary_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("big.txt"), "x".repeat(64)).unwrap();
        fs::write(root.join("blob.bin"), [0xff, 0xfe, 0x00, 0x81]).unwrap();
        fs::write(root.join("ok.txt"), "fine").unwrap();

        let collected = collect_documents_relative_to(root, &[root.to_path_buf()], 32);

        assert_eq!(names(&collected), vec!["ok.txt"]);

        let mut reasons: Vec<SkipReason> = collected
            .warnings
            .iter()
            .map(|warning| warning.reason.clone())
            .collect();
        reasons.sort_by_key(|reason| format!("{reason:?}"));
        assert_eq!(
            reasons,
            vec![SkipReason::NotUtf8, SkipReason::TooLarge { size: 64 }]
        );
    }

    #[test]
    fn test_single_file_path_and_git_dir_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/config"), "[core]").unwrap();
        fs::write(root.join("main.py"), "print(1)").unwrap();

        let whole_dir = collect_documents_relative_to(root, &[root.to_path_buf()], 1024);
        assert_eq!(names(&whole_dir), vec!["main.py"]);

        let single = collect_documents_relative_to(root, &[root.join("main.py")], 1024);
        assert_eq!(names(&single), vec!["main.py"]);
        assert_eq!(single.documents[0].content(), "print(1)");
    }

    #[test]
    fn test_overlapping_roots_collect_each_file_once() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.rs"), "const A: u8 = 1;").unwrap();
        fs::write(root.join("README.md"), "# demo").unwrap();

        let roots = vec![
            root.join("."),
            root.join("src"),
            root.join("src/a.rs"),
            root.join("src/../src"),
        ];
        let collected = collect_documents_relative_to(root, &roots, 1024);

        assert_eq!(names(&collected), vec!["README.md", "src/a.rs"]);

        let batches =
            split_documents_into_batches(&collected.documents, BatchLimits::new(1024, 10).unwrap());
        let zip = InMemoryZip::from_batch(&batches[0]).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(zip.to_vec())).unwrap();
        let mut entries: Vec<&str> = archive.file_names().collect();
        entries.sort();
        assert_eq!(entries, vec!["README.md", "src/a.rs"]);
    }

    #[test]
    fn test_roots_outside_base_keep_their_own_name() {
        let base = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let project = elsewhere.path().join("project");
        fs::create_dir_all(project.join("conf")).unwrap();
        fs::write(project.join("conf/app.toml"), "key = 1").unwrap();

        let collected = collect_documents_relative_to(base.path(), &[project.clone()], 1024);
        assert_eq!(names(&collected), vec!["project/conf/app.toml"]);

        let single =
            collect_documents_relative_to(base.path(), &[project.join("conf/app.toml")], 1024);
        assert_eq!(names(&single), vec!["app.toml"]);
    }
}
