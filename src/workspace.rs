//! Workspace discovery and file I/O.
//!
//! A migration root is a directory of C# test projects. Each immediate
//! subdirectory containing `.cs` files becomes one compilation named
//! after the directory; `.cs` files sitting directly at the root form a
//! compilation named after the root itself. Hidden directories and build
//! output (`bin`, `obj`) are skipped.
//!
//! Files are read and written as raw bytes around the rewrite so a UTF-8
//! byte order mark survives the round trip.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

const BOM: &[u8] = b"\xef\xbb\xbf";

/// One compilation: a named group of C# files rewritten together.
pub struct CompilationDir {
    pub name: String,
    pub files: Vec<PathBuf>,
}

pub struct Workspace {
    pub root: PathBuf,
    pub compilations: Vec<CompilationDir>,
}

impl Workspace {
    /// Discover the compilations under a root path. A single-file root
    /// becomes a one-file compilation.
    pub fn discover(root: &Path) -> Result<Workspace> {
        let metadata = fs::metadata(root)
            .with_context(|| format!("cannot access path {}", root.display()))?;

        if metadata.is_file() {
            let name = root
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "workspace".to_string());
            return Ok(Workspace {
                root: root.parent().unwrap_or(Path::new(".")).to_path_buf(),
                compilations: vec![CompilationDir {
                    name,
                    files: vec![root.to_path_buf()],
                }],
            });
        }

        let mut compilations = Vec::new();
        let mut root_files = Vec::new();
        let mut entries: Vec<_> = fs::read_dir(root)
            .with_context(|| format!("cannot read directory {}", root.display()))?
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if path.is_dir() {
                if skip_dir(&name) {
                    continue;
                }
                let files = cs_files(&path)?;
                if !files.is_empty() {
                    compilations.push(CompilationDir { name, files });
                }
            } else if is_cs(&path) {
                root_files.push(path);
            }
        }

        if !root_files.is_empty() {
            root_files.sort();
            let name = root
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| ".".to_string());
            compilations.insert(
                0,
                CompilationDir {
                    name,
                    files: root_files,
                },
            );
        }

        Ok(Workspace {
            root: root.to_path_buf(),
            compilations,
        })
    }
}

fn skip_dir(name: &str) -> bool {
    name.starts_with('.') || name == "bin" || name == "obj"
}

fn is_cs(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("cs")
}

fn cs_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir() && skip_dir(&e.file_name().to_string_lossy()))
        })
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_cs(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Source text plus whether a UTF-8 byte order mark was present.
pub struct SourceFile {
    pub text: String,
    pub bom: bool,
}

pub fn read_source(path: &Path) -> Result<SourceFile> {
    let bytes =
        fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let (bom, slice) = if bytes.starts_with(BOM) {
        (true, &bytes[BOM.len()..])
    } else {
        (false, &bytes[..])
    };
    let text = String::from_utf8(slice.to_vec())
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    Ok(SourceFile { text, bom })
}

pub fn write_source(path: &Path, text: &str, bom: bool) -> Result<()> {
    let mut bytes = Vec::with_capacity(text.len() + BOM.len());
    if bom {
        bytes.extend_from_slice(BOM);
    }
    bytes.extend_from_slice(text.as_bytes());
    fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))
}

/// Cheap pre-filter: only files that mention Rhino.Mocks at all go
/// through the parser and pipeline.
pub fn mentions_rhino(source: &str) -> bool {
    source.contains("Rhino.Mocks")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_subdirectories_become_compilations() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("ProjectA")).unwrap();
        fs::create_dir(dir.path().join("ProjectB")).unwrap();
        fs::create_dir(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("ProjectA/FooTest.cs"), "class A {}").unwrap();
        fs::write(dir.path().join("ProjectB/BarTest.cs"), "class B {}").unwrap();
        fs::write(dir.path().join("bin/Gen.cs"), "class G {}").unwrap();
        fs::write(dir.path().join("Shared.cs"), "class S {}").unwrap();

        let ws = Workspace::discover(dir.path()).unwrap();
        let names: Vec<&str> = ws.compilations.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(&names[1..], ["ProjectA", "ProjectB"]);
        assert_eq!(ws.compilations[1].files.len(), 1);
    }

    #[test]
    fn test_single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Test.cs");
        fs::write(&file, "class T {}").unwrap();
        let ws = Workspace::discover(&file).unwrap();
        assert_eq!(ws.compilations.len(), 1);
        assert_eq!(ws.compilations[0].name, "Test");
    }

    #[test]
    fn test_bom_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Test.cs");
        fs::write(&file, b"\xef\xbb\xbfclass T {}").unwrap();

        let source = read_source(&file).unwrap();
        assert!(source.bom);
        assert_eq!(source.text, "class T {}");

        write_source(&file, &source.text, source.bom).unwrap();
        let bytes = fs::read(&file).unwrap();
        assert!(bytes.starts_with(b"\xef\xbb\xbf"));
    }
}
