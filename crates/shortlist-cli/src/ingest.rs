//! Reading the job description and the resume directory.

use anyhow::{Context, Result};
use shortlist_core::{InputError, MatchError, SourceDocument};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const RESUME_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Read the job description from a file, or from stdin when `source` is `-`.
///
/// # Errors
///
/// Fails when the source cannot be read, or with
/// [`InputError::MissingJobDescription`] when it is blank.
pub fn read_job(source: &Path) -> Result<String> {
    let text = if source.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading job description from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("reading job description {}", source.display()))?
    };

    if text.trim().is_empty() {
        return Err(MatchError::from(InputError::MissingJobDescription).into());
    }
    Ok(text)
}

/// Paths of every `.txt`/`.md` file directly under `dir`, sorted by name.
fn resume_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(anyhow::Error::new(MatchError::from(InputError::NoResumes))
            .context(format!("resume directory {} not found", dir.display())));
    }
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading resume directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("listing {}", dir.display()))?
            .path();
        let wanted = path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    RESUME_EXTENSIONS
                        .iter()
                        .any(|wanted| ext.eq_ignore_ascii_case(wanted))
                });
        if wanted {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load every resume under `dir` in file-name order.
///
/// # Errors
///
/// Fails when a file cannot be read, or with [`InputError::NoResumes`] when
/// the directory is missing or holds no resumes.
pub fn load_resumes(dir: &Path) -> Result<Vec<SourceDocument>> {
    let paths = resume_paths(dir)?;
    if paths.is_empty() {
        return Err(MatchError::from(InputError::NoResumes).into());
    }

    let documents = paths
        .iter()
        .map(|path| {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading resume {}", path.display()))?;
            let document = SourceDocument::new(path.display().to_string(), raw);
            debug!(origin = %document.origin, pages = document.page_count, "resume loaded");
            Ok(document)
        })
        .collect::<Result<Vec<_>>>()?;

    info!(resumes = documents.len(), dir = %dir.display(), "resumes ingested");
    Ok(documents)
}
