//! Per-job working directory.
//!
//! A [`Workspace`] owns a uniquely named directory (`plex-XXXXXX`) for the
//! intermediate artifacts of one job. Artifacts follow a fixed naming
//! scheme, `<name>.<ext>`, where `<name>` is the source file name with a
//! trailing `.ts` removed. The directory is not removed on drop: the job
//! coordinator decides whether to keep it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Prefix of every working directory name.
const DIR_PREFIX: &str = "plex-";

/// Extension of the final artifact written next to the source.
pub const FINAL_EXTENSION: &str = "mkv";

/// Intermediate artifacts produced inside the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Copy of the source transport stream.
    Stream,
    /// Commercial boundary list written by the scanner.
    Boundaries,
    /// Chapter metadata consumed by the first remux.
    Chapters,
    /// Extracted captions.
    Captions,
    /// Remuxed intermediate container.
    Intermediate,
    /// Transcoder output.
    Transcoded,
}

impl Artifact {
    /// File extension for this artifact.
    pub fn extension(self) -> &'static str {
        match self {
            Artifact::Stream => "ts",
            Artifact::Boundaries => "edl",
            Artifact::Chapters => "ffmeta",
            Artifact::Captions => "srt",
            Artifact::Intermediate => "mp4",
            Artifact::Transcoded => "mkv",
        }
    }
}

/// Working directory for one job.
///
/// # Example
///
/// ```no_run
/// use dvr_av::{Artifact, Workspace};
/// use std::path::Path;
///
/// let ws = Workspace::create(Path::new("/recordings/show.ts"), &std::env::temp_dir()).unwrap();
/// assert!(ws.artifact(Artifact::Captions).ends_with("show.srt"));
/// assert_eq!(ws.final_output(), Path::new("/recordings/show.mkv"));
/// ws.remove().unwrap();
/// ```
#[derive(Debug)]
pub struct Workspace {
    source: PathBuf,
    dir: PathBuf,
    name: String,
}

impl Workspace {
    /// Create a uniquely named working directory under `parent` for
    /// processing `source`.
    pub fn create(source: &Path, parent: &Path) -> dvr_core::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| dvr_core::Error::filesystem("create working directory in", parent, e))?
            .keep();

        Ok(Self {
            source: source.to_path_buf(),
            name: base_name(source),
            dir,
        })
    }

    /// The original source file.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The working directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Base name shared by all artifacts.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of an intermediate artifact inside the working directory.
    pub fn artifact(&self, artifact: Artifact) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.name, artifact.extension()))
    }

    /// Path of the final artifact, next to the source file.
    pub fn final_output(&self) -> PathBuf {
        let parent = self.source.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!("{}.{FINAL_EXTENSION}", self.name))
    }

    /// Remove the working directory and everything in it. Removing a
    /// directory that is already gone succeeds.
    pub fn remove(&self) -> dvr_core::Result<()> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(dvr_core::Error::filesystem("remove", &self.dir, e)),
        }
    }
}

/// File name of `source` with a trailing `.ts` removed.
fn base_name(source: &Path) -> String {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    match file_name.strip_suffix(".ts") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn workspace_paths() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Path::new("/recordings/show.ts"), parent.path()).unwrap();

        assert!(ws.dir().is_dir());
        assert!(ws.dir().starts_with(parent.path()));
        assert!(ws
            .dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("plex-"));
        assert_eq!(ws.name(), "show");
        assert_eq!(ws.artifact(Artifact::Stream), ws.dir().join("show.ts"));
        assert_eq!(ws.artifact(Artifact::Boundaries), ws.dir().join("show.edl"));
        assert_eq!(ws.artifact(Artifact::Chapters), ws.dir().join("show.ffmeta"));
        assert_eq!(ws.artifact(Artifact::Captions), ws.dir().join("show.srt"));
        assert_eq!(ws.artifact(Artifact::Intermediate), ws.dir().join("show.mp4"));
        assert_eq!(ws.artifact(Artifact::Transcoded), ws.dir().join("show.mkv"));
        assert_eq!(ws.final_output(), PathBuf::from("/recordings/show.mkv"));
    }

    #[test]
    fn each_workspace_is_unique() {
        let parent = tempfile::tempdir().unwrap();
        let a = Workspace::create(Path::new("/r/show.ts"), parent.path()).unwrap();
        let b = Workspace::create(Path::new("/r/show.ts"), parent.path()).unwrap();
        assert_ne!(a.dir(), b.dir());
    }

    #[test]
    fn non_ts_source_keeps_full_name() {
        assert_eq!(base_name(Path::new("/r/show.mpg")), "show.mpg");
        assert_eq!(base_name(Path::new("/r/Show (2024).ts")), "Show (2024)");
        assert_eq!(base_name(Path::new("/r/.ts")), ".ts");
    }

    #[test]
    fn directory_survives_drop() {
        let parent = tempfile::tempdir().unwrap();
        let dir = {
            let ws = Workspace::create(Path::new("/r/show.ts"), parent.path()).unwrap();
            ws.dir().to_path_buf()
        };
        assert!(dir.is_dir());
    }

    #[test]
    fn remove_is_idempotent() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Path::new("/r/show.ts"), parent.path()).unwrap();
        fs::write(ws.artifact(Artifact::Captions), "1\n").unwrap();

        ws.remove().unwrap();
        assert!(!ws.dir().exists());
        ws.remove().unwrap();
    }

    #[test]
    fn create_fails_for_missing_parent() {
        let result = Workspace::create(Path::new("/r/show.ts"), Path::new("/nonexistent/parent"));
        assert!(matches!(result, Err(dvr_core::Error::Filesystem { .. })));
    }
}
