use std::error::Error as StdError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A candidate source failed to produce suggestions.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SourceError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl SourceError {
    /// Error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// I/O failure while listing candidates under `path`.
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self {
            message: format!("cannot list {}", path.display()),
            source: Some(Box::new(source)),
        }
    }
}

/// Supplies suggestion strings for one slot.
///
/// Implementations may be invoked concurrently for different slots of the
/// same completion request.
pub trait CandidateSource: Send + Sync {
    /// Candidates given the tokens typed so far.
    fn candidates(&self, partial: &[String]) -> Result<Vec<String>, SourceError>;
}

impl<F> CandidateSource for F
where
    F: Fn(&[String]) -> Vec<String> + Send + Sync,
{
    fn candidates(&self, partial: &[String]) -> Result<Vec<String>, SourceError> {
        Ok(self(partial))
    }
}

/// A fixed list of candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCandidates {
    values: Vec<String>,
}

impl StaticCandidates {
    /// Candidates from any list of strings.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl CandidateSource for StaticCandidates {
    fn candidates(&self, _partial: &[String]) -> Result<Vec<String>, SourceError> {
        Ok(self.values.clone())
    }
}

/// Entries of a directory, optionally restricted to some file extensions.
///
/// Directories are always offered, with a trailing `/`, so the user can
/// descend into them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCandidates {
    dir: PathBuf,
    extensions: Vec<String>,
}

impl PathCandidates {
    /// Entries of `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extensions: Vec::new(),
        }
    }

    /// Only offer files with one of these extensions (without the dot).
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        self.extensions.is_empty()
            || path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| self.extensions.iter().any(|x| x == e))
    }

    fn display(&self, name: &str) -> String {
        if self.dir == Path::new(".") {
            name.to_string()
        } else {
            self.dir.join(name).to_string_lossy().into_owned()
        }
    }
}

impl CandidateSource for PathCandidates {
    fn candidates(&self, _partial: &[String]) -> Result<Vec<String>, SourceError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| SourceError::io(&self.dir, e))?;
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SourceError::io(&self.dir, e))?;
            let path = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if path.is_dir() {
                out.push(format!("{}/", self.display(&name)));
            } else if self.accepts(&path) {
                out.push(self.display(&name));
            }
        }
        out.sort();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_candidates_ignore_input() {
        let src = StaticCandidates::new(["red", "green"]);
        assert_eq!(
            src.candidates(&["red".into()]).unwrap(),
            vec!["red".to_string(), "green".to_string()]
        );
    }

    #[test]
    fn closures_are_sources() {
        let src = |partial: &[String]| vec![format!("n{}", partial.len())];
        assert_eq!(src.candidates(&[]).unwrap(), vec!["n0".to_string()]);
    }

    #[test]
    fn path_candidates_filter_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let src = PathCandidates::new(dir.path()).with_extensions(["json"]);
        let got = src.candidates(&[]).unwrap();
        let a = dir.path().join("a.json").to_string_lossy().into_owned();
        let sub = format!("{}/", dir.path().join("sub").to_string_lossy());
        assert_eq!(got, vec![a, sub]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = PathCandidates::new(dir.path().join("nope"));
        let err = src.candidates(&[]).unwrap_err();
        assert!(err.to_string().starts_with("cannot list "), "{err}");
    }
}
