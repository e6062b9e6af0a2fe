/// Ref paths into the hierarchical store.
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalised, slash-separated location in the database tree.
///
/// Normalisation follows POSIX path joining: empty and `.` segments are
/// dropped and `..` removes the previous segment. Leading slashes are
/// irrelevant, every path is relative to the database root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RefPath {
    segments: Vec<String>,
}

impl RefPath {
    /// Parse and normalise a path.
    pub fn new(path: &str) -> Self {
        Self::root().join(path)
    }

    /// The database root.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Append `path` (which may itself contain slashes) and normalise.
    pub fn join(&self, path: &str) -> Self {
        let mut segments = self.segments.clone();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other.to_string()),
            }
        }
        Self { segments }
    }

    /// Prefix this path with `prefix`.
    pub fn under(&self, prefix: &RefPath) -> Self {
        let mut segments = prefix.segments.clone();
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for RefPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl From<&str> for RefPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalisation() {
        assert_eq!(RefPath::new("/users//alice/").segments(), ["users", "alice"]);
        assert_eq!(RefPath::new("users/./alice").to_string(), "/users/alice");
        assert_eq!(RefPath::new("users/alice/../bob").to_string(), "/users/bob");
        assert_eq!(RefPath::new("../..").to_string(), "/");
        assert!(RefPath::new("").is_root());
    }

    #[test]
    fn test_join_and_under() {
        let base = RefPath::new("users");
        assert_eq!(base.join("alice/profile").to_string(), "/users/alice/profile");
        assert_eq!(base.join("alice").key(), Some("alice"));

        let prefixed = base.under(&RefPath::new("__test__"));
        assert_eq!(prefixed.to_string(), "/__test__/users");
        assert_eq!(RefPath::root().key(), None);
    }
}
