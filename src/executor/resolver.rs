// Workflow script resolution

use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Where a requested workflow script lives, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An entry exists at this path right now
    Found(PathBuf),
    /// Nothing at the probed path
    NotFound(PathBuf),
    /// The name points outside the workflows directory
    Escapes(PathBuf),
}

/// Maps script names onto the trusted workflows directory
#[derive(Debug, Clone)]
pub struct WorkflowResolver {
    workflows_dir: PathBuf,
    contain: bool,
}

impl WorkflowResolver {
    /// `contain` rejects names with `..`, a root or a drive prefix
    pub fn new(workflows_dir: impl Into<PathBuf>, contain: bool) -> Self {
        Self {
            workflows_dir: workflows_dir.into(),
            contain,
        }
    }

    /// Resolve a script name. Existence is checked on every call.
    pub async fn resolve(&self, script_name: &str) -> Resolution {
        let path = self.workflows_dir.join(script_name);

        if self.contain && !is_contained(Path::new(script_name)) {
            debug!(script = %script_name, path = %path.display(), "workflow name escapes directory");
            return Resolution::Escapes(path);
        }

        let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
        debug!(script = %script_name, path = %path.display(), exists, "resolved workflow");

        if exists {
            Resolution::Found(path)
        } else {
            Resolution::NotFound(path)
        }
    }
}

/// Lexical check: only plain and `.` components
fn is_contained(name: &Path) -> bool {
    name.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_found_and_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.sh"), "echo hi\n").unwrap();

        let resolver = WorkflowResolver::new(dir.path(), true);

        assert_eq!(
            resolver.resolve("hello.sh").await,
            Resolution::Found(dir.path().join("hello.sh"))
        );
        assert_eq!(
            resolver.resolve("missing.sh").await,
            Resolution::NotFound(dir.path().join("missing.sh"))
        );
    }

    #[tokio::test]
    async fn test_existence_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = WorkflowResolver::new(dir.path(), true);

        assert!(matches!(resolver.resolve("late.sh").await, Resolution::NotFound(_)));
        std::fs::write(dir.path().join("late.sh"), "true\n").unwrap();
        assert!(matches!(resolver.resolve("late.sh").await, Resolution::Found(_)));
    }

    #[tokio::test]
    async fn test_nested_names_are_contained() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("daily")).unwrap();
        std::fs::write(dir.path().join("daily").join("focus.sh"), "true\n").unwrap();

        let resolver = WorkflowResolver::new(dir.path(), true);
        assert!(matches!(
            resolver.resolve("./daily/focus.sh").await,
            Resolution::Found(_)
        ));
    }

    #[tokio::test]
    async fn test_traversal_rejected_when_contained() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = WorkflowResolver::new(dir.path().join("workflows"), true);

        for name in ["../secret.sh", "a/../../b.sh", "/etc/passwd"] {
            assert!(
                matches!(resolver.resolve(name).await, Resolution::Escapes(_)),
                "{name} should escape"
            );
        }
    }

    #[tokio::test]
    async fn test_traversal_allowed_when_uncontained() {
        let dir = tempfile::tempdir().unwrap();
        let workflows = dir.path().join("workflows");
        std::fs::create_dir(&workflows).unwrap();
        std::fs::write(dir.path().join("outside.sh"), "true\n").unwrap();

        let resolver = WorkflowResolver::new(&workflows, false);
        assert_eq!(
            resolver.resolve("../outside.sh").await,
            Resolution::Found(workflows.join("../outside.sh"))
        );
    }
}
