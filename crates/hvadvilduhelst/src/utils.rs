use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Returns the user's config directory of the tool (if the platform
/// provides one).
pub(crate) fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dk", "hvadvilduhelst", "hvadvilduhelst")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Resolves `path` relative to `base`, unless it's absolute.
#[inline]
pub(crate) fn resolve<P1, P2>(path: P1, base: P2) -> PathBuf
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.as_ref().join(path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::resolve;

    #[test]
    fn resolve_relative() {
        let base = PathBuf::from("/home/foo");
        assert_eq!(
            resolve("data/hygdk", &base),
            PathBuf::from("/home/foo/data/hygdk")
        );
    }

    #[test]
    fn resolve_absolute() {
        let base = PathBuf::from("/home/foo");
        assert_eq!(
            resolve("/srv/data", base),
            PathBuf::from("/srv/data")
        );
    }
}
