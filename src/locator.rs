//! Executable Locator
//!
//! Processes launched from a desktop session do not inherit the login
//! shell's `PATH`, so the backend binary is looked up in a fixed list of
//! install locations instead.

use std::path::{Path, PathBuf};

/// Candidate locations for `name`, highest priority first:
/// `~/.local/bin`, `/usr/local/bin`, `/opt/homebrew/bin`.
pub fn candidate_paths(home: Option<&Path>, name: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(3);
    if let Some(home) = home {
        candidates.push(home.join(".local/bin").join(name));
    }
    candidates.push(Path::new("/usr/local/bin").join(name));
    candidates.push(Path::new("/opt/homebrew/bin").join(name));
    candidates
}

/// First candidate that exists and is executable
pub fn find_executable<I, P>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    candidates
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .find(|p| is_executable(p))
}

/// Locate `name` in the well-known install locations for the current user
pub fn locate_executable(name: &str) -> Option<PathBuf> {
    let home = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf());
    find_executable(candidate_paths(home.as_deref(), name))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_candidate_order() {
        let candidates = candidate_paths(Some(Path::new("/home/ada")), "quarry");
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/home/ada/.local/bin/quarry"),
                PathBuf::from("/usr/local/bin/quarry"),
                PathBuf::from("/opt/homebrew/bin/quarry"),
            ]
        );
    }

    #[test]
    fn test_candidates_without_home() {
        let candidates = candidate_paths(None, "quarry");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], PathBuf::from("/usr/local/bin/quarry"));
    }

    #[test]
    fn test_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("quarry");
        assert_eq!(find_executable([missing]), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_skips_non_executable_and_directories() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir_candidate = temp_dir.path().join("as_dir");
        std::fs::create_dir(&dir_candidate).unwrap();

        let plain = temp_dir.path().join("plain");
        std::fs::write(&plain, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).unwrap();

        let exec = temp_dir.path().join("exec");
        std::fs::write(&exec, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&exec, std::fs::Permissions::from_mode(0o755)).unwrap();

        let exec_later = temp_dir.path().join("exec_later");
        std::fs::write(&exec_later, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&exec_later, std::fs::Permissions::from_mode(0o755)).unwrap();

        let found = find_executable([&dir_candidate, &plain, &exec, &exec_later]);
        assert_eq!(found, Some(exec));
    }
}
