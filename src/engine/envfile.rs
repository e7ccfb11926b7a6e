//! Client-side env-file loading.
//!
//! The engine API has no env-file parameter; like the docker CLI, the file
//! is read here and its lines handed to the engine verbatim. Blank lines and
//! `#` comments are skipped. Values are not parsed, quoted, or validated.

use std::io;
use std::path::Path;

/// Read a file of KEY=VALUE lines into the env list for a container launch.
pub fn read_env_file(path: &Path) -> io::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;

    Ok(contents
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# database\nDB_URL=postgres://db\n\nPORT=8000\n").unwrap();

        let env = read_env_file(&path).unwrap();
        assert_eq!(env, vec!["DB_URL=postgres://db", "PORT=8000"]);
    }

    #[test]
    fn test_values_pass_through_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OPTS=--flag=1 --other=\"two\"\nEMPTY=\n").unwrap();

        let env = read_env_file(&path).unwrap();
        assert_eq!(env, vec!["OPTS=--flag=1 --other=\"two\"", "EMPTY="]);
    }

    #[test]
    fn test_missing_file() {
        let err = read_env_file(Path::new("/nonexistent/.env")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
