//! Advisory check that the storage state file is ignored by git.
//!
//! Never mutates the ignore file; callers print the suggestions.

use crate::paths::AUTH_DIR;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitignoreAdvice {
    /// A covering pattern is already present.
    Covered,
    /// `.gitignore` exists but no covering pattern was found.
    MissingPattern { suggestions: Vec<String> },
    /// No `.gitignore` in the project root.
    NoGitignore { suggestions: Vec<String> },
}

/// Read `{root}/.gitignore` (if present) and check whether `output_path`
/// is covered.
pub fn check(root: &Path, output_path: &Path) -> io::Result<GitignoreAdvice> {
    let gitignore = root.join(".gitignore");
    if !gitignore.exists() {
        return Ok(GitignoreAdvice::NoGitignore {
            suggestions: suggestions_for(output_path),
        });
    }
    let content = std::fs::read_to_string(&gitignore)?;
    Ok(advise(&content, output_path))
}

/// Pure core of the advisory: match trimmed lines against the patterns
/// that would cover the output file.
pub fn advise(gitignore_content: &str, output_path: &Path) -> GitignoreAdvice {
    let file_name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let relative = output_path
        .to_string_lossy()
        .trim_start_matches("./")
        .to_string();

    let covering = [
        format!("{AUTH_DIR}/"),
        AUTH_DIR.to_string(),
        format!("{AUTH_DIR}/**"),
        file_name,
        relative,
    ];

    let covered = gitignore_content.lines().any(|line| {
        let trimmed = line.trim();
        !trimmed.is_empty() && covering.iter().any(|pattern| trimmed == pattern)
    });

    if covered {
        GitignoreAdvice::Covered
    } else {
        GitignoreAdvice::MissingPattern {
            suggestions: suggestions_for(output_path),
        }
    }
}

/// Lines worth adding: the default directory pattern, plus the exact file
/// name when the output lives outside the default directory.
fn suggestions_for(output_path: &Path) -> Vec<String> {
    let mut suggestions = vec![format!("{AUTH_DIR}/")];
    let in_auth_dir = output_path
        .components()
        .any(|c| c.as_os_str() == AUTH_DIR);
    if !in_auth_dir {
        if let Some(name) = output_path.file_name() {
            suggestions.push(name.to_string_lossy().into_owned());
        }
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn default_output() -> PathBuf {
        PathBuf::from("./.playwright-auth/github-alice.json")
    }

    #[test]
    fn test_directory_pattern_covers_default_output() {
        let advice = advise(".playwright-auth/\ntarget/\n", &default_output());
        assert_eq!(advice, GitignoreAdvice::Covered);
    }

    #[test]
    fn test_bare_directory_name_covers() {
        let advice = advise("  .playwright-auth  \n", &default_output());
        assert_eq!(advice, GitignoreAdvice::Covered);
    }

    #[test]
    fn test_exact_file_name_covers() {
        let advice = advise("github-alice.json\n", &default_output());
        assert_eq!(advice, GitignoreAdvice::Covered);
    }

    #[test]
    fn test_missing_pattern_suggests_directory_line() {
        let advice = advise("target/\n*.log\n", &default_output());
        let GitignoreAdvice::MissingPattern { suggestions } = advice else {
            panic!("expected MissingPattern");
        };
        assert_eq!(suggestions, vec![".playwright-auth/".to_string()]);
    }

    #[test]
    fn test_output_outside_default_dir_also_suggests_file_name() {
        let advice = advise("", Path::new("auth/session.json"));
        let GitignoreAdvice::MissingPattern { suggestions } = advice else {
            panic!("expected MissingPattern");
        };
        assert_eq!(
            suggestions,
            vec![".playwright-auth/".to_string(), "session.json".to_string()]
        );
    }

    #[test]
    fn test_check_reports_missing_gitignore_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let advice = check(dir.path(), &default_output()).unwrap();
        assert!(matches!(advice, GitignoreAdvice::NoGitignore { .. }));
        assert!(!dir.path().join(".gitignore").exists());
    }

    #[test]
    fn test_check_reads_existing_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        let gitignore = dir.path().join(".gitignore");
        std::fs::write(&gitignore, "node_modules/\n").unwrap();

        let advice = check(dir.path(), &default_output()).unwrap();
        assert!(matches!(advice, GitignoreAdvice::MissingPattern { .. }));

        // advisory must never mutate the file
        assert_eq!(
            std::fs::read_to_string(&gitignore).unwrap(),
            "node_modules/\n"
        );
    }
}
