//! City seed file: one name per line, `#` starts a comment line.

use std::path::Path;

use crate::scheduler::CollectorError;

/// Read city names from `path`.
pub async fn load_city_names(path: &Path) -> Result<Vec<String>, CollectorError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CollectorError::SeedFile {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_city_names(&content))
}

pub fn parse_city_names(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let names = parse_city_names("London\n\n  # capitals\n  Paris  \r\nNew York\n");
        assert_eq!(names, vec!["London", "Paris", "New York"]);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Kyiv\nLviv").unwrap();

        let names = load_city_names(file.path()).await.unwrap();
        assert_eq!(names, vec!["Kyiv", "Lviv"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_seed_error() {
        let err = load_city_names(Path::new("/nonexistent/cities.txt")).await.unwrap_err();
        assert!(matches!(err, CollectorError::SeedFile { .. }));
    }
}
