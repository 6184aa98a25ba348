use std::path::{Component, Path, PathBuf};

use crate::model::error::Error;

pub const SEPARATOR: char = '/';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    AWS,
    GCS,
}

pub fn parse_provider_from_uri(bucket_uri: &str) -> Result<Provider, Error> {
    if bucket_uri.starts_with("s3://") {
        Ok(Provider::AWS)
    } else if bucket_uri.starts_with("gs://") {
        Ok(Provider::GCS)
    } else {
        Err(Error::Config(format!(
            "failed to parse provider of: {}",
            bucket_uri
        )))
    }
}

pub fn parse_bucket_from_uri(bucket_uri: &str) -> &str {
    bucket_uri
        .split_once("://")
        .map(|(_, rest)| rest.trim_end_matches(SEPARATOR))
        .unwrap_or("")
}

/// Rejects keys and prefixes that start with the path separator.
pub fn ensure_relative(name: &str, value: &str) -> Result<(), Error> {
    if value.starts_with(SEPARATOR) {
        return Err(Error::InvalidArgument(format!(
            "{} must not start with {}: {}",
            name, SEPARATOR, value
        )));
    }

    Ok(())
}

pub fn is_folder_marker(key: &str) -> bool {
    key.ends_with(SEPARATOR)
}

/// Path of `key` relative to `prefix`, compared segment by segment.
///
/// The result never climbs out of its base directory: `..` and absolute
/// components are rejected.
pub fn relative_key(key: &str, prefix: &str) -> Result<PathBuf, Error> {
    let err = || Error::RelativePath {
        key: key.to_string(),
        prefix: prefix.to_string(),
    };

    let relative = Path::new(key).strip_prefix(prefix).map_err(|_| err())?;

    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(err());
    }

    Ok(relative.to_path_buf())
}

/// Joins a local relative path onto `prefix` to form an object key.
pub fn join_key(prefix: &str, relative: &Path) -> String {
    let mut segments: Vec<String> = prefix
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    for component in relative.components() {
        if let Component::Normal(part) = component {
            segments.push(part.to_string_lossy().to_string());
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert!(matches!(parse_provider_from_uri("s3://bucket"), Ok(Provider::AWS)));
        assert!(matches!(parse_provider_from_uri("gs://bucket"), Ok(Provider::GCS)));
        assert!(matches!(parse_provider_from_uri("ftp://bucket"), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_bucket() {
        let cases = vec![
            ("s3://bucket", "bucket"),
            ("gs://bucket/", "bucket"),
            ("bucket", ""),
        ];

        for (input, expected) in cases {
            assert_eq!(parse_bucket_from_uri(input), expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_ensure_relative() {
        let cases = vec![
            ("", true),
            ("data/", true),
            ("data/a.txt", true),
            ("/", false),
            ("/data/a.txt", false),
        ];

        for (input, ok) in cases {
            let result = ensure_relative("object_key", input);
            assert_eq!(result.is_ok(), ok, "failed for case: {}", input);
            if let Err(err) = result {
                assert!(err.is_invalid_argument(), "failed for case: {}", input);
            }
        }
    }

    #[test]
    fn test_is_folder_marker() {
        assert!(is_folder_marker("data/"));
        assert!(is_folder_marker("data/sub/"));
        assert!(!is_folder_marker("data/a.txt"));
        assert!(!is_folder_marker(""));
    }

    #[test]
    fn test_relative_key() {
        let cases = vec![
            ("data/a.txt", "data/", Some("a.txt")),
            ("data/sub/b.txt", "data/", Some("sub/b.txt")),
            ("data/sub/b.txt", "data", Some("sub/b.txt")),
            ("a.txt", "", Some("a.txt")),
            ("database/a.txt", "data", None),
            ("other/a.txt", "data/", None),
            ("data/../escaped.txt", "data/", None),
            ("data/sub/../../escaped.txt", "data", None),
        ];

        for (key, prefix, expected) in cases {
            let result = relative_key(key, prefix);
            match expected {
                Some(expected) => assert_eq!(
                    result.unwrap(),
                    PathBuf::from(expected),
                    "failed for case: {} {}",
                    key,
                    prefix
                ),
                None => assert!(
                    matches!(result, Err(Error::RelativePath { .. })),
                    "failed for case: {} {}",
                    key,
                    prefix
                ),
            }
        }
    }

    #[test]
    fn test_join_key() {
        let cases = vec![
            ("up", "a.txt", "up/a.txt"),
            ("up/", "sub/b.txt", "up/sub/b.txt"),
            ("up/nested", "b.txt", "up/nested/b.txt"),
            ("", "sub/b.txt", "sub/b.txt"),
        ];

        for (prefix, relative, expected) in cases {
            assert_eq!(
                join_key(prefix, Path::new(relative)),
                expected,
                "failed for case: {} {}",
                prefix,
                relative
            );
        }
    }
}
