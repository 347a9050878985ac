//! Path and name rules.
//!
//! Paths are absolute, `/`-separated UTF-8. The root is `/`. Every check in
//! here runs before any store round trip.

use crate::error::FsError;

pub const ROOT: &str = "/";

/// Validate a pod name: non-empty, at most `max_len` characters, no comma.
pub fn validate_pod_name(name: &str, max_len: usize) -> Result<(), FsError> {
    if name.is_empty() {
        return Err(FsError::invalid("pod name too short"));
    }
    if name.chars().count() > max_len {
        return Err(FsError::invalid(format!(
            "pod name too long, the maximum is {} characters",
            max_len
        )));
    }
    if name.contains(',') {
        return Err(FsError::invalid("pod name must not contain ','"));
    }
    Ok(())
}

/// Validate a single file or directory name
pub fn validate_name(name: &str, max_len: usize) -> Result<(), FsError> {
    if name.is_empty() {
        return Err(FsError::invalid("name too short"));
    }
    if name.chars().count() > max_len {
        return Err(FsError::invalid(format!(
            "name too long, the maximum is {} characters",
            max_len
        )));
    }
    if name.contains('/') {
        return Err(FsError::invalid(format!("name {:?} contains '/'", name)));
    }
    if name == "." || name == ".." {
        return Err(FsError::invalid(format!("name {:?} is reserved", name)));
    }
    Ok(())
}

/// Normalize an absolute path: collapse repeated separators and drop a
/// trailing one. `.` and `..` segments are rejected rather than resolved.
pub fn clean_path(path: &str) -> Result<String, FsError> {
    if !path.starts_with('/') {
        return Err(FsError::invalid(format!("path {:?} is not absolute", path)));
    }
    let mut clean = String::with_capacity(path.len());
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(FsError::invalid(format!(
                "path {:?} contains a relative segment",
                path
            )));
        }
        clean.push('/');
        clean.push_str(segment);
    }
    if clean.is_empty() {
        clean.push('/');
    }
    Ok(clean)
}

/// Split a clean path into its parent and final name. `None` for the root.
pub fn split(path: &str) -> Option<(&str, &str)> {
    if path == ROOT {
        return None;
    }
    let idx = path.rfind('/')?;
    let parent = if idx == 0 { ROOT } else { &path[..idx] };
    Some((parent, &path[idx + 1..]))
}

/// Join a clean parent path and a name
pub fn join(parent: &str, name: &str) -> String {
    if parent == ROOT {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pod_name_rules() {
        assert!(validate_pod_name("photos", 64).is_ok());
        assert!(validate_pod_name("Photos 2024", 64).is_ok());

        let err = validate_pod_name("", 64).unwrap_err();
        assert!(matches!(&err, FsError::InvalidArgument(m) if m.contains("too short")));

        let err = validate_pod_name(&"p".repeat(65), 64).unwrap_err();
        assert!(matches!(&err, FsError::InvalidArgument(m) if m.contains("too long")));
        assert!(validate_pod_name(&"p".repeat(64), 64).is_ok());

        assert!(matches!(
            validate_pod_name("a,b", 64),
            Err(FsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("f.txt", 100).is_ok());
        assert!(validate_name("", 100).is_err());
        assert!(validate_name("a/b", 100).is_err());
        assert!(validate_name("..", 100).is_err());
        assert!(validate_name(&"n".repeat(101), 100).is_err());
        // length counts characters, not bytes
        assert!(validate_name(&"é".repeat(100), 100).is_ok());
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/").unwrap(), "/");
        assert_eq!(clean_path("//").unwrap(), "/");
        assert_eq!(clean_path("/a//b/").unwrap(), "/a/b");
        assert!(clean_path("a/b").is_err());
        assert!(clean_path("/a/../b").is_err());
    }

    #[test]
    fn test_split_and_join() {
        assert_eq!(split("/"), None);
        assert_eq!(split("/a"), Some(("/", "a")));
        assert_eq!(split("/a/b/c.txt"), Some(("/a/b", "c.txt")));
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/a/b", "c.txt"), "/a/b/c.txt");
    }
}
