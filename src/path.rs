use std::path::{Component, Path, PathBuf};

/// Lexically normalizes a path: drops redundant separators and `.` segments, and folds
/// `..` into the preceding segment where there is one. Never touches the filesystem.
/// An empty result becomes `.`.
pub fn clean(path: impl AsRef<Path>) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => (),
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                // `..` at the root is the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => (),
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        PathBuf::from(".")
    } else {
        parts.into_iter().collect()
    }
}

/// File name as stored in metainfo. The bytes are taken as is on Unix; elsewhere
/// invalid UTF-8 sequences are replaced.
pub fn from_bytes(name: &[u8]) -> PathBuf {
    #[cfg(unix)]
    {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(OsStr::from_bytes(name))
    }
    #[cfg(not(unix))]
    {
        PathBuf::from(String::from_utf8_lossy(name).into_owned())
    }
}

/// Joins the path segments of a multi-file entry into a relative file name.
/// Empty segments are skipped.
pub fn join_segments<S: AsRef<[u8]>>(segments: &[S]) -> PathBuf {
    let joined = segments
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(&b'/');
    clean(from_bytes(&joined))
}

/// Location of `relative` inside the content directory. A leading root in `relative`
/// does not escape `content_dir`.
pub fn resolve(content_dir: impl AsRef<Path>, relative: impl AsRef<Path>) -> PathBuf {
    let mut joined = content_dir.as_ref().to_path_buf();
    for component in relative.as_ref().components() {
        if let Component::Normal(_) | Component::ParentDir = component {
            joined.push(component);
        }
    }
    clean(joined)
}
