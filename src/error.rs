use crate::benc;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure is fatal for the run; `main` prints it and exits with status 1.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Arguments(String),
    #[error("could not open torrent file {}: {source}", path.display())]
    OpenTorrent { path: PathBuf, source: io::Error },
    #[error("malformed bencode ({0})")]
    Parse(#[from] benc::ParseError),
    #[error("unexpected type of '{field}' ({source})")]
    TypeMismatch {
        field: &'static str,
        source: benc::TypeMismatch,
    },
    #[error("missing '{0}' in metainfo")]
    MissingField(&'static str),
    #[error("Error, the torrent has no info dictionary.")]
    MissingInfo,
    #[error("Error, the torrent must contain at least one file.")]
    NoFiles,
    #[error("Error, could not read file: {}.", path.display())]
    ReadFile { path: PathBuf, source: io::Error },
    #[error("could not write torrent file {}: {source}", path.display())]
    WriteTorrent { path: PathBuf, source: io::Error },
    #[error("could not write output ({0})")]
    Output(#[from] io::Error),
}

impl Error {
    pub(crate) fn mismatch(field: &'static str) -> impl FnOnce(benc::TypeMismatch) -> Self {
        move |source| Error::TypeMismatch { field, source }
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        let kind = match &e {
            Error::Arguments(_) => io::ErrorKind::InvalidInput,
            Error::OpenTorrent { source, .. }
            | Error::ReadFile { source, .. }
            | Error::WriteTorrent { source, .. }
            | Error::Output(source) => source.kind(),
            Error::Parse(_)
            | Error::TypeMismatch { .. }
            | Error::MissingField(_)
            | Error::MissingInfo
            | Error::NoFiles => io::ErrorKind::InvalidData,
        };
        Self::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;
    use std::path::Path;

    assert_impl_all!(Error: std::error::Error, Send, Sync);

    #[test]
    fn test_error_messages() {
        assert_eq!(
            "Error, the torrent must contain at least one file.",
            Error::NoFiles.to_string()
        );

        let e = Error::ReadFile {
            path: Path::new("data/sub/a.txt").to_owned(),
            source: io::ErrorKind::NotFound.into(),
        };
        assert_eq!("Error, could not read file: data/sub/a.txt.", e.to_string());

        let e = Error::mismatch("info.name")(benc::TypeMismatch {
            expected: "string",
            found: "integer",
        });
        assert_eq!("unexpected type of 'info.name' (expected string, found integer)", e.to_string());
    }

    #[test]
    fn test_convert_to_io_error() {
        let e: io::Error = Error::NoFiles.into();
        assert_eq!(io::ErrorKind::InvalidData, e.kind());

        let e: io::Error = Error::WriteTorrent {
            path: "x.torrent".into(),
            source: io::ErrorKind::PermissionDenied.into(),
        }
        .into();
        assert_eq!(io::ErrorKind::PermissionDenied, e.kind());
    }
}
