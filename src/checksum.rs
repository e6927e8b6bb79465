use derive_more::Display;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// MD5 digest of a file's content, displayed as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("{}", hex::encode(_0))]
pub struct Md5Digest([u8; 16]);

impl Md5Digest {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Case-insensitive comparison against a checksum recorded in the metainfo.
    /// Recorded values that are not even text never match.
    pub fn matches(&self, recorded: &[u8]) -> bool {
        recorded.eq_ignore_ascii_case(self.to_hex().as_bytes())
    }

    pub fn verdict(&self, recorded: Option<&[u8]>) -> Verdict {
        match recorded {
            None => Verdict::New,
            Some(recorded) if self.matches(recorded) => Verdict::Match,
            Some(_) => Verdict::Wrong,
        }
    }
}

impl From<[u8; 16]> for Md5Digest {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

/// Outcome of checking one file against its recorded checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Verdict {
    #[display("")]
    New,
    #[display(" [MATCH]")]
    Match,
    #[display(" [WRONG]")]
    Wrong,
}

/// Streams the file through an MD5 hasher. The file is closed before returning.
pub fn compute_md5(path: impl AsRef<Path>) -> io::Result<Md5Digest> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let read = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..read]);
    }
    Ok(Md5Digest(hasher.finalize().into()))
}
