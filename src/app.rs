use crate::checksum::{self, Md5Digest, Verdict};
use crate::error::Error;
use crate::metainfo::{Content, FileEntry, Metainfo, SingleFile};
use crate::path;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct Config {
    /// The .torrent file to check and possibly update.
    pub metainfo_path: PathBuf,
    /// Folder the torrent content was downloaded into.
    pub content_dir: PathBuf,
}

impl Config {
    pub fn new(metainfo_path: impl AsRef<Path>, content_dir: impl AsRef<Path>) -> Self {
        Self {
            metainfo_path: path::clean(metainfo_path),
            content_dir: path::clean(content_dir),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub files_processed: usize,
    /// Whether the metainfo file was rewritten with new checksums.
    pub written: bool,
}

/// Hashes every file of the torrent in order, printing one line per file to `out`.
/// Missing checksums are added to the metainfo, existing ones are only compared.
/// The metainfo file is rewritten unless the last file processed already had a checksum.
pub fn run(config: &Config, out: &mut impl Write) -> Result<Outcome, Error> {
    log::info!("Input metainfo file: {}", config.metainfo_path.display());
    let mut metainfo = Metainfo::from_file(&config.metainfo_path)?;

    let (files_processed, write_torrent) = match metainfo.info_mut().content_mut() {
        Content::MultiFile(files) => (files.len(), process_files(files, &config.content_dir, out)?),
        Content::SingleFile(file) => (1, process_single_file(file, &config.content_dir, out)?),
    };
    log::debug!("{files_processed} files processed, write torrent: {write_torrent}");

    if write_torrent {
        writeln!(out, "Writing torrent file.")?;
        metainfo.write_to_file(&config.metainfo_path)?;
    } else {
        writeln!(out, "Torrent already contains md5 sums, not writing to torrent file.")?;
    }

    Ok(Outcome {
        files_processed,
        written: write_torrent,
    })
}

fn process_files(
    files: &mut [FileEntry],
    content_dir: &Path,
    out: &mut impl Write,
) -> Result<bool, Error> {
    writeln!(out, "Generating md5 sums for {} files...", files.len())?;

    // a later file without checksum flips this back on, so the last decision wins
    let mut write_torrent = true;
    for file in files.iter_mut() {
        let relative_path = file.relative_path();
        let digest = hash_file(path::resolve(content_dir, &relative_path))?;

        let verdict = digest.verdict(file.md5sum());
        writeln!(out, "{digest}  {}{verdict}", relative_path.display())?;

        match verdict {
            Verdict::New => {
                file.set_md5sum(digest.to_hex());
                write_torrent = true;
            }
            Verdict::Match | Verdict::Wrong => write_torrent = false,
        }
    }

    writeln!(out, "Done. {} files processed.", files.len())?;
    Ok(write_torrent)
}

fn process_single_file(
    file: &mut SingleFile,
    content_dir: &Path,
    out: &mut impl Write,
) -> Result<bool, Error> {
    writeln!(out, "Generating md5 sum for single file torrent...")?;

    let file_path = path::resolve(content_dir, file.file_name());
    let digest = hash_file(&file_path)?;

    let verdict = digest.verdict(file.md5sum());
    writeln!(out, "{digest}  {}{verdict}", file_path.display())?;

    let write_torrent = verdict == Verdict::New;
    if write_torrent {
        file.set_md5sum(digest.to_hex());
    }

    writeln!(out, "Done. 1 file processed.")?;
    Ok(write_torrent)
}

fn hash_file(file_path: impl AsRef<Path>) -> Result<Md5Digest, Error> {
    log::debug!("Hashing {}", file_path.as_ref().display());
    checksum::compute_md5(&file_path).map_err(|source| Error::ReadFile {
        path: file_path.as_ref().to_owned(),
        source,
    })
}
