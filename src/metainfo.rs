use crate::benc::Element;
use crate::error::Error;
use crate::path;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

type Dictionary = BTreeMap<Element, Element>;

const KEY_INFO: &str = "info";
const KEY_FILES: &str = "files";
const KEY_NAME: &str = "name";
const KEY_PATH: &str = "path";
const KEY_MD5SUM: &str = "md5sum";

/// Parsed metainfo file. Owns everything needed to write the file back:
/// fields this tool doesn't interpret are carried along untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Metainfo {
    root: Dictionary,
    info: Info,
}

/// The info dictionary, split into the torrent shape and the remaining fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Info {
    content: Content,
    other: Dictionary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    MultiFile(Vec<FileEntry>),
    SingleFile(SingleFile),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleFile {
    name: Vec<u8>,
    md5sum: Option<Vec<u8>>,
}

/// One dictionary of the `files` list. Path segments keep whatever encoding the
/// torrent was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    path: Vec<Vec<u8>>,
    md5sum: Option<Vec<u8>>,
    other: Dictionary,
}

impl Metainfo {
    /// Read and parse metainfo file.
    pub fn from_file(metainfo_file: impl AsRef<Path>) -> Result<Self, Error> {
        let content = fs::read(&metainfo_file).map_err(|source| Error::OpenTorrent {
            path: metainfo_file.as_ref().to_owned(),
            source,
        })?;
        Self::from_bytes(&content)
    }

    pub fn from_bytes(content: &[u8]) -> Result<Self, Error> {
        let bencode = Element::from_bytes(content)?;
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Metainfo file content:\n{bencode}");
        }
        Self::from_bencode(bencode)
    }

    pub fn from_bencode(parsed: Element) -> Result<Self, Error> {
        let mut root = parsed.into_dictionary().map_err(Error::mismatch("metainfo"))?;
        let info = root.remove(&KEY_INFO.into()).ok_or(Error::MissingInfo)?;
        let info = Info::from_bencode(info)?;
        Ok(Self { root, info })
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut Info {
        &mut self.info
    }

    pub fn to_bencode(&self) -> Element {
        let mut root = self.root.clone();
        root.insert(KEY_INFO.into(), self.info.to_bencode());
        Element::Dictionary(root)
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_bencode().encode()
    }

    /// Overwrite `metainfo_file` with the bencoded content.
    pub fn write_to_file(&self, metainfo_file: impl AsRef<Path>) -> Result<(), Error> {
        fs::write(&metainfo_file, self.encode()).map_err(|source| Error::WriteTorrent {
            path: metainfo_file.as_ref().to_owned(),
            source,
        })
    }
}

impl Info {
    /// Classifies the torrent: a `files` list wins over a `name`, and having neither is an error.
    fn from_bencode(info: Element) -> Result<Self, Error> {
        let mut other = info.into_dictionary().map_err(Error::mismatch("info"))?;

        let content = if let Some(files) = other.remove(&KEY_FILES.into()) {
            let files = files
                .into_list()
                .map_err(Error::mismatch("info.files"))?
                .into_iter()
                .map(FileEntry::from_bencode)
                .collect::<Result<Vec<_>, _>>()?;
            Content::MultiFile(files)
        } else if let Some(name) = other.remove(&KEY_NAME.into()) {
            let name = name.into_bytes().map_err(Error::mismatch("info.name"))?;
            let md5sum = take_bytes(&mut other, KEY_MD5SUM, "info.md5sum")?;
            Content::SingleFile(SingleFile { name, md5sum })
        } else {
            return Err(Error::NoFiles);
        };

        Ok(Self { content, other })
    }

    fn to_bencode(&self) -> Element {
        let mut info = self.other.clone();
        match &self.content {
            Content::MultiFile(files) => {
                let files = files.iter().map(FileEntry::to_bencode).collect::<Vec<_>>();
                info.insert(KEY_FILES.into(), Element::List(files));
            }
            Content::SingleFile(file) => {
                info.insert(KEY_NAME.into(), file.name.as_slice().into());
                if let Some(md5sum) = &file.md5sum {
                    info.insert(KEY_MD5SUM.into(), md5sum.as_slice().into());
                }
            }
        }
        Element::Dictionary(info)
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Content {
        &mut self.content
    }
}

impl SingleFile {
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn file_name(&self) -> PathBuf {
        path::from_bytes(&self.name)
    }

    pub fn md5sum(&self) -> Option<&[u8]> {
        self.md5sum.as_deref()
    }

    pub fn set_md5sum(&mut self, md5sum: String) {
        self.md5sum = Some(md5sum.into_bytes());
    }
}

impl FileEntry {
    fn from_bencode(entry: Element) -> Result<Self, Error> {
        let mut other = entry.into_dictionary().map_err(Error::mismatch("info.files"))?;

        let path = other
            .remove(&KEY_PATH.into())
            .ok_or(Error::MissingField("info.files.path"))?
            .into_list()
            .map_err(Error::mismatch("info.files.path"))?
            .into_iter()
            .map(|segment| segment.into_bytes().map_err(Error::mismatch("info.files.path")))
            .collect::<Result<Vec<_>, _>>()?;

        let md5sum = take_bytes(&mut other, KEY_MD5SUM, "info.files.md5sum")?;
        Ok(Self { path, md5sum, other })
    }

    fn to_bencode(&self) -> Element {
        let mut entry = self.other.clone();
        let path = self.path.iter().map(|s| Element::from(s.as_slice())).collect::<Vec<_>>();
        entry.insert(KEY_PATH.into(), Element::List(path));
        if let Some(md5sum) = &self.md5sum {
            entry.insert(KEY_MD5SUM.into(), md5sum.as_slice().into());
        }
        Element::Dictionary(entry)
    }

    pub fn path_segments(&self) -> &[Vec<u8>] {
        &self.path
    }

    /// Path segments joined into a file name relative to the content directory.
    pub fn relative_path(&self) -> PathBuf {
        path::join_segments(self.path.as_slice())
    }

    pub fn md5sum(&self) -> Option<&[u8]> {
        self.md5sum.as_deref()
    }

    pub fn set_md5sum(&mut self, md5sum: String) {
        self.md5sum = Some(md5sum.into_bytes());
    }
}

fn take_bytes(
    dict: &mut Dictionary,
    key: &str,
    field: &'static str,
) -> Result<Option<Vec<u8>>, Error> {
    dict.remove(&key.into())
        .map(|e| e.into_bytes().map_err(Error::mismatch(field)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benc;

    const MULTI_FILE: &str = "d8:announce30:http://localhost:8000/announce4:infod5:filesld6:lengthi3e4:pathl3:sub5:a.txteed6:lengthi0e6:md5sum32:D41D8CD98F00B204E9800998ECF8427E4:pathl7:b.emptyeee4:name4:demo12:piece lengthi16384eee";
    const SINGLE_FILE: &str =
        "d4:infod6:lengthi11e4:name9:movie.mkv12:piece lengthi16384eee";

    #[test]
    fn test_parse_multi_file_torrent() {
        let metainfo = Metainfo::from_bytes(MULTI_FILE.as_bytes()).unwrap();

        let Content::MultiFile(files) = metainfo.info().content() else {
            panic!("not a multi-file torrent");
        };
        assert_eq!(2, files.len());

        assert_eq!([b"sub".as_slice(), b"a.txt".as_slice()], files[0].path_segments());
        assert_eq!(Path::new("sub/a.txt"), files[0].relative_path());
        assert_eq!(None, files[0].md5sum());

        assert_eq!(Path::new("b.empty"), files[1].relative_path());
        assert_eq!(Some(b"D41D8CD98F00B204E9800998ECF8427E".as_slice()), files[1].md5sum());
    }

    #[test]
    fn test_parse_single_file_torrent() {
        let metainfo = Metainfo::from_bytes(SINGLE_FILE.as_bytes()).unwrap();

        let Content::SingleFile(file) = metainfo.info().content() else {
            panic!("not a single-file torrent");
        };
        assert_eq!(b"movie.mkv".as_slice(), file.name());
        assert_eq!(Path::new("movie.mkv"), file.file_name());
        assert_eq!(None, file.md5sum());
    }

    #[test]
    fn test_keep_non_utf8_names_and_checksums() {
        let input: &[u8] = b"d4:infod5:filesld6:md5sum2:\xff\xfe4:pathl3:sub8:\xcf\xf0\xe8\xe2.txteee4:name2:\xc4\xeeee";
        let metainfo = Metainfo::from_bytes(input).unwrap();

        let Content::MultiFile(files) = metainfo.info().content() else {
            panic!("not a multi-file torrent");
        };
        assert_eq!(
            [b"sub".as_slice(), b"\xcf\xf0\xe8\xe2.txt".as_slice()],
            files[0].path_segments()
        );
        assert_eq!(Some(b"\xff\xfe".as_slice()), files[0].md5sum());
        assert_eq!(input, metainfo.encode().as_slice());

        let input: &[u8] = b"d4:infod4:name4:\xcf\xf0\xe8\xe2ee";
        let metainfo = Metainfo::from_bytes(input).unwrap();
        let Content::SingleFile(file) = metainfo.info().content() else {
            panic!("not a single-file torrent");
        };
        assert_eq!(b"\xcf\xf0\xe8\xe2".as_slice(), file.name());
        assert_eq!(input, metainfo.encode().as_slice());
    }

    #[test]
    fn test_unmodified_metainfo_encodes_identically() {
        for input in [MULTI_FILE, SINGLE_FILE] {
            let metainfo = Metainfo::from_bytes(input.as_bytes()).unwrap();
            assert_eq!(input.as_bytes(), metainfo.encode().as_slice());
        }
    }

    #[test]
    fn test_add_md5sum_to_file_entry() {
        let mut metainfo = Metainfo::from_bytes(MULTI_FILE.as_bytes()).unwrap();
        if let Content::MultiFile(files) = metainfo.info_mut().content_mut() {
            files[0].set_md5sum("900150983cd24fb0d6963f7d28e17f72".to_owned());
        }

        let encoded = metainfo.encode();
        let expected = MULTI_FILE.replace(
            "d6:lengthi3e4:pathl3:sub5:a.txtee",
            "d6:lengthi3e6:md5sum32:900150983cd24fb0d6963f7d28e17f724:pathl3:sub5:a.txtee",
        );
        assert_eq!(expected.as_bytes(), encoded.as_slice());

        let reparsed = Metainfo::from_bytes(&encoded).unwrap();
        assert_eq!(metainfo, reparsed);
    }

    #[test]
    fn test_add_md5sum_to_single_file_info() {
        let mut metainfo = Metainfo::from_bytes(SINGLE_FILE.as_bytes()).unwrap();
        if let Content::SingleFile(file) = metainfo.info_mut().content_mut() {
            file.set_md5sum("5eb63bbbe01eeed093cb22bb8f5acdc3".to_owned());
        }

        let expected = "d4:infod6:lengthi11e6:md5sum32:5eb63bbbe01eeed093cb22bb8f5acdc34:name9:movie.mkv12:piece lengthi16384eee";
        assert_eq!(expected.as_bytes(), metainfo.encode().as_slice());
    }

    #[test]
    fn test_files_take_precedence_over_name() {
        let metainfo = Metainfo::from_bytes(MULTI_FILE.as_bytes()).unwrap();
        assert!(matches!(metainfo.info().content(), Content::MultiFile(_)));
        // the directory name stays an ordinary info field
        assert!(String::from_utf8(metainfo.encode()).unwrap().contains("4:name4:demo"));
    }

    #[test]
    fn test_reject_info_without_files_and_name() {
        let result = Metainfo::from_bytes(b"d4:infod6:lengthi11eee");
        assert!(matches!(result, Err(Error::NoFiles)), "{result:?}");
    }

    #[test]
    fn test_reject_missing_or_invalid_info() {
        let result = Metainfo::from_bytes(b"d8:announce3:urle");
        assert!(matches!(result, Err(Error::MissingInfo)), "{result:?}");

        let result = Metainfo::from_bytes(b"d4:infoi1ee");
        assert!(matches!(result, Err(Error::TypeMismatch { field: "info", .. })), "{result:?}");

        let result = Metainfo::from_bytes(b"li1ee");
        assert!(matches!(result, Err(Error::TypeMismatch { field: "metainfo", .. })), "{result:?}");
    }

    #[test]
    fn test_reject_mistyped_fields() {
        let result = Metainfo::from_bytes(b"d4:infod5:files3:abcee");
        assert!(matches!(result, Err(Error::TypeMismatch { field: "info.files", .. })));

        let result = Metainfo::from_bytes(b"d4:infod5:filesld4:pathli1eeeeee");
        assert!(matches!(result, Err(Error::TypeMismatch { field: "info.files.path", .. })));

        let result = Metainfo::from_bytes(b"d4:infod5:filesld6:lengthi1eeeee");
        assert!(matches!(result, Err(Error::MissingField("info.files.path"))));

        let result = Metainfo::from_bytes(b"d4:infod4:namei5eee");
        assert!(matches!(result, Err(Error::TypeMismatch { field: "info.name", .. })));

        let result = Metainfo::from_bytes(b"d4:infod6:md5sumi5e4:name1:aee");
        assert!(matches!(result, Err(Error::TypeMismatch { field: "info.md5sum", .. })));
    }

    #[test]
    fn test_reject_malformed_bencode() {
        let result = Metainfo::from_bytes(b"d4:info");
        assert!(matches!(result, Err(Error::Parse(benc::ParseError::EmptySource))), "{result:?}");
    }

    #[test]
    fn test_read_missing_metainfo_file() {
        let result = Metainfo::from_file("test_read_missing_metainfo_file.torrent");
        assert!(matches!(result, Err(Error::OpenTorrent { .. })), "{result:?}");
    }
}
