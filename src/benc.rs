use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::io;
use std::num::ParseIntError;
use std::str;
use thiserror::Error;

/// Decoded bencode value. Dictionary keys are always [`Element::ByteString`],
/// and the `BTreeMap` keeps them in the raw byte order bencode requires.
#[derive(Ord, PartialOrd, Eq, PartialEq, Debug, Clone)]
pub enum Element {
    Integer(i64),
    ByteString(Vec<u8>),
    List(Vec<Element>),
    Dictionary(BTreeMap<Element, Element>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input")]
    EmptySource,
    #[error("invalid element prefix {0:#04x}")]
    InvalidPrefix(u8),
    #[error("integer without terminating 'e'")]
    NoIntegerEnd,
    #[error("non-canonical integer '{0}'")]
    NonCanonicalInteger(String),
    #[error("string without ':' delimiter")]
    NoStringDelimiter,
    #[error("string length exceeds input")]
    InvalidStringLength,
    #[error("non-canonical string length '{0}'")]
    NonCanonicalLength(String),
    #[error("dictionary key is not a string")]
    NonStringKey,
    #[error("duplicate dictionary key {0}")]
    DuplicateKey(String),
    #[error("{0} bytes after the end of the top-level element")]
    TrailingData(usize),
    #[error("{0}")]
    Number(#[from] ParseIntError),
    #[error("{0}")]
    Utf8(#[from] str::Utf8Error),
}

impl From<ParseError> for io::Error {
    fn from(e: ParseError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, e)
    }
}

/// Returned by the checked accessors when an element has a different type than the caller needs.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected {expected}, found {found}")]
pub struct TypeMismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

impl Element {
    pub fn from_bytes(src: &[u8]) -> Result<Element, ParseError> {
        let (element, rest) = read_element(src)?;
        if !rest.is_empty() {
            return Err(ParseError::TrailingData(rest.len()));
        }
        Ok(element)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut dest = Vec::<u8>::new();
        write_element(self, &mut dest);
        dest
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Element::Integer(_) => "integer",
            Element::ByteString(_) => "string",
            Element::List(_) => "list",
            Element::Dictionary(_) => "dictionary",
        }
    }

    pub fn as_str(&self) -> Result<&str, TypeMismatch> {
        match self {
            Element::ByteString(data) => str::from_utf8(data).map_err(|_| TypeMismatch {
                expected: "utf-8 string",
                found: "binary string",
            }),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_list(&self) -> Result<&Vec<Element>, TypeMismatch> {
        match self {
            Element::List(list) => Ok(list),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn as_dictionary(&self) -> Result<&BTreeMap<Element, Element>, TypeMismatch> {
        match self {
            Element::Dictionary(map) => Ok(map),
            other => Err(other.mismatch("dictionary")),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, TypeMismatch> {
        match self {
            Element::ByteString(data) => Ok(data),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn into_list(self) -> Result<Vec<Element>, TypeMismatch> {
        match self {
            Element::List(list) => Ok(list),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn into_dictionary(self) -> Result<BTreeMap<Element, Element>, TypeMismatch> {
        match self {
            Element::Dictionary(map) => Ok(map),
            other => Err(other.mismatch("dictionary")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> TypeMismatch {
        TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Element::ByteString(Vec::<u8>::from(text))
    }
}

impl From<&[u8]> for Element {
    fn from(data: &[u8]) -> Self {
        Element::ByteString(Vec::from(data))
    }
}

impl From<i64> for Element {
    fn from(number: i64) -> Self {
        Element::Integer(number)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            write!(f, "{:width$}", "", width = depth * 2)
        }

        fn fmt_element(e: &Element, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            match e {
                Element::Integer(number) => write!(f, "{number}"),
                Element::ByteString(data) => match str::from_utf8(data) {
                    Ok(text) => write!(f, "\"{text}\""),
                    Err(_) => write!(f, "<{} bytes>", data.len()),
                },
                Element::List(list) => {
                    writeln!(f, "[")?;
                    for e in list {
                        indent(f, depth + 1)?;
                        fmt_element(e, f, depth + 1)?;
                        writeln!(f, ",")?;
                    }
                    indent(f, depth)?;
                    write!(f, "]")
                }
                Element::Dictionary(map) => {
                    writeln!(f, "{{")?;
                    for (key, value) in map {
                        indent(f, depth + 1)?;
                        fmt_element(key, f, depth + 1)?;
                        write!(f, ": ")?;
                        fmt_element(value, f, depth + 1)?;
                        writeln!(f, ",")?;
                    }
                    indent(f, depth)?;
                    write!(f, "}}")
                }
            }
        }

        fmt_element(self, f, 0)
    }
}

const DELIMITER_STRING: u8 = b':';
const PREFIX_INTEGER: u8 = b'i';
const PREFIX_LIST: u8 = b'l';
const PREFIX_DICTIONARY: u8 = b'd';
const SUFFIX_COMMON: u8 = b'e';

fn write_element(e: &Element, dest: &mut Vec<u8>) {
    match e {
        Element::Integer(number) => {
            dest.push(PREFIX_INTEGER);
            dest.extend_from_slice(number.to_string().as_bytes());
            dest.push(SUFFIX_COMMON);
        }
        Element::ByteString(data) => {
            dest.extend_from_slice(data.len().to_string().as_bytes());
            dest.push(DELIMITER_STRING);
            dest.extend_from_slice(data);
        }
        Element::List(list) => {
            dest.push(PREFIX_LIST);
            for e in list {
                write_element(e, dest);
            }
            dest.push(SUFFIX_COMMON);
        }
        Element::Dictionary(map) => {
            dest.push(PREFIX_DICTIONARY);
            for (key, value) in map {
                write_element(key, dest);
                write_element(value, dest);
            }
            dest.push(SUFFIX_COMMON);
        }
    }
}

fn read_element(src: &[u8]) -> Result<(Element, &[u8]), ParseError> {
    let first_byte = src.first().ok_or(ParseError::EmptySource)?;
    match *first_byte {
        b'0'..=b'9' => read_string(src),
        PREFIX_INTEGER => read_integer(&src[1..]),
        PREFIX_LIST => read_list(&src[1..]),
        PREFIX_DICTIONARY => read_dictionary(&src[1..]),
        other => Err(ParseError::InvalidPrefix(other)),
    }
}

fn split_once(src: &[u8], delimiter: u8) -> Option<(&[u8], &[u8])> {
    let index = src.iter().position(|b| *b == delimiter)?;
    Some((&src[..index], &src[index + 1..]))
}

fn read_integer(src: &[u8]) -> Result<(Element, &[u8]), ParseError> {
    let (number_data, rest) = split_once(src, SUFFIX_COMMON).ok_or(ParseError::NoIntegerEnd)?;
    let number_text = str::from_utf8(number_data)?;
    let number = number_text.parse::<i64>()?;

    // anything else would not survive a decode/encode round trip
    if number.to_string() != number_text {
        return Err(ParseError::NonCanonicalInteger(number_text.to_owned()));
    }
    Ok((Element::Integer(number), rest))
}

fn read_string(src: &[u8]) -> Result<(Element, &[u8]), ParseError> {
    let (size_data, rest) =
        split_once(src, DELIMITER_STRING).ok_or(ParseError::NoStringDelimiter)?;
    let size_text = str::from_utf8(size_data)?;
    let size = size_text.parse::<usize>()?;
    if size.to_string() != size_text {
        return Err(ParseError::NonCanonicalLength(size_text.to_owned()));
    }

    let data = rest.get(..size).ok_or(ParseError::InvalidStringLength)?;
    Ok((Element::ByteString(Vec::from(data)), &rest[size..]))
}

fn read_list(mut rest: &[u8]) -> Result<(Element, &[u8]), ParseError> {
    let mut list = Vec::new();
    loop {
        match rest.split_first() {
            None => return Err(ParseError::EmptySource),
            Some((&SUFFIX_COMMON, tail)) => return Ok((Element::List(list), tail)),
            Some(_) => {
                let (element, new_rest) = read_element(rest)?;
                list.push(element);
                rest = new_rest;
            }
        }
    }
}

fn read_dictionary(mut rest: &[u8]) -> Result<(Element, &[u8]), ParseError> {
    let mut map = BTreeMap::new();
    loop {
        match rest.split_first() {
            None => return Err(ParseError::EmptySource),
            Some((&SUFFIX_COMMON, tail)) => return Ok((Element::Dictionary(map), tail)),
            Some((b'0'..=b'9', _)) => {
                let (key, new_rest) = read_string(rest)?;
                let (value, new_rest) = read_element(new_rest)?;
                match map.entry(key) {
                    Entry::Vacant(entry) => {
                        entry.insert(value);
                    }
                    Entry::Occupied(entry) => {
                        return Err(ParseError::DuplicateKey(entry.key().to_string()));
                    }
                }
                rest = new_rest;
            }
            Some(_) => return Err(ParseError::NonStringKey),
        }
    }
}
