//! PLY header parser.
//!
//! Reads the ASCII header line by line up to and including `end_header`,
//! leaving the reader positioned at the first byte of element data.
//!
//! # Supported Syntax
//!
//! - `ply` magic line
//! - `format <ascii|binary_little_endian|binary_big_endian> <version>`
//! - `element <name> <count>`
//! - `property <type> <name>`
//! - `property list <count-type> <item-type> <name>`
//! - `comment ...`, `obj_info ...`
//! - `end_header`

use std::io::{BufRead, Read};

use super::error::{DecodeError, DecodeResult};

/// Upper bound on header size. Real splat headers are a few KiB.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Encoding of the element data that follows the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl PlyFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ascii" => Some(PlyFormat::Ascii),
            "binary_little_endian" => Some(PlyFormat::BinaryLittleEndian),
            "binary_big_endian" => Some(PlyFormat::BinaryBigEndian),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlyFormat::Ascii => "ascii",
            PlyFormat::BinaryLittleEndian => "binary_little_endian",
            PlyFormat::BinaryBigEndian => "binary_big_endian",
        }
    }
}

/// Scalar property type, including the sized aliases (`float32`, `uint8`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl ScalarType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "char" | "int8" => Some(ScalarType::Int8),
            "uchar" | "uint8" => Some(ScalarType::UInt8),
            "short" | "int16" => Some(ScalarType::Int16),
            "ushort" | "uint16" => Some(ScalarType::UInt16),
            "int" | "int32" => Some(ScalarType::Int32),
            "uint" | "uint32" => Some(ScalarType::UInt32),
            "float" | "float32" => Some(ScalarType::Float32),
            "double" | "float64" => Some(ScalarType::Float64),
            _ => None,
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::UInt8 => 1,
            ScalarType::Int16 | ScalarType::UInt16 => 2,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => 4,
            ScalarType::Float64 => 8,
        }
    }
}

/// A property declared on an element.
#[derive(Clone, Debug, PartialEq)]
pub enum PlyProperty {
    Scalar {
        name: String,
        ty: ScalarType,
    },
    List {
        name: String,
        count_ty: ScalarType,
        item_ty: ScalarType,
    },
}

impl PlyProperty {
    pub fn name(&self) -> &str {
        match self {
            PlyProperty::Scalar { name, .. } | PlyProperty::List { name, .. } => name,
        }
    }
}

/// An element declaration with its properties in declared order.
#[derive(Clone, Debug, PartialEq)]
pub struct PlyElement {
    pub name: String,
    pub count: usize,
    pub properties: Vec<PlyProperty>,
    /// Header line the element was declared on (1-based)
    pub line: usize,
}

impl PlyElement {
    /// Size in bytes of one binary record, or `None` if any property is a list.
    pub fn fixed_stride(&self) -> Option<usize> {
        self.properties.iter().try_fold(0usize, |acc, p| match p {
            PlyProperty::Scalar { ty, .. } => Some(acc + ty.size_bytes()),
            PlyProperty::List { .. } => None,
        })
    }
}

/// A parsed PLY header.
#[derive(Clone, Debug, PartialEq)]
pub struct PlyHeader {
    pub format: PlyFormat,
    pub version: String,
    pub elements: Vec<PlyElement>,
    pub comments: Vec<String>,
    /// Number of bytes consumed, including the `end_header` line terminator
    pub header_len: usize,
}

impl PlyHeader {
    pub fn element(&self, name: &str) -> Option<&PlyElement> {
        self.elements.iter().find(|e| e.name == name)
    }
}

/// Parse a PLY header from the start of `reader`.
///
/// Only header bytes are consumed. On success the reader is positioned
/// immediately after the `end_header` line.
pub fn parse_header<R: BufRead>(reader: &mut R) -> DecodeResult<PlyHeader> {
    let mut raw = Vec::new();
    let mut consumed = 0usize;
    let mut line_no = 0usize;

    let mut format: Option<(PlyFormat, String)> = None;
    let mut elements: Vec<PlyElement> = Vec::new();
    let mut comments = Vec::new();

    loop {
        raw.clear();
        let budget = MAX_HEADER_BYTES.saturating_sub(consumed);
        let n = (&mut *reader).take(budget as u64).read_until(b'\n', &mut raw)?;
        consumed += n;
        line_no += 1;

        if raw.last() != Some(&b'\n') {
            return Err(if consumed >= MAX_HEADER_BYTES {
                DecodeError::malformed(
                    line_no,
                    format!("header exceeds {} bytes", MAX_HEADER_BYTES),
                )
            } else {
                DecodeError::malformed(line_no, "unexpected end of file before end_header")
            });
        }

        let text = std::str::from_utf8(&raw)
            .map_err(|_| DecodeError::malformed(line_no, "header is not valid UTF-8"))?;
        let line = text.trim();

        if line_no == 1 {
            if line != "ply" {
                return Err(DecodeError::malformed(line_no, "first line must be \"ply\""));
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let tag = tokens.next().unwrap_or("");

        match tag {
            "end_header" => break,
            "comment" => {
                comments.push(line["comment".len()..].trim().to_string());
            }
            "obj_info" => {}
            "format" => {
                if format.is_some() {
                    return Err(DecodeError::malformed(line_no, "duplicate format line"));
                }
                let fmt = tokens
                    .next()
                    .ok_or_else(|| DecodeError::malformed(line_no, "format line has no format"))?;
                let fmt = PlyFormat::parse(fmt).ok_or_else(|| {
                    DecodeError::malformed(line_no, format!("unknown format '{}'", fmt))
                })?;
                let version = tokens
                    .next()
                    .ok_or_else(|| DecodeError::malformed(line_no, "format line has no version"))?;
                if version != "1.0" {
                    log::warn!("PLY header declares version {}, reading as 1.0", version);
                }
                format = Some((fmt, version.to_string()));
            }
            "element" => {
                let (name, count) = match (tokens.next(), tokens.next(), tokens.next()) {
                    (Some(name), Some(count), None) => (name, count),
                    _ => {
                        return Err(DecodeError::malformed(
                            line_no,
                            "expected 'element <name> <count>'",
                        ))
                    }
                };
                let count: usize = count.parse().map_err(|_| {
                    DecodeError::malformed(line_no, format!("bad element count '{}'", count))
                })?;
                elements.push(PlyElement {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                    line: line_no,
                });
            }
            "property" => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| DecodeError::malformed(line_no, "property before element"))?;
                let property = parse_property(tokens.collect(), line_no)?;
                element.properties.push(property);
            }
            other => {
                return Err(DecodeError::malformed(
                    line_no,
                    format!("unknown header directive '{}'", other),
                ));
            }
        }
    }

    let (format, version) =
        format.ok_or_else(|| DecodeError::malformed(line_no, "missing format line"))?;

    Ok(PlyHeader {
        format,
        version,
        elements,
        comments,
        header_len: consumed,
    })
}

fn parse_property(tokens: Vec<&str>, line: usize) -> DecodeResult<PlyProperty> {
    let scalar = |s: &str| {
        ScalarType::parse(s)
            .ok_or_else(|| DecodeError::malformed(line, format!("unknown property type '{}'", s)))
    };

    match tokens.as_slice() {
        ["list", count_ty, item_ty, name] => Ok(PlyProperty::List {
            name: name.to_string(),
            count_ty: scalar(*count_ty)?,
            item_ty: scalar(*item_ty)?,
        }),
        [ty, name] if *ty != "list" => Ok(PlyProperty::Scalar {
            name: name.to_string(),
            ty: scalar(*ty)?,
        }),
        _ => Err(DecodeError::malformed(line, "expected 'property <type> <name>'")),
    }
}
