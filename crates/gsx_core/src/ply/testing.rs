//! Builders for synthetic PLY files used by the unit tests.

use std::fmt::Write;

use super::schema::{canonical_property_names, Endianness};

/// Header text with optional elements declared ahead of `vertex`.
///
/// Property entries are `(type, name)`; the type is written verbatim so
/// `"list uchar int"` produces a list property.
pub fn header_text(
    format: &str,
    preceding: &[(&str, usize, Vec<(&'static str, String)>)],
    count: usize,
    properties: &[(&'static str, String)],
) -> String {
    let mut text = format!("ply\nformat {} 1.0\ncomment synthetic\n", format);
    for (name, element_count, props) in preceding {
        writeln!(text, "element {} {}", name, element_count).unwrap();
        for (ty, prop) in props {
            writeln!(text, "property {} {}", ty, prop).unwrap();
        }
    }
    writeln!(text, "element vertex {}", count).unwrap();
    for (ty, name) in properties {
        writeln!(text, "property {} {}", ty, name).unwrap();
    }
    text.push_str("end_header\n");
    text
}

/// A float-only PLY file with the given property order and rows.
pub fn float_ply(endianness: Endianness, names: &[String], rows: &[Vec<f32>]) -> Vec<u8> {
    let format = match endianness {
        Endianness::Little => "binary_little_endian",
        Endianness::Big => "binary_big_endian",
    };
    let props: Vec<(&'static str, String)> = names.iter().map(|n| ("float", n.clone())).collect();
    let mut bytes = header_text(format, &[], rows.len(), &props).into_bytes();
    for row in rows {
        assert_eq!(row.len(), names.len());
        for value in row {
            match endianness {
                Endianness::Little => bytes.extend_from_slice(&value.to_le_bytes()),
                Endianness::Big => bytes.extend_from_slice(&value.to_be_bytes()),
            }
        }
    }
    bytes
}

/// Canonical-order row whose every column holds a distinct value.
pub fn sample_row(record: usize, rest_count: usize) -> Vec<f32> {
    (0..14 + rest_count)
        .map(|column| record as f32 * 100.0 + column as f32 + 0.5)
        .collect()
}

/// Canonical-order little-endian file with `count` sample rows.
pub fn sample_ply(count: usize, rest_count: usize) -> Vec<u8> {
    let rows: Vec<Vec<f32>> = (0..count).map(|i| sample_row(i, rest_count)).collect();
    float_ply(Endianness::Little, &canonical_property_names(rest_count), &rows)
}
