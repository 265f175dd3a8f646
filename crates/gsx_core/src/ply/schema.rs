//! Vertex schema discovery.
//!
//! Turns the `vertex` element of a [`PlyHeader`] into a name -> byte offset
//! table, validates that every attribute a Gaussian needs is present as a
//! 32-bit float, and counts the `f_rest_*` coefficient columns.

use std::collections::HashMap;

use super::error::{DecodeError, DecodeResult};
use super::header::{PlyFormat, PlyHeader, PlyProperty, ScalarType};

/// Name of the element holding one record per Gaussian.
pub const VERTEX_ELEMENT: &str = "vertex";

/// Prefix of the higher-order spherical harmonics columns.
pub const REST_PREFIX: &str = "f_rest";

/// Properties every Gaussian record must carry, in canonical order.
#[rustfmt::skip]
pub const REQUIRED_PROPERTIES: [&str; 14] = [
    "x", "y", "z",
    "opacity",
    "scale_0", "scale_1", "scale_2",
    "rot_0", "rot_1", "rot_2", "rot_3",
    "f_dc_0", "f_dc_1", "f_dc_2",
];

/// Name of the `index`-th rest coefficient column.
pub fn rest_property_name(index: usize) -> String {
    format!("{}_{}", REST_PREFIX, index)
}

/// The canonical property list for `rest_count` rest coefficients:
/// `x, y, z, opacity, scale_0..2, rot_0..3, f_dc_0..2, f_rest_0..`.
pub fn canonical_property_names(rest_count: usize) -> Vec<String> {
    REQUIRED_PROPERTIES
        .iter()
        .map(|s| s.to_string())
        .chain((0..rest_count).map(rest_property_name))
        .collect()
}

/// Byte order of binary record data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Validated layout of the vertex element.
#[derive(Clone, Debug)]
pub struct VertexSchema {
    count: usize,
    names: Vec<String>,
    types: Vec<ScalarType>,
    offsets: Vec<usize>,
    index: HashMap<String, usize>,
    stride: usize,
    data_offset: usize,
    endianness: Endianness,
    rest_count: usize,
}

impl VertexSchema {
    /// Build the schema from a parsed header.
    ///
    /// Fails with `UnsupportedSchema` when the vertex element is absent,
    /// a required attribute is missing or not a float, the `f_rest_*`
    /// columns are not numbered `0..N`, or the record size cannot be
    /// known up front (list properties, ASCII data).
    pub fn from_header(header: &PlyHeader) -> DecodeResult<Self> {
        let endianness = match header.format {
            PlyFormat::BinaryLittleEndian => Endianness::Little,
            PlyFormat::BinaryBigEndian => Endianness::Big,
            PlyFormat::Ascii => {
                return Err(DecodeError::unsupported(
                    "ascii PLY is not supported, expected binary vertex data",
                ))
            }
        };

        let vertex_pos = header
            .elements
            .iter()
            .position(|e| e.name == VERTEX_ELEMENT)
            .ok_or_else(|| DecodeError::unsupported("no \"vertex\" element"))?;

        // Elements stored before the vertex block have to be skipped byte-wise.
        let mut data_offset = 0usize;
        for element in &header.elements[..vertex_pos] {
            let stride = element.fixed_stride().ok_or_else(|| {
                DecodeError::unsupported(format!(
                    "element \"{}\" precedes \"vertex\" and has list properties",
                    element.name
                ))
            })?;
            data_offset = stride
                .checked_mul(element.count)
                .and_then(|size| data_offset.checked_add(size))
                .ok_or_else(|| {
                    DecodeError::malformed(element.line, "declared element size overflows")
                })?;
        }

        let vertex = &header.elements[vertex_pos];
        let mut names = Vec::with_capacity(vertex.properties.len());
        let mut types = Vec::with_capacity(vertex.properties.len());
        let mut offsets = Vec::with_capacity(vertex.properties.len());
        let mut index = HashMap::with_capacity(vertex.properties.len());
        let mut stride = 0usize;

        for property in &vertex.properties {
            let (name, ty) = match property {
                PlyProperty::Scalar { name, ty } => (name, *ty),
                PlyProperty::List { name, .. } => {
                    return Err(DecodeError::unsupported(format!(
                        "vertex property \"{}\" is a list",
                        name
                    )))
                }
            };
            if index.insert(name.clone(), names.len()).is_some() {
                return Err(DecodeError::unsupported(format!(
                    "vertex property \"{}\" is declared twice",
                    name
                )));
            }
            names.push(name.clone());
            types.push(ty);
            offsets.push(stride);
            stride += ty.size_bytes();
        }

        stride.checked_mul(vertex.count).ok_or_else(|| {
            DecodeError::malformed(vertex.line, "declared vertex data size overflows")
        })?;

        let rest_count = names.iter().filter(|n| n.starts_with(REST_PREFIX)).count();

        let schema = Self {
            count: vertex.count,
            names,
            types,
            offsets,
            index,
            stride,
            data_offset,
            endianness,
            rest_count,
        };
        schema.validate()?;

        log::debug!(
            "Vertex schema: {} records, {} properties, stride {} bytes, {} f_rest columns",
            schema.count,
            schema.names.len(),
            schema.stride,
            schema.rest_count
        );

        Ok(schema)
    }

    fn validate(&self) -> DecodeResult<()> {
        let missing: Vec<&str> = REQUIRED_PROPERTIES
            .iter()
            .copied()
            .filter(|name| !self.index.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(DecodeError::unsupported(format!(
                "vertex element is missing {}",
                missing.join(", ")
            )));
        }

        for i in 0..self.rest_count {
            let name = rest_property_name(i);
            if !self.index.contains_key(&name) {
                return Err(DecodeError::unsupported(format!(
                    "found {} {} properties but no \"{}\"",
                    self.rest_count, REST_PREFIX, name
                )));
            }
        }

        let float_columns = REQUIRED_PROPERTIES
            .iter()
            .map(|s| s.to_string())
            .chain((0..self.rest_count).map(rest_property_name));
        for name in float_columns {
            let ty = self.types[self.index[&name]];
            if ty != ScalarType::Float32 {
                return Err(DecodeError::unsupported(format!(
                    "vertex property \"{}\" is {:?}, expected float",
                    name, ty
                )));
            }
        }

        Ok(())
    }

    /// Number of vertex records declared in the header.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Size of one vertex record in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes of element data preceding the vertex block.
    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    /// Total size of the vertex block in bytes.
    pub fn data_len(&self) -> usize {
        // Checked in `from_header`.
        self.stride * self.count
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Number of `f_rest*` properties.
    pub fn rest_count(&self) -> usize {
        self.rest_count
    }

    /// Property names in declared order.
    pub fn property_names(&self) -> &[String] {
        &self.names
    }

    /// Declared position of a property.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Byte offset of a property within a record.
    pub fn byte_offset(&self, name: &str) -> Option<usize> {
        self.position_of(name).map(|i| self.offsets[i])
    }

    /// True if the properties are exactly the canonical list in canonical order.
    pub fn is_canonical(&self) -> bool {
        self.names == canonical_property_names(self.rest_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::header::parse_header;
    use crate::ply::testing::header_text;
    use std::io::Cursor;

    fn schema_for(text: &str) -> DecodeResult<VertexSchema> {
        let header = parse_header(&mut Cursor::new(text.as_bytes().to_vec()))?;
        VertexSchema::from_header(&header)
    }

    fn float_props(names: &[String]) -> Vec<(&'static str, String)> {
        names.iter().map(|n| ("float", n.clone())).collect()
    }

    #[test]
    fn test_canonical_schema() {
        let names = canonical_property_names(9);
        let text = header_text("binary_little_endian", &[], 2, &float_props(&names));
        let schema = schema_for(&text).unwrap();

        assert!(schema.is_canonical());
        assert_eq!(schema.count(), 2);
        assert_eq!(schema.rest_count(), 9);
        assert_eq!(schema.stride(), (14 + 9) * 4);
        assert_eq!(schema.byte_offset("opacity"), Some(12));
        assert_eq!(schema.byte_offset("f_dc_0"), Some(11 * 4));
        assert_eq!(schema.byte_offset("f_rest_8"), Some(22 * 4));
        assert_eq!(schema.endianness(), Endianness::Little);
    }

    #[test]
    fn test_extra_properties_are_sized() {
        let mut props = vec![
            ("float", "x".to_string()),
            ("float", "y".to_string()),
            ("float", "z".to_string()),
            ("float", "nx".to_string()),
            ("double", "ny".to_string()),
            ("uchar", "red".to_string()),
        ];
        props.extend(float_props(&canonical_property_names(0)[3..]));
        let text = header_text("binary_big_endian", &[], 1, &props);
        let schema = schema_for(&text).unwrap();

        assert!(!schema.is_canonical());
        assert_eq!(schema.byte_offset("ny"), Some(16));
        assert_eq!(schema.byte_offset("red"), Some(24));
        assert_eq!(schema.byte_offset("opacity"), Some(25));
        assert_eq!(schema.stride(), 25 + 11 * 4);
        assert_eq!(schema.endianness(), Endianness::Big);
    }

    #[test]
    fn test_preceding_element_offset() {
        let names = canonical_property_names(0);
        let text = header_text(
            "binary_little_endian",
            &[("camera", 2, vec![("float", "fx".to_string()), ("uchar", "id".to_string())])],
            1,
            &float_props(&names),
        );
        let schema = schema_for(&text).unwrap();
        assert_eq!(schema.data_offset(), 10);
    }

    #[test]
    fn test_missing_required_properties() {
        let names: Vec<String> = canonical_property_names(0)
            .into_iter()
            .filter(|n| n != "rot_2" && n != "opacity")
            .collect();
        let text = header_text("binary_little_endian", &[], 1, &float_props(&names));

        match schema_for(&text).unwrap_err() {
            DecodeError::UnsupportedSchema(message) => {
                assert!(message.contains("opacity"));
                assert!(message.contains("rot_2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_vertex_element() {
        let text = "ply\nformat binary_little_endian 1.0\nelement face 0\nproperty list uchar int vertex_indices\nend_header\n";
        assert!(matches!(
            schema_for(text).unwrap_err(),
            DecodeError::UnsupportedSchema(_)
        ));
    }

    #[test]
    fn test_rest_gap_rejected() {
        let mut names = canonical_property_names(3);
        names[16] = "f_rest_7".to_string();
        let text = header_text("binary_little_endian", &[], 1, &float_props(&names));
        assert!(matches!(
            schema_for(&text).unwrap_err(),
            DecodeError::UnsupportedSchema(_)
        ));
    }

    #[test]
    fn test_non_float_required_rejected() {
        let mut props = float_props(&canonical_property_names(0));
        props[3].0 = "double";
        let text = header_text("binary_little_endian", &[], 1, &props);
        assert!(matches!(
            schema_for(&text).unwrap_err(),
            DecodeError::UnsupportedSchema(_)
        ));
    }

    #[test]
    fn test_ascii_rejected() {
        let text = header_text("ascii", &[], 1, &float_props(&canonical_property_names(0)));
        assert!(matches!(
            schema_for(&text).unwrap_err(),
            DecodeError::UnsupportedSchema(_)
        ));
    }

    #[test]
    fn test_list_before_vertex_rejected() {
        let text = header_text(
            "binary_little_endian",
            &[("face", 1, vec![("list uchar int", "vertex_indices".to_string())])],
            1,
            &float_props(&canonical_property_names(0)),
        );
        assert!(matches!(
            schema_for(&text).unwrap_err(),
            DecodeError::UnsupportedSchema(_)
        ));
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let mut names = canonical_property_names(0);
        names.push("x".to_string());
        let text = header_text("binary_little_endian", &[], 1, &float_props(&names));
        assert!(matches!(
            schema_for(&text).unwrap_err(),
            DecodeError::UnsupportedSchema(_)
        ));
    }

    #[test]
    fn test_overflowing_count_rejected() {
        let text = header_text(
            "binary_little_endian",
            &[],
            usize::MAX / 2,
            &float_props(&canonical_property_names(0)),
        );
        assert!(matches!(
            schema_for(&text).unwrap_err(),
            DecodeError::MalformedHeader { .. }
        ));
    }
}
