//! High-level PLY scene import.
//!
//! This module is the main entry point: it composes header parsing, schema
//! validation, SH layout derivation and record decoding, and returns either
//! a complete [`GaussianScene`] or an error. A failed import never yields a
//! partially decoded scene.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ply::{
    decode_records, parse_header, DecodeError, DecodeResult, ErrorKind, FieldOffsets, RecordView,
    RestOrder, ShLayout, VertexSchema,
};
use crate::progress::{NoProgress, ProgressSink};
use crate::scene::GaussianScene;

/// Import configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Ordering of the `f_rest_*` columns
    pub rest_order: RestOrder,

    /// Records between progress reports (values below 1 act as 1)
    pub progress_interval: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            rest_order: RestOrder::Interleaved,
            progress_interval: 4096,
        }
    }
}

impl ImportOptions {
    /// Progress interval clamped to at least one record.
    pub fn progress_interval(&self) -> usize {
        self.progress_interval.max(1)
    }
}

/// Stages of a single import. An import only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportState {
    Unopened,
    HeaderParsed,
    SchemaValidated,
    LayoutDerived,
    Allocated,
    Decoding,
    Complete,
    Failed,
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error from importing a file, tagged with its path.
#[derive(Error, Debug)]
#[error("Failed to import {}: {}", .path.display(), .source)]
pub struct ImportError {
    pub path: PathBuf,
    #[source]
    pub source: DecodeError,
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Result type for file imports.
pub type ImportResult<T> = Result<T, ImportError>;

/// Tracks one import through its states.
pub(crate) struct ImportRun {
    name: String,
    state: ImportState,
    history: Vec<ImportState>,
}

impl ImportRun {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: ImportState::Unopened,
            history: vec![ImportState::Unopened],
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> ImportState {
        self.state
    }

    fn advance(&mut self, next: ImportState) {
        debug_assert!(next > self.state, "{} -> {}", self.state, next);
        log::debug!("{}: {} -> {}", self.name, self.state, next);
        self.state = next;
        self.history.push(next);
    }

    /// Run the pipeline. Ends in `Complete` or `Failed`.
    pub(crate) fn run<R: BufRead, S: ProgressSink + ?Sized>(
        &mut self,
        reader: R,
        options: &ImportOptions,
        progress: &mut S,
    ) -> DecodeResult<GaussianScene> {
        match self.decode(reader, options, progress) {
            Ok(scene) => {
                self.advance(ImportState::Complete);
                Ok(scene)
            }
            Err(e) => {
                log::debug!(
                    "{}: failed in state {} (after {:?}): {}",
                    self.name,
                    self.state,
                    self.history,
                    e
                );
                self.advance(ImportState::Failed);
                Err(e)
            }
        }
    }

    fn decode<R: BufRead, S: ProgressSink + ?Sized>(
        &mut self,
        mut reader: R,
        options: &ImportOptions,
        progress: &mut S,
    ) -> DecodeResult<GaussianScene> {
        let header = parse_header(&mut reader)?;
        self.advance(ImportState::HeaderParsed);

        let schema = VertexSchema::from_header(&header)?;
        self.advance(ImportState::SchemaValidated);

        let layout = ShLayout::from_rest_count(schema.rest_count())?;
        let offsets = FieldOffsets::resolve(&schema, &layout, options.rest_order)?;
        self.advance(ImportState::LayoutDerived);
        log::debug!(
            "{}: {} f_rest properties, {} coefficients per channel, SH degree {}{}",
            self.name,
            layout.rest_coefficient_count(),
            layout.coefficients_per_channel(),
            layout.sh_dim(),
            if layout.is_exact_degree() { "" } else { " (approximate)" }
        );

        let data = read_vertex_block(&mut reader, &schema)?;
        let view = RecordView::new(&data, schema.stride(), schema.count(), schema.endianness())?;
        let mut scene = GaussianScene::allocate(self.name.as_str(), layout, schema.count());
        self.advance(ImportState::Allocated);

        self.advance(ImportState::Decoding);
        decode_records(
            &view,
            &offsets,
            &mut scene,
            options.progress_interval(),
            progress,
        )?;

        Ok(scene)
    }
}

/// Skip preceding elements, then read exactly the vertex block.
///
/// The buffer grows with the bytes actually present, so a hostile count in
/// the header cannot force a large allocation.
fn read_vertex_block<R: BufRead>(reader: &mut R, schema: &VertexSchema) -> DecodeResult<Vec<u8>> {
    let skip = schema.data_offset() as u64;
    let skipped = io::copy(&mut reader.by_ref().take(skip), &mut io::sink())?;
    if skipped < skip {
        return Err(DecodeError::TruncatedData {
            expected: schema.data_offset().saturating_add(schema.data_len()),
            available: skipped as usize,
        });
    }

    let mut data = Vec::new();
    reader
        .by_ref()
        .take(schema.data_len() as u64)
        .read_to_end(&mut data)?;
    if data.len() < schema.data_len() {
        return Err(DecodeError::TruncatedData {
            expected: schema.data_len(),
            available: data.len(),
        });
    }
    Ok(data)
}

/// Decode a PLY stream positioned at the start of the file.
pub fn decode_ply<R: BufRead, S: ProgressSink + ?Sized>(
    reader: R,
    name: &str,
    options: &ImportOptions,
    progress: &mut S,
) -> DecodeResult<GaussianScene> {
    ImportRun::new(name).run(reader, options, progress)
}

/// Decode a PLY file held in memory.
pub fn decode_ply_bytes<S: ProgressSink + ?Sized>(
    bytes: &[u8],
    name: &str,
    options: &ImportOptions,
    progress: &mut S,
) -> DecodeResult<GaussianScene> {
    decode_ply(bytes, name, options, progress)
}

/// Import a PLY file with default options and no progress reporting.
///
/// The scene is named after the file stem.
///
/// # Example
///
/// ```ignore
/// use gsx_core::import::import_ply;
///
/// let scene = import_ply("garden.ply")?;
/// println!("Loaded {} gaussians", scene.len());
/// ```
pub fn import_ply<P: AsRef<Path>>(path: P) -> ImportResult<GaussianScene> {
    import_ply_with(path, &ImportOptions::default(), &mut NoProgress)
}

/// Import a PLY file with explicit options and a progress sink.
pub fn import_ply_with<P: AsRef<Path>, S: ProgressSink + ?Sized>(
    path: P,
    options: &ImportOptions,
    progress: &mut S,
) -> ImportResult<GaussianScene> {
    let path = path.as_ref();
    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed");
    let fail = |source: DecodeError| ImportError {
        path: path.to_path_buf(),
        source,
    };

    log::info!("Importing PLY: {}", path.display());
    let file = File::open(path).map_err(|e| fail(e.into()))?;
    let scene = decode_ply(BufReader::new(file), name, options, progress).map_err(|e| {
        log::error!("Import of {} failed: {}", path.display(), e);
        fail(e)
    })?;

    log::info!(
        "Imported {} gaussians from {} (SH degree {}, {} coefficients per channel)",
        scene.len(),
        path.display(),
        scene.sh_dim(),
        scene.sh_coefficients_count()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::testing::{header_text, sample_ply, sample_row};
    use gsx_math::Vec3;

    #[test]
    fn test_decode_sample() {
        let bytes = sample_ply(3, 24);
        let scene =
            decode_ply_bytes(&bytes, "sample", &ImportOptions::default(), &mut NoProgress).unwrap();

        assert_eq!(scene.name(), "sample");
        assert_eq!(scene.len(), 3);
        assert_eq!(scene.sh_dim(), 2);
        assert_eq!(scene.sh_coefficients_count(), 9);
        let row = sample_row(2, 24);
        assert_eq!(scene.positions()[2], Vec3::new(row[0], row[1], row[2]));
    }

    #[test]
    fn test_state_history_on_success() {
        let bytes = sample_ply(1, 0);
        let mut run = ImportRun::new("ok");
        run.run(&bytes[..], &ImportOptions::default(), &mut NoProgress)
            .unwrap();

        assert_eq!(run.state(), ImportState::Complete);
        assert_eq!(
            run.history,
            vec![
                ImportState::Unopened,
                ImportState::HeaderParsed,
                ImportState::SchemaValidated,
                ImportState::LayoutDerived,
                ImportState::Allocated,
                ImportState::Decoding,
                ImportState::Complete,
            ]
        );
    }

    #[test]
    fn test_truncated_fails_before_allocation() {
        let mut bytes = sample_ply(2, 9);
        let stride = (14 + 9) * 4;
        bytes.truncate(bytes.len() - stride);

        let mut run = ImportRun::new("short");
        let err = run
            .run(&bytes[..], &ImportOptions::default(), &mut NoProgress)
            .unwrap_err();

        assert!(matches!(
            err,
            DecodeError::TruncatedData { expected, available }
                if expected == 2 * stride && available == stride
        ));
        assert_eq!(run.state(), ImportState::Failed);
        assert!(!run.history.contains(&ImportState::Allocated));
    }

    #[test]
    fn test_invalid_rest_count() {
        let mut props: Vec<(&'static str, String)> = crate::ply::canonical_property_names(0)
            .into_iter()
            .map(|n| ("float", n))
            .collect();
        props.extend((0..4).map(|i| ("float", format!("f_rest_{}", i))));
        let mut bytes = header_text("binary_little_endian", &[], 1, &props).into_bytes();
        bytes.extend(std::iter::repeat(0u8).take(18 * 4));

        let err = decode_ply_bytes(&bytes, "bad", &ImportOptions::default(), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidShLayout { rest_count: 4 }));
    }

    #[test]
    fn test_preceding_element_skipped() {
        let props: Vec<(&'static str, String)> = crate::ply::canonical_property_names(0)
            .into_iter()
            .map(|n| ("float", n))
            .collect();
        let mut bytes = header_text(
            "binary_little_endian",
            &[("camera", 3, vec![("uchar", "id".to_string()), ("short", "w".to_string())])],
            1,
            &props,
        )
        .into_bytes();
        bytes.extend([0xAAu8; 9]);
        bytes.extend(sample_row(0, 0).iter().flat_map(|v| v.to_le_bytes()));

        let scene =
            decode_ply_bytes(&bytes, "cam", &ImportOptions::default(), &mut NoProgress).unwrap();
        assert_eq!(scene.opacities()[0], sample_row(0, 0)[3]);
    }

    #[test]
    fn test_short_preceding_element() {
        let props: Vec<(&'static str, String)> = crate::ply::canonical_property_names(0)
            .into_iter()
            .map(|n| ("float", n))
            .collect();
        let mut bytes = header_text(
            "binary_little_endian",
            &[("camera", 4, vec![("int", "id".to_string())])],
            1,
            &props,
        )
        .into_bytes();
        bytes.extend([0u8; 7]);

        let err = decode_ply_bytes(&bytes, "cam", &ImportOptions::default(), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TruncatedData {
                expected: 72,
                available: 7
            }
        ));
    }

    #[test]
    fn test_options_serde() {
        let options: ImportOptions =
            serde_json::from_str(r#"{"rest_order": "channel_major"}"#).unwrap();
        assert_eq!(options.rest_order, RestOrder::ChannelMajor);
        assert_eq!(options.progress_interval, 4096);

        let json = serde_json::to_string(&ImportOptions::default()).unwrap();
        assert_eq!(json, r#"{"rest_order":"interleaved","progress_interval":4096}"#);
    }

    #[test]
    fn test_progress_interval_clamped() {
        let options = ImportOptions {
            progress_interval: 0,
            ..Default::default()
        };
        assert_eq!(options.progress_interval(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = import_ply("/nonexistent/dir/scene.ply").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.path, PathBuf::from("/nonexistent/dir/scene.ply"));
        assert!(err.to_string().contains("scene.ply"));
    }
}
