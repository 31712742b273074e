//! The reader: open a BCF file or stream, scan its records, or run
//! index-assisted range queries.
//!
//! One reader holds one cursor, so at most one iteration can be live at a
//! time; `records()` and `query()` borrow the reader mutably and the
//! borrow checker refuses a second iterator until the first is dropped.
//! Dropping an iterator is closing it.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::MultiGzDecoder;
use noodles::bgzf;

use bcfrs_codec::codec::BcfCodec;
use bcfrs_codec::stream::{BcfStream, PlainStream};
use bcfrs_core::models::{Header, Locus, Variant};
use bcfrs_core::{BcfError, Result};

use crate::index::{Span, VariantIndex, find_index, read_index, split_path_and_index};

///
/// BcfReader struct, the high-level reading surface over one open stream.
///
pub struct BcfReader<S: BcfStream> {
    codec: BcfCodec<S>,
    header: Arc<Header>,
    index: Option<Box<dyn VariantIndex>>,
}

impl<S: BcfStream> std::fmt::Debug for BcfReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BcfReader")
            .field("header", &self.header)
            .field("is_queryable", &self.index.is_some())
            .finish_non_exhaustive()
    }
}

impl BcfReader<bgzf::Reader<File>> {
    ///
    /// Open a block-compressed BCF file and read its header.
    ///
    /// # Arguments
    /// - path: the path to the file to read
    ///
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_codec(BcfCodec::open_path(path)?)
    }

    ///
    /// Open a BCF file together with its CSI index, enabling `query`.
    /// Accepts `file##idx##index` pseudo-paths; otherwise the index is the
    /// sibling `<file>.csi`.
    ///
    pub fn open_path_indexed(spec: &str) -> Result<Self> {
        let (path, index_path) = split_path_and_index(spec);
        let index_path = match index_path {
            Some(p) => PathBuf::from(p),
            None => find_index(path).ok_or_else(|| {
                BcfError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no .csi index found for {}", path),
                ))
            })?,
        };
        let mut reader = Self::open_path(path)?;
        reader.index = Some(Box::new(read_index(index_path)?));
        Ok(reader)
    }
}

impl<R: Read> BcfReader<PlainStream<R>> {
    /// Read from an arbitrary byte stream. Sequential decoding only; no
    /// rewind, no queries.
    pub fn from_stream(inner: R) -> Result<Self> {
        Self::with_codec(BcfCodec::open_stream(inner))
    }
}

impl<R: Read> BcfReader<PlainStream<MultiGzDecoder<R>>> {
    /// Read from a gzip-compressed byte stream. BGZF is gzip-compatible,
    /// so piped `.bcf` bytes decode here without random access.
    pub fn from_gzip_stream(inner: R) -> Result<Self> {
        BcfReader::from_stream(MultiGzDecoder::new(inner))
    }
}

impl<S: BcfStream> BcfReader<S> {
    fn with_codec(mut codec: BcfCodec<S>) -> Result<Self> {
        let header = codec.read_header()?;
        Ok(BcfReader {
            codec,
            header,
            index: None,
        })
    }

    /// The parsed header, shareable across readers.
    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    /// Attach an index after the fact (tests use this to inject their
    /// own).
    pub fn set_index(&mut self, index: Box<dyn VariantIndex>) {
        self.index = Some(index);
    }

    pub fn is_queryable(&self) -> bool {
        self.index.is_some()
    }

    /// Decode the next record from the current cursor position.
    pub fn decode(&mut self) -> Result<Option<Variant>> {
        self.codec.decode()
    }

    /// Decode only the locus of the next record.
    pub fn decode_loc(&mut self) -> Result<Option<Locus>> {
        self.codec.decode_loc()
    }

    /// Current virtual position of the cursor.
    pub fn position(&mut self) -> Result<u64> {
        self.codec.position()
    }

    /// Iterate every record. On seekable streams the cursor first rewinds
    /// to the first record, so repeated scans see identical lists.
    pub fn records(&mut self) -> Result<Records<'_, S>> {
        if self.codec.supports_random_access() {
            self.codec.rewind()?;
        }
        Ok(Records { reader: self })
    }

    /// Iterate the records overlapping `[start, end]` on `contig`, in file
    /// order, using the index. A contig the header does not know yields an
    /// empty iteration.
    pub fn query(&mut self, contig: &str, start: u32, end: u32) -> Result<Query<'_, S>> {
        let index = self.index.as_ref().ok_or(BcfError::NoIndex)?;
        let spans = match self.header.contig_index(contig) {
            Some(tid) => index.spans(tid, start, end)?,
            None => Vec::new(),
        };
        Ok(Query {
            reader: self,
            spans,
            span_index: 0,
            in_span: false,
            contig: contig.to_string(),
            start,
            end,
        })
    }
}

/// Full-scan iterator over a reader's records.
pub struct Records<'a, S: BcfStream> {
    reader: &'a mut BcfReader<S>,
}

impl<S: BcfStream> Iterator for Records<'_, S> {
    type Item = Result<Variant>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.codec.decode().transpose()
    }
}

/// Range-query iterator: walks the index spans strictly in order, never
/// re-entering a finished span, and keeps only overlapping records.
pub struct Query<'a, S: BcfStream> {
    reader: &'a mut BcfReader<S>,
    spans: Vec<Span>,
    span_index: usize,
    in_span: bool,
    contig: String,
    start: u32,
    end: u32,
}

impl<S: BcfStream> Query<'_, S> {
    fn advance(&mut self) -> Result<Option<Variant>> {
        loop {
            if !self.in_span {
                let Some(span) = self.spans.get(self.span_index) else {
                    return Ok(None);
                };
                self.reader.codec.seek(span.start)?;
                self.in_span = true;
            } else {
                let span = self.spans[self.span_index];
                if self.reader.codec.position()? >= span.end {
                    self.in_span = false;
                    self.span_index += 1;
                    continue;
                }
            }

            match self.reader.codec.decode()? {
                None => return Ok(None),
                Some(variant) => {
                    if variant.locus.contig == self.contig
                        && variant.locus.overlaps_interval(self.start, self.end)
                    {
                        return Ok(Some(variant));
                    }
                }
            }
        }
    }
}

impl<S: BcfStream> Iterator for Query<'_, S> {
    type Item = Result<Variant>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
