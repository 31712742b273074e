//! Stream-level codec: magic/version sniffing, the embedded text header,
//! and dispatch to the versioned record decoder. Only version 2.2 exists
//! today; the dispatch is a closed sum so another version is one more
//! variant, not a new class hierarchy.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};
use noodles::bgzf;

use bcfrs_core::models::{Header, Locus, Variant};
use bcfrs_core::{BcfError, Result};

use crate::consts::{BCF_MAGIC, SUPPORTED_VERSION};
use crate::record::RecordDecoder;
use crate::stream::{BcfStream, PlainStream};
use crate::typed::truncated;

/// A (major, minor) BCF version pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcfVersion {
    pub major: u8,
    pub minor: u8,
}

/// The versioned sub-codecs, selected by the version pair behind the magic
/// bytes.
#[derive(Debug)]
enum VersionCodec {
    V2x2(RecordDecoder),
}

///
/// BcfCodec struct, the decoder for one open BCF stream.
///
/// Holds exactly one cursor into the underlying stream; it is not safe for
/// concurrent use. Callers wanting parallel scans open independent codecs,
/// sharing the already-parsed header through its `Arc`.
///
pub struct BcfCodec<S> {
    stream: S,
    sub: Option<VersionCodec>,
}

impl BcfCodec<bgzf::Reader<File>> {
    /// Open a block-compressed BCF file for reading. The resulting codec
    /// supports `seek` and `rewind`.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_stream(bgzf::Reader::new(file)))
    }
}

impl<R: Read> BcfCodec<PlainStream<R>> {
    /// Decode from an arbitrary byte stream (a pipe, an in-memory buffer,
    /// an externally managed decompressor). Sequential decoding only.
    pub fn open_stream(inner: R) -> Self {
        Self::from_stream(PlainStream::new(inner))
    }
}

impl<S: BcfStream> BcfCodec<S> {
    pub fn from_stream(stream: S) -> Self {
        BcfCodec { stream, sub: None }
    }

    fn read_version(&mut self) -> Result<BcfVersion> {
        let mut magic = [0u8; 3];
        self.stream
            .read_exact(&mut magic)
            .map_err(|e| truncated(e, "magic bytes"))?;
        if &magic != BCF_MAGIC {
            return Err(BcfError::BadMagic);
        }
        let major = self
            .stream
            .read_u8()
            .map_err(|e| truncated(e, "version"))?;
        let minor = self
            .stream
            .read_u8()
            .map_err(|e| truncated(e, "version"))?;
        Ok(BcfVersion { major, minor })
    }

    /// Read the magic, version and embedded text header, then stand up the
    /// record decoder for the stream. Must be called once before decoding.
    pub fn read_header(&mut self) -> Result<Arc<Header>> {
        let version = self.read_version()?;
        if (version.major, version.minor) != SUPPORTED_VERSION {
            return Err(BcfError::UnsupportedVersion(version.major, version.minor));
        }

        let header_len = self
            .stream
            .read_u32::<LittleEndian>()
            .map_err(|e| truncated(e, "header length"))? as usize;
        let mut text = vec![0u8; header_len];
        self.stream
            .read_exact(&mut text)
            .map_err(|e| truncated(e, "header text"))?;

        let header = Arc::new(Header::from_vcf_text(&String::from_utf8_lossy(&text))?);

        let first_record_offset = if self.stream.supports_random_access() {
            Some(self.stream.position()?)
        } else {
            None
        };

        let decoder = RecordDecoder::new(Arc::clone(&header), first_record_offset)?;
        self.sub = Some(VersionCodec::V2x2(decoder));
        Ok(header)
    }

    /// Decode the next record, or `None` at end of stream.
    pub fn decode(&mut self) -> Result<Option<Variant>> {
        match &mut self.sub {
            Some(VersionCodec::V2x2(decoder)) => decoder.decode(&mut self.stream),
            None => Err(BcfError::HeaderNotRead),
        }
    }

    /// Decode only the locus of the next record, or `None` at end of
    /// stream.
    pub fn decode_loc(&mut self) -> Result<Option<Locus>> {
        match &mut self.sub {
            Some(VersionCodec::V2x2(decoder)) => decoder.decode_loc(&mut self.stream),
            None => Err(BcfError::HeaderNotRead),
        }
    }

    /// True when the underlying stream supports `seek` and `rewind`.
    pub fn supports_random_access(&self) -> bool {
        self.stream.supports_random_access()
    }

    /// Move the cursor to an absolute virtual position.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.stream.seek_to(offset)
    }

    /// Current virtual position of the cursor.
    pub fn position(&mut self) -> Result<u64> {
        self.stream.position()
    }

    /// Seek back to the first record.
    pub fn rewind(&mut self) -> Result<()> {
        let offset = match &self.sub {
            Some(VersionCodec::V2x2(decoder)) => decoder.first_record_offset(),
            None => return Err(BcfError::HeaderNotRead),
        };
        match offset {
            Some(offset) => self.stream.seek_to(offset),
            None => Err(BcfError::NotSeekable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const HEADER_TEXT: &str = concat!(
        "##fileformat=VCFv4.2\n",
        "##FILTER=<ID=PASS,Description=\"All filters passed\">\n",
        "##contig=<ID=chr1,length=1000>\n",
        "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">\n",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
    );

    fn bcf_bytes(major: u8, minor: u8, records: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"BCF");
        out.push(major);
        out.push(minor);
        let text = format!("{}\0", HEADER_TEXT);
        out.extend_from_slice(&(text.len() as u32).to_le_bytes());
        out.extend_from_slice(text.as_bytes());
        for record in records {
            out.extend_from_slice(record);
        }
        out
    }

    /// chr1, pos0 9, rlen 1, no id, allele "A", filters absent.
    fn simple_record() -> Vec<u8> {
        let mut info = Vec::new();
        info.extend_from_slice(&0i32.to_le_bytes());
        info.extend_from_slice(&9i32.to_le_bytes());
        info.extend_from_slice(&1i32.to_le_bytes());
        info.extend_from_slice(&30.0f32.to_bits().to_le_bytes());
        info.extend_from_slice(&0u16.to_le_bytes()); // n_info
        info.extend_from_slice(&1u16.to_le_bytes()); // n_allele
        info.extend_from_slice(&[0, 0, 0, 0]); // legacy sample count + n_fmt
        info.push(0x07); // empty id
        info.extend_from_slice(&[0x17, b'A']);
        info.push(0x01); // absent filters

        let mut out = Vec::new();
        out.extend_from_slice(&(info.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&info);
        out
    }

    #[test]
    fn test_bad_magic_fails_before_header() {
        let mut bytes = bcf_bytes(2, 2, &[]);
        bytes[0] = b'X';
        let mut codec = BcfCodec::open_stream(Cursor::new(bytes));
        assert!(matches!(codec.read_header(), Err(BcfError::BadMagic)));
    }

    #[test]
    fn test_unsupported_version() {
        let bytes = bcf_bytes(2, 1, &[]);
        let mut codec = BcfCodec::open_stream(Cursor::new(bytes));
        assert!(matches!(
            codec.read_header(),
            Err(BcfError::UnsupportedVersion(2, 1))
        ));
    }

    #[test]
    fn test_decode_before_header_is_a_usage_error() {
        let bytes = bcf_bytes(2, 2, &[]);
        let mut codec = BcfCodec::open_stream(Cursor::new(bytes));
        assert!(matches!(codec.decode(), Err(BcfError::HeaderNotRead)));
        assert!(matches!(codec.decode_loc(), Err(BcfError::HeaderNotRead)));
        assert!(matches!(codec.rewind(), Err(BcfError::HeaderNotRead)));
    }

    #[test]
    fn test_read_header_and_decode() {
        let record = simple_record();
        let bytes = bcf_bytes(2, 2, &[&record]);
        let mut codec = BcfCodec::open_stream(Cursor::new(bytes));

        let header = codec.read_header().unwrap();
        assert_eq!(header.contigs().len(), 1);

        let variant = codec.decode().unwrap().unwrap();
        assert_eq!(variant.contig(), "chr1");
        assert_eq!(variant.start(), 10);
        assert_eq!(variant.qual, Some(30.0));

        assert!(codec.decode().unwrap().is_none());
    }

    #[test]
    fn test_plain_stream_refuses_seek_and_rewind() {
        let record = simple_record();
        let bytes = bcf_bytes(2, 2, &[&record]);
        let mut codec = BcfCodec::open_stream(Cursor::new(bytes));
        codec.read_header().unwrap();

        assert!(matches!(codec.seek(0), Err(BcfError::NotSeekable)));
        assert!(matches!(codec.rewind(), Err(BcfError::NotSeekable)));
        assert!(matches!(codec.position(), Err(BcfError::NotSeekable)));
    }
}
