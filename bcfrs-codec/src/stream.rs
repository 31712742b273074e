//! Byte-source abstraction for the codec. BCF files are BGZF-compressed and
//! addressed by virtual positions (compressed block offset + offset within
//! the block); pipes and pre-decompressed byte streams can still be decoded
//! sequentially but refuse random access.

use std::io::{self, Read, Seek};

use noodles::bgzf;

use bcfrs_core::{BcfError, Result};

/// A byte source a [`BcfCodec`](crate::codec::BcfCodec) can decode from.
///
/// `position`/`seek_to` speak virtual positions and are only usable when
/// `supports_random_access` is true; otherwise they fail with
/// [`BcfError::NotSeekable`].
pub trait BcfStream: Read {
    /// True when `position` and `seek_to` are usable.
    fn supports_random_access(&self) -> bool {
        false
    }

    /// Current virtual position in the stream.
    fn position(&mut self) -> Result<u64> {
        Err(BcfError::NotSeekable)
    }

    /// Move the cursor to an absolute virtual position.
    fn seek_to(&mut self, _pos: u64) -> Result<()> {
        Err(BcfError::NotSeekable)
    }
}

impl<R: Read + Seek> BcfStream for bgzf::Reader<R> {
    fn supports_random_access(&self) -> bool {
        true
    }

    fn position(&mut self) -> Result<u64> {
        Ok(u64::from(bgzf::Reader::virtual_position(self)))
    }

    fn seek_to(&mut self, pos: u64) -> Result<()> {
        bgzf::Reader::seek(self, bgzf::VirtualPosition::from(pos))
            .map(|_| ())
            .map_err(BcfError::Io)
    }
}

///
/// Adapter for one-way byte sources (pipes, sockets, already-decompressed
/// buffers): records decode sequentially, seek and rewind report
/// `NotSeekable`.
///
pub struct PlainStream<R> {
    inner: R,
}

impl<R: Read> PlainStream<R> {
    pub fn new(inner: R) -> Self {
        PlainStream { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for PlainStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> BcfStream for PlainStream<R> {}
