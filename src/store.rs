//! Flat store of signed 32-bit cells with a small header and file
//! persistence.
//!
//! The rest of the crate treats this as a random-access array of `i32`
//! addressed by byte offset (`int_offset << 2`). Reads past the written
//! capacity yield 0, the "empty" cell value.

use crate::error::{IndexError, Result};
use bytes::{BufMut, BytesMut};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Number of header slots kept separate from the payload cells.
pub const HEADER_SLOTS: usize = 3;

const DEFAULT_SEGMENT_BYTES: usize = 32 * 1024;
const WRITE_CHUNK_BYTES: usize = 64 * 1024;

/// Growable array of signed 32-bit cells, optionally backed by a file.
pub struct IntStore {
    cells: Vec<i32>,
    header: [i32; HEADER_SLOTS],
    path: Option<PathBuf>,
    segment_bytes: usize,
    closed: bool,
}

impl IntStore {
    /// A store living purely in memory; `flush` is a no-op.
    pub fn in_memory() -> Self {
        Self {
            cells: Vec::new(),
            header: [0; HEADER_SLOTS],
            path: None,
            segment_bytes: DEFAULT_SEGMENT_BYTES,
            closed: false,
        }
    }

    /// A store backed by `path`. Nothing is read until [`load_existing`];
    /// nothing is written until [`flush`].
    ///
    /// [`load_existing`]: IntStore::load_existing
    /// [`flush`]: IntStore::flush
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Self::in_memory()
        }
    }

    /// Allocate at least `initial_bytes` of zeroed cells.
    pub fn create(&mut self, initial_bytes: usize) {
        self.ensure_capacity(initial_bytes);
    }

    /// Load a previously flushed store. Returns false when the backing file
    /// does not exist (or the store is in-memory).
    pub fn load_existing(&mut self) -> Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }

        let mut reader = BufReader::new(File::open(path)?);
        let slots = u32::from_be_bytes(read_array(&mut reader)?) as usize;
        if slots != HEADER_SLOTS {
            return Err(IndexError::InvalidFormat);
        }
        for slot in self.header.iter_mut() {
            *slot = i32::from_be_bytes(read_array(&mut reader)?);
        }

        let len = u64::from_be_bytes(read_array(&mut reader)?) as usize;
        let mut raw = vec![0u8; len * 4];
        reader.read_exact(&mut raw).map_err(map_eof)?;
        self.cells = raw
            .chunks_exact(4)
            .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(true)
    }

    /// Grow so at least `bytes` of cells are addressable, in whole segments.
    pub fn ensure_capacity(&mut self, bytes: usize) {
        if bytes > self.cells.len() * 4 {
            let segments = bytes.div_ceil(self.segment_bytes);
            self.cells.resize(segments * self.segment_bytes / 4, 0);
        }
    }

    /// Cell at `byte_pos` (must be 4-byte aligned); 0 when never written.
    pub fn get_int(&self, byte_pos: u64) -> i32 {
        debug_assert!(byte_pos % 4 == 0);
        self.cells.get((byte_pos >> 2) as usize).copied().unwrap_or(0)
    }

    /// Write the cell at `byte_pos` (must be 4-byte aligned), growing the
    /// store when necessary.
    pub fn set_int(&mut self, byte_pos: u64, value: i32) {
        debug_assert!(byte_pos % 4 == 0);
        let index = (byte_pos >> 2) as usize;
        if index >= self.cells.len() {
            self.ensure_capacity((index + 1) * 4);
        }
        self.cells[index] = value;
    }

    pub fn get_header(&self, slot: usize) -> i32 {
        self.header[slot]
    }

    pub fn set_header(&mut self, slot: usize, value: i32) {
        self.header[slot] = value;
    }

    /// Bytes currently addressable.
    pub fn capacity(&self) -> usize {
        self.cells.len() * 4
    }

    /// Set the growth granularity in bytes.
    pub fn set_segment_size(&mut self, bytes: usize) {
        self.segment_bytes = bytes.max(4);
    }

    /// Write header and cells to the backing file; a no-op for in-memory
    /// stores.
    pub fn flush(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);

        let mut buf = BytesMut::with_capacity(WRITE_CHUNK_BYTES);
        buf.put_u32(HEADER_SLOTS as u32);
        for &slot in &self.header {
            buf.put_i32(slot);
        }
        buf.put_u64(self.cells.len() as u64);
        for &cell in &self.cells {
            buf.put_i32(cell);
            if buf.len() >= WRITE_CHUNK_BYTES {
                writer.write_all(&buf)?;
                buf.clear();
            }
        }
        writer.write_all(&buf)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Release the cells and mark the store closed. Idempotent.
    pub fn close(&mut self) {
        self.cells = Vec::new();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

fn read_array<const N: usize>(reader: &mut impl Read) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(map_eof)?;
    Ok(buf)
}

fn map_eof(err: std::io::Error) -> IndexError {
    match err.kind() {
        std::io::ErrorKind::UnexpectedEof => IndexError::UnexpectedEof,
        _ => IndexError::Io(err),
    }
}
