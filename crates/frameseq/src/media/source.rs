use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a clip's bytes come from: a file on disk, bytes already in memory,
/// or both. In-memory bytes take priority when present.
#[derive(Debug, Clone, Default)]
pub struct ClipSource {
    path: Option<PathBuf>,
    data: Arc<[u8]>,
}

impl ClipSource {
    pub fn new(path: Option<PathBuf>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            path,
            data: data.into(),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            data: Arc::from(Vec::new()),
        }
    }

    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            path: None,
            data: data.into(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Build a fresh device positioned at the first byte.
    pub fn open_device(&self) -> io::Result<ByteDevice> {
        if !self.data.is_empty() {
            return Ok(ByteDevice::Memory(Cursor::new(Arc::clone(&self.data))));
        }
        match &self.path {
            Some(path) => {
                let file = File::open(path)?;
                Ok(ByteDevice::File(BufReader::new(file)))
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "clip source has neither a path nor in-memory data",
            )),
        }
    }
}

/// Seekable, buffered byte source a decode session reads from.
#[derive(Debug)]
pub enum ByteDevice {
    File(BufReader<File>),
    Memory(Cursor<Arc<[u8]>>),
}

impl Read for ByteDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ByteDevice::File(r) => r.read(buf),
            ByteDevice::Memory(r) => r.read(buf),
        }
    }
}

impl BufRead for ByteDevice {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            ByteDevice::File(r) => r.fill_buf(),
            ByteDevice::Memory(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            ByteDevice::File(r) => r.consume(amt),
            ByteDevice::Memory(r) => r.consume(amt),
        }
    }
}

impl Seek for ByteDevice {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            ByteDevice::File(r) => r.seek(pos),
            ByteDevice::Memory(r) => r.seek(pos),
        }
    }
}

impl ByteDevice {
    /// Read up to `N` leading bytes and rewind. Short sources yield a
    /// zero-padded header.
    pub fn peek_header<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut header = [0u8; N];
        let mut filled = 0;
        while filled < N {
            match self.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.rewind()?;
        Ok(header)
    }
}
