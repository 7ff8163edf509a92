//! Static resources di bawah document root
//!
//! File dibuka read-only lalu di-mmap, sehingga isi file langsung dari page
//! cache ke buffer response tanpa read loop.
//!
//! Path tidak disanitasi: `..` di request path ikut di-resolve relatif ke
//! root.

use memmap2::Mmap;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Directory request paths are resolved beneath
#[derive(Debug, Clone)]
pub struct DocumentRoot {
    root: PathBuf,
}

impl DocumentRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Plain concatenation of root and request path.
    pub fn resolve(&self, request_path: impl AsRef<OsStr>) -> PathBuf {
        let mut joined = OsString::from(self.root.as_os_str());
        joined.push(request_path);
        PathBuf::from(joined)
    }

    pub fn open(&self, request_path: impl AsRef<OsStr>) -> io::Result<StaticFile> {
        StaticFile::open(self.resolve(request_path))
    }
}

/// A file opened read-only together with its size at open time
#[derive(Debug)]
pub struct StaticFile {
    file: File,
    len: u64,
    regular: bool,
}

impl StaticFile {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let meta = file.metadata()?;
        Ok(Self {
            file,
            len: meta.len(),
            regular: meta.is_file(),
        })
    }

    #[inline(always)]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Map the whole file. Fails for directories and other non-regular
    /// files, and if the size changed since `open`.
    pub fn contents(&self) -> io::Result<FileContents> {
        if !self.regular {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        if self.len == 0 {
            return Ok(FileContents::Empty);
        }

        // SAFETY: mapping is read-only and dropped before the response is
        // sent; content is copied out immediately.
        let mmap = unsafe { Mmap::map(&self.file)? };

        if mmap.len() as u64 != self.len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file size changed: expected {}, mapped {}", self.len, mmap.len()),
            ));
        }

        Ok(FileContents::Mapped(mmap))
    }
}

/// File bytes, zero-length files are never mapped
pub enum FileContents {
    Empty,
    Mapped(Mmap),
}

impl Deref for FileContents {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileContents::Empty => &[],
            FileContents::Mapped(mmap) => mmap,
        }
    }
}
