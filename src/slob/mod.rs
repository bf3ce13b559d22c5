//! SLOB ("Sorted List Of Blobs") контейнер
//! - header.rs    : заголовок (magic, uuid, encoding, compression, tags, content types)
//! - reference.rs : записи key -> (bin, item, fragment) и отсортированная таблица
//! - store.rs     : bins, BinSource (память/файл), ленивая распаковка
//! - dictionary.rs: SlobDictionary<S> и enum Slob
//! - reader.rs    : разбор файла, выбор in-memory / file-backed
//! - writer.rs    : запись key->value в новый файл

pub mod dictionary;
pub mod header;
pub mod reader;
pub mod reference;
pub mod store;
pub mod writer;

pub use dictionary::{Slob, SlobDictionary};
pub use header::SlobHeader;
pub use reader::{open, OpenMode, SlobReader};
pub use reference::{Reference, ReferenceTable};
pub use store::{BinSource, DecodedBin, FileBin, ItemCursor, MemoryBin, StoreItem};
pub use writer::{SlobWriter, WriteSummary};

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Reader с учётом позиции: seek только если позиция действительно меняется
/// (BufReader сбрасывает буфер на каждом seek).
pub(crate) struct PosReader<R> {
    inner: R,
    pos: u64,
}

impl<R: Read + Seek> PosReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    pub(crate) fn pos(&self) -> u64 {
        self.pos
    }

    pub(crate) fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        if pos != self.pos {
            self.inner.seek(SeekFrom::Start(pos))?;
            self.pos = pos;
        }
        Ok(())
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for PosReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

/// Writer, считающий записанные байты (позиция в выходном файле).
pub(crate) struct PosWriter<W> {
    inner: W,
    pos: u64,
}

impl<W: Write> PosWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner, pos: 0 }
    }

    pub(crate) fn pos(&self) -> u64 {
        self.pos
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for PosWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
