//! Positioned byte stream over a file or an in-memory buffer.
//!
//! All multi-byte values are read and written with explicit endianness.
//! The stream tracks its own position and length, so that size
//! backpatching never has to query the OS.

use std::{
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Cursor, ErrorKind, Read, Seek, SeekFrom, Write},
    path::Path,
};

use binrw::{BinRead, BinWrite, Endian};

use crate::{ContainerError, FourCC, LogSink};

#[derive(Debug)]
enum Backing {
    /// Read-only file.
    Reader(BufReader<File>),
    /// Write-only file.
    Writer(BufWriter<File>),
    /// In-memory buffer, e.g. a decompressed `moov` atom.
    Memory(Cursor<Vec<u8>>),
}

/// Seekable byte stream, backed by a file or a memory buffer.
/// Writes past the current end extend the stream.
#[derive(Debug)]
pub struct ByteStream {
    backing: Backing,
    pos: u64,
    len: u64,
    /// Writes that would grow the stream beyond this length fail.
    limit: Option<u64>,
    pub(crate) log: LogSink,
    /// Write all atom headers with 64-bit sizes.
    pub(crate) wide_sizes: bool,
    /// Keep unknown atoms as raw passthrough atoms when reading.
    pub(crate) capture_unknown: bool,
}

impl ByteStream {
    /// Opens file at `path` for reading.
    pub fn open(path: &Path) -> Result<Self, ContainerError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self::new(Backing::Reader(BufReader::new(file)), len))
    }

    /// Creates (or truncates) file at `path` for writing.
    pub fn create(path: &Path) -> Result<Self, ContainerError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(Backing::Writer(BufWriter::new(file)), 0))
    }

    /// In-memory stream positioned at the start of `data`.
    pub fn memory(data: Vec<u8>) -> Self {
        let len = data.len() as u64;
        Self::new(Backing::Memory(Cursor::new(data)), len)
    }

    fn new(backing: Backing, len: u64) -> Self {
        Self {
            backing,
            pos: 0,
            len,
            limit: None,
            log: LogSink::default(),
            wide_sizes: false,
            capture_unknown: true,
        }
    }

    /// Fail any write that would grow the stream past `limit` bytes,
    /// as a full disk would.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_log(mut self, log: LogSink) -> Self {
        self.log = log;
        self
    }

    /// Write every atom header with a 64-bit size.
    pub fn with_wide_sizes(mut self, wide: bool) -> Self {
        self.wide_sizes = wide;
        self
    }

    /// Keep (`true`) or skip (`false`) unknown atoms when reading.
    pub fn with_capture_unknown(mut self, capture: bool) -> Self {
        self.capture_unknown = capture;
        self
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total length of the stream.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes left between current position and end of stream.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    /// Seek to absolute position `pos`.
    pub fn seek_to(&mut self, pos: u64) -> Result<u64, ContainerError> {
        Ok(self.seek(SeekFrom::Start(pos))?)
    }

    /// Seek relative to current position.
    pub fn seek_relative(&mut self, delta: i64) -> Result<u64, ContainerError> {
        Ok(self.seek(SeekFrom::Current(delta))?)
    }

    pub fn flush_all(&mut self) -> Result<(), ContainerError> {
        let offset = self.pos;
        self.flush()
            .map_err(|source| ContainerError::IoWriteFailure{offset, source})
    }

    /// Returns the underlying buffer of an in-memory stream.
    pub fn into_bytes(self) -> Result<Vec<u8>, ContainerError> {
        match self.backing {
            Backing::Memory(cursor) => Ok(cursor.into_inner()),
            _ => Err(ContainerError::IOError(std::io::Error::new(
                ErrorKind::Unsupported,
                "not an in-memory stream"
            ))),
        }
    }

    /// Runs `f` with `data` as the active backing store,
    /// then restores the original stream, position included,
    /// whether `f` succeeds or not.
    ///
    /// Used to parse a decompressed movie atom in place
    /// of the compressed one.
    pub fn with_memory<T, F>(&mut self, data: Vec<u8>, f: F) -> Result<T, ContainerError>
    where
        F: FnOnce(&mut ByteStream) -> Result<T, ContainerError>
    {
        let substitute = ByteStream::memory(data)
            .with_log(self.log.clone())
            .with_wide_sizes(self.wide_sizes)
            .with_capture_unknown(self.capture_unknown);
        let saved = std::mem::replace(self, substitute);
        let result = f(self);
        *self = saved;
        result
    }

    fn read_error(err: ContainerError, offset: u64, wanted: u64) -> ContainerError {
        match err {
            ContainerError::IOError(e) if e.kind() == ErrorKind::UnexpectedEof => {
                ContainerError::UnexpectedEof{offset, wanted}
            },
            other => other,
        }
    }

    fn write_error(err: ContainerError, offset: u64) -> ContainerError {
        match err {
            ContainerError::IOError(source) => ContainerError::IoWriteFailure{offset, source},
            other => other,
        }
    }

    /// Reads a type implementing `BinRead` with no arguments.
    pub fn read_type<T>(&mut self, endian: Endian) -> Result<T, ContainerError>
    where
        T: for<'a> BinRead<Args<'a> = ()>,
    {
        let offset = self.pos;
        T::read_options(self, endian, ())
            .map_err(|e| Self::read_error(e.into(), offset, std::mem::size_of::<T>() as u64))
    }

    /// Writes a type implementing `BinWrite` with no arguments.
    /// Failures are reported as `IoWriteFailure`.
    pub fn write_type<T>(&mut self, value: &T, endian: Endian) -> Result<(), ContainerError>
    where
        T: for<'a> BinWrite<Args<'a> = ()>,
    {
        let offset = self.pos;
        value.write_options(self, endian, ())
            .map_err(|e| Self::write_error(e.into(), offset))
    }

    pub fn read_be<T>(&mut self) -> Result<T, ContainerError>
    where
        T: for<'a> BinRead<Args<'a> = ()>,
    {
        self.read_type(Endian::Big)
    }

    pub fn read_le<T>(&mut self) -> Result<T, ContainerError>
    where
        T: for<'a> BinRead<Args<'a> = ()>,
    {
        self.read_type(Endian::Little)
    }

    pub fn write_be<T>(&mut self, value: &T) -> Result<(), ContainerError>
    where
        T: for<'a> BinWrite<Args<'a> = ()>,
    {
        self.write_type(value, Endian::Big)
    }

    pub fn write_le<T>(&mut self, value: &T) -> Result<(), ContainerError>
    where
        T: for<'a> BinWrite<Args<'a> = ()>,
    {
        self.write_type(value, Endian::Little)
    }

    pub fn read_u8(&mut self) -> Result<u8, ContainerError> {
        self.read_be()
    }

    pub fn read_u16(&mut self) -> Result<u16, ContainerError> {
        self.read_be()
    }

    pub fn read_u24(&mut self) -> Result<u32, ContainerError> {
        let b: [u8; 3] = self.read_be()?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ContainerError> {
        self.read_be()
    }

    pub fn read_u64(&mut self) -> Result<u64, ContainerError> {
        self.read_be()
    }

    pub fn read_i16(&mut self) -> Result<i16, ContainerError> {
        self.read_be()
    }

    pub fn read_i32(&mut self) -> Result<i32, ContainerError> {
        self.read_be()
    }

    pub fn read_u16_le(&mut self) -> Result<u16, ContainerError> {
        self.read_le()
    }

    pub fn read_u24_le(&mut self) -> Result<u32, ContainerError> {
        let b: [u8; 3] = self.read_be()?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, ContainerError> {
        self.read_le()
    }

    pub fn read_u64_le(&mut self) -> Result<u64, ContainerError> {
        self.read_le()
    }

    /// 16.16 fixed point.
    pub fn read_fixed32(&mut self) -> Result<f64, ContainerError> {
        let raw = self.read_u32()?;
        Ok(raw as f64 / 65536.0)
    }

    /// 8.8 fixed point.
    pub fn read_fixed16(&mut self) -> Result<f64, ContainerError> {
        let raw = self.read_u16()?;
        Ok(raw as f64 / 256.0)
    }

    pub fn read_float32(&mut self) -> Result<f32, ContainerError> {
        self.read_be()
    }

    pub fn read_double64(&mut self) -> Result<f64, ContainerError> {
        self.read_be()
    }

    pub fn read_fourcc(&mut self) -> Result<FourCC, ContainerError> {
        let b: [u8; 4] = self.read_be()?;
        Ok(FourCC::from_bytes(b))
    }

    /// Reads exactly `len` bytes. Fails before allocating
    /// if fewer than `len` bytes remain.
    pub fn read_fixed_bytes(&mut self, len: u64) -> Result<Vec<u8>, ContainerError> {
        if len > self.remaining() {
            return Err(ContainerError::UnexpectedEof{offset: self.pos, wanted: len})
        }
        let mut buf = vec![0u8; usize::try_from(len)?];
        let offset = self.pos;
        self.read_exact(&mut buf)
            .map_err(|e| Self::read_error(e.into(), offset, len))?;
        Ok(buf)
    }

    /// Pascal string: 1-byte length followed by Latin-1 text.
    pub fn read_pascal(&mut self) -> Result<String, ContainerError> {
        let len = self.read_u8()?;
        let bytes = self.read_fixed_bytes(len as u64)?;
        Ok(crate::support::latin1(&bytes))
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), ContainerError> {
        self.write_be(&value)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), ContainerError> {
        self.write_be(&value)
    }

    pub fn write_u24(&mut self, value: u32) -> Result<(), ContainerError> {
        let b = value.to_be_bytes();
        self.write_be(&[b[1], b[2], b[3]])
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), ContainerError> {
        self.write_be(&value)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), ContainerError> {
        self.write_be(&value)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<(), ContainerError> {
        self.write_be(&value)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), ContainerError> {
        self.write_be(&value)
    }

    pub fn write_u16_le(&mut self, value: u16) -> Result<(), ContainerError> {
        self.write_le(&value)
    }

    pub fn write_u24_le(&mut self, value: u32) -> Result<(), ContainerError> {
        let b = value.to_le_bytes();
        self.write_be(&[b[0], b[1], b[2]])
    }

    pub fn write_u32_le(&mut self, value: u32) -> Result<(), ContainerError> {
        self.write_le(&value)
    }

    pub fn write_u64_le(&mut self, value: u64) -> Result<(), ContainerError> {
        self.write_le(&value)
    }

    /// 16.16 fixed point. The integer part wraps at 65536.
    pub fn write_fixed32(&mut self, value: f64) -> Result<(), ContainerError> {
        self.write_u32(to_fixed32(value))
    }

    /// 8.8 fixed point.
    pub fn write_fixed16(&mut self, value: f64) -> Result<(), ContainerError> {
        let int = value.trunc();
        let frac = ((value - int) * 256.0) as u16 & 0xff;
        self.write_u16(((int as i64 as u16) << 8) | frac)
    }

    pub fn write_float32(&mut self, value: f32) -> Result<(), ContainerError> {
        self.write_be(&value)
    }

    pub fn write_double64(&mut self, value: f64) -> Result<(), ContainerError> {
        self.write_be(&value)
    }

    pub fn write_fourcc(&mut self, fourcc: &FourCC) -> Result<(), ContainerError> {
        self.write_be(&fourcc.to_bytes())
    }

    pub fn write_fixed_bytes(&mut self, bytes: &[u8]) -> Result<(), ContainerError> {
        let offset = self.pos;
        self.write_all(bytes)
            .map_err(|source| ContainerError::IoWriteFailure{offset, source})
    }

    /// Pascal string, truncated to 255 bytes.
    pub fn write_pascal(&mut self, text: &str) -> Result<(), ContainerError> {
        let mut bytes = crate::support::to_latin1(text);
        bytes.truncate(255);
        self.write_u8(bytes.len() as u8)?;
        self.write_fixed_bytes(&bytes)
    }
}

/// 16.16 fixed point. Only the low 16 bits of the integer
/// part are kept, so e.g. 96000 wraps to 30464.
pub(crate) fn to_fixed32(value: f64) -> u32 {
    let int = value.trunc();
    let frac = ((value - int) * 65536.0) as u32 & 0xffff;
    (((int as i64) as u32 & 0xffff) << 16) | frac
}

/// Undoes the 16.16 wrap of the two common sample rates
/// that do not fit, 96000 and 88200. Apply after reading
/// a fixed32 sample rate.
pub fn correct_sample_rate(rate: f64) -> f64 {
    let unwrapped = rate + 65536.0;
    if unwrapped == 96000.0 || unwrapped == 88200.0 {
        unwrapped
    } else {
        rate
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = match &mut self.backing {
            Backing::Reader(r) => r.read(buf)?,
            Backing::Memory(c) => c.read(buf)?,
            Backing::Writer(_) => return Err(std::io::Error::new(
                ErrorKind::Unsupported,
                "stream is write-only"
            )),
        };
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for ByteStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(limit) = self.limit {
            if self.pos + buf.len() as u64 > limit {
                return Err(std::io::Error::new(
                    ErrorKind::Other,
                    format!("no space left: stream limited to {limit} bytes")
                ))
            }
        }
        let n = match &mut self.backing {
            Backing::Writer(w) => w.write(buf)?,
            Backing::Memory(c) => c.write(buf)?,
            Backing::Reader(_) => return Err(std::io::Error::new(
                ErrorKind::Unsupported,
                "stream is read-only"
            )),
        };
        self.pos += n as u64;
        self.len = self.len.max(self.pos);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.backing {
            Backing::Writer(w) => w.flush(),
            Backing::Memory(c) => c.flush(),
            Backing::Reader(_) => Ok(()),
        }
    }
}

impl Seek for ByteStream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let new_pos = match &mut self.backing {
            Backing::Reader(r) => r.seek(pos)?,
            Backing::Writer(w) => w.seek(pos)?,
            Backing::Memory(c) => c.seek(pos)?,
        };
        self.pos = new_pos;
        Ok(new_pos)
    }

    fn stream_position(&mut self) -> std::io::Result<u64> {
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_round_trip() {
        let mut s = ByteStream::memory(Vec::new());
        s.write_u8(0xab).unwrap();
        s.write_u16(0x1234).unwrap();
        s.write_u24(0x00abcdef).unwrap();
        s.write_u32_le(0xdeadbeef).unwrap();
        s.write_u64(u64::MAX - 1).unwrap();
        s.write_fixed32(1.5).unwrap();
        s.write_fixed16(0.75).unwrap();
        s.write_double64(-2.25).unwrap();
        s.write_pascal("Apple Video").unwrap();
        assert_eq!(s.len(), 1 + 2 + 3 + 4 + 8 + 4 + 2 + 8 + 12);

        s.seek_to(0).unwrap();
        assert_eq!(s.read_u8().unwrap(), 0xab);
        assert_eq!(s.read_u16().unwrap(), 0x1234);
        assert_eq!(s.read_u24().unwrap(), 0x00abcdef);
        assert_eq!(s.read_u32_le().unwrap(), 0xdeadbeef);
        assert_eq!(s.read_u64().unwrap(), u64::MAX - 1);
        assert_eq!(s.read_fixed32().unwrap(), 1.5);
        assert_eq!(s.read_fixed16().unwrap(), 0.75);
        assert_eq!(s.read_double64().unwrap(), -2.25);
        assert_eq!(s.read_pascal().unwrap(), "Apple Video");
        assert_eq!(s.remaining(), 0);
    }

    #[test]
    fn read_past_end_is_eof() {
        let mut s = ByteStream::memory(vec![0, 1]);
        assert!(matches!(s.read_u32(), Err(ContainerError::UnexpectedEof{offset: 0, ..})));
        let mut s = ByteStream::memory(vec![0, 1]);
        assert!(matches!(s.read_fixed_bytes(3), Err(ContainerError::UnexpectedEof{..})));
    }

    #[test]
    fn write_extends_and_overwrites() {
        let mut s = ByteStream::memory(vec![0; 4]);
        s.seek_to(2).unwrap();
        s.write_u32(0x01020304).unwrap();
        assert_eq!(s.len(), 6);
        s.seek_to(0).unwrap();
        s.write_u16(0xffff).unwrap();
        assert_eq!(s.into_bytes().unwrap(), vec![0xff, 0xff, 1, 2, 3, 4]);
    }

    #[test]
    fn limited_stream_reports_write_failure() {
        let mut s = ByteStream::memory(Vec::new()).with_limit(6);
        s.write_u32(1).unwrap();
        match s.write_u32(2) {
            Err(ContainerError::IoWriteFailure{offset, ..}) => assert_eq!(offset, 4),
            other => panic!("expected write failure, got {other:?}"),
        }
    }

    #[test]
    fn sample_rate_kludge() {
        let wrapped = to_fixed32(96000.0) as f64 / 65536.0;
        assert_eq!(wrapped, 30464.0);
        assert_eq!(correct_sample_rate(wrapped), 96000.0);
        let wrapped = to_fixed32(88200.0) as f64 / 65536.0;
        assert_eq!(correct_sample_rate(wrapped), 88200.0);
        assert_eq!(correct_sample_rate(48000.0), 48000.0);
    }

    #[test]
    fn memory_substitution_restores_state() {
        let mut s = ByteStream::memory(vec![1, 2, 3, 4]);
        s.seek_to(2).unwrap();
        let inner = s.with_memory(vec![9, 9], |m| {
            assert_eq!(m.position(), 0);
            m.read_u16()
        }).unwrap();
        assert_eq!(inner, 0x0909);
        assert_eq!(s.position(), 2);
        assert_eq!(s.read_u8().unwrap(), 3);

        let failed = s.with_memory(vec![], |m| m.read_u8());
        assert!(failed.is_err());
        assert_eq!(s.position(), 3);
    }
}
