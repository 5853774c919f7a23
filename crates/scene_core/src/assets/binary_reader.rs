//! Bounds-checked cursor over an in-memory byte buffer
//!
//! Every read checks the remaining length first; a short buffer is reported as
//! [`ReadError::UnexpectedEof`] and leaves the cursor where it was.

use thiserror::Error;

/// Errors produced by [`MemoryReader`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// Fewer bytes remain than the operation needs
    #[error("unexpected end of data at offset {offset}: needed {requested} bytes, {remaining} remain")]
    UnexpectedEof {
        /// Cursor position when the read was attempted
        offset: usize,
        /// Bytes the read needed
        requested: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// Seek target lies beyond the end of the buffer
    #[error("seek to {target} is past the end of a {len} byte buffer")]
    SeekOutOfBounds {
        /// Requested offset
        target: usize,
        /// Buffer length
        len: usize,
    },
}

/// Fixed-width numeric types decodable from little-endian bytes
pub trait Primitive: Copy {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Decode from exactly `SIZE` little-endian bytes
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_primitive!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Sequential reader over a borrowed byte slice
#[derive(Debug, Clone)]
pub struct MemoryReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> MemoryReader<'a> {
    /// Create a reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current cursor position
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Whether at least `size` bytes remain; never moves the cursor
    pub fn check_remained(&self, size: usize) -> bool {
        size <= self.remaining()
    }

    /// Read the next `T` and advance past it
    pub fn read<T: Primitive>(&mut self) -> Result<T, ReadError> {
        let bytes = self.read_bytes(T::SIZE)?;
        Ok(T::from_le_slice(bytes))
    }

    /// Compare the next bytes against `tag`, advancing only when they match
    pub fn test(&mut self, tag: &[u8]) -> bool {
        if !self.check_remained(tag.len()) {
            return false;
        }

        let end = self.offset + tag.len();
        if &self.data[self.offset..end] != tag {
            return false;
        }

        self.offset = end;
        true
    }

    /// Advance `size` bytes without reading them
    pub fn skip(&mut self, size: usize) -> Result<(), ReadError> {
        self.ensure(size)?;
        self.offset += size;
        Ok(())
    }

    /// Move the cursor to an absolute position
    pub fn seek(&mut self, offset: usize) -> Result<(), ReadError> {
        if offset > self.data.len() {
            return Err(ReadError::SeekOutOfBounds {
                target: offset,
                len: self.data.len(),
            });
        }

        self.offset = offset;
        Ok(())
    }

    /// Borrow the next `size` bytes and advance past them
    pub fn read_bytes(&mut self, size: usize) -> Result<&'a [u8], ReadError> {
        self.ensure(size)?;
        let bytes = &self.data[self.offset..self.offset + size];
        self.offset += size;
        Ok(bytes)
    }

    /// Read a fixed-size, NUL-padded text field
    ///
    /// Bytes after the first NUL are ignored; invalid UTF-8 is replaced.
    pub fn read_fixed_str(&mut self, size: usize) -> Result<String, ReadError> {
        let bytes = self.read_bytes(size)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Everything after the cursor
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    fn ensure(&self, size: usize) -> Result<(), ReadError> {
        if self.check_remained(size) {
            Ok(())
        } else {
            Err(ReadError::UnexpectedEof {
                offset: self.offset,
                requested: size,
                remaining: self.remaining(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_little_endian_values() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x1234_5678u32.to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());
        data.extend_from_slice(&0xBEEFu16.to_le_bytes());
        data.push(7);

        let mut reader = MemoryReader::new(&data);
        assert_eq!(reader.read::<u32>(), Ok(0x1234_5678));
        assert_eq!(reader.read::<f32>(), Ok(1.5));
        assert_eq!(reader.read::<u16>(), Ok(0xBEEF));
        assert_eq!(reader.read::<u8>(), Ok(7));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_short_read_does_not_advance() {
        let data = [1u8, 2, 3];
        let mut reader = MemoryReader::new(&data);
        reader.skip(1).unwrap();

        let err = reader.read::<u32>().unwrap_err();
        assert_eq!(
            err,
            ReadError::UnexpectedEof { offset: 1, requested: 4, remaining: 2 }
        );
        assert_eq!(reader.offset(), 1);
        assert_eq!(reader.read::<u16>(), Ok(u16::from_le_bytes([2, 3])));
    }

    #[test]
    fn test_tag_only_advances_on_match() {
        let data = b"Pmd\x00";
        let mut reader = MemoryReader::new(data);

        assert!(!reader.test(b"Pmx"));
        assert_eq!(reader.offset(), 0);
        assert!(reader.test(b"Pmd"));
        assert_eq!(reader.offset(), 3);
        assert!(!reader.test(b"\x00\x00"));
        assert_eq!(reader.offset(), 3);
    }

    #[test]
    fn test_skip_and_check_remained() {
        let data = [0u8; 10];
        let mut reader = MemoryReader::new(&data);

        assert!(reader.check_remained(10));
        assert!(!reader.check_remained(11));
        assert!(reader.skip(11).is_err());
        assert_eq!(reader.offset(), 0);
        reader.skip(10).unwrap();
        assert!(reader.check_remained(0));
        assert!(reader.rest().is_empty());
    }

    #[test]
    fn test_fixed_str_stops_at_nul() {
        let mut data = b"bone".to_vec();
        data.resize(20, 0);
        data.push(0xAA);

        let mut reader = MemoryReader::new(&data);
        assert_eq!(reader.read_fixed_str(20).unwrap(), "bone");
        assert_eq!(reader.read::<u8>(), Ok(0xAA));
    }

    #[test]
    fn test_seek_bounds() {
        let data = [0u8; 4];
        let mut reader = MemoryReader::new(&data);
        reader.seek(4).unwrap();
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.seek(5), Err(ReadError::SeekOutOfBounds { target: 5, len: 4 }));
    }
}
