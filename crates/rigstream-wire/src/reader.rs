//! Bounds-checked little-endian cursor
//!
//! Every read checks the remaining length first and reports the absolute
//! offset in the original message on failure, so nested block readers point
//! at the right byte.

use rigstream_core::DecodeError;

#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Absolute offset of `buf[0]` in the message
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteReader {
            buf,
            pos: 0,
            base: 0,
        }
    }

    /// Absolute offset of the cursor
    #[inline]
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `n` bytes
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::TruncatedInput {
                offset: self.offset(),
                needed: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Split off a reader over the next `n` bytes and advance past them
    pub fn sub_reader(&mut self, n: usize) -> Result<ByteReader<'a>, DecodeError> {
        let base = self.offset();
        let buf = self.take(n)?;
        Ok(ByteReader { buf, pos: 0, base })
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(f64::from_le_bytes(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() {
        let mut bytes = vec![0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-2.25f64).to_le_bytes());

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.read_u32().unwrap(), 0x12345678);
        assert_eq!(r.read_f32().unwrap(), 1.5);
        assert_eq!(r.read_f64().unwrap(), -2.25);
        assert!(r.is_empty());
    }

    #[test]
    fn test_sub_reader_reports_absolute_offset() {
        let bytes = [0u8; 10];
        let mut r = ByteReader::new(&bytes);
        r.skip(4).unwrap();
        let mut sub = r.sub_reader(3).unwrap();
        assert_eq!(sub.offset(), 4);
        sub.read_u16().unwrap();
        let err = sub.read_u16().unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedInput {
                offset: 6,
                needed: 2,
                available: 1
            }
        );
        assert_eq!(r.offset(), 7);
    }
}
