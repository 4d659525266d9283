//! Growable write buffer and cursor-based readers for the wire codec.
//!
//! All message serialization bottoms out here. Integers that dominate
//! traffic (frame lengths, message identifiers) use a variable-length
//! encoding: 7 data bits per byte, continuation bit set on all but the
//! final byte, least-significant group first, so values below 128 cost a
//! single byte.
//!
//! Writing appends to an internal [`BytesMut`] and `flush()` hands the
//! accumulated bytes out while resetting the buffer. Reading goes through
//! [`ByteCursor`], which operates on an immutable in-memory buffer and
//! fails with [`ProtocolError::Underrun`] instead of resizing or blocking.

use crate::error::{ProtocolError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Longest legal varint encoding of a u64 (ceil(64 / 7) bytes).
pub const MAX_VARINT_LEN: usize = 10;

/// Growable byte buffer for encoding one outbound frame payload.
#[derive(Debug, Default)]
pub struct ByteBuf {
    buf: BytesMut,
}

impl ByteBuf {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Number of bytes accumulated since the last `flush`.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    /// Append an unsigned varint.
    pub fn put_var_u64(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.put_u8(byte);
                return;
            }
            self.buf.put_u8(byte | 0x80);
        }
    }

    /// Append a signed varint (zigzag mapping over the unsigned encoding).
    pub fn put_var_i64(&mut self, value: i64) {
        self.put_var_u64(((value << 1) ^ (value >> 63)) as u64);
    }

    /// Append a UTF-8 string as varint byte length followed by its bytes.
    pub fn put_str(&mut self, value: &str) {
        self.put_var_u64(value.len() as u64);
        self.buf.put_slice(value.as_bytes());
    }

    /// Append a byte slice as varint length followed by the raw bytes.
    pub fn put_bytes(&mut self, value: &[u8]) {
        self.put_var_u64(value.len() as u64);
        self.buf.put_slice(value);
    }

    /// Append raw bytes with no length prefix.
    pub fn put_raw(&mut self, value: &[u8]) {
        self.buf.put_slice(value);
    }

    /// Hand out the accumulated bytes and reset the buffer for reuse.
    pub fn flush(&mut self) -> Bytes {
        self.buf.split().freeze()
    }
}

/// Cursor over an immutable decode buffer.
///
/// The buffer is sized exactly once, from the declared frame length, before
/// the cursor is constructed; every read checks the remaining byte count and
/// reports an underrun rather than growing or blocking.
#[derive(Debug)]
pub struct ByteCursor {
    buf: Bytes,
}

impl ByteCursor {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    /// Bytes left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(ProtocolError::Underrun { needed, remaining });
        }
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn get_bool(&mut self) -> Result<bool> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ProtocolError::MalformedFrame(format!(
                "invalid bool byte: {other:#04x}"
            ))),
        }
    }

    /// Decode an unsigned varint.
    pub fn get_var_u64(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for group in 0..MAX_VARINT_LEN {
            let byte = self.get_u8()?;
            // the tenth byte may only carry the single remaining high bit
            if group == MAX_VARINT_LEN - 1 && byte > 0x01 {
                return Err(ProtocolError::VarintOverflow);
            }
            value |= u64::from(byte & 0x7F) << (7 * group);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ProtocolError::VarintOverflow)
    }

    /// Decode a signed varint (zigzag).
    pub fn get_var_i64(&mut self) -> Result<i64> {
        let raw = self.get_var_u64()?;
        Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
    }

    /// Decode a varint-length-prefixed UTF-8 string.
    pub fn get_str(&mut self) -> Result<String> {
        let bytes = self.get_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ProtocolError::MalformedFrame(format!("invalid UTF-8 string: {e}")))
    }

    /// Decode a varint-length-prefixed byte slice.
    pub fn get_bytes(&mut self) -> Result<Bytes> {
        let len = self.get_var_u64()? as usize;
        self.ensure(len)?;
        Ok(self.buf.copy_to_bytes(len))
    }

    /// Take every byte left in the buffer.
    pub fn take_remaining(&mut self) -> Bytes {
        let len = self.buf.remaining();
        self.buf.copy_to_bytes(len)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn roundtrip_u64(value: u64) -> u64 {
        let mut buf = ByteBuf::new();
        buf.put_var_u64(value);
        ByteCursor::new(buf.flush()).get_var_u64().unwrap()
    }

    #[test]
    fn test_varint_small_values_single_byte() {
        for value in [0u64, 1, 17, 127] {
            let mut buf = ByteBuf::new();
            buf.put_var_u64(value);
            let encoded = buf.flush();
            assert_eq!(encoded.len(), 1, "{value} should encode in one byte");
            assert_eq!(roundtrip_u64(value), value);
        }
    }

    #[test]
    fn test_varint_continuation_boundary() {
        let mut buf = ByteBuf::new();
        buf.put_var_u64(128);
        let encoded = buf.flush();
        assert_eq!(encoded.as_ref(), &[0x80, 0x01]);
    }

    #[test]
    fn test_varint_roundtrip_wide_range() {
        for value in [300u64, 16_384, u32::MAX as u64, u64::MAX] {
            assert_eq!(roundtrip_u64(value), value);
        }
    }

    #[test]
    fn test_varint_max_encoding_length() {
        let mut buf = ByteBuf::new();
        buf.put_var_u64(u64::MAX);
        assert_eq!(buf.len(), MAX_VARINT_LEN);
    }

    #[test]
    fn test_varint_overflow_rejected() {
        // eleven continuation bytes can never be a valid u64
        let bytes = Bytes::from(vec![0xFFu8; 11]);
        let result = ByteCursor::new(bytes).get_var_u64();
        assert!(matches!(result, Err(ProtocolError::VarintOverflow)));
    }

    #[test]
    fn test_signed_varint_roundtrip() {
        for value in [0i64, -1, 1, -64, 64, i64::MIN, i64::MAX] {
            let mut buf = ByteBuf::new();
            buf.put_var_i64(value);
            let decoded = ByteCursor::new(buf.flush()).get_var_i64().unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_string_roundtrip() {
        let mut buf = ByteBuf::new();
        buf.put_str("remote désktop 画面");
        let mut cursor = ByteCursor::new(buf.flush());
        assert_eq!(cursor.get_str().unwrap(), "remote désktop 画面");
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_bool_rejects_garbage_byte() {
        let mut cursor = ByteCursor::new(Bytes::from_static(&[2]));
        assert!(matches!(
            cursor.get_bool(),
            Err(ProtocolError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_underrun_reports_counts() {
        let mut cursor = ByteCursor::new(Bytes::from_static(&[1, 2]));
        match cursor.get_u32() {
            Err(ProtocolError::Underrun { needed, remaining }) => {
                assert_eq!(needed, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("expected underrun, got {other:?}"),
        }
    }

    #[test]
    fn test_flush_resets_buffer() {
        let mut buf = ByteBuf::new();
        buf.put_u8(0xAB);
        let first = buf.flush();
        assert_eq!(first.as_ref(), &[0xAB]);
        assert!(buf.is_empty());

        buf.put_u8(0xCD);
        assert_eq!(buf.flush().as_ref(), &[0xCD]);
    }
}
