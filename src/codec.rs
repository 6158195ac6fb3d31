//! Fixed-width scalar codec under an explicit byte order.
//!
//! SEG-Y is nominally big endian but little endian files exist in the wild,
//! so every decode/encode path takes the order explicitly and no path depends
//! on host endianness.

use serde::{Deserialize, Serialize};

/// Byte order of multi-byte fields in a SEG-Y stream.
#[derive(Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ByteOrder {
    Big,
    Little,
}

/// read_/write_ pair for one scalar width. Callers guarantee that
/// `offset + size_of::<$typ>()` is in bounds.
macro_rules! scalar_codec {
    ($read:ident, $write:ident, $typ:ty, $len:expr) => {
        pub fn $read(self, buf: &[u8], offset: usize) -> $typ {
            let mut bytes = [0u8; $len];
            bytes.copy_from_slice(&buf[offset..offset + $len]);
            match self {
                ByteOrder::Big => <$typ>::from_be_bytes(bytes),
                ByteOrder::Little => <$typ>::from_le_bytes(bytes),
            }
        }

        pub fn $write(self, value: $typ, buf: &mut [u8], offset: usize) {
            let bytes = match self {
                ByteOrder::Big => value.to_be_bytes(),
                ByteOrder::Little => value.to_le_bytes(),
            };
            buf[offset..offset + $len].copy_from_slice(&bytes);
        }
    };
}

impl ByteOrder {
    scalar_codec!(read_i16, write_i16, i16, 2);
    scalar_codec!(read_u16, write_u16, u16, 2);
    scalar_codec!(read_i32, write_i32, i32, 4);
    scalar_codec!(read_u32, write_u32, u32, 4);
    scalar_codec!(read_i64, write_i64, i64, 8);
    scalar_codec!(read_u64, write_u64, u64, 8);
    scalar_codec!(read_f32, write_f32, f32, 4);
    scalar_codec!(read_f64, write_f64, f64, 8);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scalar_roundtrip_both_orders() {
        let mut buf = [0u8; 16];
        for order in [ByteOrder::Big, ByteOrder::Little] {
            order.write_i16(-12345, &mut buf, 1);
            assert_eq!(order.read_i16(&buf, 1), -12345);
            order.write_u32(0xDEAD_BEEF, &mut buf, 3);
            assert_eq!(order.read_u32(&buf, 3), 0xDEAD_BEEF);
            order.write_i64(i64::MIN + 7, &mut buf, 8);
            assert_eq!(order.read_i64(&buf, 8), i64::MIN + 7);
            order.write_u64(u64::MAX - 9, &mut buf, 8);
            assert_eq!(order.read_u64(&buf, 8), u64::MAX - 9);
            order.write_f32(-2.5, &mut buf, 0);
            assert_eq!(order.read_f32(&buf, 0), -2.5);
            order.write_f64(1.0e300, &mut buf, 8);
            assert_eq!(order.read_f64(&buf, 8), 1.0e300);
        }
    }

    #[test]
    fn big_and_little_are_byte_reversals() {
        let mut big = [0u8; 4];
        let mut little = [0u8; 4];
        ByteOrder::Big.write_i32(0x0102_0304, &mut big, 0);
        ByteOrder::Little.write_i32(0x0102_0304, &mut little, 0);
        assert_eq!(big, [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(little, [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(ByteOrder::Little.read_i32(&big, 0), 0x0403_0201);
    }

    #[test]
    fn unsigned_reads_do_not_sign_extend() {
        let buf = [0xFF, 0xFE];
        assert_eq!(ByteOrder::Big.read_u16(&buf, 0), 0xFFFE);
        assert_eq!(ByteOrder::Big.read_i16(&buf, 0), -2);
    }
}
