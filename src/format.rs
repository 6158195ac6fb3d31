//! Data sample format codes and the per-format sample codecs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::ByteOrder;
use crate::error::{Result, SegyError};
use crate::ibm;

/// Absolute file offset of the sample format code field, 24 bytes into the
/// binary header at 3200.
pub(crate) const FORMAT_CODE_OFFSET: usize = 3224;

/// A data sample format the binary header can declare.
///
/// Codes 1, 2, 3, 5 and 8 have full codecs. Code 4 (fixed gain, an obsolete
/// rev-0 format) is recognized for its sample size so trace geometry still
/// works, but decoding or encoding its samples is refused.
#[derive(Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SampleFormat {
    /// Code 1, 4-byte IBM System/360 hexadecimal floating point.
    IbmFloat4,
    /// Code 2, 4-byte two's complement integer.
    Int4,
    /// Code 3, 2-byte two's complement integer.
    Int2,
    /// Code 4, 4-byte fixed point with gain. No codec.
    FixedGain4,
    /// Code 5, 4-byte IEEE-754 floating point.
    IeeeFloat4,
    /// Code 8, 1-byte two's complement integer.
    Int1,
}

impl SampleFormat {
    /// Resolves a header format code, rejecting codes with no known sample
    /// size (0, 6, 7 and anything out of range).
    pub fn from_code(code: i16) -> Result<Self> {
        match code {
            1 => Ok(Self::IbmFloat4),
            2 => Ok(Self::Int4),
            3 => Ok(Self::Int2),
            4 => Ok(Self::FixedGain4),
            5 => Ok(Self::IeeeFloat4),
            8 => Ok(Self::Int1),
            _ => Err(SegyError::UnsupportedSampleFormat(code)),
        }
    }

    /// The header code for this format.
    pub fn code(self) -> i16 {
        match self {
            Self::IbmFloat4 => 1,
            Self::Int4 => 2,
            Self::Int2 => 3,
            Self::FixedGain4 => 4,
            Self::IeeeFloat4 => 5,
            Self::Int1 => 8,
        }
    }

    /// Bytes per sample.
    pub fn sample_size(self) -> usize {
        match self {
            Self::IbmFloat4 | Self::Int4 | Self::FixedGain4 | Self::IeeeFloat4 => 4,
            Self::Int2 => 2,
            Self::Int1 => 1,
        }
    }

    /// Decodes `count` samples from `bytes` into `f32` amplitudes.
    ///
    /// `bytes` must hold exactly `count * sample_size()` bytes. Integer
    /// formats are widened; values outside `f32`'s exact integer range
    /// round, which at 24 significant bits only affects large `Int4` data.
    pub fn decode_samples(self, bytes: &[u8], count: usize, order: ByteOrder) -> Result<Vec<f32>> {
        let expected = count * self.sample_size();
        if bytes.len() != expected {
            return Err(SegyError::Format(format!(
                "sample payload is {} bytes, format {self} needs {expected} for {count} samples",
                bytes.len()
            )));
        }
        let mut out = Vec::with_capacity(count);
        match self {
            Self::IbmFloat4 => {
                for i in 0..count {
                    out.push(ibm::to_f32(order.read_u32(bytes, i * 4)));
                }
            }
            Self::Int4 => {
                for i in 0..count {
                    out.push(order.read_i32(bytes, i * 4) as f32);
                }
            }
            Self::Int2 => {
                for i in 0..count {
                    out.push(order.read_i16(bytes, i * 2) as f32);
                }
            }
            Self::IeeeFloat4 => {
                for i in 0..count {
                    out.push(order.read_f32(bytes, i * 4));
                }
            }
            Self::Int1 => {
                for i in 0..count {
                    out.push(bytes[i] as i8 as f32);
                }
            }
            Self::FixedGain4 => return Err(SegyError::UnsupportedSampleFormat(self.code())),
        }
        Ok(out)
    }

    /// Encodes `f32` amplitudes into `buf`, which must hold exactly
    /// `samples.len() * sample_size()` bytes.
    ///
    /// Integer formats truncate toward zero and saturate at the type's
    /// bounds, matching `as` casts from float.
    pub fn encode_samples(self, samples: &[f32], buf: &mut [u8], order: ByteOrder) -> Result<()> {
        let expected = samples.len() * self.sample_size();
        if buf.len() != expected {
            return Err(SegyError::Format(format!(
                "sample buffer is {} bytes, format {self} needs {expected} for {} samples",
                buf.len(),
                samples.len()
            )));
        }
        match self {
            Self::IbmFloat4 => {
                for (i, &s) in samples.iter().enumerate() {
                    order.write_u32(ibm::from_f32(s), buf, i * 4);
                }
            }
            Self::Int4 => {
                for (i, &s) in samples.iter().enumerate() {
                    order.write_i32(s as i32, buf, i * 4);
                }
            }
            Self::Int2 => {
                for (i, &s) in samples.iter().enumerate() {
                    order.write_i16(s as i16, buf, i * 2);
                }
            }
            Self::IeeeFloat4 => {
                for (i, &s) in samples.iter().enumerate() {
                    order.write_f32(s, buf, i * 4);
                }
            }
            Self::Int1 => {
                for (i, &s) in samples.iter().enumerate() {
                    buf[i] = s as i8 as u8;
                }
            }
            Self::FixedGain4 => return Err(SegyError::UnsupportedSampleFormat(self.code())),
        }
        Ok(())
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IbmFloat4 => "IBM float (4 bytes)",
            Self::Int4 => "integer (4 bytes)",
            Self::Int2 => "integer (2 bytes)",
            Self::FixedGain4 => "fixed point with gain (4 bytes)",
            Self::IeeeFloat4 => "IEEE float (4 bytes)",
            Self::Int1 => "integer (1 byte)",
        };
        write!(f, "{name}")
    }
}

/// Infers byte order and sample format from the two format-code bytes.
///
/// `prefix` must cover the file up to at least offset 3226. The code is
/// interpreted under both byte orders; an interpretation is plausible when
/// it lands in 0..=8. Ties (which only happen for symmetric byte pairs)
/// resolve to big-endian, the order the standard mandates.
pub fn infer(prefix: &[u8]) -> Result<(ByteOrder, SampleFormat)> {
    if prefix.len() < FORMAT_CODE_OFFSET + 2 {
        return Err(SegyError::Format(format!(
            "need {} bytes to inspect the format code, got {}",
            FORMAT_CODE_OFFSET + 2,
            prefix.len()
        )));
    }
    let be = ByteOrder::Big.read_i16(prefix, FORMAT_CODE_OFFSET);
    let le = ByteOrder::Little.read_i16(prefix, FORMAT_CODE_OFFSET);
    let plausible = |code: i16| (0..=8).contains(&code);

    let (order, code) = if plausible(be) {
        (ByteOrder::Big, be)
    } else if plausible(le) {
        log::debug!("format code {be} is implausible big-endian, {le} little-endian fits");
        (ByteOrder::Little, le)
    } else {
        return Err(SegyError::Format(format!(
            "format code bytes {:02x?} are implausible in either byte order",
            &prefix[FORMAT_CODE_OFFSET..FORMAT_CODE_OFFSET + 2]
        )));
    };
    Ok((order, SampleFormat::from_code(code)?))
}
