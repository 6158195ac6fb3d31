//! The 400-byte binary file header at offset 3200.
//!
//! Field offsets are format constants from the SEG-Y rev 1 standard; bytes
//! 60..300 are reserved and kept zero on encode. Two legacy writer quirks
//! are preserved on decode:
//!
//! - samples-per-trace is a 16-bit field at offset 20, but producers that
//!   needed more than 32767 samples wrote the value as a 32-bit unsigned at
//!   offset 18 instead. A negative 16-bit reading triggers the 32-bit
//!   fallback, truncated to 16 bits. The 16-bit field is always consulted
//!   first.
//! - revision numbers outside {0, 1} are normalized to 1.

use serde::{Deserialize, Serialize};

use crate::codec::ByteOrder;
use crate::error::{Result, SegyError};
use crate::format::SampleFormat;

/// Size in bytes of the binary file header.
pub const BINARY_HEADER_LEN: usize = 400;

/// The SEG-Y binary file header.
///
/// Read once at file open, or constructed in memory when creating a new
/// file, and immutable thereafter: the nominal sample grid of a file does
/// not change after creation.
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct BinaryHeader {
    pub job_id: i32,
    pub line_num: i32,
    pub reel_num: i32,
    pub data_traces_per_record: i16,
    pub aux_traces_per_record: i16,
    /// Sample interval of this file, in microseconds.
    pub sample_interval_us: i16,
    /// Sample interval of the original field recording, in microseconds.
    pub sample_interval_orig_us: i16,
    /// The authoritative per-trace sample count for the whole file. The
    /// per-trace header carries its own copy but it is unreliable in
    /// practice and never consulted for decoding.
    pub samples_per_trace: u16,
    pub samples_per_trace_orig: i16,
    /// Raw data sample format code, resolved via [`BinaryHeader::sample_format`].
    pub sample_format_code: i16,
    pub cdp_fold: i16,
    pub trace_sorting_code: i16,
    pub vertical_sum_code: i16,
    pub sweep_frequency_start: i16,
    pub sweep_frequency_end: i16,
    pub sweep_length_ms: i16,
    pub sweep_type: i16,
    pub trace_num_sweep_channel: i16,
    pub sweep_taper_length_start_ms: i16,
    pub sweep_taper_length_end_ms: i16,
    pub sweep_taper_type: i16,
    pub correlated_data_traces: i16,
    pub binary_gain_recovered: i16,
    pub amplitude_recovery: i16,
    pub unit_system: i16,
    pub impulse_signal_polarity: i16,
    pub vibratory_polarity_code: i16,
    pub segy_revision: i16,
    pub fixed_length_trace_flag: i16,
    pub extended_text_header_count: i16,
}

impl BinaryHeader {
    /// A rev-1 fixed-length IBM-float header with the given sample grid,
    /// everything else zeroed.
    pub fn new(sample_interval_us: i16, samples_per_trace: u16) -> Self {
        Self {
            job_id: 0,
            line_num: 0,
            reel_num: 0,
            data_traces_per_record: 0,
            aux_traces_per_record: 0,
            sample_interval_us,
            sample_interval_orig_us: sample_interval_us,
            samples_per_trace,
            samples_per_trace_orig: samples_per_trace as i16,
            sample_format_code: SampleFormat::IbmFloat4.code(),
            cdp_fold: 0,
            trace_sorting_code: 0,
            vertical_sum_code: 0,
            sweep_frequency_start: 0,
            sweep_frequency_end: 0,
            sweep_length_ms: 0,
            sweep_type: 0,
            trace_num_sweep_channel: 0,
            sweep_taper_length_start_ms: 0,
            sweep_taper_length_end_ms: 0,
            sweep_taper_type: 0,
            correlated_data_traces: 0,
            binary_gain_recovered: 0,
            amplitude_recovery: 0,
            unit_system: 0,
            impulse_signal_polarity: 0,
            vibratory_polarity_code: 0,
            segy_revision: 1,
            fixed_length_trace_flag: 1,
            extended_text_header_count: 0,
        }
    }

    /// Resolves the sample format code into a known [`SampleFormat`].
    pub fn sample_format(&self) -> Result<SampleFormat> {
        SampleFormat::from_code(self.sample_format_code)
    }

    /// Decodes a binary header from a 400-byte region starting at `offset`.
    pub fn decode(bytes: &[u8], offset: usize, order: ByteOrder) -> Result<Self> {
        if bytes.len() < offset + BINARY_HEADER_LEN {
            return Err(SegyError::Format(format!(
                "binary header needs {BINARY_HEADER_LEN} bytes, got {}",
                bytes.len().saturating_sub(offset)
            )));
        }

        let ns16 = order.read_i16(bytes, offset + 20);
        let samples_per_trace = if ns16 >= 0 {
            ns16 as u16
        } else {
            let ns32 = order.read_u32(bytes, offset + 18);
            log::warn!("16-bit samples-per-trace reads {ns16}, using 32-bit fallback {ns32}");
            ns32 as u16
        };

        let mut segy_revision = order.read_i16(bytes, offset + 300);
        if segy_revision != 0 && segy_revision != 1 {
            log::warn!("unrecognized SEG-Y revision {segy_revision}, normalizing to 1");
            segy_revision = 1;
        }

        Ok(Self {
            job_id: order.read_i32(bytes, offset),
            line_num: order.read_i32(bytes, offset + 4),
            reel_num: order.read_i32(bytes, offset + 8),
            data_traces_per_record: order.read_i16(bytes, offset + 12),
            aux_traces_per_record: order.read_i16(bytes, offset + 14),
            sample_interval_us: order.read_i16(bytes, offset + 16),
            sample_interval_orig_us: order.read_i16(bytes, offset + 18),
            samples_per_trace,
            samples_per_trace_orig: order.read_i16(bytes, offset + 22),
            sample_format_code: order.read_i16(bytes, offset + 24),
            cdp_fold: order.read_i16(bytes, offset + 26),
            trace_sorting_code: order.read_i16(bytes, offset + 28),
            vertical_sum_code: order.read_i16(bytes, offset + 30),
            sweep_frequency_start: order.read_i16(bytes, offset + 32),
            sweep_frequency_end: order.read_i16(bytes, offset + 34),
            sweep_length_ms: order.read_i16(bytes, offset + 36),
            sweep_type: order.read_i16(bytes, offset + 38),
            trace_num_sweep_channel: order.read_i16(bytes, offset + 40),
            sweep_taper_length_start_ms: order.read_i16(bytes, offset + 42),
            sweep_taper_length_end_ms: order.read_i16(bytes, offset + 44),
            sweep_taper_type: order.read_i16(bytes, offset + 46),
            correlated_data_traces: order.read_i16(bytes, offset + 48),
            binary_gain_recovered: order.read_i16(bytes, offset + 50),
            amplitude_recovery: order.read_i16(bytes, offset + 52),
            unit_system: order.read_i16(bytes, offset + 54),
            impulse_signal_polarity: order.read_i16(bytes, offset + 56),
            vibratory_polarity_code: order.read_i16(bytes, offset + 58),
            segy_revision,
            fixed_length_trace_flag: order.read_i16(bytes, offset + 302),
            extended_text_header_count: order.read_i16(bytes, offset + 304),
        })
    }

    /// Encodes this header into a 400-byte region starting at `offset`.
    /// Reserved bytes are zeroed.
    pub fn encode(&self, buf: &mut [u8], offset: usize, order: ByteOrder) -> Result<()> {
        if buf.len() < offset + BINARY_HEADER_LEN {
            return Err(SegyError::Format(format!(
                "binary header needs {BINARY_HEADER_LEN} bytes of output, got {}",
                buf.len().saturating_sub(offset)
            )));
        }
        buf[offset..offset + BINARY_HEADER_LEN].fill(0);

        order.write_i32(self.job_id, buf, offset);
        order.write_i32(self.line_num, buf, offset + 4);
        order.write_i32(self.reel_num, buf, offset + 8);
        order.write_i16(self.data_traces_per_record, buf, offset + 12);
        order.write_i16(self.aux_traces_per_record, buf, offset + 14);
        order.write_i16(self.sample_interval_us, buf, offset + 16);
        order.write_i16(self.sample_interval_orig_us, buf, offset + 18);
        order.write_u16(self.samples_per_trace, buf, offset + 20);
        order.write_i16(self.samples_per_trace_orig, buf, offset + 22);
        order.write_i16(self.sample_format_code, buf, offset + 24);
        order.write_i16(self.cdp_fold, buf, offset + 26);
        order.write_i16(self.trace_sorting_code, buf, offset + 28);
        order.write_i16(self.vertical_sum_code, buf, offset + 30);
        order.write_i16(self.sweep_frequency_start, buf, offset + 32);
        order.write_i16(self.sweep_frequency_end, buf, offset + 34);
        order.write_i16(self.sweep_length_ms, buf, offset + 36);
        order.write_i16(self.sweep_type, buf, offset + 38);
        order.write_i16(self.trace_num_sweep_channel, buf, offset + 40);
        order.write_i16(self.sweep_taper_length_start_ms, buf, offset + 42);
        order.write_i16(self.sweep_taper_length_end_ms, buf, offset + 44);
        order.write_i16(self.sweep_taper_type, buf, offset + 46);
        order.write_i16(self.correlated_data_traces, buf, offset + 48);
        order.write_i16(self.binary_gain_recovered, buf, offset + 50);
        order.write_i16(self.amplitude_recovery, buf, offset + 52);
        order.write_i16(self.unit_system, buf, offset + 54);
        order.write_i16(self.impulse_signal_polarity, buf, offset + 56);
        order.write_i16(self.vibratory_polarity_code, buf, offset + 58);
        order.write_i16(self.segy_revision, buf, offset + 300);
        order.write_i16(self.fixed_length_trace_flag, buf, offset + 302);
        order.write_i16(self.extended_text_header_count, buf, offset + 304);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_header() -> BinaryHeader {
        let mut header = BinaryHeader::new(2000, 1001);
        header.job_id = 42;
        header.line_num = -7;
        header.reel_num = 3;
        header.cdp_fold = 60;
        header.sweep_frequency_start = 8;
        header.sweep_frequency_end = 80;
        header.extended_text_header_count = 2;
        header
    }

    #[test]
    fn roundtrip_both_orders() {
        let header = sample_header();
        for order in [ByteOrder::Big, ByteOrder::Little] {
            let mut buf = [0u8; BINARY_HEADER_LEN];
            header.encode(&mut buf, 0, order).unwrap();
            let decoded = BinaryHeader::decode(&buf, 0, order).unwrap();
            assert_eq!(decoded, header);
        }
    }

    #[test]
    fn decode_at_offset() {
        let header = sample_header();
        let mut buf = vec![0u8; 3200 + BINARY_HEADER_LEN];
        header.encode(&mut buf, 3200, ByteOrder::Big).unwrap();
        let decoded = BinaryHeader::decode(&buf, 3200, ByteOrder::Big).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn samples_per_trace_falls_back_to_32_bit_field() {
        // 40000 does not fit i16; the 16-bit field reads negative and the
        // unsigned 32-bit field spanning offsets 18..22 takes over.
        let mut header = sample_header();
        header.samples_per_trace = 40_000;
        header.sample_interval_orig_us = 0;
        let mut buf = [0u8; BINARY_HEADER_LEN];
        header.encode(&mut buf, 0, ByteOrder::Big).unwrap();
        assert_eq!(ByteOrder::Big.read_i16(&buf, 20), -25_536i16);
        let decoded = BinaryHeader::decode(&buf, 0, ByteOrder::Big).unwrap();
        assert_eq!(decoded.samples_per_trace, 40_000);
    }

    #[test]
    fn sixteen_bit_field_wins_when_non_negative() {
        let mut buf = [0u8; BINARY_HEADER_LEN];
        ByteOrder::Big.write_u32(40_000, &mut buf, 18);
        // A non-negative 16-bit value must win even though the 32-bit
        // reading would differ.
        ByteOrder::Big.write_i16(500, &mut buf, 20);
        let decoded = BinaryHeader::decode(&buf, 0, ByteOrder::Big).unwrap();
        assert_eq!(decoded.samples_per_trace, 500);
    }

    #[test]
    fn revision_outside_zero_and_one_normalizes() {
        let mut buf = [0u8; BINARY_HEADER_LEN];
        for raw in [5i16, -1, 256] {
            ByteOrder::Big.write_i16(raw, &mut buf, 300);
            let decoded = BinaryHeader::decode(&buf, 0, ByteOrder::Big).unwrap();
            assert_eq!(decoded.segy_revision, 1);
        }
        ByteOrder::Big.write_i16(0, &mut buf, 300);
        let decoded = BinaryHeader::decode(&buf, 0, ByteOrder::Big).unwrap();
        assert_eq!(decoded.segy_revision, 0);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let buf = [0u8; 399];
        assert!(matches!(
            BinaryHeader::decode(&buf, 0, ByteOrder::Big),
            Err(SegyError::Format(_))
        ));
    }
}
