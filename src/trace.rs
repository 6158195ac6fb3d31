//! The 240-byte trace header and the in-memory trace record.
//!
//! The trace header is pure metadata here. In particular its own
//! samples-in-trace field is ignored when decoding sample payloads; the
//! binary file header's count is authoritative for the whole file.

use serde::{Deserialize, Serialize};

use crate::codec::ByteOrder;
use crate::error::{Result, SegyError};

/// Size in bytes of one trace header.
pub const TRACE_HEADER_LEN: usize = 240;

/// Field access for the scalar types a trace header is made of.
trait HeaderField: Sized {
    fn get(order: ByteOrder, buf: &[u8], offset: usize) -> Self;
    fn put(self, order: ByteOrder, buf: &mut [u8], offset: usize);
}

macro_rules! header_field {
    ($ty:ty, $read:ident, $write:ident) => {
        impl HeaderField for $ty {
            fn get(order: ByteOrder, buf: &[u8], offset: usize) -> Self {
                order.$read(buf, offset)
            }
            fn put(self, order: ByteOrder, buf: &mut [u8], offset: usize) {
                order.$write(self, buf, offset);
            }
        }
    };
}

header_field!(i16, read_i16, write_i16);
header_field!(u16, read_u16, write_u16);
header_field!(i32, read_i32, write_i32);

/// Declares the header struct together with its on-disk field table, so the
/// layout is written down exactly once.
macro_rules! trace_header {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($field:ident: $ty:ty => $offset:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        pub struct $name {
            $(pub $field: $ty,)+
        }

        impl $name {
            /// Decodes a trace header from a 240-byte region starting at
            /// `offset`.
            pub fn decode(bytes: &[u8], offset: usize, order: ByteOrder) -> Result<Self> {
                if bytes.len() < offset + TRACE_HEADER_LEN {
                    return Err(SegyError::Format(format!(
                        "trace header needs {TRACE_HEADER_LEN} bytes, got {}",
                        bytes.len().saturating_sub(offset)
                    )));
                }
                Ok(Self {
                    $($field: <$ty as HeaderField>::get(order, bytes, offset + $offset),)+
                })
            }

            /// Encodes this header into a 240-byte region starting at
            /// `offset`.
            pub fn encode(&self, buf: &mut [u8], offset: usize, order: ByteOrder) -> Result<()> {
                if buf.len() < offset + TRACE_HEADER_LEN {
                    return Err(SegyError::Format(format!(
                        "trace header needs {TRACE_HEADER_LEN} bytes of output, got {}",
                        buf.len().saturating_sub(offset)
                    )));
                }
                buf[offset..offset + TRACE_HEADER_LEN].fill(0);
                $(HeaderField::put(self.$field, order, buf, offset + $offset);)+
                Ok(())
            }
        }
    };
}

trace_header! {
    /// A SEG-Y rev 1 trace header. Offsets in the table are zero-based
    /// byte positions within the 240-byte block.
    #[derive(Deserialize, Serialize, Clone, Default, PartialEq, Eq, Debug)]
    #[serde(rename_all = "PascalCase")]
    pub struct TraceHeader {
        trace_sequence_line: i32 => 0,
        trace_sequence_file: i32 => 4,
        field_record_num: i32 => 8,
        trace_num_in_field_record: i32 => 12,
        energy_source_point: i32 => 16,
        ensemble_num: i32 => 20,
        trace_num_in_ensemble: i32 => 24,
        trace_id_code: i16 => 28,
        vertically_summed_traces: i16 => 30,
        horizontally_stacked_traces: i16 => 32,
        data_use: i16 => 34,
        source_receiver_distance: i32 => 36,
        receiver_elevation: i32 => 40,
        surface_elevation_at_source: i32 => 44,
        source_depth: i32 => 48,
        datum_elevation_receiver: i32 => 52,
        datum_elevation_source: i32 => 56,
        water_depth_source: i32 => 60,
        water_depth_receiver: i32 => 64,
        elevation_scalar: i16 => 68,
        coordinate_scalar: i16 => 70,
        source_x: i32 => 72,
        source_y: i32 => 76,
        receiver_x: i32 => 80,
        receiver_y: i32 => 84,
        coordinate_units: i16 => 88,
        weathering_velocity: i16 => 90,
        subweathering_velocity: i16 => 92,
        uphole_time_source_ms: i16 => 94,
        uphole_time_receiver_ms: i16 => 96,
        source_static_correction_ms: i16 => 98,
        receiver_static_correction_ms: i16 => 100,
        total_static_ms: i16 => 102,
        lag_time_a_ms: i16 => 104,
        lag_time_b_ms: i16 => 106,
        delay_recording_time_ms: i16 => 108,
        mute_time_start_ms: i16 => 110,
        mute_time_end_ms: i16 => 112,
        samples_in_trace: u16 => 114,
        sample_interval_us: u16 => 116,
        gain_type: i16 => 118,
        instrument_gain_constant_db: i16 => 120,
        instrument_initial_gain_db: i16 => 122,
        correlated: i16 => 124,
        sweep_frequency_start: i16 => 126,
        sweep_frequency_end: i16 => 128,
        sweep_length_ms: i16 => 130,
        sweep_type: i16 => 132,
        sweep_taper_start_ms: i16 => 134,
        sweep_taper_end_ms: i16 => 136,
        taper_type: i16 => 138,
        alias_filter_frequency: i16 => 140,
        alias_filter_slope: i16 => 142,
        notch_filter_frequency: i16 => 144,
        notch_filter_slope: i16 => 146,
        low_cut_frequency: i16 => 148,
        high_cut_frequency: i16 => 150,
        low_cut_slope: i16 => 152,
        high_cut_slope: i16 => 154,
        year: i16 => 156,
        day_of_year: i16 => 158,
        hour: i16 => 160,
        minute: i16 => 162,
        second: i16 => 164,
        time_basis_code: i16 => 166,
        trace_weighting_factor: i16 => 168,
        geophone_group_num_roll_switch: i16 => 170,
        geophone_group_num_first_trace: i16 => 172,
        geophone_group_num_last_trace: i16 => 174,
        gap_size: i16 => 176,
        over_travel: i16 => 178,
        cdp_x: i32 => 180,
        cdp_y: i32 => 184,
        inline_num: i32 => 188,
        crossline_num: i32 => 192,
        shot_point_num: i32 => 196,
        shot_point_scalar: i16 => 200,
        trace_value_unit: i16 => 202,
        transduction_constant_mantissa: i32 => 204,
        transduction_constant_exponent: i16 => 208,
        transduction_units: i16 => 210,
        device_id: i16 => 212,
        time_scalar: i16 => 214,
        source_type_orientation: i16 => 216,
        source_energy_direction_mantissa: i32 => 218,
        source_energy_direction_exponent: i16 => 222,
        source_measurement_mantissa: i32 => 224,
        source_measurement_exponent: i16 => 228,
        source_measurement_unit: i16 => 230,
        unassigned1: i32 => 232,
        unassigned2: i32 => 236,
    }
}

#[cfg(feature = "chrono")]
impl TraceHeader {
    /// The recording time fields as a UTC timestamp, when they form a
    /// valid date. The year field is a four-digit year, the day field is
    /// 1-based day of year.
    pub fn recording_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        use chrono::TimeZone;
        let date = chrono::NaiveDate::from_yo_opt(self.year as i32, self.day_of_year as u32)?;
        let time = date.and_hms_opt(
            u32::try_from(self.hour).ok()?,
            u32::try_from(self.minute).ok()?,
            u32::try_from(self.second).ok()?,
        )?;
        Some(chrono::Utc.from_utc_datetime(&time))
    }

    /// Stores a UTC timestamp into the recording time fields, discarding
    /// sub-second precision.
    pub fn set_recording_time(&mut self, time: chrono::DateTime<chrono::Utc>) {
        use chrono::{Datelike, Timelike};
        self.year = time.year() as i16;
        self.day_of_year = time.ordinal() as i16;
        self.hour = time.hour() as i16;
        self.minute = time.minute() as i16;
        self.second = time.second() as i16;
    }
}

/// One trace: its header plus decoded amplitudes.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Trace {
    pub header: TraceHeader,
    pub samples: Vec<f32>,
}

impl Trace {
    pub fn new(header: TraceHeader, samples: Vec<f32>) -> Self {
        Self { header, samples }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_header() -> TraceHeader {
        let mut header = TraceHeader::default();
        header.trace_sequence_line = 17;
        header.field_record_num = 1024;
        header.trace_id_code = 1;
        header.source_x = -12_345_678;
        header.source_y = 987_654;
        header.coordinate_scalar = -100;
        header.samples_in_trace = 1001;
        header.sample_interval_us = 2000;
        header.year = 1987;
        header.day_of_year = 200;
        header.inline_num = 402;
        header.crossline_num = 1101;
        header.unassigned2 = 9;
        header
    }

    #[test]
    fn roundtrip_both_orders() {
        let header = sample_header();
        for order in [ByteOrder::Big, ByteOrder::Little] {
            let mut buf = [0u8; TRACE_HEADER_LEN];
            header.encode(&mut buf, 0, order).unwrap();
            let decoded = TraceHeader::decode(&buf, 0, order).unwrap();
            assert_eq!(decoded, header);
        }
    }

    #[test]
    fn known_field_positions() {
        let header = sample_header();
        let mut buf = [0u8; TRACE_HEADER_LEN];
        header.encode(&mut buf, 0, ByteOrder::Big).unwrap();
        assert_eq!(ByteOrder::Big.read_i32(&buf, 72), -12_345_678);
        assert_eq!(ByteOrder::Big.read_u16(&buf, 114), 1001);
        assert_eq!(ByteOrder::Big.read_i16(&buf, 156), 1987);
        assert_eq!(ByteOrder::Big.read_i32(&buf, 236), 9);
    }

    #[test]
    fn decode_at_offset() {
        let header = sample_header();
        let mut buf = vec![0u8; 600];
        header.encode(&mut buf, 360, ByteOrder::Little).unwrap();
        let decoded = TraceHeader::decode(&buf, 360, ByteOrder::Little).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let buf = [0u8; TRACE_HEADER_LEN];
        assert!(TraceHeader::decode(&buf, 1, ByteOrder::Big).is_err());
        let mut out = [0u8; TRACE_HEADER_LEN - 1];
        assert!(sample_header().encode(&mut out, 0, ByteOrder::Big).is_err());
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn recording_time_roundtrip() {
        use chrono::TimeZone;
        let mut header = TraceHeader::default();
        let time = chrono::Utc.with_ymd_and_hms(1987, 7, 19, 6, 30, 15).unwrap();
        header.set_recording_time(time);
        assert_eq!(header.year, 1987);
        assert_eq!(header.day_of_year, 200);
        assert_eq!(header.recording_time(), Some(time));
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn zeroed_time_fields_are_not_a_timestamp() {
        assert_eq!(TraceHeader::default().recording_time(), None);
    }
}
