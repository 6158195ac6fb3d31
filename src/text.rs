//! 3200-byte textual headers, 40 card-image rows of 80 columns.
//!
//! Headers on disk are either ASCII or EBCDIC (code page 037). The first
//! byte tells them apart: every conforming header starts its first row with
//! a `C` marker, which is 0x43 in ASCII and 0xC3 in EBCDIC. Internally the
//! text is always held as ASCII and converted at the disk boundary.

use std::fmt;

use crate::error::{Result, SegyError};

/// Size in bytes of one textual header block.
pub const TEXT_HEADER_LEN: usize = 3200;

const ROWS: usize = 40;
const COLS: usize = 80;
/// Row marker "Cnn " occupies the first four columns of each row.
const ROW_PREFIX: usize = 4;
const CONTENT_COLS: usize = COLS - ROW_PREFIX;
/// Rows 39 and 40 carry fixed trailer text, leaving 38 for user content.
const CONTENT_ROWS: usize = ROWS - 2;

/// Character encoding of a textual header on disk.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TextEncoding {
    Ascii,
    Ebcdic,
}

impl TextEncoding {
    /// Detects the encoding from the first byte of a header block.
    pub fn detect(first: u8) -> Self {
        if first == b'C' {
            Self::Ascii
        } else {
            Self::Ebcdic
        }
    }
}

/// One 3200-byte textual header, held as ASCII.
#[derive(Clone, PartialEq, Eq)]
pub struct TextHeader {
    bytes: [u8; TEXT_HEADER_LEN],
}

impl TextHeader {
    /// Conditions free text into a conforming header.
    ///
    /// Text that already starts with a `C` row marker is taken as
    /// pre-formatted and only padded with spaces to 3200 bytes. Anything
    /// else is wrapped into `Cnn `-prefixed rows with the standard trailer
    /// rows appended.
    pub fn from_text(text: &str) -> Result<Self> {
        if !text.is_ascii() {
            return Err(SegyError::Format(
                "text header must be ASCII".to_string(),
            ));
        }
        if text.len() > TEXT_HEADER_LEN {
            return Err(SegyError::Format(format!(
                "text header is {} chars, limit is {TEXT_HEADER_LEN}",
                text.len()
            )));
        }

        let mut bytes = [b' '; TEXT_HEADER_LEN];
        if text.starts_with('C') {
            bytes[..text.len()].copy_from_slice(text.as_bytes());
            return Ok(Self { bytes });
        }

        if text.len() > CONTENT_ROWS * CONTENT_COLS {
            return Err(SegyError::Format(format!(
                "text header is {} chars, {} fit after row conditioning",
                text.len(),
                CONTENT_ROWS * CONTENT_COLS
            )));
        }
        let mut chunks = text.as_bytes().chunks(CONTENT_COLS);
        for row in 0..CONTENT_ROWS {
            let start = row * COLS;
            bytes[start..start + ROW_PREFIX]
                .copy_from_slice(format!("C{:02} ", row + 1).as_bytes());
            if let Some(chunk) = chunks.next() {
                bytes[start + ROW_PREFIX..start + ROW_PREFIX + chunk.len()]
                    .copy_from_slice(chunk);
            }
        }
        let rev = b"C39 SEG Y REV 1";
        bytes[38 * COLS..38 * COLS + rev.len()].copy_from_slice(rev);
        let end = b"C40 END TEXTUAL HEADER";
        bytes[39 * COLS..39 * COLS + end.len()].copy_from_slice(end);
        Ok(Self { bytes })
    }

    /// Decodes a 3200-byte block, detecting and reporting its encoding.
    pub fn decode(block: &[u8]) -> Result<(Self, TextEncoding)> {
        if block.len() < TEXT_HEADER_LEN {
            return Err(SegyError::Format(format!(
                "text header needs {TEXT_HEADER_LEN} bytes, got {}",
                block.len()
            )));
        }
        let encoding = TextEncoding::detect(block[0]);
        let mut bytes = [0u8; TEXT_HEADER_LEN];
        match encoding {
            TextEncoding::Ascii => bytes.copy_from_slice(&block[..TEXT_HEADER_LEN]),
            TextEncoding::Ebcdic => {
                for (out, &b) in bytes.iter_mut().zip(block) {
                    *out = ebcdic_to_ascii(b);
                }
            }
        }
        Ok((Self { bytes }, encoding))
    }

    /// Serializes the header in the requested on-disk encoding.
    pub fn encode(&self, encoding: TextEncoding) -> [u8; TEXT_HEADER_LEN] {
        match encoding {
            TextEncoding::Ascii => self.bytes,
            TextEncoding::Ebcdic => {
                let mut out = [0u8; TEXT_HEADER_LEN];
                for (o, &b) in out.iter_mut().zip(&self.bytes) {
                    *o = ascii_to_ebcdic(b);
                }
                out
            }
        }
    }

    /// The header text as ASCII bytes.
    pub fn as_bytes(&self) -> &[u8; TEXT_HEADER_LEN] {
        &self.bytes
    }

    /// One 80-column row, 1-based like the `Cnn` markers.
    pub fn row(&self, n: usize) -> Option<&str> {
        if n == 0 || n > ROWS {
            return None;
        }
        let start = (n - 1) * COLS;
        // Internal bytes are ASCII by construction.
        std::str::from_utf8(&self.bytes[start..start + COLS]).ok()
    }
}

impl fmt::Display for TextHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for n in 1..=ROWS {
            if let Some(row) = self.row(n) {
                writeln!(f, "{}", row.trim_end())?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TextHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextHeader")
            .field("row1", &self.row(1).unwrap_or("").trim_end())
            .finish_non_exhaustive()
    }
}

/// Code page 037 to ASCII for the printable set; everything else becomes a
/// space, which is all a card-image header can carry anyway.
fn ebcdic_to_ascii(b: u8) -> u8 {
    match b {
        0x40 => b' ',
        0x4B => b'.',
        0x4C => b'<',
        0x4D => b'(',
        0x4E => b'+',
        0x4F => b'|',
        0x50 => b'&',
        0x5A => b'!',
        0x5B => b'$',
        0x5C => b'*',
        0x5D => b')',
        0x5E => b';',
        0x60 => b'-',
        0x61 => b'/',
        0x6B => b',',
        0x6C => b'%',
        0x6D => b'_',
        0x6E => b'>',
        0x6F => b'?',
        0x79 => b'`',
        0x7A => b':',
        0x7B => b'#',
        0x7C => b'@',
        0x7D => b'\'',
        0x7E => b'=',
        0x7F => b'"',
        0x81..=0x89 => b'a' + (b - 0x81),
        0x91..=0x99 => b'j' + (b - 0x91),
        0xA1 => b'~',
        0xA2..=0xA9 => b's' + (b - 0xA2),
        0xB0 => b'^',
        0xBA => b'[',
        0xBB => b']',
        0xC0 => b'{',
        0xC1..=0xC9 => b'A' + (b - 0xC1),
        0xD0 => b'}',
        0xD1..=0xD9 => b'J' + (b - 0xD1),
        0xE0 => b'\\',
        0xE2..=0xE9 => b'S' + (b - 0xE2),
        0xF0..=0xF9 => b'0' + (b - 0xF0),
        _ => b' ',
    }
}

fn ascii_to_ebcdic(b: u8) -> u8 {
    match b {
        b' ' => 0x40,
        b'.' => 0x4B,
        b'<' => 0x4C,
        b'(' => 0x4D,
        b'+' => 0x4E,
        b'|' => 0x4F,
        b'&' => 0x50,
        b'!' => 0x5A,
        b'$' => 0x5B,
        b'*' => 0x5C,
        b')' => 0x5D,
        b';' => 0x5E,
        b'-' => 0x60,
        b'/' => 0x61,
        b',' => 0x6B,
        b'%' => 0x6C,
        b'_' => 0x6D,
        b'>' => 0x6E,
        b'?' => 0x6F,
        b'`' => 0x79,
        b':' => 0x7A,
        b'#' => 0x7B,
        b'@' => 0x7C,
        b'\'' => 0x7D,
        b'=' => 0x7E,
        b'"' => 0x7F,
        b'a'..=b'i' => 0x81 + (b - b'a'),
        b'j'..=b'r' => 0x91 + (b - b'j'),
        b'~' => 0xA1,
        b's'..=b'z' => 0xA2 + (b - b's'),
        b'^' => 0xB0,
        b'[' => 0xBA,
        b']' => 0xBB,
        b'{' => 0xC0,
        b'A'..=b'I' => 0xC1 + (b - b'A'),
        b'}' => 0xD0,
        b'J'..=b'R' => 0xD1 + (b - b'J'),
        b'\\' => 0xE0,
        b'S'..=b'Z' => 0xE2 + (b - b'S'),
        b'0'..=b'9' => 0xF0 + (b - b'0'),
        _ => 0x40,
    }
}
