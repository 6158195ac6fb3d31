#![deny(unsafe_code)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub use crate::codec::ByteOrder;
pub use crate::error::{Result, SegyError};
pub use crate::file::SegyFile;
pub use crate::format::{infer, SampleFormat};
pub use crate::header::{BinaryHeader, BINARY_HEADER_LEN};
pub use crate::text::{TextEncoding, TextHeader, TEXT_HEADER_LEN};
pub use crate::trace::{Trace, TraceHeader, TRACE_HEADER_LEN};

mod codec;
mod error;
mod file;
mod format;
mod header;
pub mod ibm;
mod text;
mod trace;
