//! The random-access trace store over one SEG-Y file on disk.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::codec::ByteOrder;
use crate::error::{Result, SegyError};
use crate::format::{self, SampleFormat};
use crate::header::{BinaryHeader, BINARY_HEADER_LEN};
use crate::text::{TextEncoding, TextHeader, TEXT_HEADER_LEN};
use crate::trace::{Trace, TraceHeader, TRACE_HEADER_LEN};

/// File offset of the binary header, right after the mandatory textual
/// header.
const BINARY_HEADER_OFFSET: u64 = TEXT_HEADER_LEN as u64;
/// Smallest conforming file: one textual header plus the binary header.
const MIN_FILE_LEN: u64 = (TEXT_HEADER_LEN + BINARY_HEADER_LEN) as u64;

/// A SEG-Y file opened for random-access trace reads and writes.
///
/// All operations take `&mut self`; a store is not reentrant and is meant
/// to be owned by one thread (or wrapped in a lock) at a time. Trace
/// positions are derived from the immutable binary header, never cached on
/// disk, so the file and the store cannot disagree about layout.
///
/// The geometry is fixed at open: every trace holds exactly
/// `samples_per_trace` samples of the one declared sample format. Indexed
/// writes overwrite in place and never extend the file; only the append
/// operations grow it.
#[derive(Debug)]
pub struct SegyFile {
    stream: Option<File>,
    path: PathBuf,
    byte_order: ByteOrder,
    sample_format: SampleFormat,
    binary_header: BinaryHeader,
    text_headers: Vec<TextHeader>,
    trace_count: u64,
}

impl SegyFile {
    /// Opens an existing file, inferring byte order and sample format from
    /// the format code bytes.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();
        if len < MIN_FILE_LEN {
            return Err(SegyError::Format(format!(
                "file is {len} bytes, a SEG-Y file is at least {MIN_FILE_LEN}"
            )));
        }

        let mut prefix = vec![0u8; MIN_FILE_LEN as usize];
        file.read_exact(&mut prefix)?;
        let (byte_order, sample_format) = format::infer(&prefix)?;
        let (text, _) = TextHeader::decode(&prefix)?;
        let binary_header =
            BinaryHeader::decode(&prefix, BINARY_HEADER_OFFSET as usize, byte_order)?;
        if binary_header.samples_per_trace == 0 {
            return Err(SegyError::Format(
                "binary header declares zero samples per trace".to_string(),
            ));
        }

        let mut text_headers = vec![text];
        let ext = binary_header.extended_text_header_count;
        if ext < 0 {
            log::warn!("negative extended text header count {ext}, treating as 0");
        }
        let mut block = vec![0u8; TEXT_HEADER_LEN];
        for _ in 0..ext.max(0) {
            file.read_exact(&mut block)?;
            let (header, _) = TextHeader::decode(&block)?;
            text_headers.push(header);
        }

        let mut store = Self {
            stream: Some(file),
            path,
            byte_order,
            sample_format,
            binary_header,
            text_headers,
            trace_count: 0,
        };
        let data_start = store.trace_data_start();
        if len < data_start {
            log::warn!(
                "file ends at {len}, before the trace data start at {data_start}"
            );
        }
        store.trace_count = len.saturating_sub(data_start) / store.trace_stride();
        log::debug!(
            "opened {} as {:?} {}, {} traces of {} samples",
            store.path.display(),
            store.byte_order,
            store.sample_format,
            store.trace_count,
            store.samples_per_trace()
        );
        Ok(store)
    }

    /// Creates a new, empty store: a conditioned textual header, the given
    /// binary header, no traces.
    ///
    /// With `overwrite` unset an existing file at `path` is an error.
    pub fn create<P: AsRef<Path>>(
        path: P,
        text: &str,
        mut header: BinaryHeader,
        order: ByteOrder,
        encoding: TextEncoding,
        overwrite: bool,
    ) -> Result<Self> {
        if header.samples_per_trace == 0 {
            return Err(SegyError::Format(
                "binary header declares zero samples per trace".to_string(),
            ));
        }
        let sample_format = header.sample_format()?;
        if header.extended_text_header_count != 0 {
            log::warn!(
                "extended text header count {} reset to 0, new files carry one textual header",
                header.extended_text_header_count
            );
            header.extended_text_header_count = 0;
        }
        let text_header = TextHeader::from_text(text)?;

        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut file = options.open(&path)?;

        file.write_all(&text_header.encode(encoding))?;
        let mut buf = [0u8; BINARY_HEADER_LEN];
        header.encode(&mut buf, 0, order)?;
        file.write_all(&buf)?;
        file.flush()?;
        log::debug!("created {} as {order:?} {sample_format}", path.display());

        Ok(Self {
            stream: Some(file),
            path,
            byte_order: order,
            sample_format,
            binary_header: header,
            text_headers: vec![text_header],
            trace_count: 0,
        })
    }

    /// Reads the trace at `index`.
    pub fn read_trace(&mut self, index: u64) -> Result<Trace> {
        self.check_index(index)?;
        let offset = self.trace_offset(index);
        let mut buf = vec![0u8; self.trace_stride() as usize];
        let file = self.stream()?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        self.decode_trace(&buf)
    }

    /// Reads the header of the trace at `index`, skipping its samples.
    pub fn read_trace_header(&mut self, index: u64) -> Result<TraceHeader> {
        self.check_index(index)?;
        let offset = self.trace_offset(index);
        let order = self.byte_order;
        let mut buf = [0u8; TRACE_HEADER_LEN];
        let file = self.stream()?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        TraceHeader::decode(&buf, 0, order)
    }

    /// Reads up to `count` traces starting at `start`, sequentially.
    ///
    /// The range is clamped to the traces the file holds, and a truncated
    /// tail ends the read early instead of failing, so the result may be
    /// shorter than requested.
    pub fn read_traces(&mut self, start: u64, count: u64) -> Result<Vec<Trace>> {
        let available = self.trace_count.saturating_sub(start);
        let count = count.min(available);
        let offset = self.trace_offset(start);
        let mut buf = vec![0u8; self.trace_stride() as usize];

        self.stream()?.seek(SeekFrom::Start(offset))?;
        let mut traces = Vec::with_capacity(count as usize);
        for i in 0..count {
            // The file cursor advances one stride per pass.
            if !read_exact_or_eof(self.stream()?, &mut buf)? {
                log::warn!(
                    "trace data ends mid-trace at index {}, returning {} of {count}",
                    start + i,
                    i
                );
                break;
            }
            traces.push(self.decode_trace(&buf)?);
        }
        Ok(traces)
    }

    /// Reads up to `count` trace headers starting at `start`. Clamping and
    /// truncation behave like [`SegyFile::read_traces`].
    pub fn read_trace_headers(&mut self, start: u64, count: u64) -> Result<Vec<TraceHeader>> {
        let available = self.trace_count.saturating_sub(start);
        let count = count.min(available);
        let order = self.byte_order;
        let stride = self.trace_stride();
        let offset = self.trace_offset(start);

        let file = self.stream()?;
        let mut headers = Vec::with_capacity(count as usize);
        let mut buf = [0u8; TRACE_HEADER_LEN];
        for i in 0..count {
            file.seek(SeekFrom::Start(offset + i * stride))?;
            if !read_exact_or_eof(file, &mut buf)? {
                log::warn!(
                    "trace data ends mid-header at index {}, returning {} of {count}",
                    start + i,
                    i
                );
                break;
            }
            headers.push(TraceHeader::decode(&buf, 0, order)?);
        }
        Ok(headers)
    }

    /// Appends one trace at the end of the file.
    pub fn append_trace(&mut self, trace: &Trace) -> Result<()> {
        self.append_traces(std::slice::from_ref(trace))
    }

    /// Appends traces at the end of the file. Sample counts are validated
    /// up front so a mismatch writes nothing.
    pub fn append_traces(&mut self, traces: &[Trace]) -> Result<()> {
        for trace in traces {
            self.check_samples(&trace.samples)?;
        }
        let offset = self.trace_offset(self.trace_count);
        let mut buf = vec![0u8; self.trace_stride() as usize];
        for (i, trace) in traces.iter().enumerate() {
            self.encode_trace(trace, &mut buf)?;
            let pos = offset + i as u64 * buf.len() as u64;
            let file = self.stream()?;
            file.seek(SeekFrom::Start(pos))?;
            file.write_all(&buf)?;
        }
        self.trace_count += traces.len() as u64;
        Ok(())
    }

    /// Overwrites the trace at `index` in place.
    pub fn write_trace(&mut self, trace: &Trace, index: u64) -> Result<()> {
        self.check_index(index)?;
        self.check_samples(&trace.samples)?;
        let offset = self.trace_offset(index);
        let mut buf = vec![0u8; self.trace_stride() as usize];
        self.encode_trace(trace, &mut buf)?;
        let file = self.stream()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&buf)?;
        Ok(())
    }

    /// Overwrites a run of traces in place starting at `start`. The whole
    /// run must already exist; writes never extend the file.
    pub fn write_traces(&mut self, traces: &[Trace], start: u64) -> Result<()> {
        if !traces.is_empty() {
            self.check_index(start + traces.len() as u64 - 1)?;
        }
        for trace in traces {
            self.check_samples(&trace.samples)?;
        }
        for (i, trace) in traces.iter().enumerate() {
            self.write_trace(trace, start + i as u64)?;
        }
        Ok(())
    }

    /// Overwrites only the samples of the trace at `index`, leaving its
    /// header untouched.
    pub fn write_samples(&mut self, samples: &[f32], index: u64) -> Result<()> {
        self.check_index(index)?;
        self.check_samples(samples)?;
        let offset = self.trace_offset(index) + TRACE_HEADER_LEN as u64;
        let mut buf = vec![0u8; samples.len() * self.sample_format.sample_size()];
        self.sample_format
            .encode_samples(samples, &mut buf, self.byte_order)?;
        let file = self.stream()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&buf)?;
        Ok(())
    }

    /// Overwrites the samples of a run of traces starting at `start`,
    /// leaving every header untouched. The whole run must already exist
    /// and all sample counts are validated up front so a mismatch writes
    /// nothing.
    pub fn write_samples_bulk(&mut self, samples: &[Vec<f32>], start: u64) -> Result<()> {
        if !samples.is_empty() {
            self.check_index(start + samples.len() as u64 - 1)?;
        }
        for run in samples {
            self.check_samples(run)?;
        }
        for (i, run) in samples.iter().enumerate() {
            self.write_samples(run, start + i as u64)?;
        }
        Ok(())
    }

    /// Overwrites only the header of the trace at `index`, leaving its
    /// samples untouched.
    pub fn write_trace_header(&mut self, header: &TraceHeader, index: u64) -> Result<()> {
        self.check_index(index)?;
        let offset = self.trace_offset(index);
        let mut buf = [0u8; TRACE_HEADER_LEN];
        header.encode(&mut buf, 0, self.byte_order)?;
        let file = self.stream()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&buf)?;
        Ok(())
    }

    /// Overwrites a run of trace headers in place starting at `start`.
    pub fn write_trace_headers(&mut self, headers: &[TraceHeader], start: u64) -> Result<()> {
        if !headers.is_empty() {
            self.check_index(start + headers.len() as u64 - 1)?;
        }
        for (i, header) in headers.iter().enumerate() {
            self.write_trace_header(header, start + i as u64)?;
        }
        Ok(())
    }

    /// Writes a copy of this file to `dest` in which every trace keeps its
    /// header but has all samples replaced by `fill`.
    ///
    /// The header region is copied byte for byte, so the copy opens with
    /// the same byte order, format and geometry.
    pub fn copy_populated<P: AsRef<Path>>(
        &mut self,
        dest: P,
        fill: f32,
        overwrite: bool,
    ) -> Result<()> {
        // Fail before touching the destination when already closed.
        self.stream()?;
        let data_start = self.trace_data_start();
        let stride = self.trace_stride() as usize;
        let count = self.trace_count;

        let ns = self.samples_per_trace() as usize;
        let mut payload = vec![0u8; ns * self.sample_format.sample_size()];
        self.sample_format
            .encode_samples(&vec![fill; ns], &mut payload, self.byte_order)?;

        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut out = options.open(dest.as_ref())?;

        let src = self.stream()?;
        src.seek(SeekFrom::Start(0))?;
        let mut headers = vec![0u8; data_start as usize];
        src.read_exact(&mut headers)?;
        out.write_all(&headers)?;

        let mut block = vec![0u8; stride];
        for i in 0..count {
            let src = self.stream()?;
            src.seek(SeekFrom::Start(data_start + i * stride as u64))?;
            src.read_exact(&mut block[..TRACE_HEADER_LEN])?;
            out.write_all(&block[..TRACE_HEADER_LEN])?;
            out.write_all(&payload)?;
        }
        out.flush()?;
        log::debug!(
            "copied {} traces of {} to {} filled with {fill}",
            count,
            self.path.display(),
            dest.as_ref().display()
        );
        Ok(())
    }

    /// Scans every sample in the file and returns the global `(min, max)`.
    ///
    /// Returns `None` when the file holds no traces, or when `cancel` was
    /// raised; cancellation is checked once per trace.
    pub fn amplitude_range(
        &mut self,
        cancel: Option<&AtomicBool>,
    ) -> Result<Option<(f32, f32)>> {
        if self.trace_count == 0 {
            return Ok(None);
        }
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for i in 0..self.trace_count {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    log::debug!("amplitude scan cancelled at trace {i}");
                    return Ok(None);
                }
            }
            let trace = self.read_trace(i)?;
            for &s in &trace.samples {
                min = min.min(s);
                max = max.max(s);
            }
        }
        Ok(Some((min, max)))
    }

    /// Flushes and drops the file handle. Safe to call more than once;
    /// every other operation afterwards returns [`SegyError::Closed`].
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.stream.take() {
            file.flush()?;
            file.sync_all()?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    pub fn binary_header(&self) -> &BinaryHeader {
        &self.binary_header
    }

    /// The mandatory textual header followed by any extended ones.
    pub fn text_headers(&self) -> &[TextHeader] {
        &self.text_headers
    }

    pub fn trace_count(&self) -> u64 {
        self.trace_count
    }

    pub fn samples_per_trace(&self) -> u16 {
        self.binary_header.samples_per_trace
    }

    /// File offset of the first trace, past all textual headers.
    fn trace_data_start(&self) -> u64 {
        let ext = self.binary_header.extended_text_header_count.max(0) as u64;
        MIN_FILE_LEN + ext * TEXT_HEADER_LEN as u64
    }

    /// Bytes per trace record: header plus the fixed sample payload.
    fn trace_stride(&self) -> u64 {
        TRACE_HEADER_LEN as u64
            + self.samples_per_trace() as u64 * self.sample_format.sample_size() as u64
    }

    fn trace_offset(&self, index: u64) -> u64 {
        self.trace_data_start() + index * self.trace_stride()
    }

    fn check_index(&self, index: u64) -> Result<()> {
        if index >= self.trace_count {
            return Err(SegyError::IndexOutOfRange {
                index,
                count: self.trace_count,
            });
        }
        Ok(())
    }

    fn check_samples(&self, samples: &[f32]) -> Result<()> {
        let expected = self.samples_per_trace() as usize;
        if samples.len() != expected {
            return Err(SegyError::LengthMismatch {
                expected,
                actual: samples.len(),
            });
        }
        Ok(())
    }

    fn stream(&mut self) -> Result<&mut File> {
        self.stream.as_mut().ok_or(SegyError::Closed)
    }

    fn decode_trace(&self, buf: &[u8]) -> Result<Trace> {
        let header = TraceHeader::decode(buf, 0, self.byte_order)?;
        let samples = self.sample_format.decode_samples(
            &buf[TRACE_HEADER_LEN..],
            self.samples_per_trace() as usize,
            self.byte_order,
        )?;
        Ok(Trace { header, samples })
    }

    fn encode_trace(&self, trace: &Trace, buf: &mut [u8]) -> Result<()> {
        trace.header.encode(buf, 0, self.byte_order)?;
        self.sample_format.encode_samples(
            &trace.samples,
            &mut buf[TRACE_HEADER_LEN..],
            self.byte_order,
        )
    }
}

/// Like `read_exact`, but end-of-file reports `false` instead of an error.
fn read_exact_or_eof(file: &mut File, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}
