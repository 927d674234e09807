//! I/O plumbing: CSV reader/writer construction, encoding resolution, and
//! byte-record decoding.
//!
//! The upstream sales export is semicolon-delimited Latin-1, so that is the
//! input default; the grouped export is comma-delimited UTF-8. Output uses
//! minimal quoting to match the upstream tooling. Non-UTF-8 output (the
//! excluded-rows export keeps the input conventions) goes through a
//! transcoding writer.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

pub const DEFAULT_INPUT_DELIMITER: u8 = b';';
pub const DEFAULT_OUTPUT_DELIMITER: u8 = b',';

/// The `-` path convention routes through stdin/stdout.
pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

/// Default encoding for the upstream export. The WHATWG encoding standard
/// folds the ISO-8859-1 label into windows-1252, which is what `encoding_rs`
/// resolves it to as well.
pub fn default_input_encoding() -> &'static Encoding {
    WINDOWS_1252
}

pub fn resolve_encoding(
    label: Option<&str>,
    default: &'static Encoding,
) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(default)
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn open_csv_writer(
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };

    let writer: Box<dyn Write> = if encoding == UTF_8 {
        base
    } else {
        Box::new(TranscodingWriter::new(base, encoding))
    };

    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .from_writer(writer))
}

pub fn decode_bytes(
    bytes: &[u8],
    encoding: &'static Encoding,
) -> Result<String, crate::error::PipelineError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(crate::error::PipelineError::Parse(format!(
            "undecodable byte sequence for encoding {}",
            encoding.name()
        )))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> Result<Vec<String>, crate::error::PipelineError> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>, crate::error::PipelineError>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

/// Buffers UTF-8 output and re-encodes it on flush. Runs are single-shot
/// in-memory transforms, so whole-output buffering is acceptable here.
struct TranscodingWriter<W: Write> {
    inner: W,
    encoding: &'static Encoding,
    buffer: Vec<u8>,
}

impl<W: Write> TranscodingWriter<W> {
    fn new(inner: W, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding,
            buffer: Vec::new(),
        }
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let text = std::str::from_utf8(&self.buffer)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let (encoded, _, had_errors) = self.encoding.encode(text);
            if had_errors {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("failed to encode text using {}", self.encoding.name()),
                ));
            }
            self.inner.write_all(encoded.as_ref())?;
            self.buffer.clear();
        }
        self.inner.flush()
    }
}

impl<W: Write> Drop for TranscodingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
