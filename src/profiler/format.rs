//! Conversion between the in-memory event buffer and the trace-viewer JSON
//! array, plus the save function handed to writers on flush.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::Value;

use super::event::TraceEvent;
use crate::writing::SaveFn;

const INDENT: &[u8] = b"    ";

/// Buffer as a JSON array value, the payload given to writers.
pub fn events_to_value(events: &[TraceEvent]) -> Result<Value, serde_json::Error> {
    serde_json::to_value(events)
}

/// Compact JSON text of the buffer, as stored in checkpoints.
pub fn events_to_string(events: &[TraceEvent]) -> Result<String, serde_json::Error> {
    serde_json::to_string(events)
}

pub fn events_from_str(text: &str) -> Result<Vec<TraceEvent>, serde_json::Error> {
    serde_json::from_str(text)
}

/// Pretty-printed, ASCII-only encoding loadable by chrome://tracing and Perfetto.
pub fn encode_trace<T: Serialize + ?Sized>(payload: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, AsciiPrettyFormatter::new());
    payload.serialize(&mut ser)?;
    Ok(out)
}

/// Save function used by `ChromeTracer::flush`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeTracingSaveFunc;

impl SaveFn for ChromeTracingSaveFunc {
    fn save(&self, payload: &Value, out: &mut dyn io::Write) -> io::Result<()> {
        let bytes = encode_trace(payload).map_err(io::Error::from)?;
        out.write_all(&bytes)
    }
}

/// Pretty printer that escapes everything outside ASCII as `\uXXXX`.
struct AsciiPrettyFormatter {
    inner: PrettyFormatter<'static>,
}

impl AsciiPrettyFormatter {
    fn new() -> Self {
        Self {
            inner: PrettyFormatter::with_indent(INDENT),
        }
    }
}

impl Formatter for AsciiPrettyFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut run_start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[run_start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            run_start = idx + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[run_start..])
    }
}
