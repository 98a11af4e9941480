use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// JSON-lines trace of one or more conversions: which rules were parsed,
/// which selectors matched or were rejected, how many elements were styled.
/// Shared across clones; all writes funnel through one buffered file.
#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<DebugState>>,
}

struct DebugState {
    writer: BufWriter<File>,
    rules: u64,
    selectors_skipped: u64,
    elements_styled: u64,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(DebugState {
                writer: BufWriter::new(file),
                rules: 0,
                selectors_skipped: 0,
                elements_styled: 0,
            })),
        })
    }

    pub fn rules_parsed(&self, count: usize) {
        if let Ok(mut state) = self.inner.lock() {
            state.rules = state.rules.saturating_add(count as u64);
            let line = format!("{{\"type\":\"css.rules\",\"count\":{count}}}");
            let _ = writeln!(state.writer, "{line}");
        }
    }

    pub fn selector_matched(&self, selector: &str, elements: usize) {
        if let Ok(mut state) = self.inner.lock() {
            let line = format!(
                "{{\"type\":\"css.match\",\"selector\":\"{}\",\"elements\":{}}}",
                json_escape(selector),
                elements
            );
            let _ = writeln!(state.writer, "{line}");
        }
    }

    pub fn selector_skipped(&self, selector: &str) {
        if let Ok(mut state) = self.inner.lock() {
            state.selectors_skipped = state.selectors_skipped.saturating_add(1);
            let line = format!(
                "{{\"type\":\"css.skip\",\"selector\":\"{}\"}}",
                json_escape(selector)
            );
            let _ = writeln!(state.writer, "{line}");
        }
    }

    pub fn elements_styled(&self, count: usize) {
        if let Ok(mut state) = self.inner.lock() {
            state.elements_styled = state.elements_styled.saturating_add(count as u64);
        }
    }

    /// Emit the per-conversion summary line and reset the counters.
    pub fn finish(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let line = format!(
                "{{\"type\":\"convert.summary\",\"rules\":{},\"selectors_skipped\":{},\"elements_styled\":{}}}",
                state.rules, state.selectors_skipped, state.elements_styled
            );
            let _ = writeln!(state.writer, "{line}");
            state.rules = 0;
            state.selectors_skipped = 0;
            state.elements_styled = 0;
            let _ = state.writer.flush();
        }
    }
}

fn json_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}
