//! Line reassembly across arbitrarily fragmented reads.
//!
//! Tracer output arrives in chunks that rarely align with line boundaries.
//! [`LineAssembler`] turns each chunk into a list of [`LineEdit`]s for the
//! display: start a new entry, or extend the entry left open by the
//! previous chunk.
//!
//! ```text
//! "alpha\nbe"  → Append("alpha", complete)  Append("be", open)
//! "ta\ngamma"  → Extend("ta", complete)     Append("gamma", open)
//! ```
//!
//! The trailing fragment of a chunk is shown immediately rather than held
//! back until its newline arrives.

/// One mutation of the display buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEdit {
    /// Start a new entry
    Append { text: String, complete: bool },
    /// Concatenate onto the entry left open by an earlier edit
    Extend { text: String, complete: bool },
}

impl LineEdit {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Append { text, .. } | Self::Extend { text, .. } => text,
        }
    }

    /// True when a newline terminated this entry.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Append { complete, .. } | Self::Extend { complete, .. } => *complete,
        }
    }
}

/// Incremental newline splitter.
#[derive(Debug, Default)]
pub struct LineAssembler {
    /// The last emitted entry has no newline yet
    open: bool,
    /// Leading bytes of a UTF-8 sequence cut off by the end of a chunk
    carry: Vec<u8>,
}

impl LineAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `chunk` into display edits, in arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<LineEdit> {
        let mut edits = Vec::new();
        if chunk.is_empty() {
            return edits;
        }

        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let text = self.decode(&rest[..pos]);
            // A sequence still incomplete at a newline is garbage; flush it.
            let text = text + &self.flush_carry();
            edits.push(self.edit(text, true));
            rest = &rest[pos + 1..];
        }

        if !rest.is_empty() {
            let text = self.decode(rest);
            // Bytes may all have gone to the carry
            if !text.is_empty() {
                edits.push(self.edit(text, false));
            }
        }

        edits
    }

    /// The last emitted entry still awaits its newline.
    #[must_use]
    pub fn has_pending_continuation(&self) -> bool {
        self.open
    }

    /// Flush bytes of a multi-byte sequence the stream ended in the middle
    /// of, as a final replacement character. Call once the stream is done.
    pub fn finish(&mut self) -> Option<LineEdit> {
        let text = self.flush_carry();
        if text.is_empty() {
            return None;
        }
        Some(self.edit(text, false))
    }

    /// Forget the open entry; the next bytes start a fresh one.
    pub fn reset(&mut self) {
        self.open = false;
        self.carry.clear();
    }

    fn edit(&mut self, text: String, complete: bool) -> LineEdit {
        let extends = self.open;
        self.open = !complete;

        if extends {
            LineEdit::Extend { text, complete }
        } else {
            LineEdit::Append { text, complete }
        }
    }

    /// Decode `bytes` (prefixed by any carried bytes), keeping a trailing
    /// incomplete UTF-8 sequence for the next call.
    fn decode(&mut self, bytes: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.carry);
        buf.extend_from_slice(bytes);

        let keep = incomplete_tail_len(&buf);
        self.carry = buf.split_off(buf.len() - keep);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn flush_carry(&mut self) -> String {
        if self.carry.is_empty() {
            return String::new();
        }
        let text = String::from_utf8_lossy(&self.carry).into_owned();
        self.carry.clear();
        text
    }
}

/// Length of a truncated multi-byte sequence at the end of `bytes`.
fn incomplete_tail_len(bytes: &[u8]) -> usize {
    // A UTF-8 sequence is at most 4 bytes, so only the last 3 can be a prefix.
    let start = bytes.len().saturating_sub(3);
    (start..bytes.len())
        .rev()
        .find(|&i| bytes[i] & 0b1100_0000 != 0b1000_0000)
        .map_or(0, |lead| match std::str::from_utf8(&bytes[lead..]) {
            Err(e) if e.valid_up_to() == 0 && e.error_len().is_none() => bytes.len() - lead,
            _ => 0,
        })
}
