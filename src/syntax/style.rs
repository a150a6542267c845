//! Decoration streams
//!
//! A decoration marks the offset where a style run begins. A stream of
//! them, ordered by offset, styles every byte of a source from the
//! stream's base offset to its end.

use std::collections::BTreeMap;

use super::tokens::StyleTag;

/// Start of a style run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    /// Absolute byte offset where the run starts
    pub offset: usize,
    /// Style of the run
    pub style: StyleTag,
}

impl Decoration {
    pub fn new(offset: usize, style: StyleTag) -> Self {
        Self { offset, style }
    }
}

/// A styled `[start, end)` run of text, as handed to a renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub style: StyleTag,
}

impl Span {
    pub fn new(start: usize, end: usize, style: StyleTag) -> Self {
        Self { start, end, style }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Canonicalize a raw decoration stream for `source_len` bytes at `base_pos`.
///
/// Entries sharing an offset collapse to the one written last. Entries
/// repeating the previous style are dropped, as is a final entry that
/// would start a run at the very end of the source. The result has
/// strictly increasing offsets and no two neighbours with equal styles.
pub fn compact(raw: &[Decoration], base_pos: usize, source_len: usize) -> Vec<Decoration> {
    let mut by_offset: BTreeMap<usize, &StyleTag> = BTreeMap::new();
    for decoration in raw {
        by_offset.insert(decoration.offset, &decoration.style);
    }

    let mut out: Vec<Decoration> = Vec::with_capacity(by_offset.len());
    for (offset, style) in by_offset {
        if out.last().is_some_and(|last| last.style == *style) {
            continue;
        }
        out.push(Decoration::new(offset, style.clone()));
    }

    if out.last().is_some_and(|last| last.offset == base_pos + source_len) {
        out.pop();
    }
    out
}

/// Expand a stream into explicit `[start, end)` runs over the source
pub fn spans(stream: &[Decoration], base_pos: usize, source_len: usize) -> Vec<Span> {
    let end_of_source = base_pos + source_len;
    stream
        .iter()
        .enumerate()
        .map(|(i, decoration)| {
            let end = stream.get(i + 1).map_or(end_of_source, |next| next.offset);
            Span::new(decoration.offset, end, decoration.style.clone())
        })
        .filter(|span| !span.is_empty())
        .collect()
}
