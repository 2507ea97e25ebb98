//! Cell storage strategies
//!
//! The scanner writes a cell through [`CellBuffer`] without knowing how it is
//! stored. [`OwnedBuffer`] copies every accepted character; [`BorrowedView`]
//! only records the `[start, end)` span of the source and copies the cell
//! out the first time a character is skipped (a collapsed `""`), so most
//! cells of an in-memory input are never copied.

use super::source::CharSource;

/// Accumulation strategy for the characters of one cell
pub trait CellBuffer {
    /// Start a new cell whose first content byte would be at `offset`
    fn begin(&mut self, offset: usize);

    /// Accept `ch`, which was read from source byte offset `offset`
    fn push(&mut self, ch: char, offset: usize);

    /// Current cell content
    fn as_str(&self) -> &str;

    /// Whether the content is a view into the source rather than a copy
    fn is_borrowed(&self) -> bool {
        false
    }
}

/// Growable owned buffer, reused across cells
#[derive(Debug, Clone, Default)]
pub struct OwnedBuffer {
    content: String,
}

impl OwnedBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with reserved capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            content: String::with_capacity(capacity),
        }
    }
}

impl CellBuffer for OwnedBuffer {
    #[inline]
    fn begin(&mut self, _offset: usize) {
        self.content.clear();
    }

    #[inline]
    fn push(&mut self, ch: char, _offset: usize) {
        self.content.push(ch);
    }

    fn as_str(&self) -> &str {
        &self.content
    }
}

/// Zero-copy view into a stable in-memory source
#[derive(Debug, Clone)]
pub struct BorrowedView<'s> {
    source: &'s str,
    start: usize,
    end: usize,
    spilled: bool,
    spill: String,
}

impl<'s> BorrowedView<'s> {
    /// Create a view strategy over `source`
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            start: 0,
            end: 0,
            spilled: false,
            spill: String::new(),
        }
    }

    /// Content borrowed for the lifetime of the source, if no copy was needed
    ///
    /// Unlike [`CellBuffer::as_str`] the returned slice may outlive the
    /// current cell.
    pub fn view(&self) -> Option<&'s str> {
        (!self.spilled).then(|| &self.source[self.start..self.end])
    }

    fn copy_out(&mut self) {
        self.spill.clear();
        self.spill.push_str(&self.source[self.start..self.end]);
        self.spilled = true;
    }
}

impl CellBuffer for BorrowedView<'_> {
    #[inline]
    fn begin(&mut self, offset: usize) {
        self.start = offset;
        self.end = offset;
        self.spilled = false;
    }

    #[inline]
    fn push(&mut self, ch: char, offset: usize) {
        if self.spilled {
            self.spill.push(ch);
            return;
        }
        if offset == self.end
            && self
                .source
                .get(offset..)
                .is_some_and(|rest| rest.starts_with(ch))
        {
            self.end = offset + ch.len_utf8();
        } else {
            self.copy_out();
            self.spill.push(ch);
        }
    }

    fn as_str(&self) -> &str {
        if self.spilled {
            &self.spill
        } else {
            &self.source[self.start..self.end]
        }
    }

    fn is_borrowed(&self) -> bool {
        !self.spilled
    }
}

/// Strategy picked for a given source
#[derive(Debug, Clone)]
pub enum CellStorage<'s> {
    /// Copying buffer, works with any source
    Owned(OwnedBuffer),
    /// Zero-copy view, requires stable backing memory
    Borrowed(BorrowedView<'s>),
}

impl<'s> CellStorage<'s> {
    /// Pick the view strategy when `source` exposes stable backing memory
    pub fn for_source<S: CharSource<'s>>(source: &S) -> Self {
        match source.backing() {
            Some(input) => CellStorage::Borrowed(BorrowedView::new(input)),
            None => CellStorage::Owned(OwnedBuffer::with_capacity(256)),
        }
    }

    /// Content borrowed from the source, see [`BorrowedView::view`]
    pub fn view(&self) -> Option<&'s str> {
        match self {
            CellStorage::Owned(_) => None,
            CellStorage::Borrowed(view) => view.view(),
        }
    }
}

impl CellBuffer for CellStorage<'_> {
    #[inline]
    fn begin(&mut self, offset: usize) {
        match self {
            CellStorage::Owned(b) => b.begin(offset),
            CellStorage::Borrowed(b) => b.begin(offset),
        }
    }

    #[inline]
    fn push(&mut self, ch: char, offset: usize) {
        match self {
            CellStorage::Owned(b) => b.push(ch, offset),
            CellStorage::Borrowed(b) => b.push(ch, offset),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            CellStorage::Owned(b) => b.as_str(),
            CellStorage::Borrowed(b) => b.as_str(),
        }
    }

    fn is_borrowed(&self) -> bool {
        match self {
            CellStorage::Owned(_) => false,
            CellStorage::Borrowed(b) => b.is_borrowed(),
        }
    }
}

/// Working state for the cell being scanned, reused for every cell of a read
///
/// Contents are overwritten when the next cell starts; callbacks that need a
/// cell afterwards must copy it out.
#[derive(Debug, Clone, Default)]
pub struct CellData<B> {
    buffer: B,
    enclosed: bool,
    unterminated: bool,
}

impl<B: CellBuffer> CellData<B> {
    /// Wrap a buffer strategy
    pub fn new(buffer: B) -> Self {
        Self {
            buffer,
            enclosed: false,
            unterminated: false,
        }
    }

    /// Current cell content
    #[inline]
    pub fn as_str(&self) -> &str {
        self.buffer.as_str()
    }

    /// Underlying buffer strategy
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Whether the cell was enclosed in quotes
    pub fn is_enclosed(&self) -> bool {
        self.enclosed
    }

    /// Whether the cell was still inside quotes when the stream ended
    pub fn is_unterminated(&self) -> bool {
        self.unterminated
    }

    pub(crate) fn reset(&mut self, offset: usize) {
        self.buffer.begin(offset);
        self.enclosed = false;
        self.unterminated = false;
    }

    #[inline]
    pub(crate) fn push(&mut self, ch: char, offset: usize) {
        self.buffer.push(ch, offset);
    }

    pub(crate) fn open_enclosure(&mut self, offset: usize) {
        self.buffer.begin(offset);
        self.enclosed = true;
    }

    pub(crate) fn mark_unterminated(&mut self) {
        self.unterminated = true;
    }
}

impl<'s> CellData<CellStorage<'s>> {
    /// Cell data with the strategy matching `source`
    pub fn for_source<S: CharSource<'s>>(source: &S) -> Self {
        Self::new(CellStorage::for_source(source))
    }
}
