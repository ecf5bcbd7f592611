//! Cell value types: line ranges, cell kinds, and the interval record.

/// The kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    /// Executable code cell.
    Code,
    /// Markdown prose cell.
    Markdown,
    /// Uninterpreted text cell.
    Raw,
}

/// Whether a cell carries a boundary-marker line.
///
/// Opaque to the pointer layer; consumers use it to decide whether the first
/// line of the cell is marker syntax rather than content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkersAtLines {
    /// The cell has no marker line (e.g. the implicit leading cell).
    No,
    /// The cell's first line is a boundary marker.
    Top,
}

/// An inclusive range of 0-based line numbers.
///
/// Both ends are inclusive: `LineRange::new(0, 1)` covers lines 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    /// First line of the range.
    pub first: usize,
    /// Last line of the range (inclusive).
    pub last: usize,
}

impl LineRange {
    /// Create an inclusive line range. `first` must not exceed `last`.
    pub fn new(first: usize, last: usize) -> Self {
        debug_assert!(first <= last, "inverted line range {first}..={last}");
        Self { first, last }
    }

    /// Number of lines covered by this range.
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// A line range always covers at least one line.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check whether `line` falls inside this range.
    pub fn contains(&self, line: usize) -> bool {
        self.first <= line && line <= self.last
    }

    /// Check whether two ranges share at least one line.
    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    /// Check whether two ranges overlap or are directly adjacent
    /// (`1..=2` touches `3..=4`).
    pub fn touches(&self, other: &LineRange) -> bool {
        self.first <= other.last.saturating_add(1) && other.first <= self.last.saturating_add(1)
    }

    /// This range moved by a signed line delta.
    pub fn shifted(&self, delta: isize) -> Self {
        Self {
            first: (self.first as isize + delta) as usize,
            last: (self.last as isize + delta) as usize,
        }
    }
}

/// One notebook cell: a contiguous span of document lines.
///
/// Interval values have no identity across edits: the model rebuilds the full
/// interval list on every change, so two snapshots never share `CellInterval`
/// objects. Use [`crate::CellPointerFactory`] to follow a cell across edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellInterval {
    /// Zero-based position among the current intervals. Strictly consecutive.
    pub ordinal: usize,
    /// The kind of this cell.
    pub cell_type: CellType,
    /// The inclusive line span owned by this cell.
    pub lines: LineRange,
    /// Boundary-marker metadata.
    pub markers: MarkersAtLines,
}

impl CellInterval {
    /// Create a cell interval record.
    pub fn new(
        ordinal: usize,
        cell_type: CellType,
        lines: LineRange,
        markers: MarkersAtLines,
    ) -> Self {
        Self {
            ordinal,
            cell_type,
            lines,
            markers,
        }
    }

    /// Equality that ignores where the cell sits in the document: same kind,
    /// same marker shape, same line count.
    pub fn same_shape(&self, other: &CellInterval) -> bool {
        self.cell_type == other.cell_type
            && self.markers == other.markers
            && self.lines.len() == other.lines.len()
    }
}
