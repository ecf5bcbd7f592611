//! The cell-lines model: a rope-backed document partitioned into cells.
//!
//! [`CellLines`] is the single source of truth for the interval list. Every
//! document mutation recomputes the full list from the text, diffs it against
//! the previous snapshot, and notifies subscribers synchronously with a
//! [`CellChangeEvent`] carrying the complete before/after lists.
//!
//! Cell boundaries follow the percent format: a line starting with `#%%`
//! begins a new cell, with an optional type word (`md`/`markdown`, `raw`)
//! selecting the cell kind. Lines before the first marker form an implicit
//! leading raw cell; a document with no markers is a single raw cell.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use ropey::Rope;

use crate::cell::{CellInterval, CellType, LineRange, MarkersAtLines};

/// A change to the model's interval list.
///
/// `old` and `new` are the full before/after snapshots, not deltas.
/// `affected` is the subset of `new` inside the changed region; it exists for
/// fine-grained consumer invalidation and is not required for pointer
/// correctness.
#[derive(Debug, Clone)]
pub struct CellChangeEvent {
    /// The full interval list before the change.
    pub old: Vec<CellInterval>,
    /// The full interval list after the change.
    pub new: Vec<CellInterval>,
    /// The intervals of `new` that lie in the changed region.
    pub affected: Vec<CellInterval>,
}

/// Change notification callback type.
///
/// Callbacks run in-line during the mutation that triggered them, on the
/// single logical thread that owns the model.
pub type CellChangeCallback = Box<dyn FnMut(&CellChangeEvent)>;

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"^#%%(?:\s+(\S+))?").unwrap())
}

/// The notebook cell-lines model.
///
/// Owns the document text plus the current interval snapshot. All mutation
/// and listener dispatch happen on one logical thread; no internal locking.
pub struct CellLines {
    rope: Rope,
    intervals: Vec<CellInterval>,
    modification_stamp: u64,
    callbacks: Vec<CellChangeCallback>,
}

impl CellLines {
    /// Build the model from document text. An empty document has no cells.
    pub fn from_text(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let intervals = compute_intervals(&rope);
        Self {
            rope,
            intervals,
            modification_stamp: 0,
            callbacks: Vec::new(),
        }
    }

    /// Current interval snapshot. Ordinals are exactly `0..n` in list order
    /// and line ranges partition `[0, line_count)`.
    pub fn intervals(&self) -> &[CellInterval] {
        &self.intervals
    }

    /// Forward iterator over intervals starting with the one containing
    /// `start_line` (or the first interval after it).
    pub fn intervals_iterator(&self, start_line: usize) -> impl Iterator<Item = &CellInterval> {
        let idx = self
            .intervals
            .partition_point(|it| it.lines.last < start_line);
        self.intervals[idx..].iter()
    }

    /// The interval containing `line`, if any.
    pub fn interval_at(&self, line: usize) -> Option<&CellInterval> {
        self.intervals_iterator(line)
            .next()
            .filter(|it| it.lines.contains(line))
    }

    /// Monotonically increasing counter, bumped whenever the interval list
    /// changes.
    pub fn modification_stamp(&self) -> u64 {
        self.modification_stamp
    }

    /// Number of document lines covered by the cell partition.
    pub fn line_count(&self) -> usize {
        if self.rope.len_chars() == 0 {
            0
        } else {
            self.rope.len_lines()
        }
    }

    /// Full document text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Subscribe to interval-list changes. Callbacks are invoked
    /// synchronously, in registration order, during the mutation.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&CellChangeEvent) + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Insert `text` at `char_offset` (clamped to the document length).
    pub fn insert(&mut self, char_offset: usize, text: &str) {
        let offset = char_offset.min(self.rope.len_chars());
        self.rope.insert(offset, text);
        self.rebuild();
    }

    /// Remove the character range (clamped to the document length).
    pub fn remove(&mut self, char_range: Range<usize>) {
        let len = self.rope.len_chars();
        let start = char_range.start.min(len);
        let end = char_range.end.min(len);
        if start >= end {
            return;
        }
        self.rope.remove(start..end);
        self.rebuild();
    }

    /// Replace the entire document text.
    pub fn replace_all(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let new = compute_intervals(&self.rope);
        if new == self.intervals {
            return;
        }

        let old = std::mem::replace(&mut self.intervals, new.clone());
        self.modification_stamp += 1;

        let (prefix, suffix) = diff_bounds(&old, &new);
        let affected = new[prefix..new.len() - suffix].to_vec();

        let event = CellChangeEvent { old, new, affected };
        for callback in &mut self.callbacks {
            callback(&event);
        }
    }
}

/// Split `old`/`new` into unchanged prefix, changed middle, unchanged suffix.
///
/// Returns `(prefix_len, suffix_len)`. Prefix intervals are value-equal;
/// suffix intervals match modulo the uniform line shift caused by the edit
/// (same kind, markers and length, positions shifted by the total line
/// delta). The two regions never overlap.
pub(crate) fn diff_bounds(old: &[CellInterval], new: &[CellInterval]) -> (usize, usize) {
    let mut prefix = 0;
    while prefix < old.len() && prefix < new.len() && old[prefix] == new[prefix] {
        prefix += 1;
    }

    let line_delta = total_lines(new) as isize - total_lines(old) as isize;
    let max_suffix = old.len().min(new.len()) - prefix;

    let mut suffix = 0;
    while suffix < max_suffix {
        let o = &old[old.len() - 1 - suffix];
        let n = &new[new.len() - 1 - suffix];
        let shifted = n.lines.first as isize - o.lines.first as isize == line_delta;
        if o.same_shape(n) && shifted {
            suffix += 1;
        } else {
            break;
        }
    }

    (prefix, suffix)
}

fn total_lines(intervals: &[CellInterval]) -> usize {
    intervals.last().map_or(0, |it| it.lines.last + 1)
}

fn compute_intervals(rope: &Rope) -> Vec<CellInterval> {
    let total = if rope.len_chars() == 0 {
        0
    } else {
        rope.len_lines()
    };
    if total == 0 {
        return Vec::new();
    }

    // Marker lines begin cells; everything before the first marker is an
    // implicit leading raw cell.
    let mut starts: Vec<(usize, CellType, MarkersAtLines)> = Vec::new();
    for (line_no, line) in rope.lines().enumerate().take(total) {
        let text = line.to_string();
        if let Some(caps) = marker_regex().captures(&text) {
            let cell_type = match caps.get(1).map(|m| m.as_str()) {
                Some("md") | Some("markdown") => CellType::Markdown,
                Some("raw") => CellType::Raw,
                _ => CellType::Code,
            };
            starts.push((line_no, cell_type, MarkersAtLines::Top));
        }
    }

    if starts.first().map_or(true, |s| s.0 > 0) {
        starts.insert(0, (0, CellType::Raw, MarkersAtLines::No));
    }

    let mut intervals = Vec::with_capacity(starts.len());
    for (ordinal, &(first, cell_type, markers)) in starts.iter().enumerate() {
        let last = starts
            .get(ordinal + 1)
            .map_or(total - 1, |next| next.0 - 1);
        intervals.push(CellInterval::new(
            ordinal,
            cell_type,
            LineRange::new(first, last),
            markers,
        ));
    }
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(model: &CellLines) -> Vec<CellType> {
        model.intervals().iter().map(|it| it.cell_type).collect()
    }

    #[test]
    fn test_empty_document_has_no_intervals() {
        let model = CellLines::from_text("");
        assert!(model.intervals().is_empty());
        assert_eq!(model.line_count(), 0);
    }

    #[test]
    fn test_markerless_document_is_single_raw_cell() {
        let model = CellLines::from_text("plain\ntext");
        assert_eq!(
            model.intervals(),
            &[CellInterval::new(
                0,
                CellType::Raw,
                LineRange::new(0, 1),
                MarkersAtLines::No
            )]
        );
    }

    #[test]
    fn test_markers_partition_document() {
        let model = CellLines::from_text("#%%\na = 1\n#%% md\n*notes*\n#%% raw\nblob");
        assert_eq!(
            kinds(&model),
            vec![CellType::Code, CellType::Markdown, CellType::Raw]
        );
        assert_eq!(model.intervals()[0].lines, LineRange::new(0, 1));
        assert_eq!(model.intervals()[1].lines, LineRange::new(2, 3));
        assert_eq!(model.intervals()[2].lines, LineRange::new(4, 5));
        assert!(
            model
                .intervals()
                .iter()
                .all(|it| it.markers == MarkersAtLines::Top)
        );
    }

    #[test]
    fn test_leading_lines_form_implicit_raw_cell() {
        let model = CellLines::from_text("title\n#%%\ncode");
        assert_eq!(kinds(&model), vec![CellType::Raw, CellType::Code]);
        assert_eq!(model.intervals()[0].markers, MarkersAtLines::No);
        assert_eq!(model.intervals()[0].lines, LineRange::new(0, 0));
    }

    #[test]
    fn test_appending_cell_leaves_no_line_gap() {
        let mut model = CellLines::from_text("#%%\na = 1");
        assert_eq!(model.intervals()[0].lines, LineRange::new(0, 1));

        let end = model.text().chars().count();
        model.insert(end, "\n#%%\nb = 2");

        let intervals = model.intervals();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].lines, LineRange::new(0, 1));
        assert_eq!(intervals[1].lines.first, 2);
        assert_eq!(intervals[1].ordinal, 1);
    }

    #[test]
    fn test_modification_stamp_tracks_interval_changes() {
        let mut model = CellLines::from_text("#%%\na = 1");
        let stamp = model.modification_stamp();

        // Editing inside a cell without moving line boundaries keeps the
        // interval list (and therefore the stamp) unchanged.
        model.insert(5, "x");
        assert_eq!(model.modification_stamp(), stamp);

        model.insert(model.text().chars().count(), "\n#%%\n");
        assert_eq!(model.modification_stamp(), stamp + 1);
    }

    #[test]
    fn test_listener_receives_old_new_affected() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut model = CellLines::from_text("#%%\na = 1");
        let seen: Rc<RefCell<Vec<CellChangeEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        model.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        model.insert(model.text().chars().count(), "\n#%% md\ntext");

        let events = seen.borrow();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.old.len(), 1);
        assert_eq!(event.new.len(), 2);
        // The code cell kept its span, so only the appended markdown cell is
        // in the changed region.
        assert_eq!(event.affected.len(), 1);
        assert_eq!(event.affected[0].cell_type, CellType::Markdown);
    }

    #[test]
    fn test_intervals_iterator_starts_at_containing_cell() {
        let model = CellLines::from_text("#%%\na\nb\n#%%\nc\n#%%\nd");
        let from_line_4: Vec<usize> = model
            .intervals_iterator(4)
            .map(|it| it.ordinal)
            .collect();
        assert_eq!(from_line_4, vec![1, 2]);

        assert_eq!(model.interval_at(1).unwrap().ordinal, 0);
        assert_eq!(model.interval_at(6).unwrap().ordinal, 2);
        assert!(model.interval_at(99).is_none());
    }

    #[test]
    fn test_partition_invariant_on_parse() {
        let model = CellLines::from_text("lead\n#%%\na\n#%% md\nb\nc\n#%%\n");
        let intervals = model.intervals();
        for (i, it) in intervals.iter().enumerate() {
            assert_eq!(it.ordinal, i);
        }
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].lines.last + 1, pair[1].lines.first);
        }
        assert_eq!(intervals[0].lines.first, 0);
        assert_eq!(intervals.last().unwrap().lines.last + 1, model.line_count());
    }
}
