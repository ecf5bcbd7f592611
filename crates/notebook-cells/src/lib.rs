#![warn(missing_docs)]
//! Notebook Cells - Headless Cell Interval Model
//!
//! # Overview
//!
//! `notebook-cells` models a line-addressed notebook document as an ordered
//! partition of contiguous, ordinally-numbered cells, and keeps stable
//! handles to individual cells valid across arbitrary edits. It is a
//! headless kernel: no rendering, no UI, no execution — just the interval
//! bookkeeping a notebook frontend builds on.
//!
//! # Core Features
//!
//! - **Rope-backed document**: O(log n) line access via `ropey`
//! - **Wholesale recompute**: intervals are rebuilt and diffed on every edit
//! - **Change Notifications**: synchronous listener callbacks with full
//!   before/after interval lists
//! - **Stable Pointers**: [`CellPointer`]s survive cell moves and resizes,
//!   and go permanently `None` when their cell is deleted
//! - **Range Utilities**: sorted disjoint line-range set maintenance
//!
//! # Quick Start
//!
//! ```rust
//! use notebook_cells::{CellLines, CellPointerFactory, CellType};
//!
//! let mut model = CellLines::from_text("#%%\na = 1\n#%% md\n*notes*");
//! assert_eq!(model.intervals().len(), 2);
//!
//! let factory = CellPointerFactory::attach(&mut model);
//! let pointer = factory.create(&model.intervals()[1].clone());
//!
//! // Grow the first cell; the pointer follows the markdown cell.
//! model.insert(9, "\nb = 2");
//! let cell = pointer.get().unwrap();
//! assert_eq!(cell.cell_type, CellType::Markdown);
//! assert_eq!(cell.lines.first, 3);
//! ```
//!
//! # Module Description
//!
//! - [`cell`] - cell value types ([`CellInterval`], [`LineRange`], ...)
//! - [`cell_lines`] - the document-backed model and change events
//! - [`pointers`] - the pointer factory and pointer handles
//! - [`line_ranges`] - disjoint line-range set merging
//!
//! # Threading
//!
//! Single-writer, same-thread: all mutation, listener dispatch, and pointer
//! resolution happen on one logical thread. Nothing here is `Send`.

pub mod cell;
pub mod cell_lines;
pub mod line_ranges;
pub mod pointers;

pub use cell::{CellInterval, CellType, LineRange, MarkersAtLines};
pub use cell_lines::{CellChangeCallback, CellChangeEvent, CellLines};
pub use line_ranges::merge_and_join_intersections;
pub use pointers::{CellPointer, CellPointerFactory};
