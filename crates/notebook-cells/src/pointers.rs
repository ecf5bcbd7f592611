//! Stable pointers to cells across document edits.
//!
//! Interval values are rebuilt wholesale on every edit, so they carry no
//! identity. [`CellPointerFactory`] restores identity: it subscribes to a
//! [`CellLines`] model and keeps one shared slot per live cell, keyed by
//! ordinal position and chained forward through change events. A
//! [`CellPointer`] wraps such a slot; once the underlying cell is deleted the
//! slot is emptied and detached, and the pointer resolves to `None` forever.
//!
//! Everything here assumes the model's single-writer, same-thread discipline;
//! slots are `Rc<RefCell<_>>`, not synchronized.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cell::CellInterval;
use crate::cell_lines::{CellChangeEvent, CellLines, diff_bounds};

type Slot = Rc<RefCell<Option<CellInterval>>>;

/// A stable handle to one notebook cell.
///
/// Resolution never panics: a deleted cell is a routine occurrence, reported
/// as `None`.
#[derive(Clone)]
pub struct CellPointer {
    slot: Slot,
}

impl CellPointer {
    /// The live interval this pointer refers to, or `None` if the cell was
    /// deleted (permanently) or the pointer was created for an interval the
    /// model does not know.
    pub fn get(&self) -> Option<CellInterval> {
        self.slot.borrow().clone()
    }
}

impl std::fmt::Debug for CellPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CellPointer").field(&self.get()).finish()
    }
}

/// Produces [`CellPointer`]s for a [`CellLines`] model and keeps them
/// resolving correctly across edits.
pub struct CellPointerFactory {
    registry: Rc<RefCell<Vec<Slot>>>,
}

impl CellPointerFactory {
    /// Attach a factory to `model`. The factory subscribes to the model's
    /// change events; pointer bookkeeping happens inside the listener, in the
    /// same mutation that changed the intervals.
    pub fn attach(model: &mut CellLines) -> Self {
        let slots: Vec<Slot> = model
            .intervals()
            .iter()
            .map(|it| Rc::new(RefCell::new(Some(it.clone()))))
            .collect();
        let registry = Rc::new(RefCell::new(slots));

        let hook = registry.clone();
        model.subscribe(move |event| apply_change(&mut hook.borrow_mut(), event));

        Self { registry }
    }

    /// Create a pointer for `interval`.
    ///
    /// Deduplicates by value: two calls with equal intervals share one slot,
    /// so the resulting pointers resolve identically after any later change.
    /// An interval that does not match any current cell yields a dead pointer
    /// whose `get()` is already `None`.
    pub fn create(&self, interval: &CellInterval) -> CellPointer {
        let registry = self.registry.borrow();
        if let Some(slot) = registry.get(interval.ordinal) {
            if slot.borrow().as_ref() == Some(interval) {
                return CellPointer { slot: slot.clone() };
            }
        }
        CellPointer {
            slot: Rc::new(RefCell::new(None)),
        }
    }
}

/// Re-anchor slots after a model change.
///
/// The old/new lists are split into unchanged prefix, changed middle, and
/// shifted-but-unchanged suffix. Prefix slots stay as they are; suffix slots
/// take the shifted new values. In the middle, positional continuity is
/// trusted only when exactly one interval changed in place (the "cell grew"
/// case): that slot takes the new value. Any wider replacement empties the
/// old slots and detaches them, so those pointers stay `None` even if a
/// look-alike cell appears at the same ordinal later.
fn apply_change(slots: &mut Vec<Slot>, event: &CellChangeEvent) {
    let (prefix, suffix) = diff_bounds(&event.old, &event.new);
    let old_mid = event.old.len() - prefix - suffix;
    let new_mid = event.new.len() - prefix - suffix;

    let mut next: Vec<Slot> = Vec::with_capacity(event.new.len());
    next.extend(slots[..prefix].iter().cloned());

    if old_mid == 1 && new_mid == 1 {
        let slot = slots[prefix].clone();
        *slot.borrow_mut() = Some(event.new[prefix].clone());
        next.push(slot);
    } else {
        for slot in &slots[prefix..prefix + old_mid] {
            *slot.borrow_mut() = None;
        }
        for interval in &event.new[prefix..prefix + new_mid] {
            next.push(Rc::new(RefCell::new(Some(interval.clone()))));
        }
    }

    for (slot, interval) in slots[prefix + old_mid..]
        .iter()
        .zip(&event.new[prefix + new_mid..])
    {
        *slot.borrow_mut() = Some(interval.clone());
        next.push(slot.clone());
    }

    *slots = next;
}
