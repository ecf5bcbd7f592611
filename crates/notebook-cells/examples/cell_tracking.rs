//! Demonstrates stable cell pointers surviving document edits.
//!
//! Run with: cargo run --example cell_tracking

use notebook_cells::{CellLines, CellPointerFactory};

fn main() {
    let mut model = CellLines::from_text("#%%\nimport sys\n#%% md\n# Notes\n#%%\nprint(42)");

    println!("initial cells:");
    for cell in model.intervals() {
        println!(
            "  #{} {:?} lines {}..={}",
            cell.ordinal, cell.cell_type, cell.lines.first, cell.lines.last
        );
    }

    model.subscribe(|event| {
        println!(
            "change: {} -> {} cells, {} affected",
            event.old.len(),
            event.new.len(),
            event.affected.len()
        );
    });

    let factory = CellPointerFactory::attach(&mut model);
    let notes = factory.create(&model.intervals()[1].clone());

    // Grow the first cell; the notes cell shifts down but the pointer follows.
    model.insert(14, "\nimport os");
    println!("notes cell now: {:?}", notes.get());

    // Delete the notes cell entirely; the pointer goes permanently dead.
    model.remove(25..40);
    println!("after delete: {:?}", notes.get());
}
