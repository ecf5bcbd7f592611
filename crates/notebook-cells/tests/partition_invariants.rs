//! Drives the model with long random edit sequences and checks the cell
//! partition invariants at every step.

use notebook_cells::CellLines;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_partition_invariants(model: &CellLines) {
    let intervals = model.intervals();

    if model.line_count() == 0 {
        assert!(intervals.is_empty(), "empty document must have no cells");
        return;
    }

    assert!(!intervals.is_empty(), "non-empty document must have cells");
    assert_eq!(intervals[0].lines.first, 0, "partition must start at line 0");
    assert_eq!(
        intervals.last().unwrap().lines.last + 1,
        model.line_count(),
        "partition must end at the last line"
    );

    for (i, interval) in intervals.iter().enumerate() {
        assert_eq!(interval.ordinal, i, "ordinals must be consecutive");
        assert!(interval.lines.first <= interval.lines.last);
    }

    for pair in intervals.windows(2) {
        assert_eq!(
            pair[0].lines.last + 1,
            pair[1].lines.first,
            "adjacent cells must not leave gaps or overlap"
        );
    }
}

fn random_insert_text(rng: &mut StdRng) -> String {
    match rng.gen_range(0..6) {
        0 => "#%%\n".to_string(),
        1 => "#%% md\n".to_string(),
        2 => "\n".to_string(),
        3 => "code line\n".to_string(),
        4 => "x".to_string(),
        _ => "a = 1\nb = 2".to_string(),
    }
}

#[test]
fn test_partition_invariants_under_random_edits() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut model = CellLines::from_text("#%%\na = 1\n#%% md\nnotes\n#%%\nb = 2");
    assert_partition_invariants(&model);

    let mut last_stamp = model.modification_stamp();

    for _ in 0..500 {
        let len = model.text().chars().count();
        match rng.gen_range(0..10) {
            // Mostly inserts, so documents keep growing back after deletes.
            0..=5 => {
                let offset = if len == 0 { 0 } else { rng.gen_range(0..=len) };
                let text = random_insert_text(&mut rng);
                model.insert(offset, &text);
            }
            6..=8 => {
                if len > 0 {
                    let start = rng.gen_range(0..len);
                    let end = (start + rng.gen_range(1..=8)).min(len);
                    model.remove(start..end);
                }
            }
            _ => {
                if rng.gen_bool(0.5) {
                    model.replace_all("");
                } else {
                    model.replace_all("#%%\nfresh");
                }
            }
        }

        assert_partition_invariants(&model);

        let stamp = model.modification_stamp();
        assert!(stamp >= last_stamp, "modification stamp must not go back");
        last_stamp = stamp;
    }
}

#[test]
fn test_pointers_never_dangle_under_random_edits() {
    use notebook_cells::CellPointerFactory;

    let mut rng = StdRng::seed_from_u64(0xcafe);
    let mut model = CellLines::from_text("#%%\na\n#%%\nb\n#%%\nc");
    let factory = CellPointerFactory::attach(&mut model);

    for step in 0..300 {
        // Keep one pointer per live cell, created from the current snapshot.
        let pointers: Vec<_> = model
            .intervals()
            .iter()
            .map(|it| factory.create(&it.clone()))
            .collect();

        let len = model.text().chars().count();
        if rng.gen_bool(0.7) {
            let offset = if len == 0 { 0 } else { rng.gen_range(0..=len) };
            let text = random_insert_text(&mut rng);
            model.insert(offset, &text);
        } else if len > 0 {
            let start = rng.gen_range(0..len);
            let end = (start + rng.gen_range(1..=6)).min(len);
            model.remove(start..end);
        }

        // Every pointer either resolves to a cell currently in the model, or
        // to nothing at all. Never to a stale value.
        for pointer in &pointers {
            if let Some(cell) = pointer.get() {
                assert_eq!(
                    model.intervals().get(cell.ordinal),
                    Some(&cell),
                    "step {step}: pointer resolved to a value not in the model"
                );
            }
        }
    }
}
