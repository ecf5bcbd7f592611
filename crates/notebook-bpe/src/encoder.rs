//! The per-word merge loop.
//!
//! Classic greedy BPE: split a word into single-character symbols, then
//! repeatedly pick the learned merge with the lowest rank among all adjacent
//! pairs (leftmost position breaks ties) and apply it to every non-overlapping
//! occurrence of that pair in one round, until no adjacent pair has a rule.
//!
//! The `(rank, position)` ordering is load-bearing: changing it changes
//! tokenization output.

use crate::model::{MergeModel, Rank, TokenId};

/// Merge veto consulted during winner selection, used for BPE-dropout.
/// `None` is the deterministic path.
///
/// The closure lifetime is independent of the reference lifetime so the
/// option can be reborrowed once per merge round.
pub(crate) type DropoutFn<'a, 'f> = &'a mut (dyn FnMut() -> bool + 'f);

/// Encode one word (boundary symbol already prepended) to token ids.
pub(crate) fn encode_word(
    model: &MergeModel,
    word: &str,
    mut dropout: Option<DropoutFn<'_, '_>>,
) -> Vec<TokenId> {
    let mut symbols: Vec<TokenId> = word
        .chars()
        .map(|c| model.char_id(c).unwrap_or_else(|| model.unk_id()))
        .collect();

    while symbols.len() > 1 {
        let Some((pair, merged)) = winning_pair(model, &symbols, dropout.as_deref_mut()) else {
            break;
        };
        symbols = merge_all_occurrences(&symbols, pair, merged);
    }

    let mut out = Vec::with_capacity(symbols.len());
    for id in symbols {
        push_valid(model, id, &mut out);
    }
    out
}

/// Scan adjacent pairs and pick the candidate with the lowest rank, leftmost
/// position on ties. With dropout active, candidates are vetoed here, during
/// selection; the round that follows still merges every occurrence of
/// whichever pair wins.
fn winning_pair(
    model: &MergeModel,
    symbols: &[TokenId],
    mut dropout: Option<DropoutFn<'_, '_>>,
) -> Option<((TokenId, TokenId), TokenId)> {
    let mut best: Option<(Rank, usize, (TokenId, TokenId), TokenId)> = None;

    for i in 0..symbols.len() - 1 {
        let pair = (symbols[i], symbols[i + 1]);
        let Some((merged, rank)) = model.merge(pair.0, pair.1) else {
            continue;
        };
        if let Some(skip) = dropout.as_deref_mut() {
            if skip() {
                continue;
            }
        }
        if best.map_or(true, |(r, p, _, _)| (rank, i) < (r, p)) {
            best = Some((rank, i, pair, merged));
        }
    }

    best.map(|(_, _, pair, merged)| (pair, merged))
}

/// One merge round: replace every non-overlapping occurrence of `pair`,
/// scanning left to right and skipping positions consumed by an earlier merge
/// in the same round.
fn merge_all_occurrences(
    symbols: &[TokenId],
    pair: (TokenId, TokenId),
    merged: TokenId,
) -> Vec<TokenId> {
    let mut out = Vec::with_capacity(symbols.len());
    let mut i = 0;
    while i < symbols.len() {
        if i + 1 < symbols.len() && (symbols[i], symbols[i + 1]) == pair {
            out.push(merged);
            i += 2;
        } else {
            out.push(symbols[i]);
            i += 1;
        }
    }
    out
}

/// Emit `id` if it is a valid vocabulary entry; otherwise reverse the merge
/// that produced it and recurse into the halves. Pieces with no parents and
/// no valid entry degrade to UNK. Recursion depth is bounded by the merge
/// dag, which only composes.
fn push_valid(model: &MergeModel, id: TokenId, out: &mut Vec<TokenId>) {
    if model.recipe(id).is_some() && !model.is_invalid(id) {
        out.push(id);
        return;
    }
    if let Some((left, right)) = model.parents(id) {
        push_valid(model, left, out);
        push_valid(model, right, out);
    } else {
        out.push(model.unk_id());
    }
}
