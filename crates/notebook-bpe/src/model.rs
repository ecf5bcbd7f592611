//! Merge model loading.
//!
//! The model file is a whitespace/line-oriented text format read strictly
//! sequentially; the field order is load-bearing for compatibility with
//! trained model files:
//!
//! ```text
//! n m
//! <innerId> <utf32>      x n    character table
//! <x> <y> <z>            x m    merge rules, file order = rank
//! <unk> <pad> <bos> <eos>       special ids (negative = absent)
//! ```
//!
//! Everything derived from the file (recipes, parent links, the vocabulary
//! map, the invalid-id set) is computed here, once, so the loaded model is
//! immutable and cheap to share across concurrent encode calls.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;

use crate::error::ModelError;

/// Integer token id.
pub type TokenId = u32;

/// Merge priority: the rule's position in the model file. Lower merges first.
pub type Rank = u32;

/// Word-boundary symbol prepended to every encoded word.
pub const BOUNDARY: char = '\u{2581}';

/// Literal strings special ids decode to.
const UNK_TEXT: &str = "<UNK>";
const PAD_TEXT: &str = "<PAD>";
const BOS_TEXT: &str = "<BOS>";
const EOS_TEXT: &str = "<EOS>";

/// Reserved token ids, each optional and outside the learned vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecialTokens {
    /// Unknown-token id.
    pub unk: Option<TokenId>,
    /// Padding id.
    pub pad: Option<TokenId>,
    /// Beginning-of-sequence id.
    pub bos: Option<TokenId>,
    /// End-of-sequence id.
    pub eos: Option<TokenId>,
}

impl SpecialTokens {
    fn literal(&self, id: TokenId) -> Option<&'static str> {
        if self.unk == Some(id) {
            Some(UNK_TEXT)
        } else if self.pad == Some(id) {
            Some(PAD_TEXT)
        } else if self.bos == Some(id) {
            Some(BOS_TEXT)
        } else if self.eos == Some(id) {
            Some(EOS_TEXT)
        } else {
            None
        }
    }

    fn iter(&self) -> impl Iterator<Item = TokenId> {
        [self.unk, self.pad, self.bos, self.eos].into_iter().flatten()
    }
}

/// A loaded merge model: pure lookup structure, immutable after construction.
#[derive(Debug)]
pub struct MergeModel {
    char_to_id: HashMap<char, TokenId>,
    merges: HashMap<(TokenId, TokenId), (TokenId, Rank)>,
    parents: HashMap<TokenId, (TokenId, TokenId)>,
    recipes: Vec<Option<String>>,
    vocab: HashMap<String, TokenId>,
    invalid_ids: HashSet<TokenId>,
    special: SpecialTokens,
    vocab_size: usize,
}

/// Characters the tokenizer accepts: printable ASCII, newline, and the
/// boundary symbol. Everything else is dropped during normalization and
/// poisons any recipe containing it.
pub(crate) fn is_allowed_char(c: char) -> bool {
    matches!(c, ' '..='~') || c == '\n' || c == BOUNDARY
}

impl MergeModel {
    /// Load a model from a file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    /// Parse a model from its textual form.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self, ModelError> {
        let mut fields = text.split_whitespace();

        let n = next_field(&mut fields, "char-table size")
            .map_err(|_| ModelError::Header("missing char-table size".into()))?;
        let m = next_field(&mut fields, "rule count")
            .map_err(|_| ModelError::Header("missing rule count".into()))?;

        let mut char_to_id = HashMap::with_capacity(n);
        let mut recipes: Vec<Option<String>> = Vec::new();

        for _ in 0..n {
            let inner: TokenId = next_field(&mut fields, "char-table inner id")?;
            let utf32: u32 = next_field(&mut fields, "char-table code point")?;
            let ch = char::from_u32(utf32).ok_or(ModelError::InvalidCodePoint(utf32))?;

            let idx = inner as usize;
            if recipes.len() <= idx {
                recipes.resize(idx + 1, None);
            }
            if recipes[idx].is_some() {
                return Err(ModelError::DuplicateCharEntry(inner));
            }
            recipes[idx] = Some(ch.to_string());
            char_to_id.insert(ch, inner);
        }

        let mut merges = HashMap::with_capacity(m);
        let mut parents = HashMap::with_capacity(m);

        for rank in 0..m {
            let x: TokenId = next_field(&mut fields, "merge rule left id")?;
            let y: TokenId = next_field(&mut fields, "merge rule right id")?;
            let z: TokenId = next_field(&mut fields, "merge rule result id")?;

            let left = recipe_of(&recipes, x).ok_or(ModelError::UnknownMergeOperand(x))?;
            let right = recipe_of(&recipes, y).ok_or(ModelError::UnknownMergeOperand(y))?;
            let combined = format!("{left}{right}");

            let idx = z as usize;
            if recipes.len() <= idx {
                recipes.resize(idx + 1, None);
            }
            if recipes[idx].is_some() {
                return Err(ModelError::MergeResultCollision(z));
            }
            recipes[idx] = Some(combined);
            merges.insert((x, y), (z, rank as Rank));
            parents.insert(z, (x, y));
        }

        let special = SpecialTokens {
            unk: next_special(&mut fields, "unk id")?,
            pad: next_special(&mut fields, "pad id")?,
            bos: next_special(&mut fields, "bos id")?,
            eos: next_special(&mut fields, "eos id")?,
        };

        let mut invalid_ids: HashSet<TokenId> = special.iter().collect();
        for (id, recipe) in recipes.iter().enumerate() {
            if let Some(recipe) = recipe {
                if recipe.chars().any(|c| !is_allowed_char(c)) {
                    invalid_ids.insert(id as TokenId);
                }
            }
        }

        let mut vocab = HashMap::new();
        for (id, recipe) in recipes.iter().enumerate() {
            if let Some(recipe) = recipe {
                if !invalid_ids.contains(&(id as TokenId)) {
                    vocab.insert(recipe.clone(), id as TokenId);
                }
            }
        }

        let max_special = special.iter().map(|id| id as usize + 1).max().unwrap_or(0);
        let vocab_size = recipes.len().max(max_special);

        Ok(Self {
            char_to_id,
            merges,
            parents,
            recipes,
            vocab,
            invalid_ids,
            special,
            vocab_size,
        })
    }

    /// The id that encodes a single character, if the character is known.
    pub(crate) fn char_id(&self, c: char) -> Option<TokenId> {
        self.char_to_id.get(&c).copied()
    }

    /// Look up the merge rule for an adjacent pair.
    pub(crate) fn merge(&self, left: TokenId, right: TokenId) -> Option<(TokenId, Rank)> {
        self.merges.get(&(left, right)).copied()
    }

    /// The pair of ids whose merge produced `id`, if any.
    pub(crate) fn parents(&self, id: TokenId) -> Option<(TokenId, TokenId)> {
        self.parents.get(&id).copied()
    }

    /// Full character expansion of `id`, precomputed at load time.
    pub fn recipe(&self, id: TokenId) -> Option<&str> {
        self.recipes
            .get(id as usize)
            .and_then(|r| r.as_deref())
    }

    /// The literal string a special id decodes to, if `id` is special.
    pub(crate) fn special_literal(&self, id: TokenId) -> Option<&'static str> {
        self.special.literal(id)
    }

    /// True if `id` must never appear in encoder output.
    pub(crate) fn is_invalid(&self, id: TokenId) -> bool {
        self.invalid_ids.contains(&id)
    }

    /// The id substituted for unresolvable pieces. Falls back to 0 when the
    /// model declares no UNK id.
    pub(crate) fn unk_id(&self) -> TokenId {
        self.special.unk.unwrap_or(0)
    }

    /// The reserved special-token ids.
    pub fn special_tokens(&self) -> SpecialTokens {
        self.special
    }

    /// Token-string to id mapping for every valid vocabulary entry.
    pub fn vocab(&self) -> &HashMap<String, TokenId> {
        &self.vocab
    }

    /// Ids that are reserved or may never be emitted by `encode`.
    pub fn invalid_ids(&self) -> &HashSet<TokenId> {
        &self.invalid_ids
    }

    /// Total id space: every valid id is in `[0, vocab_size)`.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Ids whose full expansion matches `pattern`, ascending.
    pub fn ids_by_regex(&self, pattern: &Regex) -> Vec<TokenId> {
        let mut ids: Vec<TokenId> = self
            .recipes
            .iter()
            .enumerate()
            .filter_map(|(id, recipe)| {
                recipe
                    .as_deref()
                    .filter(|r| pattern.is_match(r))
                    .map(|_| id as TokenId)
            })
            .collect();
        ids.sort_unstable();
        ids
    }
}

fn recipe_of(recipes: &[Option<String>], id: TokenId) -> Option<&str> {
    recipes.get(id as usize).and_then(|r| r.as_deref())
}

fn next_field<T: std::str::FromStr>(
    fields: &mut std::str::SplitWhitespace<'_>,
    name: &'static str,
) -> Result<T, ModelError> {
    let raw = fields.next().ok_or(ModelError::Truncated { expected: name })?;
    raw.parse().map_err(|_| ModelError::Parse {
        field: name,
        value: raw.to_string(),
    })
}

fn next_special(
    fields: &mut std::str::SplitWhitespace<'_>,
    name: &'static str,
) -> Result<Option<TokenId>, ModelError> {
    let raw: i64 = next_field(fields, name)?;
    if raw < 0 {
        Ok(None)
    } else {
        Ok(Some(raw as TokenId))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Three chars (a, b, boundary) and one rule merging "a b" -> "ab".
    const TOY: &str = "3 1\n0 97\n1 98\n2 9601\n0 1 3\n4 5 6 7\n";

    #[test]
    fn test_parse_toy_model() {
        let model = MergeModel::from_str(TOY).unwrap();
        assert_eq!(model.recipe(0), Some("a"));
        assert_eq!(model.recipe(1), Some("b"));
        assert_eq!(model.recipe(2), Some("\u{2581}"));
        assert_eq!(model.recipe(3), Some("ab"));
        assert_eq!(model.merge(0, 1), Some((3, 0)));
        assert_eq!(model.parents(3), Some((0, 1)));
        assert_eq!(model.special_tokens().unk, Some(4));
        assert_eq!(model.special_tokens().eos, Some(7));
        assert_eq!(model.vocab_size(), 8);
    }

    #[test]
    fn test_vocab_maps_recipes_to_ids() {
        let model = MergeModel::from_str(TOY).unwrap();
        assert_eq!(model.vocab().get("ab"), Some(&3));
        assert_eq!(model.vocab().get("a"), Some(&0));
        assert!(!model.vocab().contains_key("<UNK>"));
    }

    #[test]
    fn test_negative_special_ids_are_absent() {
        let model = MergeModel::from_str("1 0\n0 97\n-1 -1 -1 5\n").unwrap();
        assert_eq!(model.special_tokens().unk, None);
        assert_eq!(model.special_tokens().eos, Some(5));
        assert_eq!(model.unk_id(), 0);
    }

    #[test]
    fn test_truncated_file_fails_at_load() {
        let err = MergeModel::from_str("3 1\n0 97\n1 98\n").unwrap_err();
        assert!(matches!(err, ModelError::Truncated { .. }));
    }

    #[test]
    fn test_merge_rule_with_unknown_operand_fails() {
        let err = MergeModel::from_str("1 1\n0 97\n0 9 3\n0 1 2 3\n").unwrap_err();
        assert!(matches!(err, ModelError::UnknownMergeOperand(9)));
    }

    #[test]
    fn test_garbage_numeric_field_fails() {
        let err = MergeModel::from_str("1 0\n0 xyz\n0 1 2 3\n").unwrap_err();
        assert!(matches!(err, ModelError::Parse { .. }));
    }

    #[test]
    fn test_non_printable_recipe_is_invalid_id() {
        // Char table carries a control character; its id may never be emitted.
        let model = MergeModel::from_str("2 0\n0 97\n1 7\n-1 -1 -1 -1\n").unwrap();
        assert!(model.invalid_ids().contains(&1));
        assert!(!model.invalid_ids().contains(&0));
    }

    #[test]
    fn test_ids_by_regex() {
        let model = MergeModel::from_str(TOY).unwrap();
        let re = Regex::new("^a").unwrap();
        assert_eq!(model.ids_by_regex(&re), vec![0, 3]);
    }
}
