//! The tokenizer: normalization, word splitting, encode/decode, batching.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

use rand::Rng;
use rayon::prelude::*;
use regex::Regex;

use crate::cache::{BoundedCache, DEFAULT_CAPACITY};
use crate::encoder::encode_word;
use crate::error::{DecodeError, EncodeError, ModelError};
use crate::model::{BOUNDARY, MergeModel, TokenId};

/// Batches below this size are always encoded sequentially.
const PARALLEL_THRESHOLD: usize = 32;

/// How [`BpeTokenizer::encode_batch`] schedules work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    /// Process every sentence on the calling thread.
    Sequential,
    /// Fan large batches out across the rayon worker pool.
    Parallel,
}

fn disallowed() -> &'static Regex {
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    // Everything outside printable ASCII (and newline) is dropped.
    DISALLOWED.get_or_init(|| Regex::new(r"[^ -~\n]").unwrap())
}

/// BPE tokenizer over a loaded [`MergeModel`].
///
/// The model tables are immutable after construction, so a shared reference
/// can encode from many threads at once; the bounded encode/decode caches
/// are the only shared mutable state and are internally synchronized.
pub struct BpeTokenizer {
    model: MergeModel,
    encode_cache: BoundedCache<String, Vec<TokenId>>,
    decode_cache: BoundedCache<Vec<TokenId>, String>,
    parallelism: Parallelism,
}

impl std::fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeTokenizer")
            .field("vocab_size", &self.model.vocab_size())
            .field("parallelism", &self.parallelism)
            .finish_non_exhaustive()
    }
}

impl BpeTokenizer {
    /// Wrap a loaded model with default (parallel) batch scheduling.
    pub fn new(model: MergeModel) -> Self {
        Self::with_parallelism(model, Parallelism::Parallel)
    }

    /// Wrap a loaded model with an explicit batch scheduling mode.
    pub fn with_parallelism(model: MergeModel, parallelism: Parallelism) -> Self {
        Self {
            model,
            encode_cache: BoundedCache::new(DEFAULT_CAPACITY),
            decode_cache: BoundedCache::new(DEFAULT_CAPACITY),
            parallelism,
        }
    }

    /// Load a model file and wrap it. Corrupt files fail here, not at the
    /// first encode.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Ok(Self::new(MergeModel::load(path)?))
    }

    /// The underlying merge model.
    pub fn model(&self) -> &MergeModel {
        &self.model
    }

    /// Encode `text` to token ids.
    ///
    /// Total over all inputs: disallowed characters are dropped by
    /// normalization and unknown pieces degrade to the UNK id. Each
    /// whitespace-delimited word is prefixed with the boundary symbol before
    /// merging.
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        let key = text.to_string();
        if let Some(hit) = self.encode_cache.get(&key) {
            return hit;
        }
        let ids = self.encode_uncached(text);
        self.encode_cache.insert(key, ids.clone());
        ids
    }

    fn encode_uncached(&self, text: &str) -> Vec<TokenId> {
        let normalized = disallowed().replace_all(text, "");
        let mut ids = Vec::new();
        let mut word_buf = String::new();
        for word in normalized.split_whitespace() {
            word_buf.clear();
            word_buf.push(BOUNDARY);
            word_buf.push_str(word);
            ids.extend(encode_word(&self.model, &word_buf, None));
        }
        ids
    }

    /// Encode with BPE-dropout: each merge candidate is skipped with
    /// probability `p`, yielding alternative segmentations of the same text.
    ///
    /// `p` outside `[0, 1]` is rejected; `p == 0` is exactly the
    /// deterministic [`encode`](Self::encode) path. Dropout output is not
    /// cached.
    pub fn encode_with_dropout(&self, text: &str, p: f64) -> Result<Vec<TokenId>, EncodeError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(EncodeError::InvalidDropout(p));
        }
        if p == 0.0 {
            return Ok(self.encode(text));
        }

        let mut rng = rand::thread_rng();
        let mut skip = || rng.gen_bool(p);

        let normalized = disallowed().replace_all(text, "");
        let mut ids = Vec::new();
        let mut word_buf = String::new();
        for word in normalized.split_whitespace() {
            word_buf.clear();
            word_buf.push(BOUNDARY);
            word_buf.push_str(word);
            ids.extend(encode_word(&self.model, &word_buf, Some(&mut skip)));
        }
        Ok(ids)
    }

    /// Encode a batch of sentences, preserving input order.
    ///
    /// Small batches (and `Parallelism::Sequential` tokenizers) run on the
    /// calling thread; large batches fan out over rayon workers. All work is
    /// joined before returning, and the result always equals encoding every
    /// sentence sequentially.
    pub fn encode_batch<S>(&self, texts: &[S]) -> Vec<Vec<TokenId>>
    where
        S: AsRef<str> + Sync,
    {
        if self.parallelism == Parallelism::Sequential || texts.len() < PARALLEL_THRESHOLD {
            texts.iter().map(|t| self.encode(t.as_ref())).collect()
        } else {
            texts.par_iter().map(|t| self.encode(t.as_ref())).collect()
        }
    }

    /// Decode token ids back to text.
    ///
    /// Special ids decode to their literal strings (`<UNK>`, `<PAD>`,
    /// `<BOS>`, `<EOS>`). Word boundary symbols decode to spaces, except the
    /// leading one, which decodes to a newline; `decode(encode(s))` therefore
    /// reproduces a single-spaced `s` with a leading newline prepended.
    ///
    /// Ids with no recipe and no special meaning fail with
    /// [`DecodeError::UnknownId`]; decode never silently returns garbage.
    pub fn decode(&self, ids: &[TokenId]) -> Result<String, DecodeError> {
        let key = ids.to_vec();
        if let Some(hit) = self.decode_cache.get(&key) {
            return Ok(hit);
        }

        let mut raw = String::new();
        for &id in ids {
            if let Some(literal) = self.model.special_literal(id) {
                raw.push_str(literal);
            } else if let Some(recipe) = self.model.recipe(id) {
                raw.push_str(recipe);
            } else {
                return Err(DecodeError::UnknownId {
                    id,
                    vocab_size: self.model.vocab_size(),
                });
            }
        }

        let mut text = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c == BOUNDARY {
                text.push(if text.is_empty() { '\n' } else { ' ' });
            } else {
                text.push(c);
            }
        }

        self.decode_cache.insert(key, text.clone());
        Ok(text)
    }

    /// Token-string to id mapping for every valid vocabulary entry.
    pub fn vocab(&self) -> &HashMap<String, TokenId> {
        self.model.vocab()
    }

    /// Total id space; every id `encode` emits is special or below this.
    pub fn vocab_size(&self) -> usize {
        self.model.vocab_size()
    }

    /// The end-of-sequence id, if the model declares one.
    pub fn eos_token_id(&self) -> Option<TokenId> {
        self.model.special_tokens().eos
    }

    /// Ids that `encode` never emits (reserved or unprintable).
    pub fn invalid_ids(&self) -> &HashSet<TokenId> {
        self.model.invalid_ids()
    }

    /// True if `text` consists only of characters the tokenizer accepts
    /// without normalization loss.
    pub fn is_valid_string(&self, text: &str) -> bool {
        !disallowed().is_match(text)
    }

    /// Ids of vocabulary entries whose expansion matches `pattern`.
    pub fn ids_by_regex(&self, pattern: &Regex) -> Vec<TokenId> {
        self.model.ids_by_regex(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> BpeTokenizer {
        // a, b, boundary; a+b -> 3; unk=4 pad=5 bos=6 eos=7.
        let model = MergeModel::from_str("3 1\n0 97\n1 98\n2 9601\n0 1 3\n4 5 6 7\n").unwrap();
        BpeTokenizer::new(model)
    }

    #[test]
    fn test_encode_is_deterministic_across_cache_states() {
        let tok = toy();
        let cold = tok.encode("ab ab");
        let warm = tok.encode("ab ab");
        assert_eq!(cold, warm);
        assert_eq!(cold, vec![2, 3, 2, 3]);
    }

    #[test]
    fn test_normalization_drops_disallowed_chars() {
        let tok = toy();
        assert_eq!(tok.encode("a\u{7}b"), tok.encode("ab"));
        assert!(!tok.is_valid_string("a\u{7}b"));
        assert!(tok.is_valid_string("ab cd"));
    }

    #[test]
    fn test_special_ids_decode_to_literals() {
        let tok = toy();
        assert_eq!(tok.decode(&[6, 3, 7]).unwrap(), "<BOS>ab<EOS>");
    }

    #[test]
    fn test_surface_properties() {
        let tok = toy();
        assert_eq!(tok.vocab_size(), 8);
        assert_eq!(tok.eos_token_id(), Some(7));
        assert!(tok.invalid_ids().contains(&4));
        assert_eq!(tok.vocab().get("ab"), Some(&3));
    }
}
