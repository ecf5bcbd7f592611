//! Error types for the tokenizer.
//!
//! Two tiers, kept apart deliberately: [`ModelError`] is fatal to the
//! tokenizer instance and only happens at construction/load time;
//! [`EncodeError`] and [`DecodeError`] are per-call argument failures and
//! leave the instance usable. Out-of-vocabulary *input* is never an error —
//! it degrades to the UNK token.

use thiserror::Error;

use crate::model::TokenId;

/// Errors raised while loading a merge model file.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("malformed header: {0}")]
    /// The leading `n m` counts line was missing or unreadable.
    Header(String),

    #[error("model file truncated: expected {expected}, ran out of input")]
    /// The file ended before every declared record was read.
    Truncated {
        /// Description of the record that was being read.
        expected: &'static str,
    },

    #[error("invalid numeric field {field:?}: {value:?}")]
    /// A field could not be parsed as the expected integer type.
    Parse {
        /// Which record field was malformed.
        field: &'static str,
        /// The offending raw text.
        value: String,
    },

    #[error("duplicate character-table entry for id {0}")]
    /// Two character-table rows claim the same inner id.
    DuplicateCharEntry(TokenId),

    #[error("invalid code point {0} in character table")]
    /// A character-table row's UTF-32 value is not a Unicode scalar.
    InvalidCodePoint(u32),

    #[error("merge rule references unknown id {0}")]
    /// A merge rule's operand has no recipe yet (not in the character table
    /// and not produced by an earlier rule).
    UnknownMergeOperand(TokenId),

    #[error("merge rule result {0} collides with an existing id")]
    /// A merge rule's result id was already defined.
    MergeResultCollision(TokenId),
}

/// Per-call encoding failures.
#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    #[error("dropout probability {0} is outside [0, 1]")]
    /// `encode_with_dropout` was given a probability outside `[0, 1]`.
    InvalidDropout(f64),
}

/// Per-call decoding failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token id {id} is not a known token (vocabulary size {vocab_size})")]
    /// An id does not belong to the vocabulary or the special-token set.
    /// Ids past `vocab_size` always fail; so do ids inside the range that a
    /// sparse character table left without a recipe.
    UnknownId {
        /// The offending id.
        id: TokenId,
        /// The tokenizer's vocabulary size.
        vocab_size: usize,
    },
}
