#![warn(missing_docs)]
//! Notebook BPE - Byte-Pair-Encoding Tokenizer Engine
//!
//! # Overview
//!
//! `notebook-bpe` converts free text to integer token ids and back using
//! classic byte-pair encoding: a learned merge table drives greedy,
//! priority-ordered pairwise merging, and precomputed "recipes" (each id's
//! full character expansion) drive constant-shape decoding.
//!
//! # Core Features
//!
//! - **Sequential model format**: `n m` header, character table, ranked
//!   merge triples, special ids; field order preserved for compatibility
//!   with trained model files
//! - **Greedy ranked merging**: lowest rank first, leftmost on ties, whole
//!   rounds per winning pair
//! - **Total encoding**: normalization plus UNK degradation; out-of-vocab
//!   input is never an error
//! - **OOV decomposition**: invalid merge results split back along the merge
//!   dag
//! - **Parallel batches**: large batches fan out over rayon, results in
//!   input order
//! - **Bounded caches**: per-instance LRU caches for encode and decode
//!
//! # Quick Start
//!
//! ```rust
//! use notebook_bpe::{BpeTokenizer, MergeModel};
//!
//! // Toy model: chars a/b/boundary, one rule merging a+b.
//! let model = MergeModel::from_str("3 1\n0 97\n1 98\n2 9601\n0 1 3\n4 5 6 7\n").unwrap();
//! let tok = BpeTokenizer::new(model);
//!
//! let ids = tok.encode("ab ab");
//! assert_eq!(ids, vec![2, 3, 2, 3]);
//! assert_eq!(tok.decode(&ids).unwrap(), "\nab ab");
//! ```
//!
//! # Module Description
//!
//! - [`model`] - model file loading and lookup tables
//! - [`encoder`] - the per-word merge loop
//! - [`tokenizer`] - the public tokenizer surface
//! - [`error`] - load-time vs per-call error tiers
//!
//! # Concurrency
//!
//! Model tables are immutable after construction; `encode` takes `&self` and
//! is safe to call from many threads, which is exactly what the batch path
//! relies on. Only the bounded caches are shared mutable state, and they are
//! internally synchronized.

pub mod error;
pub mod model;
pub mod tokenizer;

mod cache;
mod encoder;

pub use error::{DecodeError, EncodeError, ModelError};
pub use model::{BOUNDARY, MergeModel, Rank, SpecialTokens, TokenId};
pub use tokenizer::{BpeTokenizer, Parallelism};
