//! Loads a model from its textual form and round-trips a sentence.
//!
//! Run with: cargo run --example tokenize

use notebook_bpe::{BpeTokenizer, MergeModel};

fn main() {
    // Lowercase alphabet, boundary symbol, and three merges that build up
    // the token "▁the".
    let mut text = String::from("27 3\n");
    for i in 0..26u32 {
        text.push_str(&format!("{} {}\n", i, 97 + i));
    }
    text.push_str("26 9601\n");
    text.push_str("26 19 27\n7 4 28\n27 28 29\n");
    text.push_str("30 31 32 33\n");

    let tok = BpeTokenizer::new(MergeModel::from_str(&text).expect("parse model"));

    let input = "the cat sat on the mat";
    let ids = tok.encode(input);
    println!("input:   {input:?}");
    println!("ids:     {ids:?}");
    println!("decoded: {:?}", tok.decode(&ids).expect("decode"));

    for id in &ids {
        println!("  {id:>3} -> {:?}", tok.model().recipe(*id).unwrap_or("?"));
    }
}
