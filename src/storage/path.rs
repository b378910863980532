// src/storage/path.rs

//! Cache key and sharded path computation.
//!
//! Browse pages are keyed by the hex encoding of the word's UTF-8 bytes.
//! Definition pages live under a sharded relative path derived from the
//! lower-cased word bytes, bounding per-directory fan-out:
//!
//! - length <= 2: `hex(bw)`
//! - length <= 4: `hex(bw[0..2]).d/hex(bw[2..])`
//! - length  > 4: `hex(bw[0..2]).d/hex(bw[2..4]).d/hex(bw[4..8])-<sha1 prefix>`
//!
//! The SHA-1 prefix disambiguates words sharing the same 4-byte prefix.
//! Everything here is pure: only the word's bytes go in.

use std::path::PathBuf;

use sha1::{Digest, Sha1};

use crate::error::{AppError, Result};

/// Browse cache filename for a word: hex of its UTF-8 bytes.
pub fn browse_key(word: &str) -> String {
    hex::encode(word.as_bytes())
}

/// Recover the word from a browse cache filename.
pub fn word_from_key(key: &str) -> Result<String> {
    let bytes = hex::decode(key).map_err(|e| AppError::cache_key(key, e))?;
    String::from_utf8(bytes).map_err(|e| AppError::cache_key(key, e))
}

/// Relative sharded path for a word's definition page.
///
/// Case-insensitive: the word is ASCII-lower-cased (byte-wise, so the
/// byte length and shard shape never change) before hashing.
pub fn dict_rel_path(word: &str) -> PathBuf {
    let bw = word.as_bytes().to_ascii_lowercase();

    if bw.len() <= 2 {
        return PathBuf::from(hex::encode(&bw));
    }
    if bw.len() <= 4 {
        let mut path = PathBuf::from(format!("{}.d", hex::encode(&bw[..2])));
        path.push(hex::encode(&bw[2..]));
        return path;
    }

    let digest = hex::encode(Sha1::digest(&bw));
    let leaf_end = bw.len().min(8);
    let mut path = PathBuf::from(format!("{}.d", hex::encode(&bw[..2])));
    path.push(format!("{}.d", hex::encode(&bw[2..4])));
    path.push(format!("{}-{}", hex::encode(&bw[4..leaf_end]), &digest[..8]));
    path
}
