// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Content digests for cached files
//!
//! Cached artifacts are identified by an MD5 digest rendered as lowercase
//! hex (32 characters, two zero-padded digits per digest byte). The CMS
//! publishes the same form, so the value is comparable across platforms.

use std::io::{self, Read};

use md5::{Digest, Md5};

/// Compute the MD5 digest of `data` as lowercase hex
///
/// # Example
/// ```
/// use storm_content::compute_hash;
///
/// let hash = compute_hash(b"hello world");
/// assert_eq!(hash, "5eb63bbbe01eeed093cb22bb8f5acdc3");
/// ```
pub fn compute_hash(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Compute the MD5 digest of everything readable from `reader`
///
/// Streams the input so large bundle files are never held in memory.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Md5::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
