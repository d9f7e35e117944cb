//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::io::Read;
use std::path::{Path, PathBuf};

use takeoutfs::FileSystem;

#[path = "../../src/vfs/archive/testing.rs"]
mod zip_builder;

pub use zip_builder::ZipBuilder;

/// Write a shard named `name` under `dir`, alternating stored and deflated entries.
pub fn write_shard(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let mut builder = ZipBuilder::new();
    for (i, (path, content)) in files.iter().enumerate() {
        builder = if i % 2 == 0 {
            builder.stored(path, content)
        } else {
            builder.deflated(path, content)
        };
    }
    let shard = dir.join(name);
    builder.write_to(&shard).expect("write shard");
    shard
}

/// Read a whole file through any filesystem backend.
pub fn read_to_vec<F: FileSystem + ?Sized>(fs: &F, path: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    fs.open(path)
        .unwrap_or_else(|e| panic!("open {}: {}", path, e))
        .read_to_end(&mut buf)
        .unwrap_or_else(|e| panic!("read {}: {}", path, e));
    buf
}

/// Deterministic, poorly compressible content unique to `seed`.
pub fn payload(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}
