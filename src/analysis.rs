//! Experiments run over the MD5 engine: prefix matches between near-identical
//! inputs, duplicate digests over random inputs and hashing speed by length.
use std::collections::HashMap;
use std::fmt::Display;
use std::io::Write;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::{common_prefix_len, Hasher, Md5};

const ALPHANUMERIC: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const COLLISIONS_HEADER: &str = "Num Differing Characters,Max Matching Hash Length";
pub const DUPLICATES_HEADER: &str = "Num Hashes,Collisions Count";
pub const SPEED_HEADER: &str = "String Length,Average Time (ms)";

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub differences: Vec<usize>,
    pub collision_trials: usize,
    pub collision_len: usize,
    pub duplicate_sizes: Vec<usize>,
    pub duplicate_len: usize,
    pub speed_lengths: Vec<usize>,
    pub speed_trials: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            differences: vec![1, 2, 4, 8, 16],
            collision_trials: 1000,
            collision_len: 128,
            duplicate_sizes: (2..=6).map(|exp| 10usize.pow(exp)).collect(),
            duplicate_len: 256,
            speed_lengths: (6..=13).map(|exp| 1usize << exp).collect(),
            speed_trials: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionRow {
    pub differing_chars: usize,
    pub max_matching_prefix: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateRow {
    pub hashes: usize,
    pub collisions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRow {
    pub len: usize,
    pub average: Duration,
}

impl Display for CollisionRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.differing_chars, self.max_matching_prefix)
    }
}

impl Display for DuplicateRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.hashes, self.collisions)
    }
}

impl Display for SpeedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let millis = self.average.as_nanos() as f64 / 1_000_000.0;
        write!(f, "{},{}", self.len, millis)
    }
}

pub fn random_alphanumeric<R: Rng>(len: usize, rng: &mut R) -> String {
    (0..len)
        .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}

pub fn random_bytes<R: Rng>(len: usize, rng: &mut R) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng.fill(bytes.as_mut_slice());
    bytes
}

/// Longest common hex prefix seen between the digests of a random string and
/// a copy with its first `diff` characters changed.
pub fn max_matching_prefix<R: Rng>(diff: usize, trials: usize, len: usize, rng: &mut R) -> usize {
    let mut max_prefix = 0;
    for _ in 0..trials {
        let original = random_alphanumeric(len, rng).into_bytes();
        let mut altered = original.clone();
        for c in altered.iter_mut().take(diff) {
            *c = if *c == b'a' { b'b' } else { b'a' };
        }

        let hash_1 = Md5::digest_message(&original).to_hex();
        let hash_2 = Md5::digest_message(&altered).to_hex();
        max_prefix = max_prefix.max(common_prefix_len(&hash_1, &hash_2));
    }
    max_prefix
}

/// Number of digests that repeat an earlier one across `n` random strings.
pub fn count_duplicates<R: Rng>(n: usize, len: usize, rng: &mut R) -> usize {
    let mut seen = HashMap::with_capacity(n);
    for _ in 0..n {
        let message = random_alphanumeric(len, rng);
        *seen.entry(Md5::digest_message(message.as_bytes())).or_insert(0usize) += 1;
    }
    seen.values().filter(|&&count| count > 1).map(|count| count - 1).sum()
}

/// Mean wall-clock time to hash one random string of `len` characters.
pub fn average_hash_time<R: Rng>(len: usize, trials: usize, rng: &mut R) -> Duration {
    let mut total = Duration::ZERO;
    for _ in 0..trials {
        let message = random_alphanumeric(len, rng);
        let start = Instant::now();
        let mut md5 = Md5::new();
        md5.update(message.as_bytes());
        std::hint::black_box(md5.digest());
        total += start.elapsed();
    }
    mean_duration(total, trials)
}

fn mean_duration(total: Duration, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    total.div_f64(count as f64)
}

pub fn collision_experiment<R: Rng>(config: &ExperimentConfig, rng: &mut R) -> Vec<CollisionRow> {
    config
        .differences
        .iter()
        .map(|&diff| {
            let row = CollisionRow {
                differing_chars: diff,
                max_matching_prefix: max_matching_prefix(
                    diff,
                    config.collision_trials,
                    config.collision_len,
                    rng,
                ),
            };
            log::debug!("collision experiment: {row}");
            row
        })
        .collect()
}

pub fn duplicate_experiment<R: Rng>(config: &ExperimentConfig, rng: &mut R) -> Vec<DuplicateRow> {
    config
        .duplicate_sizes
        .iter()
        .map(|&n| {
            let row = DuplicateRow {
                hashes: n,
                collisions: count_duplicates(n, config.duplicate_len, rng),
            };
            log::debug!("duplicate experiment: {row}");
            row
        })
        .collect()
}

pub fn speed_experiment<R: Rng>(config: &ExperimentConfig, rng: &mut R) -> Vec<SpeedRow> {
    config
        .speed_lengths
        .iter()
        .map(|&len| {
            let row = SpeedRow {
                len,
                average: average_hash_time(len, config.speed_trials, rng),
            };
            log::debug!("speed experiment: {row}");
            row
        })
        .collect()
}

pub fn write_csv<W: Write, T: Display>(
    mut writer: W,
    header: &str,
    rows: &[T],
) -> std::io::Result<()> {
    writeln!(writer, "{header}")?;
    for row in rows {
        writeln!(writer, "{row}")?;
    }
    writer.flush()
}
