mod analysis;
mod block;
mod digest;
mod hash;
mod hex;
mod md5;

pub use analysis::{
    average_hash_time, collision_experiment, count_duplicates, duplicate_experiment,
    max_matching_prefix, random_alphanumeric, random_bytes, speed_experiment, write_csv,
    CollisionRow, DuplicateRow, ExperimentConfig, SpeedRow, COLLISIONS_HEADER, DUPLICATES_HEADER,
    SPEED_HEADER,
};
pub use block::{BlockBuffer, BLOCK_SIZE};
pub use digest::{Digest, Md5Digest};
pub use hash::Hasher;
pub use hex::{bytes_to_hex, common_prefix_len, hex_to_bytes};
pub use md5::{md5_hex, md5_reader, Md5};
