use std::io::Read;

use crate::block::{BlockBuffer, BLOCK_SIZE};
use crate::{Hasher, Md5Digest};

const MD5_SIZE: usize = 16;
const INITIALISATION_CONSTANTS: [u32; 4] = [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476];
const LENGTH_OFFSET: usize = 56;
const READ_CHUNK_SIZE: usize = 8192;

const K: [u32; 64] = [
    0xD76AA478, 0xE8C7B756, 0x242070DB, 0xC1BDCEEE, 0xF57C0FAF, 0x4787C62A, 0xA8304613,
    0xFD469501, 0x698098D8, 0x8B44F7AF, 0xFFFF5BB1, 0x895CD7BE, 0x6B901122, 0xFD987193,
    0xA679438E, 0x49B40821, 0xF61E2562, 0xC040B340, 0x265E5A51, 0xE9B6C7AA, 0xD62F105D,
    0x02441453, 0xD8A1E681, 0xE7D3FBC8, 0x21E1CDE6, 0xC33707D6, 0xF4D50D87, 0x455A14ED,
    0xA9E3E905, 0xFCEFA3F8, 0x676F02D9, 0x8D2A4C8A, 0xFFFA3942, 0x8771F681, 0x6D9D6122,
    0xFDE5380C, 0xA4BEEA44, 0x4BDECFA9, 0xF6BB4B60, 0xBEBFBC70, 0x289B7EC6, 0xEAA127FA,
    0xD4EF3085, 0x04881D05, 0xD9D4D039, 0xE6DB99E5, 0x1FA27CF8, 0xC4AC5665, 0xF4292244,
    0x432AFF97, 0xAB9423A7, 0xFC93A039, 0x655B59C3, 0x8F0CCC92, 0xFFEFF47D, 0x85845DD1,
    0x6FA87E4F, 0xFE2CE6E0, 0xA3014314, 0x4E0811A1, 0xF7537E82, 0xBD3AF235, 0x2AD7D2BB,
    0xEB86D391,
];

/// Left-rotate amounts, one row per round, cycling every four steps.
const SHIFTS: [[u32; 4]; 4] = [[7, 12, 17, 22], [5, 9, 14, 20], [4, 11, 16, 23], [6, 10, 15, 21]];

/// Streaming MD5.
///
/// `digest` consumes the hasher. Use `finalize` or `hex_digest` to read the
/// digest of everything seen so far while continuing to feed the stream.
#[derive(Debug, Clone)]
pub struct Md5 {
    buffer: BlockBuffer,
    state: [u32; 4],
    message_bit_len: u64,
}

impl Md5 {
    pub fn new() -> Self {
        Self {
            buffer: BlockBuffer::new(),
            state: INITIALISATION_CONSTANTS,
            message_bit_len: 0,
        }
    }

    pub fn update(&mut self, message: &[u8]) {
        // MD5 only records the length modulo 2^64.
        self.message_bit_len = self
            .message_bit_len
            .wrapping_add((message.len() as u64).wrapping_mul(8));

        let mut offset = 0;
        if !self.buffer.is_empty() {
            offset = self.buffer.fill(message);
            if self.buffer.is_full() {
                process_chunk(&mut self.state, self.buffer.block());
                self.buffer.clear();
            }
        }

        let mut chunks = message[offset..].chunks_exact(BLOCK_SIZE);
        for chunk in &mut chunks {
            process_chunk(&mut self.state, chunk);
        }
        self.buffer.fill(chunks.remainder());
    }

    pub fn digest(mut self) -> Md5Digest {
        self.md_pad();

        let mut out = [0u8; MD5_SIZE];
        for (bytes, word) in out.chunks_exact_mut(4).zip(self.state) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }
        Md5Digest::new(out)
    }

    /// Digest of the message so far, leaving this hasher untouched.
    pub fn finalize(&self) -> Md5Digest {
        self.clone().digest()
    }

    pub fn hex_digest(&self) -> String {
        self.finalize().to_hex()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn bit_len(&self) -> u64 {
        self.message_bit_len
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    fn md_pad(&mut self) {
        let bit_len_bytes = self.message_bit_len.to_le_bytes();

        let len_mod = self.buffer.len();
        let padding_len = if len_mod < LENGTH_OFFSET {
            LENGTH_OFFSET - len_mod
        } else {
            BLOCK_SIZE + LENGTH_OFFSET - len_mod
        };
        let mut padding = [0u8; BLOCK_SIZE];
        padding[0] = 0x80;
        self.update(&padding[..padding_len]);
        self.update(&bit_len_bytes);

        debug_assert!(self.buffer.is_empty());
    }
}

impl Default for Md5 {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher<MD5_SIZE> for Md5 {
    fn update(&mut self, data: &[u8]) {
        Md5::update(self, data);
    }

    fn digest(self) -> Md5Digest {
        Md5::digest(self)
    }
}

/// Hex digest of a whole message.
pub fn md5_hex(message: &[u8]) -> String {
    Md5::digest_message(message).to_hex()
}

/// Digest everything a reader yields, streaming it through `update`.
pub fn md5_reader<R: Read>(mut reader: R) -> std::io::Result<Md5Digest> {
    let mut md5 = Md5::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => md5.update(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(md5.digest())
}

fn process_chunk(state: &mut [u32; 4], chunk: &[u8]) {
    debug_assert_eq!(chunk.len(), BLOCK_SIZE);

    let mut x = [0u32; 16];
    for (word, bytes) in x.iter_mut().zip(chunk.chunks_exact(4)) {
        *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }

    let [mut a, mut b, mut c, mut d] = *state;
    for step in 0..64 {
        let (mixed, word_idx) = match step {
            0..=15 => (f(b, c, d), step),
            16..=31 => (g(b, c, d), (5 * step + 1) % 16),
            32..=47 => (h(b, c, d), (3 * step + 5) % 16),
            _ => (i(b, c, d), (7 * step) % 16),
        };

        let rotated = a
            .wrapping_add(mixed)
            .wrapping_add(K[step])
            .wrapping_add(x[word_idx])
            .rotate_left(SHIFTS[step / 16][step % 4]);
        a = d;
        d = c;
        c = b;
        b = b.wrapping_add(rotated);
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);
}

fn f(x: u32, y: u32, z: u32) -> u32 {
    (x & y) | (!x & z)
}

fn g(x: u32, y: u32, z: u32) -> u32 {
    (x & z) | (y & !z)
}

fn h(x: u32, y: u32, z: u32) -> u32 {
    x ^ y ^ z
}

fn i(x: u32, y: u32, z: u32) -> u32 {
    y ^ (x | !z)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rstest::rstest;

    #[rstest]
    #[case("", "d41d8cd98f00b204e9800998ecf8427e")]
    #[case("a", "0cc175b9c0f1b6a831c399e269772661")]
    #[case("abc", "900150983cd24fb0d6963f7d28e17f72")]
    #[case("message digest", "f96b697d7cb7938d525a2f31aaf161d0")]
    #[case("abcdefghijklmnopqrstuvwxyz", "c3fcd3d76192e4007dfb496cca67e13b")]
    #[case(
        "abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
        "8215ef0796a20bcaaae116d3876c664a"
    )]
    #[case(
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789",
        "d174ab98d277d9f5a5611c2c9f419d9f"
    )]
    #[case(
        "12345678901234567890123456789012345678901234567890123456789012345678901234567890",
        "57edf4a22be3c955ac49da2e2107b67a"
    )]
    #[case(
        "The quick brown fox jumps over the lazy dog",
        "9e107d9d372bb6826bd81d3542a419d6"
    )]
    fn md5_generates_test_vector_hashes(#[case] input: &str, #[case] expected: &str) {
        let mut md5 = Md5::new();
        md5.update(input.as_bytes());

        assert_eq!(md5.digest().to_hex(), expected);
    }

    #[rstest]
    #[case(0, "d41d8cd98f00b204e9800998ecf8427e")]
    #[case(55, "ef1772b6dff9a122358552954ad0df65")]
    #[case(56, "3b0c8ac703f828b04c6c197006d17218")]
    #[case(57, "652b906d60af96844ebd21b674f35e93")]
    #[case(63, "b06521f39153d618550606be297466d5")]
    #[case(64, "014842d480b571495a4a0363793f7367")]
    #[case(65, "c743a45e0d2e6a95cb859adae0248435")]
    #[case(127, "020406e1d05cdc2aa287641f7ae2cc39")]
    #[case(128, "e510683b3f5ffe4093d021808bc6ff70")]
    #[case(1000, "cabe45dcc9ae5b66ba86600cca6b8ba8")]
    fn md5_handles_padding_and_block_boundaries(#[case] len: usize, #[case] expected: &str) {
        let message = vec![b'a'; len];

        assert_eq!(md5_hex(&message), expected);
    }

    #[test]
    fn md5_of_one_million_a() {
        let mut md5 = Md5::new();
        let chunk = [b'a'; 1000];
        for _ in 0..1000 {
            md5.update(&chunk);
        }

        assert_eq!(md5.digest(), "7707d6ae4e027c70eea2a935c2296f21");
    }

    #[test]
    fn digest_is_the_same_for_every_two_way_split() {
        let message: Vec<u8> = (0..=255u8).cycle().take(200).collect();
        let expected = Md5::digest_message(&message);

        for split in 0..=message.len() {
            let (head, tail) = message.split_at(split);
            let mut md5 = Md5::new();
            md5.update(head);
            md5.update(tail);

            assert_eq!(md5.digest(), expected, "split at {split}");
        }
    }

    #[test]
    fn digest_is_the_same_when_fed_byte_by_byte() {
        let message = vec![0x5a; 1000];
        let mut md5 = Md5::new();
        for byte in &message {
            md5.update(std::slice::from_ref(byte));
        }

        assert_eq!(md5.digest(), "00dde050b563dc1cd920ba043e0d5d70");
    }

    #[test]
    fn digest_is_the_same_for_random_chunkings() {
        let mut rng = StdRng::seed_from_u64(9);
        let message: Vec<u8> = (0..4096).map(|_| rng.gen()).collect();
        let expected = Md5::digest_message(&message);

        for _ in 0..50 {
            let mut md5 = Md5::new();
            let mut rest = message.as_slice();
            while !rest.is_empty() {
                let take = rng.gen_range(0..=150).min(rest.len());
                let (chunk, tail) = rest.split_at(take);
                md5.update(chunk);
                rest = tail;
            }

            assert_eq!(md5.digest(), expected);
        }
    }

    #[test]
    fn md5_reader_matches_in_memory_digest() {
        let message = vec![b'a'; 20_000];

        let digest = md5_reader(std::io::Cursor::new(&message)).unwrap();

        assert_eq!(digest, Md5::digest_message(&message));
    }

    struct InterruptOnce<'a> {
        data: &'a [u8],
        interrupted: bool,
    }

    impl std::io::Read for InterruptOnce<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::ErrorKind::Interrupted.into());
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn md5_reader_retries_interrupted_reads() {
        let reader = InterruptOnce {
            data: b"abc",
            interrupted: false,
        };

        let digest = md5_reader(reader).unwrap();

        assert_eq!(digest, "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn md5_reader_propagates_other_errors() {
        struct Broken;
        impl std::io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
        }

        let err = md5_reader(Broken).unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn bit_len_wraps_modulo_two_to_the_sixty_four() {
        let mut md5 = Md5::new();
        md5.message_bit_len = u64::MAX - 7;

        md5.update(b"ab");

        assert_eq!(md5.bit_len(), 8);
        assert_eq!(md5.pending_len(), 2);
        assert_eq!(md5.finalize().to_hex().len(), 32);
    }

    #[test]
    fn update_tracks_bit_length_and_pending_bytes() {
        let mut md5 = Md5::new();
        md5.update(&[0u8; 100]);

        assert_eq!(md5.bit_len(), 800);
        assert_eq!(md5.pending_len(), 36);

        md5.update(&[0u8; 28]);

        assert_eq!(md5.bit_len(), 1024);
        assert_eq!(md5.pending_len(), 0);
    }

    #[test]
    fn finalize_leaves_the_stream_open() {
        let mut md5 = Md5::new();
        md5.update(b"a");

        assert_eq!(md5.hex_digest(), "0cc175b9c0f1b6a831c399e269772661");
        assert_eq!(md5.hex_digest(), "0cc175b9c0f1b6a831c399e269772661");

        md5.update(b"bc");

        assert_eq!(md5.finalize(), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(md5.bit_len(), 24);
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut md5 = Md5::new();
        md5.update(b"something else entirely");
        md5.reset();
        md5.update(b"abc");

        assert_eq!(md5.pending_len(), 3);
        assert_eq!(md5.digest(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn digest_is_deterministic_across_instances() {
        let message = b"repeatable input";

        assert_eq!(
            Md5::digest_message(message),
            Md5::default().update_and_digest(message)
        );
    }

    #[test]
    fn changing_one_byte_changes_the_digest() {
        let mut rng = StdRng::seed_from_u64(1);
        let message: Vec<u8> = (0..128).map(|_| rng.gen()).collect();
        let original = Md5::digest_message(&message);

        for i in 0..message.len() {
            let mut flipped = message.clone();
            flipped[i] ^= 0x01;

            assert_ne!(Md5::digest_message(&flipped), original, "byte {i}");
        }
    }
}
