pub const BLOCK_SIZE: usize = 64;

/// Holds input that does not yet make up a whole block.
#[derive(Debug, Clone)]
pub struct BlockBuffer {
    bytes: [u8; BLOCK_SIZE],
    len: usize,
}

impl BlockBuffer {
    pub fn new() -> Self {
        Self {
            bytes: [0u8; BLOCK_SIZE],
            len: 0,
        }
    }

    /// Copy as much of `input` as fits, returning the number of bytes taken.
    pub fn fill(&mut self, input: &[u8]) -> usize {
        let to_copy = (BLOCK_SIZE - self.len).min(input.len());
        self.bytes[self.len..self.len + to_copy].copy_from_slice(&input[..to_copy]);
        self.len += to_copy;
        to_copy
    }

    pub fn is_full(&self) -> bool {
        self.len == BLOCK_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn block(&self) -> &[u8; BLOCK_SIZE] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for BlockBuffer {
    fn default() -> Self {
        Self::new()
    }
}
