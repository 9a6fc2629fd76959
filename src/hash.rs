use crate::Digest;

pub trait Hasher<const N: usize>: Default {
    fn update(&mut self, data: &[u8]);

    /// Finalise the message and consume the hasher.
    fn digest(self) -> Digest<N>;

    fn digest_message(message: &[u8]) -> Digest<N> {
        let mut hasher = Self::default();
        hasher.update(message);
        hasher.digest()
    }

    fn update_and_digest(mut self, message: &[u8]) -> Digest<N> {
        self.update(message);
        self.digest()
    }
}
