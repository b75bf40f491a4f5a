//! Cryptographically secure randomness
//!
//! Every key, nonce and token in the crate is drawn through [`RandomSource`].
//! The production source is the operating system CSPRNG; failure is fatal
//! and surfaced as [`Error::EntropyUnavailable`] without retry.

use crate::{Error, Result};
use rand::RngCore;
use rand::rngs::OsRng;

/// Supplier of cryptographically secure random bytes
///
/// Implementations must be safe to share between threads.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely with random bytes
    fn try_fill(&self, dest: &mut [u8]) -> Result<()>;

    /// Draw `n` random bytes
    fn random_bytes(&self, n: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; n];
        self.try_fill(&mut bytes)?;
        Ok(bytes)
    }

    /// Draw a fixed-size array of random bytes
    fn random_array<const N: usize>(&self) -> Result<[u8; N]>
    where
        Self: Sized,
    {
        let mut bytes = [0u8; N];
        self.try_fill(&mut bytes)?;
        Ok(bytes)
    }
}

/// Operating-system backed CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn try_fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(dest).map_err(|e| {
            tracing::error!("❌ OS entropy source failed: {}", e);
            Error::EntropyUnavailable
        })
    }
}

/// Fill a fixed-size array from a shared source
pub(crate) fn fill_array<const N: usize>(source: &dyn RandomSource) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    source.try_fill(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ExhaustedSource;

    impl RandomSource for ExhaustedSource {
        fn try_fill(&self, _dest: &mut [u8]) -> Result<()> {
            Err(Error::EntropyUnavailable)
        }
    }

    #[test]
    fn test_os_random_bytes() {
        let source = OsRandom;

        let bytes = source.random_bytes(48).unwrap();
        assert_eq!(bytes.len(), 48);

        let a: [u8; 32] = source.random_array().unwrap();
        let b: [u8; 32] = source.random_array().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_length_draw() {
        assert!(OsRandom.random_bytes(0).unwrap().is_empty());
    }

    #[test]
    fn test_exhausted_source_is_fatal() {
        let source = ExhaustedSource;
        assert!(matches!(
            source.random_bytes(16),
            Err(Error::EntropyUnavailable)
        ));
        assert!(matches!(
            fill_array::<12>(&source),
            Err(Error::EntropyUnavailable)
        ));
    }

    #[test]
    fn test_source_shared_across_threads() {
        let source = std::sync::Arc::new(OsRandom);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let source = source.clone();
                std::thread::spawn(move || source.random_array::<32>().unwrap())
            })
            .collect();

        let draws: std::collections::HashSet<[u8; 32]> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(draws.len(), 4);
    }
}
