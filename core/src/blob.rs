//! Single-row blob read/update workload.

use anyhow::{Result, ensure};
use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;

/// Shape of the blob workload.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BlobMix {
    /// Probability that a request is a read.
    pub read_fraction: f64,
    /// Size of the stored blob in bytes.
    pub payload_size: usize,
}

impl BlobMix {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.read_fraction),
            "read fraction must be within [0, 1], got {}",
            self.read_fraction
        );
        ensure!(self.payload_size > 0, "blob payload size must be positive");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobRequest {
    Read,
    Write,
}

/// Per-worker stream of [`BlobRequest`]s.
#[derive(Debug, Clone)]
pub struct BlobGenerator {
    rng: StdRng,
    read: Bernoulli,
}

impl BlobGenerator {
    pub fn new(mix: &BlobMix, seed: u64) -> Result<Self> {
        Self::with_rng(mix, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(mix: &BlobMix) -> Result<Self> {
        Self::with_rng(mix, StdRng::from_entropy())
    }

    fn with_rng(mix: &BlobMix, rng: StdRng) -> Result<Self> {
        mix.validate()?;
        Ok(Self {
            rng,
            read: Bernoulli::new(mix.read_fraction)?,
        })
    }

    pub fn next_request(&mut self) -> BlobRequest {
        if self.read.sample(&mut self.rng) {
            BlobRequest::Read
        } else {
            BlobRequest::Write
        }
    }

    /// Filler bytes for the stored blob.
    pub fn payload(&mut self, size: usize) -> Vec<u8> {
        fill(&mut self.rng, size)
    }
}

/// `size` bytes from an entropy-seeded generator.
pub fn random_payload(size: usize) -> Vec<u8> {
    fill(&mut StdRng::from_entropy(), size)
}

fn fill<R: RngCore>(rng: &mut R, size: usize) -> Vec<u8> {
    let mut buf = vec![0u8; size];
    rng.fill_bytes(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mix(read_fraction: f64) -> BlobMix {
        BlobMix {
            read_fraction,
            payload_size: 1000,
        }
    }

    #[test]
    fn invalid_mix_is_rejected() {
        assert!(BlobGenerator::new(&mix(1.5), 1).is_err());
        assert!(BlobGenerator::new(&mix(-0.1), 1).is_err());
        assert!(
            BlobGenerator::new(
                &BlobMix {
                    read_fraction: 0.5,
                    payload_size: 0
                },
                1
            )
            .is_err()
        );
    }

    #[test]
    fn extreme_mixes_are_pure() {
        let mut reads = BlobGenerator::new(&mix(1.0), 1).unwrap();
        let mut writes = BlobGenerator::new(&mix(0.0), 1).unwrap();
        for _ in 0..1000 {
            assert_eq!(reads.next_request(), BlobRequest::Read);
            assert_eq!(writes.next_request(), BlobRequest::Write);
        }
    }

    #[test]
    fn read_fraction_is_respected() {
        let mut generator = BlobGenerator::new(&mix(0.3), 11).unwrap();
        let reads = (0..100_000)
            .filter(|_| generator.next_request() == BlobRequest::Read)
            .count();
        let fraction = reads as f64 / 100_000.0;
        assert!((fraction - 0.3).abs() < 0.01, "read fraction {fraction}");
    }

    #[test]
    fn payload_has_requested_size() {
        let mut generator = BlobGenerator::new(&mix(0.5), 2).unwrap();
        assert_eq!(generator.payload(4096).len(), 4096);
        assert_eq!(random_payload(17).len(), 17);
    }
}
