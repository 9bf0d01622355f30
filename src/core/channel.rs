//! Remote memory channel interface.
//!
//! A channel performs one physical scatter read: N `(address, size)` requests
//! in, N buffers (or per-request failures) out, in request order. Everything
//! above this trait is transport agnostic; the channel is expected to bound
//! its own latency and report a stalled request as a failure.

use anyhow::Result;

/// Highest canonical user-space address on x86-64.
pub const MAX_USER_ADDRESS: u64 = 0x0000_7FFF_FFFF_FFFF;

/// One remote read inside a batched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadRequest {
    pub address: u64,
    pub size: usize,
}

impl ReadRequest {
    pub fn new(address: u64, size: usize) -> Self {
        Self { address, size }
    }

    /// Exclusive end address, saturating at `u64::MAX`.
    pub fn end(&self) -> u64 {
        self.address.saturating_add(self.size as u64)
    }
}

/// Batched read primitive the scatter scheduler is built on.
pub trait MemoryChannel: Send + Sync {
    /// Reads every request in one round trip.
    ///
    /// The returned vector is index-aligned with `requests`. Implementations
    /// may return fewer entries than requested; missing trailing entries are
    /// treated as failures by the caller.
    fn batch_read(&self, requests: &[ReadRequest]) -> Vec<Result<Vec<u8>>>;

    /// Convenience single read built on `batch_read`.
    fn read(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.batch_read(&[ReadRequest::new(address, size)])
            .pop()
            .unwrap_or_else(|| Err(anyhow::anyhow!("channel returned no buffer for 0x{:X}", address)))
    }
}

impl<C: MemoryChannel + ?Sized> MemoryChannel for std::sync::Arc<C> {
    fn batch_read(&self, requests: &[ReadRequest]) -> Vec<Result<Vec<u8>>> {
        (**self).batch_read(requests)
    }
}

impl<C: MemoryChannel + ?Sized> MemoryChannel for &C {
    fn batch_read(&self, requests: &[ReadRequest]) -> Vec<Result<Vec<u8>>> {
        (**self).batch_read(requests)
    }
}

/// Whether `address` can be dereferenced at all: non-null and inside the
/// canonical user-space half.
#[inline]
pub fn is_valid_address(address: u64) -> bool {
    address != 0 && address <= MAX_USER_ADDRESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validity() {
        assert!(!is_valid_address(0));
        assert!(is_valid_address(0x1000));
        assert!(is_valid_address(MAX_USER_ADDRESS));
        assert!(!is_valid_address(MAX_USER_ADDRESS + 1));
        assert!(!is_valid_address(0xFFFF_8000_0000_0000));
    }

    #[test]
    fn test_request_end_saturates() {
        assert_eq!(ReadRequest::new(0x1000, 8).end(), 0x1008);
        assert_eq!(ReadRequest::new(u64::MAX - 1, 8).end(), u64::MAX);
    }
}
