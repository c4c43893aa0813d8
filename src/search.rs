use thiserror::Error;
use tracing::trace;

use crate::{
    api::{NtApi, ViewRequest},
    error::NtStatus,
};

/// Bytes committed up front for every view: a single page.
pub const COMMIT_SIZE: usize = 0x1000;

/// A view of the backing section mapped into the current process.
///
/// Views are never unmapped by this crate; they stay reserved for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappingView {
    base: usize,
    size: usize,
}

impl MappingView {
    pub fn new(base: usize, size: usize) -> Self {
        Self { base, size }
    }

    pub fn base_address(&self) -> usize {
        self.base
    }

    /// Reserved bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The view size as a power-of-two shift (rounded down if the kernel adjusted the size).
    pub fn size_shift(&self) -> u32 {
        usize::BITS - 1 - self.size.max(1).leading_zeros()
    }

    /// First address past the view, or `None` if it would wrap.
    pub fn end_address(&self) -> Option<usize> {
        self.base.checked_add(self.size)
    }
}

/// Every view size in the requested range was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "no view between 2^{min_shift} and 2^{max_shift} bytes could be mapped \
     after {attempts} attempts (last {last_status})"
)]
pub struct Exhausted {
    pub max_shift: u32,
    pub min_shift: u32,
    pub attempts: u32,
    pub last_status: NtStatus,
}

/// Maps the largest view of `section` whose size is a power of two between `2^max_shift` and
/// `2^min_shift`, walking down one shift at a time and stopping at the first size the kernel
/// accepts.
///
/// The kernel rejects views that do not fit the free (or permitted) address space, which depends on
/// the machine and on whatever else the process has mapped, so the search starts big and degrades.
pub fn search_view<A: NtApi + ?Sized>(
    api: &A,
    section: &A::Handle,
    max_shift: u32,
    min_shift: u32,
    hint: Option<usize>,
) -> Result<MappingView, Exhausted> {
    let mut attempts = 0;
    let mut last_status = NtStatus::UNSUCCESSFUL;

    for shift in (min_shift..=max_shift).rev() {
        attempts += 1;

        let Some(size) = 1usize.checked_shl(shift) else {
            trace!(shift, "view size exceeds the address width");
            continue;
        };

        let request = ViewRequest {
            hint,
            size,
            commit_size: COMMIT_SIZE,
        };

        match api.map_view(section, request) {
            Ok(view) => {
                trace!(shift, base = view.base_address(), "view mapped");
                return Ok(view);
            }
            Err(status) => {
                trace!(shift, %status, "view rejected");
                last_status = status;
            }
        }
    }

    Err(Exhausted {
        max_shift,
        min_shift,
        attempts,
        last_status,
    })
}
