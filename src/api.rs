use std::io;

use crate::{error::NtStatus, search::MappingView, sys};

/// Parameters for a single `NtMapViewOfSection` attempt.
///
/// The remaining arguments are fixed: no zero-bit constraint, no section offset, `ViewUnmap`
/// inheritance, `MEM_RESERVE` allocation and read/write protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRequest {
    /// Preferred base address. `None` lets the kernel choose.
    pub hint: Option<usize>,
    /// Number of bytes of address space to reserve.
    pub size: usize,
    /// Number of bytes to commit up front.
    pub commit_size: usize,
}

/// The native entry points a reservation run depends on.
///
/// On Windows this is backed by [`NtApiTable`](crate::NtApiTable), whose four function pointers
/// are resolved together at runtime. Everything downstream only sees this trait, so it can be
/// driven by a scripted double.
pub trait NtApi {
    /// An owned kernel object. Dropping it releases the object.
    type Handle;

    /// `NtCreateTransaction` with all access and default isolation.
    fn create_transaction(&self) -> Result<Self::Handle, NtStatus>;

    /// `CreateFileTransactedA` with exclusive read/write access and `CREATE_NEW`. Returns `None`
    /// when the call yields an invalid handle.
    fn create_transacted_file(&self, name: &str, transaction: &Self::Handle)
        -> Option<Self::Handle>;

    /// Writes `data` to `file`, returning how many bytes made it.
    fn write_file(&self, file: &Self::Handle, data: &[u8]) -> io::Result<usize>;

    /// `NtCreateSection` over `file` with `SEC_COMMIT` and read/write protection.
    fn create_section(&self, file: &Self::Handle) -> Result<Self::Handle, NtStatus>;

    /// `NtMapViewOfSection` into the current process.
    fn map_view(&self, section: &Self::Handle, request: ViewRequest)
        -> Result<MappingView, NtStatus>;

    /// Installed physical memory in bytes, if it can be determined.
    fn physical_memory(&self) -> Option<u64> {
        sys::physical_memory_bytes()
    }

    /// A monotonic millisecond counter.
    fn tick_count(&self) -> u64 {
        sys::tick_count()
    }
}
