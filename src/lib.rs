//! Addrfog fills a process' address space with a handful of enormous reserved views so that tools
//! which walk that address space page by page (memory scanners, process inspectors) slow to a crawl.
//!
//! ## How it works
//!
//! - A **transaction** is created and a small file is created *inside* it. The transaction is never
//!   committed, so the file never reaches the disk even though the handle behaves like a regular
//!   file handle.
//!
//! - A **section** is created over that file. Its committed size is the size of the file: a few
//!   bytes, rounded up to a page.
//!
//! - **Views** of the section are mapped with `MEM_RESERVE`, which lets the requested view size
//!   exceed the size of the section. Each view reserves up to 16 TiB of address space while only a
//!   single page is ever backed.
//!
//! View sizes are searched from the largest power of two down, since the kernel rejects requests
//! that do not fit the free address space. Views are placed back to back, and the run stops once
//! the total reaches a ceiling derived from the machine's physical memory.
//!
//! Only Windows is supported. On other targets [`protect`] fails with [`Error::ApiLoadFailed`].
//!
//! ```no_run
//! let result = addrfog::protect(&addrfog::Config::default());
//! match result {
//!     Ok(result) => println!("reserved {} GB", result.total_reserved_bytes() >> 30),
//!     Err(error) => eprintln!("error: {error}"),
//! }
//! ```

pub mod api;
pub mod backing;
pub mod config;
pub mod error;
pub mod reserve;
pub mod search;

#[cfg_attr(windows, path = "sys/windows.rs")]
#[cfg_attr(not(windows), path = "sys/unix.rs")]
mod sys;

pub use api::{NtApi, ViewRequest};
pub use config::Config;
pub use error::{Error, NtStatus};
pub use reserve::{reserve_with, ReservationResult};
pub use search::{Exhausted, MappingView};
pub use sys::NtApiTable;
#[cfg(windows)]
pub use sys::OwnedHandle;

/// Resolves the native API and reserves address space according to `config`.
///
/// The returned views stay mapped for the rest of the process' lifetime. Every handle created along
/// the way is closed before this returns, on success and on failure alike.
pub fn protect(config: &Config) -> Result<ReservationResult, Error> {
    let api = NtApiTable::resolve()?;
    reserve_with(&api, config)
}

/// Like [`protect`], but only reports the total number of reserved bytes, or `0` on failure.
pub fn protect_simple(config: &Config) -> u64 {
    protect(config).map_or(0, |result| result.total_reserved_bytes())
}
