use std::{convert::Infallible, io};

use tracing::debug;

use crate::{
    api::{NtApi, ViewRequest},
    error::{Error, NtStatus},
    search::MappingView,
};

/// The native API does not exist outside of Windows, so no table can ever be resolved.
pub enum NtApiTable {}

impl NtApiTable {
    pub fn resolve() -> Result<Self, Error> {
        debug!("native entry points are only available on Windows");
        Err(Error::ApiLoadFailed)
    }
}

impl NtApi for NtApiTable {
    type Handle = Infallible;

    fn create_transaction(&self) -> Result<Infallible, NtStatus> {
        match *self {}
    }

    fn create_transacted_file(&self, _name: &str, _transaction: &Infallible) -> Option<Infallible> {
        match *self {}
    }

    fn write_file(&self, _file: &Infallible, _data: &[u8]) -> io::Result<usize> {
        match *self {}
    }

    fn create_section(&self, _file: &Infallible) -> Result<Infallible, NtStatus> {
        match *self {}
    }

    fn map_view(&self, _section: &Infallible, _request: ViewRequest) -> Result<MappingView, NtStatus> {
        match *self {}
    }
}

pub fn physical_memory_bytes() -> Option<u64> {
    let (pages, page_size) =
        unsafe { (libc::sysconf(libc::_SC_PHYS_PAGES), libc::sysconf(libc::_SC_PAGESIZE)) };

    if pages <= 0 || page_size <= 0 {
        return None;
    }

    (pages as u64).checked_mul(page_size as u64)
}

pub fn tick_count() -> u64 {
    let mut now = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };

    if unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut now) } != 0 {
        return 0;
    }

    (now.tv_sec as u64) * 1000 + (now.tv_nsec as u64) / 1_000_000
}
