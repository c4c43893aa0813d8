// native api quick reference:
// https://learn.microsoft.com/en-us/windows/win32/api/winbase/nf-winbase-createfiletransacteda
// https://learn.microsoft.com/en-us/windows-hardware/drivers/ddi/wdm/nf-wdm-zwcreatetransaction
// https://learn.microsoft.com/en-us/windows-hardware/drivers/ddi/wdm/nf-wdm-zwcreatesection
// https://learn.microsoft.com/en-us/windows-hardware/drivers/ddi/wdm/nf-wdm-zwmapviewofsection
// https://learn.microsoft.com/en-us/windows/win32/api/sysinfoapi/nf-sysinfoapi-globalmemorystatusex

use std::{
    ffi::{c_void, CStr, CString},
    io, mem,
    ptr::{null, null_mut},
};

use tracing::debug;
use windows_sys::Win32::{
    Foundation::{
        CloseHandle, GetLastError, GENERIC_READ, GENERIC_WRITE, HANDLE, HMODULE,
        INVALID_HANDLE_VALUE,
    },
    Storage::FileSystem::{WriteFile, CREATE_NEW, FILE_ATTRIBUTE_NORMAL},
    System::{
        LibraryLoader::{GetModuleHandleA, GetProcAddress},
        Memory::{MEM_RESERVE, PAGE_READWRITE, SECTION_ALL_ACCESS, SEC_COMMIT},
        SystemInformation::{GetTickCount64, GlobalMemoryStatusEx, MEMORYSTATUSEX},
        Threading::GetCurrentProcess,
    },
};

use crate::{
    api::{NtApi, ViewRequest},
    error::{Error, NtStatus},
    search::MappingView,
};

const TRANSACTION_ALL_ACCESS: u32 = 0x0012_003F;

/// `SECTION_INHERIT::ViewUnmap`: the view is not mapped into child processes.
const VIEW_UNMAP: u32 = 2;

#[repr(C)]
struct ObjectAttributes {
    length: u32,
    root_directory: HANDLE,
    object_name: *const c_void,
    attributes: u32,
    security_descriptor: *const c_void,
    security_quality_of_service: *const c_void,
}

impl ObjectAttributes {
    fn empty() -> Self {
        Self {
            length: mem::size_of::<Self>() as u32,
            root_directory: 0,
            object_name: null(),
            attributes: 0,
            security_descriptor: null(),
            security_quality_of_service: null(),
        }
    }
}

type NtCreateTransactionFn = unsafe extern "system" fn(
    /* transaction */ *mut HANDLE,
    /* desired access */ u32,
    /* object attributes */ *mut ObjectAttributes,
    /* unit of work */ *const c_void,
    /* transaction manager */ HANDLE,
    /* create options */ u32,
    /* isolation level */ u32,
    /* isolation flags */ u32,
    /* timeout */ *const i64,
    /* description */ *const c_void,
) -> i32;

type NtCreateSectionFn = unsafe extern "system" fn(
    /* section */ *mut HANDLE,
    /* desired access */ u32,
    /* object attributes */ *const ObjectAttributes,
    /* maximum size */ *const i64,
    /* page protection */ u32,
    /* allocation attributes */ u32,
    /* file */ HANDLE,
) -> i32;

type NtMapViewOfSectionFn = unsafe extern "system" fn(
    /* section */ HANDLE,
    /* process */ HANDLE,
    /* base address */ *mut *mut c_void,
    /* zero bits */ usize,
    /* commit size */ usize,
    /* section offset */ *const i64,
    /* view size */ *mut usize,
    /* inherit disposition */ u32,
    /* allocation type */ u32,
    /* page protection */ u32,
) -> i32;

type CreateFileTransactedAFn = unsafe extern "system" fn(
    /* file name */ *const u8,
    /* desired access */ u32,
    /* share mode */ u32,
    /* security attributes */ *const c_void,
    /* creation disposition */ u32,
    /* flags and attributes */ u32,
    /* template file */ HANDLE,
    /* transaction */ HANDLE,
    /* mini version */ *const u16,
    /* extended parameter */ *const c_void,
) -> HANDLE;

/// A kernel handle closed on drop.
#[derive(Debug)]
pub struct OwnedHandle(HANDLE);

impl OwnedHandle {
    fn new(raw: HANDLE) -> Option<Self> {
        (raw != 0 && raw != INVALID_HANDLE_VALUE).then_some(Self(raw))
    }

    pub fn raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        unsafe {
            // Safety: we own the handle and nothing else closes it.
            CloseHandle(self.0);
        }
    }
}

/// The native entry points, resolved by name from `ntdll.dll` and `kernel32.dll`.
///
/// Either all four are present or no table is produced.
pub struct NtApiTable {
    nt_create_transaction: NtCreateTransactionFn,
    nt_create_section: NtCreateSectionFn,
    nt_map_view_of_section: NtMapViewOfSectionFn,
    create_file_transacted_a: CreateFileTransactedAFn,
}

impl NtApiTable {
    pub fn resolve() -> Result<Self, Error> {
        let table = unsafe {
            // Safety: both modules are loaded into every Win32 process and each type alias above
            // matches the signature of the export it is looked up with.
            Self::lookup_all()
        };

        table.ok_or_else(|| {
            debug!("failed to resolve native entry points");
            Error::ApiLoadFailed
        })
    }

    unsafe fn lookup_all() -> Option<Self> {
        let ntdll = module(c"ntdll.dll")?;
        let kernel32 = module(c"kernel32.dll")?;

        Some(Self {
            nt_create_transaction: lookup(ntdll, c"NtCreateTransaction")?,
            nt_create_section: lookup(ntdll, c"NtCreateSection")?,
            nt_map_view_of_section: lookup(ntdll, c"NtMapViewOfSection")?,
            create_file_transacted_a: lookup(kernel32, c"CreateFileTransactedA")?,
        })
    }
}

unsafe fn module(name: &CStr) -> Option<HMODULE> {
    let module = GetModuleHandleA(name.as_ptr().cast());
    (module != 0).then_some(module)
}

unsafe fn lookup<F: Copy>(module: HMODULE, name: &CStr) -> Option<F> {
    let export = GetProcAddress(module, name.as_ptr().cast())?;
    debug_assert_eq!(mem::size_of::<F>(), mem::size_of_val(&export));

    Some(mem::transmute_copy(&export))
}

impl NtApi for NtApiTable {
    type Handle = OwnedHandle;

    fn create_transaction(&self) -> Result<OwnedHandle, NtStatus> {
        let mut attributes = ObjectAttributes::empty();
        let mut raw: HANDLE = 0;

        let status = NtStatus(unsafe {
            (self.nt_create_transaction)(
                &mut raw,
                TRANSACTION_ALL_ACCESS,
                &mut attributes,
                null(),
                0,
                0,
                0,
                0,
                null(),
                null(),
            )
        });

        status.ok()?;
        OwnedHandle::new(raw).ok_or(NtStatus::UNSUCCESSFUL)
    }

    fn create_transacted_file(&self, name: &str, transaction: &OwnedHandle) -> Option<OwnedHandle> {
        let name = CString::new(name).ok()?;

        let raw = unsafe {
            (self.create_file_transacted_a)(
                name.as_ptr().cast(),
                GENERIC_READ | GENERIC_WRITE,
                /* share mode */ 0,
                null(),
                CREATE_NEW,
                FILE_ATTRIBUTE_NORMAL,
                /* template file */ 0,
                transaction.raw(),
                null(),
                null(),
            )
        };

        OwnedHandle::new(raw)
    }

    fn write_file(&self, file: &OwnedHandle, data: &[u8]) -> io::Result<usize> {
        let len = u32::try_from(data.len()).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
        let mut written = 0u32;

        let ok = unsafe { WriteFile(file.raw(), data.as_ptr().cast(), len, &mut written, null_mut()) };
        if ok == 0 {
            let error = unsafe { GetLastError() };
            return Err(io::Error::from_raw_os_error(error as i32));
        }

        Ok(written as usize)
    }

    fn create_section(&self, file: &OwnedHandle) -> Result<OwnedHandle, NtStatus> {
        let mut raw: HANDLE = 0;

        let status = NtStatus(unsafe {
            (self.nt_create_section)(
                &mut raw,
                SECTION_ALL_ACCESS,
                null(),
                /* maximum size: taken from the file */ null(),
                PAGE_READWRITE,
                SEC_COMMIT,
                file.raw(),
            )
        });

        status.ok()?;
        OwnedHandle::new(raw).ok_or(NtStatus::UNSUCCESSFUL)
    }

    fn map_view(&self, section: &OwnedHandle, request: ViewRequest) -> Result<MappingView, NtStatus> {
        let mut base = request.hint.map_or(null_mut(), |hint| hint as *mut c_void);
        let mut view_size = request.size;

        // N.B. `MEM_RESERVE` is what allows `view_size` to exceed the size of the section. Only the
        // first `commit_size` bytes are backed; the rest is pure address space.
        let status = NtStatus(unsafe {
            (self.nt_map_view_of_section)(
                section.raw(),
                GetCurrentProcess(),
                &mut base,
                /* zero bits */ 0,
                request.commit_size,
                /* section offset */ null(),
                &mut view_size,
                VIEW_UNMAP,
                MEM_RESERVE,
                PAGE_READWRITE,
            )
        });

        status.ok()?;
        Ok(MappingView::new(base as usize, view_size))
    }
}

pub fn physical_memory_bytes() -> Option<u64> {
    let mut status = unsafe { mem::zeroed::<MEMORYSTATUSEX>() };
    status.dwLength = mem::size_of::<MEMORYSTATUSEX>() as u32;

    if unsafe { GlobalMemoryStatusEx(&mut status) } == 0 {
        return None;
    }

    Some(status.ullTotalPhys)
}

pub fn tick_count() -> u64 {
    unsafe { GetTickCount64() }
}
