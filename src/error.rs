use std::fmt;

use thiserror::Error;

/// The reasons a reservation run can fail.
///
/// Exactly one of these is produced per failing run. Everything before the first mapping attempt is
/// fatal; mapping attempts themselves only surface as [`Error::AllMappingsFailed`] once every one of
/// them has been exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Error {
    #[error("failed to load NT API functions")]
    ApiLoadFailed,

    #[error("NtCreateTransaction failed")]
    TransactionCreateFailed,

    #[error("CreateFileTransactedA failed")]
    FileCreateFailed,

    #[error("WriteFile to transacted file failed")]
    FileWriteFailed,

    #[error("NtCreateSection failed")]
    SectionCreateFailed,

    #[error("all NtMapViewOfSection attempts failed")]
    AllMappingsFailed,
}

/// A raw `NTSTATUS` code as returned by the native API.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NtStatus(pub i32);

impl NtStatus {
    pub const SUCCESS: Self = Self(0);

    /// `STATUS_UNSUCCESSFUL`, also used when a view search gives up without a more specific code.
    pub const UNSUCCESSFUL: Self = Self(0xC000_0001_u32 as i32);

    /// Mirrors the `NT_SUCCESS` macro: success and informational codes are non-negative.
    pub fn is_success(self) -> bool {
        self.0 >= 0
    }

    pub fn ok(self) -> Result<(), NtStatus> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NTSTATUS {:#010X}", self.0 as u32)
    }
}

impl fmt::Debug for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NtStatus({:#010X})", self.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_descriptions() {
        let cases = [
            (Error::ApiLoadFailed, "failed to load NT API functions"),
            (Error::TransactionCreateFailed, "NtCreateTransaction failed"),
            (Error::FileCreateFailed, "CreateFileTransactedA failed"),
            (Error::FileWriteFailed, "WriteFile to transacted file failed"),
            (Error::SectionCreateFailed, "NtCreateSection failed"),
            (Error::AllMappingsFailed, "all NtMapViewOfSection attempts failed"),
        ];

        for (error, text) in cases {
            assert_eq!(error.to_string(), text);
        }
    }

    #[test]
    fn status_severity() {
        assert!(NtStatus::SUCCESS.is_success());
        assert!(NtStatus(0x4000_0000).is_success());
        assert!(!NtStatus::UNSUCCESSFUL.is_success());
        assert_eq!(NtStatus::UNSUCCESSFUL.ok(), Err(NtStatus::UNSUCCESSFUL));
        assert_eq!(NtStatus::UNSUCCESSFUL.to_string(), "NTSTATUS 0xC0000001");
    }
}
