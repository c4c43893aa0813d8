use tracing::debug;

use crate::{api::NtApi, error::Error};

/// Written to the transacted file so it has a non-zero length. An empty file cannot back a section.
pub const FILE_PAYLOAD: &[u8] = b"addrfog";

/// Name for the transacted file, derived from a tick count.
///
/// Uniqueness is best effort. A collision makes the `CREATE_NEW` open fail, which is reported like
/// any other file creation failure.
pub fn temp_file_name(ticks: u64) -> String {
    format!("~afg{ticks:x}.tmp")
}

/// A section backed by a file that only exists inside an uncommitted transaction.
///
/// Since the transaction is never committed, nothing reaches the disk. Fields are declared in the
/// order they must be released: section, then file, then transaction.
pub struct BackingObject<H> {
    section: H,
    _file: H,
    _transaction: H,
}

impl<H> BackingObject<H> {
    /// Creates the transaction, the transacted file and the section, in that order.
    ///
    /// On failure, whatever was already created is released before returning.
    pub fn build<A>(api: &A) -> Result<Self, Error>
    where
        A: NtApi<Handle = H> + ?Sized,
    {
        let transaction = api.create_transaction().map_err(|status| {
            debug!(%status, "failed to create transaction");
            Error::TransactionCreateFailed
        })?;

        let name = temp_file_name(api.tick_count());
        let file = api
            .create_transacted_file(&name, &transaction)
            .ok_or_else(|| {
                debug!(name = %name, "failed to create transacted file");
                Error::FileCreateFailed
            })?;

        match api.write_file(&file, FILE_PAYLOAD) {
            Ok(written) if written == FILE_PAYLOAD.len() => {}
            Ok(written) => {
                debug!(written, expected = FILE_PAYLOAD.len(), "short write to transacted file");
                return Err(Error::FileWriteFailed);
            }
            Err(error) => {
                debug!(%error, "failed to write transacted file");
                return Err(Error::FileWriteFailed);
            }
        }

        let section = api.create_section(&file).map_err(|status| {
            debug!(%status, "failed to create section");
            Error::SectionCreateFailed
        })?;

        debug!(name = %name, "backing section ready");

        Ok(Self {
            section,
            _file: file,
            _transaction: transaction,
        })
    }

    pub fn section(&self) -> &H {
        &self.section
    }
}
