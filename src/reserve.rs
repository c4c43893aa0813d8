use tracing::{debug, info, warn};

use crate::{
    api::NtApi,
    backing::BackingObject,
    config::Config,
    error::Error,
    search::{search_view, MappingView},
};

/// Assumed physical memory when the real amount cannot be queried.
pub const FALLBACK_PHYSICAL_MEMORY: u64 = 16 << 30;

/// Upper bound on the bytes reserved in one run: `physical_memory * multiplier`.
pub fn reservation_ceiling(physical_memory: Option<u64>, multiplier: u32) -> u64 {
    let physical_memory = physical_memory.unwrap_or_else(|| {
        warn!(
            assumed = FALLBACK_PHYSICAL_MEMORY,
            "could not query physical memory, assuming a fixed amount"
        );
        FALLBACK_PHYSICAL_MEMORY
    });

    physical_memory.saturating_mul(u64::from(multiplier))
}

/// The views mapped by a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationResult {
    views: Vec<MappingView>,
    total_reserved_bytes: u64,
    attempts: u32,
    ceiling_bytes: u64,
}

impl ReservationResult {
    fn new(ceiling_bytes: u64) -> Self {
        Self {
            ceiling_bytes,
            ..Self::default()
        }
    }

    fn push(&mut self, view: MappingView) {
        self.total_reserved_bytes = self.total_reserved_bytes.saturating_add(view.size() as u64);
        self.views.push(view);
    }

    /// Mapped views, in the order they were created.
    pub fn views(&self) -> &[MappingView] {
        &self.views
    }

    /// Sum of the sizes of [`views`](Self::views).
    pub fn total_reserved_bytes(&self) -> u64 {
        self.total_reserved_bytes
    }

    /// View searches issued, successful or not.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The budget this run stopped at.
    pub fn ceiling_bytes(&self) -> u64 {
        self.ceiling_bytes
    }
}

/// Runs the reservation against an already-resolved API.
///
/// Builds the backing section, then maps up to `config.view_count` views, each placed right after
/// the previous one. Views that cannot be mapped at any size are skipped. The run stops early once
/// the reserved total reaches the RAM-derived ceiling, and only fails if no view was mapped at all.
///
/// The backing handles are released before this returns. The mapped views are not.
pub fn reserve_with<A: NtApi + ?Sized>(api: &A, config: &Config) -> Result<ReservationResult, Error> {
    let backing = BackingObject::build(api)?;

    let ceiling = reservation_ceiling(api.physical_memory(), config.ram_multiplier);
    let mut result = ReservationResult::new(ceiling);
    let mut hint = None;

    for index in 0..config.view_count {
        if result.total_reserved_bytes >= ceiling {
            debug!(index, ceiling, "reservation ceiling reached");
            break;
        }

        result.attempts += 1;

        match search_view(
            api,
            backing.section(),
            config.max_size_shift,
            config.min_size_shift,
            hint,
        ) {
            Ok(view) => {
                debug!(
                    index,
                    base = view.base_address(),
                    shift = view.size_shift(),
                    "view reserved"
                );
                hint = view.end_address();
                result.push(view);
            }
            Err(exhausted) => {
                debug!(index, %exhausted, "skipping view");
            }
        }
    }

    drop(backing);

    if result.views.is_empty() {
        return Err(Error::AllMappingsFailed);
    }

    info!(
        views = result.views.len(),
        attempts = result.attempts,
        total_gib = result.total_reserved_bytes >> 30,
        "address space reserved"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_multiplies_physical_memory() {
        assert_eq!(reservation_ceiling(Some(8 << 30), 256), 2 << 40);
    }

    #[test]
    fn ceiling_falls_back_to_fixed_memory() {
        assert_eq!(reservation_ceiling(None, 4), 64 << 30);
    }

    #[test]
    fn ceiling_saturates() {
        assert_eq!(reservation_ceiling(Some(u64::MAX / 2), 256), u64::MAX);
    }
}
