/// Tuning knobs for a reservation run.
///
/// Sizes are expressed as power-of-two shifts: a shift of 44 asks for a 16 TiB view. No validation
/// happens up front; a `min_size_shift` above `max_size_shift` simply leaves the search with nothing
/// to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of views to attempt.
    pub view_count: u32,
    /// Largest view size tried, as a power of two.
    pub max_size_shift: u32,
    /// Smallest view size tried, as a power of two.
    pub min_size_shift: u32,
    /// The total reservation is capped at physical memory times this factor.
    pub ram_multiplier: u32,
}

impl Config {
    pub const DEFAULT_VIEW_COUNT: u32 = 3;
    pub const DEFAULT_MAX_SIZE_SHIFT: u32 = 44;
    pub const DEFAULT_MIN_SIZE_SHIFT: u32 = 39;
    pub const DEFAULT_RAM_MULTIPLIER: u32 = 256;

    pub fn with_view_count(mut self, view_count: u32) -> Self {
        self.view_count = view_count;
        self
    }

    pub fn with_size_shifts(mut self, max_size_shift: u32, min_size_shift: u32) -> Self {
        self.max_size_shift = max_size_shift;
        self.min_size_shift = min_size_shift;
        self
    }

    pub fn with_ram_multiplier(mut self, ram_multiplier: u32) -> Self {
        self.ram_multiplier = ram_multiplier;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            view_count: Self::DEFAULT_VIEW_COUNT,
            max_size_shift: Self::DEFAULT_MAX_SIZE_SHIFT,
            min_size_shift: Self::DEFAULT_MIN_SIZE_SHIFT,
            ram_multiplier: Self::DEFAULT_RAM_MULTIPLIER,
        }
    }
}
