use core::alloc::Layout;

use alloc::collections::TryReserveError;

/// Errors returned by [`DenseMap::try_reserve`](crate::DenseMap::try_reserve).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Growing the slot vector failed.
    #[error("slot storage reservation failed: {0}")]
    SlotStorage(#[from] TryReserveError),

    /// The requested index capacity does not fit in `usize`.
    #[error("index capacity overflow")]
    IndexCapacityOverflow,

    /// The allocator refused to grow the index.
    #[error("index allocation of {} bytes failed", .layout.size())]
    IndexAlloc { layout: Layout },
}

impl From<hashbrown::TryReserveError> for Error {
    #[inline]
    fn from(e: hashbrown::TryReserveError) -> Self {
        match e {
            hashbrown::TryReserveError::CapacityOverflow => Self::IndexCapacityOverflow,
            hashbrown::TryReserveError::AllocError { layout } => Self::IndexAlloc { layout },
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
