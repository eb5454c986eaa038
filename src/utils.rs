//! Utility functions and types used accross the library
use crate::Error;

/// Restrict value to a certain interval
#[inline]
pub fn clamp<T>(val: T, min: T, max: T) -> T
where
    T: PartialOrd,
{
    if val < min {
        min
    } else if val > max {
        max
    } else {
        val
    }
}

/// Allocate vector of `len` copies of `value` without aborting on failure
pub(crate) fn try_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>, Error> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|error| Error::Resource {
        reason: format!("failed to allocate {} elements: {}", len, error),
    })?;
    data.resize(len, value);
    Ok(data)
}

/// Number of bytes needed for `height` rows of `stride` bytes each, last row only `row_len`
pub(crate) fn buffer_len(height: usize, stride: usize, row_len: usize) -> Result<usize, Error> {
    if height == 0 {
        return Ok(0);
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|len| len.checked_add(row_len))
        .ok_or_else(|| Error::Resource {
            reason: format!("buffer size overflow: {} rows of {} bytes", height, stride),
        })
}
