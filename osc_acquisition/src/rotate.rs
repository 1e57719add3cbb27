use osc_traits::{ScopeError, ScopeResult};

/// Rotates `buffer` in place so that the element at `current_index` ends up at `new_index`.
///
/// This is a left rotation by `(current_index - new_index) mod n`. The buffer
/// length must be even and `scratch` must hold at least half of it: a rotation
/// by more than half the buffer first swaps the two halves, the rest is done
/// with three copies through the scratch buffer.
pub fn rotate<T: Copy>(
    buffer: &mut [T],
    new_index: usize,
    current_index: usize,
    scratch: &mut [T],
) -> ScopeResult<()> {
    let n = buffer.len();
    if n % 2 != 0 {
        return Err(ScopeError::OddBufferLength { len: n });
    }
    for index in [new_index, current_index] {
        if index >= n {
            return Err(ScopeError::IndexOutOfRange { index, len: n });
        }
    }
    let half = n / 2;
    if scratch.len() < half {
        return Err(ScopeError::ScratchTooSmall {
            needed: half,
            available: scratch.len(),
        });
    }

    if new_index == current_index {
        return Ok(());
    }

    let mut start = (current_index + n - new_index) % n;

    if start >= half {
        let hold = &mut scratch[..half];
        hold.copy_from_slice(&buffer[..half]);
        buffer.copy_within(half.., 0);
        buffer[half..].copy_from_slice(hold);
        start -= half;
    }

    let hold = &mut scratch[..start];
    hold.copy_from_slice(&buffer[..start]);
    buffer.copy_within(start.., 0);
    buffer[n - start..].copy_from_slice(hold);

    Ok(())
}
