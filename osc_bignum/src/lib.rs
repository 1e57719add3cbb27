//! Arbitrary width signed integers over caller owned byte buffers.
//!
//! A value is a little-endian, two's-complement byte slice of any length:
//! a slice of `c` bytes holds values in `[-2^(8c-1), 2^(8c-1)-1]` and the
//! high bit of its last byte is the sign bit. Operands and results are sized
//! independently by the caller; missing high bytes of a shorter operand read
//! as zero and results are truncated to the output length.
//!
//! Nothing here allocates. The signed operations need private copies of
//! their operands, those live in a fixed arena of [`MAX_OPERAND_BYTES`] on
//! the stack and wider operands are rejected up front.

use osc_traits::{ScopeError, ScopeResult};

/// Widest operand the signed operations accept.
pub const MAX_OPERAND_BYTES: usize = 32;

/// Largest divisor magnitude supported once the dividend is wider than 64 bits.
/// Every remainder must fit in 7 bytes so it can be carried into the next
/// window of the long division.
pub const MAX_LONG_DIVISOR: u64 = 1 << 56;

const WINDOW: usize = core::mem::size_of::<u64>();

#[inline]
fn byte_at(buf: &[u8], i: usize) -> u16 {
    buf.get(i).copied().unwrap_or(0) as u16
}

/// True if the sign bit of the most significant byte is set.
#[inline]
pub fn is_negative(a: &[u8]) -> bool {
    a.last().is_some_and(|msb| msb & 0x80 != 0)
}

/// `out = a + b`, truncated to `out.len()` bytes.
///
/// Byte-wise unsigned addition with a running carry, low byte first.
pub fn add(a: &[u8], b: &[u8], out: &mut [u8]) {
    let mut sum: u16 = 0;
    for (i, r) in out.iter_mut().enumerate() {
        sum += byte_at(a, i) + byte_at(b, i);
        *r = (sum & 0xFF) as u8;
        sum >>= 8;
    }
}

/// `acc = acc + b`, the form of [`add`] where the result aliases the first operand.
///
/// The accumulation is streamed low byte first and each byte of `acc` is read
/// before it is overwritten, so no temporary copy of `acc` is needed.
pub fn add_in_place(acc: &mut [u8], b: &[u8]) {
    let mut sum: u16 = 0;
    for (i, r) in acc.iter_mut().enumerate() {
        sum += *r as u16 + byte_at(b, i);
        *r = (sum & 0xFF) as u8;
        sum >>= 8;
    }
}

/// Two's-complement negation in place.
pub fn negate(a: &mut [u8]) {
    for b in a.iter_mut() {
        *b = !*b;
    }
    add_in_place(a, &[1]);
}

/// `out = a * b` with both operands read as unsigned magnitudes.
///
/// `out` is cleared first and must be at least `a.len() + b.len()` bytes,
/// otherwise it is left zeroed and [`ScopeError::Overflow`] is returned.
pub fn unsigned_multiply(a: &[u8], b: &[u8], out: &mut [u8]) -> ScopeResult<()> {
    out.fill(0);

    let needed = a.len() + b.len();
    if out.len() < needed {
        return Err(ScopeError::Overflow {
            needed,
            available: out.len(),
        });
    }

    for (im2, &d2) in b.iter().enumerate() {
        for (im1, &d1) in a.iter().enumerate() {
            let mut sr = d1 as u32 * d2 as u32;
            let mut ir = im1 + im2;
            while sr != 0 && ir < out.len() {
                sr += out[ir] as u32;
                out[ir] = (sr & 0xFF) as u8;
                sr >>= 8;
                ir += 1;
            }
        }
    }
    Ok(())
}

/// Copies `src` into the arena and makes it positive.
/// Returns the magnitude and whether `src` was negative.
fn load_magnitude<'a>(
    src: &[u8],
    arena: &'a mut [u8; MAX_OPERAND_BYTES],
) -> ScopeResult<(&'a mut [u8], bool)> {
    if src.len() > MAX_OPERAND_BYTES {
        return Err(ScopeError::OperandTooWide {
            width: src.len(),
            max: MAX_OPERAND_BYTES,
        });
    }
    let magnitude = &mut arena[..src.len()];
    magnitude.copy_from_slice(src);
    let negative = is_negative(src);
    if negative {
        negate(magnitude);
    }
    Ok((magnitude, negative))
}

/// `out = a * b` for signed operands. The operands are not modified.
///
/// Same sizing rule as [`unsigned_multiply`]: `out` must be at least
/// `a.len() + b.len()` bytes.
pub fn signed_multiply(a: &[u8], b: &[u8], out: &mut [u8]) -> ScopeResult<()> {
    out.fill(0);

    let mut arena1 = [0u8; MAX_OPERAND_BYTES];
    let mut arena2 = [0u8; MAX_OPERAND_BYTES];
    let (m1, negative1) = load_magnitude(a, &mut arena1)?;
    let (m2, negative2) = load_magnitude(b, &mut arena2)?;

    unsigned_multiply(m1, m2, out)?;

    if negative1 ^ negative2 {
        negate(out);
    }
    Ok(())
}

/// `out = a / divisor`, truncated toward zero.
///
/// Dividends of 8 bytes or less are sign extended and divided as an `i64`.
/// Wider dividends go through a long division over 64-bit windows of their
/// magnitude, most significant window first, with each remainder carried into
/// the next window; that path requires `|divisor| <= 2^56`.
///
/// `out` is zeroed on any error.
pub fn signed_divide(a: &[u8], divisor: i64, out: &mut [u8]) -> ScopeResult<()> {
    out.fill(0);

    if divisor == 0 {
        return Err(ScopeError::DivideByZero);
    }

    if a.len() <= WINDOW {
        let mut word = if is_negative(a) {
            [0xFFu8; WINDOW]
        } else {
            [0u8; WINDOW]
        };
        word[..a.len()].copy_from_slice(a);
        let quotient = i64::from_le_bytes(word).wrapping_div(divisor);

        if quotient < 0 {
            out.fill(0xFF);
        }
        let n = out.len().min(WINDOW);
        out[..n].copy_from_slice(&quotient.to_le_bytes()[..n]);
        return Ok(());
    }

    let d = divisor.unsigned_abs();
    if d > MAX_LONG_DIVISOR {
        return Err(ScopeError::DivisorTooLarge { divisor: d });
    }

    let mut arena = [0u8; MAX_OPERAND_BYTES];
    let (lm, negative_dividend) = load_magnitude(a, &mut arena)?;
    let negative = negative_dividend ^ (divisor < 0);

    for i in (0..=lm.len() - WINDOW).rev() {
        let mut word = [0u8; WINDOW];
        word.copy_from_slice(&lm[i..i + WINDOW]);
        let window = u64::from_le_bytes(word);

        if i < out.len() {
            add_in_place(&mut out[i..], &(window / d).to_le_bytes());
        }

        // the remainder is < 2^56 so the top byte of this window goes to zero
        lm[i..i + WINDOW].copy_from_slice(&(window % d).to_le_bytes());
    }

    if negative {
        negate(out);
    }
    Ok(())
}
