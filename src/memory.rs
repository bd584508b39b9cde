//! Byte-addressable, zero-extended, word-counted memory (spec §3, §4.2).
//!
//! Grounded in the teacher's `memory.rs`: the resize-to-next-multiple-of-32
//! rule and the `C_mem(a) = 3a + floor(a^2 / 512)` expansion-cost formula
//! are kept verbatim. Unlike the teacher, each `Memory` owns its buffer
//! outright
//! (no `Rc<RefCell<..>>` sharing across call frames) per spec §9's "no
//! aliasing" rule for `MachineState`.

use crate::constants::{MEMORY_EXPANSION_QUOTIENT, WORD_SIZE_IN_BYTES_U64, WORD_SIZE_IN_BYTES_USIZE};
use crate::errors::{ExceptionalHalt::OutOfBounds, InternalError, VMError};
use bytes::Bytes;
use ethereum_types::U256;

#[derive(Debug, Clone, Default)]
pub struct Memory {
    buffer: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// `active_words` per spec §3: `ceil(high_water_mark / 32)`.
    #[inline]
    pub fn active_words(&self) -> usize {
        self.buffer.len().div_ceil(WORD_SIZE_IN_BYTES_USIZE)
    }

    /// Resizes the buffer to cover `new_memory_size` bytes, rounded up to
    /// the next word. A no-op if memory is already at least that large —
    /// `active_words` is monotonic non-decreasing (spec §3 invariant).
    pub fn resize(&mut self, new_memory_size: usize) -> Result<(), VMError> {
        if new_memory_size == 0 {
            return Ok(());
        }
        let new_memory_size = new_memory_size
            .checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE)
            .ok_or(OutOfBounds)?;

        if new_memory_size <= self.buffer.len() {
            return Ok(());
        }

        self.buffer.resize(new_memory_size, 0);
        Ok(())
    }

    /// Reads `length` bytes at `offset`, zero-extending past the current
    /// high-water mark. `length == 0` never touches `active_words` (spec
    /// §4.2).
    pub fn read(&mut self, offset: usize, length: usize) -> Result<Bytes, VMError> {
        if length == 0 {
            return Ok(Bytes::new());
        }
        let end = offset.checked_add(length).ok_or(OutOfBounds)?;
        self.resize(end)?;
        #[expect(clippy::indexing_slicing, reason = "resize guarantees end <= buffer.len()")]
        Ok(Bytes::copy_from_slice(&self.buffer[offset..end]))
    }

    /// Reads a full word at `offset`.
    pub fn read_word(&mut self, offset: usize) -> Result<U256, VMError> {
        let data = self.read(offset, WORD_SIZE_IN_BYTES_USIZE)?;
        Ok(U256::from_big_endian(&data))
    }

    /// Reads environment data (call data, code) that is not memory: no
    /// resize, no `active_words` side effect, zero-padded past the source
    /// length. See spec §4.2 "read_zeroed".
    pub fn read_zeroed(source: &[u8], offset: usize, length: usize) -> Bytes {
        if length == 0 {
            return Bytes::new();
        }
        let mut out = vec![0u8; length];
        if offset < source.len() {
            let available = source.len().saturating_sub(offset);
            let copy_len = available.min(length);
            #[expect(clippy::indexing_slicing, reason = "bounds checked above")]
            out[..copy_len].copy_from_slice(&source[offset..offset.wrapping_add(copy_len)]);
        }
        Bytes::from(out)
    }

    /// Writes `data`, extending memory (zero-padded) as needed.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), VMError> {
        if data.is_empty() {
            return Ok(());
        }
        let end = offset.checked_add(data.len()).ok_or(OutOfBounds)?;
        self.resize(end)?;
        #[expect(clippy::indexing_slicing, reason = "resize guarantees end <= buffer.len()")]
        self.buffer[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Writes `data` at `offset`, zero-padding (or truncating) to exactly
    /// `total_size` bytes — the shape every `*COPY` opcode needs.
    pub fn write_zero_padded(
        &mut self,
        offset: usize,
        data: &[u8],
        total_size: usize,
    ) -> Result<(), VMError> {
        if total_size == 0 {
            return Ok(());
        }
        let end = offset.checked_add(total_size).ok_or(OutOfBounds)?;
        self.resize(end)?;

        let copy_len = data.len().min(total_size);
        #[expect(clippy::indexing_slicing, reason = "resize guarantees bounds")]
        self.buffer[offset..offset.wrapping_add(copy_len)].copy_from_slice(&data[..copy_len]);
        if copy_len < total_size {
            let zero_start = offset.wrapping_add(copy_len);
            let zero_end = offset.wrapping_add(total_size);
            #[expect(clippy::indexing_slicing, reason = "resize guarantees bounds")]
            self.buffer[zero_start..zero_end].fill(0);
        }
        Ok(())
    }

    /// `write8` — writes the low byte of `value` at `offset` (spec §4.2).
    pub fn write8(&mut self, offset: usize, value: U256) -> Result<(), VMError> {
        let byte = value.low_u32() as u8;
        self.write(offset, &[byte])
    }

    pub fn write_word(&mut self, offset: usize, word: U256) -> Result<(), VMError> {
        let mut bytes = [0u8; WORD_SIZE_IN_BYTES_USIZE];
        word.to_big_endian(&mut bytes);
        self.write(offset, &bytes)
    }

}

/// The additional bytes of memory that must be paid for when a
/// expansion to `new_memory_size` occurs over a prior `current_memory_size`
/// (spec §4.4). `new_memory_size`/`current_memory_size` are already the
/// *word-rounded* sizes used for the cost formula.
#[inline]
pub fn expansion_cost(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    if new_memory_size <= current_memory_size {
        return Ok(0);
    }
    Ok(cost(new_memory_size)?.wrapping_sub(cost(current_memory_size)?))
}

/// `C_mem(a) = 3a + floor(a^2 / 512)`, `a` measured in 32-byte words.
fn cost(memory_size: usize) -> Result<u64, VMError> {
    let memory_size = u64::try_from(memory_size).map_err(|_| InternalError::TypeConversion)?;
    let words = memory_size.div_ceil(WORD_SIZE_IN_BYTES_U64);
    #[expect(clippy::arithmetic_side_effects, reason = "words is bounded by gas-limited offsets")]
    let gas_cost = words * words / MEMORY_EXPANSION_QUOTIENT + 3 * words;
    Ok(gas_cost)
}

/// The word-rounded memory size implied by accessing `[offset, offset+size)`.
/// A `size` of zero never expands memory (spec §4.2/§4.4).
#[inline]
pub fn calculate_memory_size(offset: usize, size: usize) -> Result<usize, VMError> {
    if size == 0 {
        return Ok(0);
    }
    offset
        .checked_add(size)
        .and_then(|sum| sum.checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE))
        .ok_or_else(|| OutOfBounds.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_past_end_is_zero_and_does_not_mutate() {
        let mut m = Memory::new();
        let data = m.read(100, 32).unwrap();
        assert_eq!(&data[..], &[0u8; 32][..]);
        assert_eq!(m.active_words(), 5); // (100+32) -> 132 bytes -> 5 words (160 bytes)
    }

    #[test]
    fn zero_length_read_does_not_bump_active_words() {
        let mut m = Memory::new();
        let data = m.read(1000, 0).unwrap();
        assert!(data.is_empty());
        assert_eq!(m.active_words(), 0);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let mut m = Memory::new();
        m.write(0, b"hello").unwrap();
        let data = m.read(0, 5).unwrap();
        assert_eq!(&data[..], b"hello");
    }

    #[test]
    fn expansion_cost_matches_formula() {
        // 1 word: 3*1 + 0 = 3
        assert_eq!(expansion_cost(32, 0).unwrap(), 3);
        // growing from 1 word to 2 words costs cost(2) - cost(1) = (6+0)-(3+0) = 3
        assert_eq!(expansion_cost(64, 32).unwrap(), 3);
    }

    #[test]
    fn no_expansion_cost_when_shrinking_or_equal() {
        assert_eq!(expansion_cost(32, 64).unwrap(), 0);
        assert_eq!(expansion_cost(32, 32).unwrap(), 0);
    }
}
