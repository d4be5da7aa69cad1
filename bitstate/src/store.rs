//! Packed boolean state store with exclusive-selection semantics.
//!
//! [StateStore] keeps a fixed number of boolean slots in a bit array, using [u8] "blocks"
//! for a more-efficient memory layout than a [`Vec<bool>`]. If the capacity is not a
//! multiple of 8, the last block contains bits that are not part of the store; an
//! invariant of the implementation is that those bits are always 0.
//!
//! On top of raw bit access, the store maintains a cached "active" index (the
//! lowest-indexed true slot) and offers radio-button assignment: setting a slot
//! exclusively forces every other slot false. A parallel snapshot buffer supports
//! save/restore of the whole bit pattern.
//!
//! Out-of-range indices are never an error: writes are no-ops and reads return the
//! documented sentinel (`false` / `None` / empty). No method panics on caller input.

use bytes::{Buf, BufMut, BytesMut};
use core::{
    fmt::{self, Formatter, Write as _},
    ops::Index,
};
use thiserror::Error;

/// Type alias for the underlying block type.
type Block = u8;

/// Number of bits in a [Block].
const BITS_PER_BLOCK: usize = Block::BITS as usize;

/// Empty block of bits (all bits set to 0).
const EMPTY_BLOCK: Block = 0;

/// Full block of bits (all bits set to 1).
const FULL_BLOCK: Block = Block::MAX;

/// Maximum number of slots a [StateStore] can hold.
///
/// Construction requests outside `[1, MAX_STATES]` are clamped, never rejected.
pub const MAX_STATES: usize = 254;

/// Errors returned by [StateStore::copy_from].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// One of the stores involved is disabled (zero capacity).
    #[error("store disabled")]
    Disabled,
    /// The two stores hold a different number of slots.
    #[error("capacity mismatch: {0} != {1}")]
    CapacityMismatch(usize, usize),
}

/// Errors returned when decoding a [StateStore] from its wire form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before the encoding was complete.
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    /// The encoded capacity exceeds [MAX_STATES].
    #[error("invalid capacity: {0}")]
    InvalidCapacity(usize),
    /// A bit beyond the encoded capacity was set in the last block.
    #[error("trailing bits set beyond capacity")]
    TrailingBits,
}

/// A fixed-capacity set of named boolean states, packed one bit per state.
///
/// The store tracks the lowest-indexed true slot as the "active" index, available in
/// O(1) via [Self::active]. Exclusive assignment ([Self::select], [Self::toggle], or
/// [Self::set] with `exclusive = true`) clears every other slot, so at most one slot
/// is true afterwards. Non-exclusive assignment lets any number of slots accumulate;
/// callers that need the single-true invariant back can check
/// [Self::exactly_one_set].
///
/// Equality compares capacity, bits, and the active index. The snapshot buffer is
/// transient state and does not participate in equality or in the wire form.
#[derive(Clone)]
pub struct StateStore {
    /// Number of slots, fixed at construction. Zero only for a disabled store.
    capacity: usize,
    /// The packed slots, `num_blocks(capacity)` blocks.
    storage: Vec<Block>,
    /// Last explicitly saved copy of `storage`, same length.
    snapshot: Vec<Block>,
    /// Lowest-indexed true slot, or `None` if all slots are false.
    active: Option<usize>,
    /// Value of `active` at the time of the last [Self::save].
    saved_active: Option<usize>,
    /// Whether [Self::save] has ever run.
    saved: bool,
}

impl StateStore {
    /// Creates a store with `capacity` slots, all false.
    ///
    /// The requested capacity is clamped to `[1, MAX_STATES]`. Both the storage and
    /// the snapshot buffer are allocated together, so a store is never observable in
    /// a half-constructed state.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_STATES);
        let blocks = Self::num_blocks(capacity);
        Self {
            capacity,
            storage: vec![EMPTY_BLOCK; blocks],
            snapshot: vec![EMPTY_BLOCK; blocks],
            active: None,
            saved_active: None,
            saved: false,
        }
    }

    /// Creates a permanently inert, zero-capacity store.
    ///
    /// This is the state a store degrades to when its buffers cannot be allocated on
    /// constrained targets: every subsequent operation is a safe no-op, every read
    /// returns its sentinel (`false` / `None` / empty).
    pub fn disabled() -> Self {
        Self {
            capacity: 0,
            storage: Vec::new(),
            snapshot: Vec::new(),
            active: None,
            saved_active: None,
            saved: false,
        }
    }

    /// Returns the number of slots in the store.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if the store is the inert zero-capacity instance.
    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.capacity == 0
    }

    /// Gets the value of the slot at `index`.
    ///
    /// Returns false if the index is out of range.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        if !self.is_valid(index) {
            return false;
        }
        self.get_bit_unchecked(index)
    }

    /// Sets the slot at `index` to `value`. No-op if the index is out of range.
    ///
    /// When `value` is true the slot becomes part of the active set; with
    /// `exclusive = true` every other slot is forced false (radio-button
    /// assignment). When `value` is false, `exclusive` is ignored and the active
    /// index is recomputed if the cleared slot was the active one.
    pub fn set(&mut self, index: usize, value: bool, exclusive: bool) {
        if !self.is_valid(index) {
            return;
        }
        if value {
            if exclusive {
                self.clear_others(index);
                self.active = Some(index);
            } else {
                self.set_bit_unchecked(index);
                // The cache always names the lowest true slot.
                self.active = Some(match self.active {
                    Some(current) if current < index => current,
                    _ => index,
                });
            }
        } else {
            self.clear_bit_unchecked(index);
            if self.active == Some(index) {
                self.active = self.find(true);
            }
        }
    }

    /// Sets the slot at `index` true and every other slot false.
    ///
    /// Shorthand for `set(index, true, true)`.
    #[inline]
    pub fn select(&mut self, index: usize) {
        self.set(index, true, true);
    }

    /// Flips the slot at `index`. No-op if the index is out of range.
    ///
    /// Toggling a slot on is always exclusive: the slot becomes the only true one.
    /// Toggling the active slot off recomputes the active index from the remaining
    /// slots.
    pub fn toggle(&mut self, index: usize) {
        if !self.is_valid(index) {
            return;
        }
        if self.get_bit_unchecked(index) {
            self.clear_bit_unchecked(index);
            if self.active == Some(index) {
                self.active = self.find(true);
            }
        } else {
            self.clear_others(index);
            self.active = Some(index);
        }
    }

    /// Sets every slot to false.
    pub fn reset(&mut self) {
        for block in &mut self.storage {
            *block = EMPTY_BLOCK;
        }
        self.active = None;
    }

    /// Sets every slot to `value`.
    ///
    /// `fill(true)` deliberately violates the single-true invariant: all slots become
    /// true at once and the active index is 0. Callers relying on exclusivity must
    /// verify it separately with [Self::exactly_one_set].
    pub fn fill(&mut self, value: bool) {
        if self.is_disabled() {
            return;
        }
        let fill = if value { FULL_BLOCK } else { EMPTY_BLOCK };
        for block in &mut self.storage {
            *block = fill;
        }
        if value {
            self.clear_trailing_bits();
            self.active = Some(0);
        } else {
            self.active = None;
        }
    }

    /// Resets the store and sets slot 0 true.
    pub fn set_default(&mut self) {
        if self.is_disabled() {
            return;
        }
        self.reset();
        self.set_bit_unchecked(0);
        self.active = Some(0);
    }

    /// Resets the store, then sets `value` across `[start, min(end, capacity - 1)]`
    /// inclusive.
    ///
    /// Range assignment always replaces prior state wholesale, never layers onto it.
    /// No-op (no reset either) if `start` is out of range; an inverted range
    /// (`end < start`) leaves the store fully reset.
    pub fn set_range(&mut self, start: usize, end: usize, value: bool) {
        if start >= self.capacity {
            return;
        }
        self.reset();
        let end = end.min(self.capacity - 1);
        if start > end || !value {
            return;
        }
        for index in start..=end {
            self.set_bit_unchecked(index);
        }
        self.active = Some(start);
    }

    /// Complements every slot. Bits beyond the capacity stay zero.
    pub fn invert(&mut self) {
        for block in &mut self.storage {
            *block = !*block;
        }
        self.clear_trailing_bits();
        self.active = self.find(true);
    }

    /// Overwrites this store's slots and active index with `other`'s.
    ///
    /// Fails without mutating anything if either store is disabled or the
    /// capacities differ. The snapshot buffers of both stores are untouched.
    pub fn copy_from(&mut self, other: &StateStore) -> Result<(), Error> {
        if self.is_disabled() || other.is_disabled() {
            return Err(Error::Disabled);
        }
        if self.capacity != other.capacity {
            return Err(Error::CapacityMismatch(self.capacity, other.capacity));
        }
        self.storage.copy_from_slice(&other.storage);
        self.active = other.active;
        Ok(())
    }

    // ---------- Queries ----------

    /// Returns the lowest-indexed true slot, or `None` if every slot is false.
    ///
    /// This is a cache maintained by every mutation, so the call is O(1).
    #[inline]
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Returns the lowest index whose slot equals `value`, scanning from 0.
    pub fn find(&self, value: bool) -> Option<usize> {
        (0..self.capacity).find(|&index| self.get_bit_unchecked(index) == value)
    }

    /// Returns every true index in ascending order.
    ///
    /// The result is a fresh, caller-owned vector; it is empty when no slot is true.
    pub fn set_indices(&self) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter_map(|(index, bit)| bit.then_some(index))
            .collect()
    }

    /// Returns the number of true slots.
    #[inline]
    pub fn count_set(&self) -> usize {
        // Trailing bits are kept zero, so counting whole blocks is exact.
        self.storage
            .iter()
            .map(|block| block.count_ones() as usize)
            .sum()
    }

    /// Returns true if at least one slot is true.
    #[inline]
    pub fn any_set(&self) -> bool {
        self.storage.iter().any(|block| *block != EMPTY_BLOCK)
    }

    /// Returns true if exactly one slot is true.
    ///
    /// Lets callers validate the exclusivity invariant after bulk operations that
    /// may have violated it (e.g. [Self::fill] with true).
    #[inline]
    pub fn exactly_one_set(&self) -> bool {
        self.count_set() == 1
    }

    /// Creates an iterator over the slot values.
    pub fn iter(&self) -> StateIter<'_> {
        StateIter { store: self, pos: 0 }
    }

    // ---------- Snapshot ----------

    /// Copies the current bit pattern and active index into the snapshot buffer.
    ///
    /// No-op on a disabled store.
    pub fn save(&mut self) {
        if self.is_disabled() {
            return;
        }
        self.snapshot.copy_from_slice(&self.storage);
        self.saved_active = self.active;
        self.saved = true;
    }

    /// Overwrites the bit pattern and active index from the snapshot buffer.
    ///
    /// Restoring before any [Self::save] applies the all-zero snapshot; use
    /// [Self::has_snapshot] to distinguish that case. No-op on a disabled store.
    pub fn restore(&mut self) {
        if self.is_disabled() {
            return;
        }
        self.storage.copy_from_slice(&self.snapshot);
        self.active = self.saved_active;
    }

    /// Returns true once [Self::save] has run at least once.
    #[inline]
    pub fn has_snapshot(&self) -> bool {
        self.saved
    }

    // ---------- Text output ----------

    /// Returns the buffer capacity needed to serialize every slot as text: one
    /// character per slot plus a terminator.
    #[inline]
    pub fn serialized_size(&self) -> usize {
        self.capacity + 1
    }

    /// Renders the slots as a string of `'0'`/`'1'` characters, slot 0 leftmost.
    ///
    /// The output is truncated to `buf_capacity - 1` characters, reserving one byte
    /// for a terminator in fixed-size destinations. Empty on a disabled store or
    /// when `buf_capacity` is 0.
    pub fn serialize_bits(&self, buf_capacity: usize) -> String {
        if self.is_disabled() || buf_capacity == 0 {
            return String::new();
        }
        let len = self.capacity.min(buf_capacity - 1);
        let mut out = String::with_capacity(len);
        for index in 0..len {
            out.push(if self.get_bit_unchecked(index) { '1' } else { '0' });
        }
        out
    }

    /// Renders the active index as a label: `"<n> assigned"` when a slot is active,
    /// `"- unassigned"` otherwise.
    ///
    /// Truncated to `buf_capacity - 1` characters, as [Self::serialize_bits].
    pub fn describe_active(&self, buf_capacity: usize) -> String {
        if buf_capacity == 0 {
            return String::new();
        }
        let mut out = match self.active {
            Some(index) => format!("{index} assigned"),
            None => String::from("- unassigned"),
        };
        out.truncate(buf_capacity - 1);
        out
    }

    // ---------- Wire format ----------

    /// Returns the exact number of bytes [Self::write] produces.
    #[inline]
    pub fn encoded_size(&self) -> usize {
        1 + self.storage.len()
    }

    /// Writes the wire form: one capacity byte followed by the packed blocks.
    ///
    /// The snapshot buffer is transient and is not part of the wire form.
    pub fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.capacity as u8);
        buf.put_slice(&self.storage);
    }

    /// Encodes the store to a fresh buffer.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.encoded_size());
        self.write(&mut buf);
        buf
    }

    /// Reads a store from its wire form, consuming the necessary bytes.
    ///
    /// The active index is recomputed from the decoded bits and the snapshot starts
    /// out fresh (unsaved). A capacity byte of 0 decodes to the disabled store.
    pub fn read(buf: &mut impl Buf) -> Result<Self, DecodeError> {
        if buf.remaining() < 1 {
            return Err(DecodeError::EndOfBuffer);
        }
        let capacity = buf.get_u8() as usize;
        if capacity > MAX_STATES {
            return Err(DecodeError::InvalidCapacity(capacity));
        }
        let blocks = Self::num_blocks(capacity);
        if buf.remaining() < blocks {
            return Err(DecodeError::EndOfBuffer);
        }
        let mut storage = vec![EMPTY_BLOCK; blocks];
        buf.copy_to_slice(&mut storage);

        // Reject stray bits beyond the capacity in the last block.
        let bit_offset = Self::bit_offset(capacity);
        if bit_offset != 0 && storage[blocks - 1] & !Self::mask_over_first_n_bits(bit_offset) != 0 {
            return Err(DecodeError::TrailingBits);
        }

        let mut store = Self {
            capacity,
            snapshot: vec![EMPTY_BLOCK; blocks],
            storage,
            active: None,
            saved_active: None,
            saved: false,
        };
        store.active = store.find(true);
        Ok(store)
    }

    // ---------- Helper Functions ----------

    /// Calculates the block index for a given slot index.
    #[inline(always)]
    fn block_index(index: usize) -> usize {
        index / BITS_PER_BLOCK
    }

    /// Calculates the bit offset within a block.
    #[inline(always)]
    fn bit_offset(index: usize) -> usize {
        index % BITS_PER_BLOCK
    }

    /// Calculates the number of blocks needed to store `capacity` slots.
    #[inline(always)]
    fn num_blocks(capacity: usize) -> usize {
        capacity.div_ceil(BITS_PER_BLOCK)
    }

    /// Creates a mask with the first `num_bits` bits set to 1.
    #[inline(always)]
    fn mask_over_first_n_bits(num_bits: usize) -> Block {
        match num_bits {
            BITS_PER_BLOCK => FULL_BLOCK,
            n if n < BITS_PER_BLOCK => (1 << n) - 1,
            _ => panic!("num_bits exceeds block size: {num_bits}"),
        }
    }

    #[inline(always)]
    fn is_valid(&self, index: usize) -> bool {
        index < self.capacity
    }

    #[inline(always)]
    fn get_bit_unchecked(&self, index: usize) -> bool {
        (self.storage[Self::block_index(index)] & (1 << Self::bit_offset(index))) != 0
    }

    #[inline(always)]
    fn set_bit_unchecked(&mut self, index: usize) {
        self.storage[Self::block_index(index)] |= 1 << Self::bit_offset(index);
    }

    #[inline(always)]
    fn clear_bit_unchecked(&mut self, index: usize) {
        self.storage[Self::block_index(index)] &= !(1 << Self::bit_offset(index));
    }

    /// Forces every slot except `index` false, leaving `index` true.
    fn clear_others(&mut self, index: usize) {
        for block in &mut self.storage {
            *block = EMPTY_BLOCK;
        }
        self.set_bit_unchecked(index);
    }

    /// Clears any bits in storage beyond the last valid slot.
    fn clear_trailing_bits(&mut self) {
        let bit_offset = Self::bit_offset(self.capacity);
        if bit_offset == 0 {
            // No extra bits to clear
            return;
        }
        let block = self
            .storage
            .last_mut()
            .expect("storage should not be empty");
        *block &= Self::mask_over_first_n_bits(bit_offset);
    }
}

// ---------- Equality ----------

impl PartialEq for StateStore {
    /// Compares capacity, slots, and active index; the snapshot buffer is excluded.
    fn eq(&self, other: &Self) -> bool {
        self.capacity == other.capacity
            && self.storage == other.storage
            && self.active == other.active
    }
}

impl Eq for StateStore {}

// ---------- Debug / Display ----------

impl fmt::Display for StateStore {
    /// Renders every slot as `'0'`/`'1'`, slot 0 leftmost.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for index in 0..self.capacity {
            f.write_char(if self.get_bit_unchecked(index) { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "StateStore[{self}]")
    }
}

// ---------- Operations ----------

impl Index<usize> for StateStore {
    type Output = bool;

    /// Allows accessing slots using the `[]` operator.
    ///
    /// Out-of-range indices yield `&false`, matching [StateStore::get].
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        if self.get(index) {
            &true
        } else {
            &false
        }
    }
}

// ---------- Iterator ----------

/// Iterator over slot values in a [StateStore].
pub struct StateIter<'a> {
    /// The store being iterated over.
    store: &'a StateStore,

    /// Current position (0-indexed).
    pos: usize,
}

impl Iterator for StateIter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.store.capacity {
            return None;
        }
        let bit = self.store.get_bit_unchecked(self.pos);
        self.pos += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.store.capacity - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StateIter<'_> {}
