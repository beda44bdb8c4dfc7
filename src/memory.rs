//! Linear memory and the bounds-check guard (SPEC_FULL.md §4.E).
//!
//! Grounded on the teacher's `interpreter/memory.rs` / `interpreter/memory/
//! operations.rs` split between a growable backing buffer and a set of free
//! functions that perform explicit, overflow-checked address arithmetic.
//! Byte order is little-endian here (Wasm), unlike the teacher's big-endian
//! Fuel VM; the *mechanism* — explicit byte copies, never a transmute — is
//! unchanged.

use crate::error::{MemoryTrapPayload, Trap};
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

/// A single Wasm linear memory instance.
///
/// Growth (`grow`) is the only exclusive-writer operation; every load/store
/// is a shared reader. [`MemoryInstance`] uses a seqlock-style generation
/// counter rather than a full reader-writer lock, matching the spec's
/// permission to use "a seqlock if mutation is rare" (§4.E).
#[derive(Debug)]
pub struct MemoryInstance {
    index: u32,
    bytes: Vec<u8>,
    generation: AtomicU32,
}

/// Held for the duration of one memory access. Its only job is to make the
/// "observed `base`/`length` are consistent for the duration of one memory
/// op" contract explicit at the type level; it must never be held across a
/// host call (§4.E, §5).
pub struct MemoryReadGuard<'m> {
    memory: &'m MemoryInstance,
    generation_at_entry: u32,
}

impl MemoryInstance {
    /// Creates a new instance of the given length, zero-initialized, with
    /// the given store-wide memory index (used only for trap payloads).
    pub fn new(index: u32, initial_len: usize) -> Self {
        Self {
            index,
            bytes: vec![0; initial_len],
            generation: AtomicU32::new(0),
        }
    }

    /// Current length in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the memory is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Grows the memory by `delta_bytes`, the sole exclusive-writer
    /// operation. Bumps the generation counter so any reader that began
    /// before the grow and observes a torn read can detect it (full
    /// seqlock validation is the caller's responsibility in a
    /// multi-threaded host; this single-threaded core only needs the
    /// counter to exist for the contract to be checkable).
    pub fn grow(&mut self, delta_bytes: usize) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.bytes.resize(self.bytes.len() + delta_bytes, 0);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Acquires a shared read guard.
    pub fn lock_for_read(&self) -> MemoryReadGuard<'_> {
        MemoryReadGuard {
            memory: self,
            generation_at_entry: self.generation.load(Ordering::Acquire),
        }
    }
}

impl MemoryReadGuard<'_> {
    /// Whether a grow happened while this guard was held (an odd
    /// generation means a grow is mid-flight; a mismatch against entry
    /// means one completed).
    fn torn(&self) -> bool {
        let now = self.memory.generation.load(Ordering::Acquire);
        now != self.generation_at_entry || now % 2 == 1
    }
}

/// Computes `address + static_offset` in the 33-bit effective-offset
/// domain used for bounds checks (SPEC_FULL.md §3). Returns `None` if the
/// 32-bit addition overflows, which must trap regardless of memory size
/// (boundary case B2).
pub fn effective_offset(address: u32, static_offset: u32) -> Option<u64> {
    address.checked_add(static_offset).map(u64::from)
}

/// The generic bounds-check test: trap unless
/// `effective + access_width <= length`.
fn should_trap_oob(effective: u64, access_width: u32, length: u64) -> bool {
    match effective.checked_add(u64::from(access_width)) {
        Some(end) => end > length,
        None => true,
    }
}

/// A bounds-check strategy chosen by translation (§4.C/§4.F). The
/// specialized variant is statically known never to trap for a given
/// memory and is elided entirely by the selector; it is expressed here as
/// a value rather than only at the type level so the selector can hand out
/// either strategy from the same function signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsCheckStrategy {
    /// Evaluate the inequality on every access.
    Generic,
    /// Statically known to never trap for the memory it was selected for.
    Specialized,
}

fn build_trap(
    memory: &MemoryInstance,
    declared_offset: u32,
    effective_offset: u64,
    access_width: u32,
) -> Trap {
    MemoryTrapPayload {
        memory_index: memory.index,
        declared_offset,
        effective_offset,
        memory_length: memory.len(),
        access_width,
    }
    .into()
}

/// Reads `access_width` little-endian bytes at `address + static_offset`.
///
/// Mirrors the teacher's `load_byte`/`load_word` shape: a pure function
/// over explicit parameters, independently unit-testable without a full
/// interpreter context.
pub fn load(
    memory: &MemoryInstance,
    address: u32,
    static_offset: u32,
    access_width: u32,
    strategy: BoundsCheckStrategy,
) -> Result<Vec<u8>, Trap> {
    let Some(effective) = effective_offset(address, static_offset) else {
        return Err(build_trap(memory, static_offset, u64::from(address) + u64::from(static_offset), access_width));
    };
    let guard = memory.lock_for_read();
    if strategy == BoundsCheckStrategy::Generic
        && should_trap_oob(effective, access_width, memory.len())
    {
        return Err(build_trap(memory, static_offset, effective, access_width));
    }
    let start = effective as usize;
    let end = start + access_width as usize;
    let out = memory.bytes[start..end].to_vec();
    if guard.torn() {
        return Err(build_trap(memory, static_offset, effective, access_width));
    }
    Ok(out)
}

/// Writes `bytes` (little-endian, length == access width) at
/// `address + static_offset`.
pub fn store(
    memory: &mut MemoryInstance,
    address: u32,
    static_offset: u32,
    bytes: &[u8],
    strategy: BoundsCheckStrategy,
) -> Result<(), Trap> {
    let access_width = bytes.len() as u32;
    let Some(effective) = effective_offset(address, static_offset) else {
        return Err(build_trap(memory, static_offset, u64::from(address) + u64::from(static_offset), access_width));
    };
    {
        let guard = memory.lock_for_read();
        if strategy == BoundsCheckStrategy::Generic
            && should_trap_oob(effective, access_width, memory.len())
        {
            return Err(build_trap(memory, static_offset, effective, access_width));
        }
        if guard.torn() {
            return Err(build_trap(memory, static_offset, effective, access_width));
        }
    }
    let start = effective as usize;
    memory.bytes[start..start + bytes.len()].copy_from_slice(bytes);
    Ok(())
}

/// Loads a little-endian `i32`, optionally narrowing from a smaller stored
/// width with sign or zero extension — the shape every memory-load fused
/// family (§4.C.12) ultimately bottoms out in.
pub fn load_i32(
    memory: &MemoryInstance,
    address: u32,
    static_offset: u32,
    width: NarrowWidth,
    signed: bool,
    strategy: BoundsCheckStrategy,
) -> Result<i32, Trap> {
    let raw = load(memory, address, static_offset, width.bytes(), strategy)?;
    Ok(width.extend_i32(&raw, signed))
}

/// Loads a little-endian `i64`, with the same narrowing rules as
/// [`load_i32`] plus the two 32-bit-source extensions.
pub fn load_i64(
    memory: &MemoryInstance,
    address: u32,
    static_offset: u32,
    width: NarrowWidth,
    signed: bool,
    strategy: BoundsCheckStrategy,
) -> Result<i64, Trap> {
    let raw = load(memory, address, static_offset, width.bytes(), strategy)?;
    Ok(width.extend_i64(&raw, signed))
}

/// Stores an `i32`, truncated to the given width.
pub fn store_i32(
    memory: &mut MemoryInstance,
    address: u32,
    static_offset: u32,
    value: i32,
    width: NarrowWidth,
    strategy: BoundsCheckStrategy,
) -> Result<(), Trap> {
    let bytes = width.truncate_i32(value);
    store(memory, address, static_offset, &bytes, strategy)
}

/// Stores an `i64`, truncated to the given width.
pub fn store_i64(
    memory: &mut MemoryInstance,
    address: u32,
    static_offset: u32,
    value: i64,
    width: NarrowWidth,
    strategy: BoundsCheckStrategy,
) -> Result<(), Trap> {
    let bytes = width.truncate_i64(value);
    store(memory, address, static_offset, &bytes, strategy)
}

/// 4-byte-aligned memcpy fusion (§4.C.12): copies `len` bytes from `src` to
/// `dst`, both within the same memory, net zero stack effect.
pub fn memcopy(
    memory: &mut MemoryInstance,
    dst: u32,
    src: u32,
    len: u32,
    strategy: BoundsCheckStrategy,
) -> Result<(), Trap> {
    let dst_eff = effective_offset(dst, 0)
        .ok_or_else(|| build_trap(memory, 0, u64::from(dst), len))?;
    let src_eff = effective_offset(src, 0)
        .ok_or_else(|| build_trap(memory, 0, u64::from(src), len))?;
    if strategy == BoundsCheckStrategy::Generic {
        if should_trap_oob(dst_eff, len, memory.len()) {
            return Err(build_trap(memory, 0, dst_eff, len));
        }
        if should_trap_oob(src_eff, len, memory.len()) {
            return Err(build_trap(memory, 0, src_eff, len));
        }
    }
    let (dst, src, len) = (dst_eff as usize, src_eff as usize, len as usize);
    memory.bytes.copy_within(src..src + len, dst);
    Ok(())
}

/// The narrow-store/narrow-load width used by memory fusions: Wasm allows
/// narrowing an `i32` to 8/16 bits and an `i64` to 8/16/32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrowWidth {
    /// 1 byte.
    Byte,
    /// 2 bytes.
    Half,
    /// 4 bytes.
    Word,
    /// 8 bytes (only legal as an `i64` full-width access).
    DoubleWord,
}

impl NarrowWidth {
    fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
            Self::DoubleWord => 8,
        }
    }

    fn extend_i32(self, raw: &[u8], signed: bool) -> i32 {
        match self {
            Self::Byte => {
                let v = raw[0];
                if signed {
                    v as i8 as i32
                } else {
                    v as i32
                }
            }
            Self::Half => {
                let v = u16::from_le_bytes([raw[0], raw[1]]);
                if signed {
                    v as i16 as i32
                } else {
                    v as i32
                }
            }
            Self::Word => i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            Self::DoubleWord => unreachable!("i32 cannot be loaded at double-word width"),
        }
    }

    fn extend_i64(self, raw: &[u8], signed: bool) -> i64 {
        match self {
            Self::Byte => {
                let v = raw[0];
                if signed {
                    v as i8 as i64
                } else {
                    v as i64
                }
            }
            Self::Half => {
                let v = u16::from_le_bytes([raw[0], raw[1]]);
                if signed {
                    v as i16 as i64
                } else {
                    v as i64
                }
            }
            Self::Word => {
                let v = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                if signed {
                    v as i32 as i64
                } else {
                    v as i64
                }
            }
            Self::DoubleWord => i64::from_le_bytes(raw.try_into().expect("8 bytes")),
        }
    }

    fn truncate_i32(self, value: i32) -> Vec<u8> {
        match self {
            Self::Byte => vec![value as u8],
            Self::Half => (value as u16).to_le_bytes().to_vec(),
            Self::Word => value.to_le_bytes().to_vec(),
            Self::DoubleWord => unreachable!("i32 cannot be stored at double-word width"),
        }
    }

    fn truncate_i64(self, value: i64) -> Vec<u8> {
        match self {
            Self::Byte => vec![value as u8],
            Self::Half => (value as u16).to_le_bytes().to_vec(),
            Self::Word => (value as u32).to_le_bytes().to_vec(),
            Self::DoubleWord => value.to_le_bytes().to_vec(),
        }
    }
}
