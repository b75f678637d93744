//! Per-frame primitive arena
//!
//! Linear allocator with a byte budget. Records are addressed by handle,
//! never freed one by one, and all invalidated by `reset`.

use super::primitive::Primitive;
use thiserror::Error;

/// Index of a record in its arena; only valid until the next reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimHandle(u32);

impl PrimHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("primitive arena full: {requested} bytes requested, {remaining} remaining")]
pub struct ArenaFull {
    pub requested: usize,
    pub remaining: usize,
}

/// A record plus its link to the next record in the same ordering-table bucket
#[derive(Debug, Clone)]
pub(crate) struct PrimRecord {
    pub prim: Primitive,
    pub next: Option<PrimHandle>,
}

#[derive(Debug, Clone)]
pub struct PrimArena {
    records: Vec<PrimRecord>,
    cursor: usize,
    capacity: usize,
}

impl PrimArena {
    /// Create an arena with a byte budget
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            records: Vec::new(),
            cursor: 0,
            capacity: capacity_bytes,
        }
    }

    /// Rewind to the start; every handle handed out so far becomes stale
    pub fn reset(&mut self) {
        self.records.clear();
        self.cursor = 0;
    }

    /// Carve one record at the cursor
    pub fn alloc(&mut self, prim: Primitive) -> Result<PrimHandle, ArenaFull> {
        let size = prim.size_bytes();
        if size > self.remaining() {
            return Err(ArenaFull {
                requested: size,
                remaining: self.remaining(),
            });
        }
        let handle = PrimHandle(self.records.len() as u32);
        self.records.push(PrimRecord { prim, next: None });
        self.cursor += size;
        Ok(handle)
    }

    pub fn get(&self, handle: PrimHandle) -> Option<&Primitive> {
        self.records.get(handle.index()).map(|r| &r.prim)
    }

    pub(crate) fn record(&self, handle: PrimHandle) -> &PrimRecord {
        &self.records[handle.index()]
    }

    pub(crate) fn set_next(&mut self, handle: PrimHandle, next: Option<PrimHandle>) {
        self.records[handle.index()].next = next;
    }

    /// Bytes consumed this frame
    pub fn used(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records allocated this frame
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
