//! Double-buffered frame slots
//!
//! Two independent (ordering table, arena, clear colour) sets. The CPU only
//! ever writes the building slot; the presenting slot is read by the display
//! sink. `swap` is the single hand-over point each frame.

use super::arena::PrimArena;
use super::ordering_table::OrderingTable;
use crate::gte::Rgb;

#[derive(Debug, Clone)]
pub struct FrameSlot {
    pub ot: OrderingTable,
    pub arena: PrimArena,
    pub clear_color: Rgb,
}

impl FrameSlot {
    pub fn new(ot_len: usize, arena_bytes: usize, clear_color: Rgb) -> Self {
        Self {
            ot: OrderingTable::new(ot_len),
            arena: PrimArena::new(arena_bytes),
            clear_color,
        }
    }

    /// Empty the table and rewind the arena
    pub fn reset(&mut self) {
        self.ot.clear();
        self.arena.reset();
    }
}

/// Which of the two slots is being built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    BuildingA,
    BuildingB,
}

#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    a: FrameSlot,
    b: FrameSlot,
    role: Role,
}

impl DoubleBuffer {
    pub fn new(ot_len: usize, arena_bytes: usize, clear_color: Rgb) -> Self {
        Self {
            a: FrameSlot::new(ot_len, arena_bytes, clear_color),
            b: FrameSlot::new(ot_len, arena_bytes, clear_color),
            role: Role::BuildingA,
        }
    }

    pub fn building(&self) -> &FrameSlot {
        match self.role {
            Role::BuildingA => &self.a,
            Role::BuildingB => &self.b,
        }
    }

    pub fn building_mut(&mut self) -> &mut FrameSlot {
        match self.role {
            Role::BuildingA => &mut self.a,
            Role::BuildingB => &mut self.b,
        }
    }

    pub fn presenting(&self) -> &FrameSlot {
        match self.role {
            Role::BuildingA => &self.b,
            Role::BuildingB => &self.a,
        }
    }

    /// Hand the built slot to the display and start a fresh one
    pub fn swap(&mut self) {
        self.role = match self.role {
            Role::BuildingA => Role::BuildingB,
            Role::BuildingB => Role::BuildingA,
        };
        self.building_mut().reset();
    }

    pub fn set_clear_color(&mut self, color: Rgb) {
        self.a.clear_color = color;
        self.b.clear_color = color;
    }
}
