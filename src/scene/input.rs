//! Controller state
//!
//! Button words use the PS1 digital pad bit layout, active high.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u16 {
        const SELECT   = 0x0001;
        const L3       = 0x0002;
        const R3       = 0x0004;
        const START    = 0x0008;
        const UP       = 0x0010;
        const RIGHT    = 0x0020;
        const DOWN     = 0x0040;
        const LEFT     = 0x0080;
        const L2       = 0x0100;
        const R2       = 0x0200;
        const L1       = 0x0400;
        const R1       = 0x0800;
        const TRIANGLE = 0x1000;
        const CIRCLE   = 0x2000;
        const CROSS    = 0x4000;
        const SQUARE   = 0x8000;
    }
}

/// Anything that can be polled once per frame for a button word
pub trait PadSource {
    fn poll(&mut self) -> Buttons;
}

/// One pad: this frame's buttons and last frame's
#[derive(Debug, Clone, Copy, Default)]
pub struct Pad {
    current: Buttons,
    previous: Buttons,
}

impl Pad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a new button word; call exactly once per frame
    pub fn update(&mut self, buttons: Buttons) {
        self.previous = self.current;
        self.current = buttons;
    }

    /// Level-triggered: true every frame the buttons are down
    pub fn held(&self, buttons: Buttons) -> bool {
        self.current.contains(buttons)
    }

    /// Edge-triggered: true only on the frame the button went down
    pub fn pressed(&self, buttons: Buttons) -> bool {
        self.current.contains(buttons) && !self.previous.contains(buttons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressed_is_edge_triggered() {
        let mut pad = Pad::new();
        pad.update(Buttons::TRIANGLE);
        assert!(pad.pressed(Buttons::TRIANGLE));
        pad.update(Buttons::TRIANGLE);
        assert!(!pad.pressed(Buttons::TRIANGLE));
        assert!(pad.held(Buttons::TRIANGLE));
        pad.update(Buttons::empty());
        pad.update(Buttons::TRIANGLE);
        assert!(pad.pressed(Buttons::TRIANGLE));
    }

    #[test]
    fn test_held_tracks_latest_word() {
        let mut pad = Pad::new();
        pad.update(Buttons::LEFT | Buttons::L1);
        assert!(pad.held(Buttons::LEFT | Buttons::L1));
        pad.update(Buttons::LEFT);
        assert!(pad.held(Buttons::LEFT));
        assert!(!pad.held(Buttons::L1));
        assert!(!pad.pressed(Buttons::LEFT));
    }

    #[test]
    fn test_bit_layout() {
        assert_eq!(Buttons::START.bits(), 0x0008);
        assert_eq!(Buttons::TRIANGLE.bits(), 0x1000);
        assert_eq!(Buttons::all().bits(), 0xFFFF);
    }
}
