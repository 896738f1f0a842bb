use serde::{Deserialize, Serialize};

/// Input bitmask constants.
pub mod button {
    pub const NONE: u8 = 0;
    pub const LEFT: u8 = 1 << 0;
    pub const RIGHT: u8 = 1 << 1;
    pub const ATTACK: u8 = 1 << 2;
    pub const MASK: u8 = LEFT | RIGHT | ATTACK;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const BOTH: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::One => "P1",
            Self::Two => "P2",
        }
    }
}

/// One frame of input for one fighter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSample {
    pub bits: u8,
    /// Seconds since the round entered Fight.
    pub time: f32,
}

impl InputSample {
    pub fn new(bits: u8, time: f32) -> Self {
        Self {
            bits: bits & button::MASK,
            time,
        }
    }

    #[inline]
    pub fn left(&self) -> bool {
        self.bits & button::LEFT != 0
    }

    #[inline]
    pub fn right(&self) -> bool {
        self.bits & button::RIGHT != 0
    }

    #[inline]
    pub fn attack(&self) -> bool {
        self.bits & button::ATTACK != 0
    }
}
