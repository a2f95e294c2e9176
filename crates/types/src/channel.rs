//! Fixed four-channel order used throughout the pipeline.

use serde::{Deserialize, Serialize};

/// One of the four digitizer input channels, in the fixed order {A,B,C,D}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    A,
    B,
    C,
    D,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::A, Channel::B, Channel::C, Channel::D];

    pub fn index(self) -> usize {
        match self {
            Channel::A => 0,
            Channel::B => 1,
            Channel::C => 2,
            Channel::D => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Channel> {
        match index {
            0 => Some(Channel::A),
            1 => Some(Channel::B),
            2 => Some(Channel::C),
            3 => Some(Channel::D),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Channel::A => "A",
            Channel::B => "B",
            Channel::C => "C",
            Channel::D => "D",
        };
        write!(f, "{}", name)
    }
}
