//! Command values and their fixed-size wire encoding.
//!
//! A [`Command`] names an actuator on the gateway and an action to apply
//! to it. Commands are plain `Copy` values; the queue owns its copies
//! until the transmitter takes them.
//!
//! The wire format is one 3-byte record per TCP connection:
//!
//! | byte | meaning                                        |
//! |------|------------------------------------------------|
//! | 0    | actuator code                                  |
//! | 1    | action code (`0` = Toggle, `1` = SetLevel)     |
//! | 2    | level percent, meaningful only for SetLevel    |

use crate::config::{MAX_LEVEL, MIN_LEVEL};

/// Identifier of a physical input, assigned at board-definition time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonId {
    Button0,
    Button1,
}

impl ButtonId {
    /// Number of buttons on the board.
    pub const COUNT: usize = 2;

    pub const fn index(self) -> usize {
        match self {
            ButtonId::Button0 => 0,
            ButtonId::Button1 => 1,
        }
    }
}

/// Identifier of an actuator attached to the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorId {
    Lamp0,
}

impl ActuatorId {
    pub const fn code(self) -> u8 {
        match self {
            ActuatorId::Lamp0 => 0,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ActuatorId::Lamp0),
            _ => None,
        }
    }
}

/// Action requested from the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Toggle,
    SetLevel,
}

impl Action {
    pub const fn code(self) -> u8 {
        match self {
            Action::Toggle => 0,
            Action::SetLevel => 1,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Action::Toggle),
            1 => Some(Action::SetLevel),
            _ => None,
        }
    }
}

/// Size of one encoded command record.
pub const RECORD_LEN: usize = 3;

/// A value describing an action and target to send to the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    pub target: ActuatorId,
    pub action: Action,
    /// Level percent in `[MIN_LEVEL, MAX_LEVEL]`; `Some` only for SetLevel.
    pub level: Option<u8>,
}

impl Command {
    /// Toggle the actuator, whatever state it is in.
    pub const fn toggle(target: ActuatorId) -> Self {
        Self {
            target,
            action: Action::Toggle,
            level: None,
        }
    }

    /// Set the actuator level from a 0-based press ordinal (see
    /// [`level_for_press`]).
    pub fn set_level(target: ActuatorId, ordinal: u32) -> Self {
        Self {
            target,
            action: Action::SetLevel,
            level: Some(level_for_press(ordinal)),
        }
    }

    /// Encode into the fixed-size wire record.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        [
            self.target.code(),
            self.action.code(),
            self.level.unwrap_or(0),
        ]
    }

    /// Decode a wire record. Returns `None` for a wrong-sized buffer,
    /// an unknown actuator or action code, or an out-of-range level.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != RECORD_LEN {
            return None;
        }
        let target = ActuatorId::from_code(buf[0])?;
        let action = Action::from_code(buf[1])?;
        let level = match action {
            Action::Toggle => None,
            Action::SetLevel => {
                if buf[2] < MIN_LEVEL || buf[2] > MAX_LEVEL {
                    return None;
                }
                Some(buf[2])
            }
        };
        Some(Self {
            target,
            action,
            level,
        })
    }
}

/// Level produced by the n-th press of the level button (0-based).
///
/// Each press steps the level by 10 points starting from `MIN_LEVEL`;
/// past `MAX_LEVEL` the ramp restarts at `MIN_LEVEL`, so with the
/// default 20..100 bounds ten presses walk the full ramp and the tenth
/// returns to 20.
pub fn level_for_press(ordinal: u32) -> u8 {
    let level = ((ordinal % 9) as u8) * 10 + MIN_LEVEL;
    if level > MAX_LEVEL {
        MIN_LEVEL
    } else {
        level
    }
}

/// Which button drives which action.
///
/// A press of a button that matches neither role produces no command at
/// all; the builder logs it and moves on.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonRoles {
    /// Toggles `target` on every press.
    pub primary: ButtonId,
    /// Steps the level of `target` on every press.
    pub secondary: ButtonId,
    /// Actuator both roles address.
    pub target: ActuatorId,
}

impl ButtonRoles {
    pub const fn new(primary: ButtonId, secondary: ButtonId, target: ActuatorId) -> Self {
        Self {
            primary,
            secondary,
            target,
        }
    }

    /// Map a press to the command it should produce, if any.
    pub fn command_for(&self, button: ButtonId, ordinal: u32) -> Option<Command> {
        if button == self.primary {
            Some(Command::toggle(self.target))
        } else if button == self.secondary {
            Some(Command::set_level(self.target, ordinal))
        } else {
            None
        }
    }
}

impl Default for ButtonRoles {
    fn default() -> Self {
        Self::new(ButtonId::Button0, ButtonId::Button1, ActuatorId::Lamp0)
    }
}
