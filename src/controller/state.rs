//! Controller State - the live snapshot of one Sixaxis
//!
//! Every field is independent and only ever overwritten by the latest event
//! carrying its code. Rendering is sparse: idle fields are left out so a line
//! printed ten times a second stays readable.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::dispatch::{self, AnalogButton, DigitalButton, OrientationAxis, StickAxis, Update};
use super::event_record::EventRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalogStick {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Orientation {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Orientation {
    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0 && self.z == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigitalButtons {
    pub select: bool,
    pub l3: bool,
    pub r3: bool,
    pub start: bool,
    pub ps: bool,
}

impl DigitalButtons {
    fn slot(&mut self, button: DigitalButton) -> &mut bool {
        match button {
            DigitalButton::Select => &mut self.select,
            DigitalButton::L3 => &mut self.l3,
            DigitalButton::R3 => &mut self.r3,
            DigitalButton::Start => &mut self.start,
            DigitalButton::Ps => &mut self.ps,
        }
    }

    pub fn get(&self, button: DigitalButton) -> bool {
        match button {
            DigitalButton::Select => self.select,
            DigitalButton::L3 => self.l3,
            DigitalButton::R3 => self.r3,
            DigitalButton::Start => self.start,
            DigitalButton::Ps => self.ps,
        }
    }
}

/// Pressure readings, nominally 0-255
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalogButtons {
    pub up: i32,
    pub down: i32,
    pub left: i32,
    pub right: i32,
    pub l1: i32,
    pub l2: i32,
    pub r1: i32,
    pub r2: i32,
    pub triangle: i32,
    pub circle: i32,
    pub cross: i32,
    pub square: i32,
}

impl AnalogButtons {
    fn slot(&mut self, button: AnalogButton) -> &mut i32 {
        match button {
            AnalogButton::Up => &mut self.up,
            AnalogButton::Down => &mut self.down,
            AnalogButton::Left => &mut self.left,
            AnalogButton::Right => &mut self.right,
            AnalogButton::L1 => &mut self.l1,
            AnalogButton::L2 => &mut self.l2,
            AnalogButton::R1 => &mut self.r1,
            AnalogButton::R2 => &mut self.r2,
            AnalogButton::Triangle => &mut self.triangle,
            AnalogButton::Circle => &mut self.circle,
            AnalogButton::Cross => &mut self.cross,
            AnalogButton::Square => &mut self.square,
        }
    }

    pub fn get(&self, button: AnalogButton) -> i32 {
        match button {
            AnalogButton::Up => self.up,
            AnalogButton::Down => self.down,
            AnalogButton::Left => self.left,
            AnalogButton::Right => self.right,
            AnalogButton::L1 => self.l1,
            AnalogButton::L2 => self.l2,
            AnalogButton::R1 => self.r1,
            AnalogButton::R2 => self.r2,
            AnalogButton::Triangle => self.triangle,
            AnalogButton::Circle => self.circle,
            AnalogButton::Cross => self.cross,
            AnalogButton::Square => self.square,
        }
    }
}

/// When the orientation vector shows up in [`ControllerState::render`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationPolicy {
    /// Only while any axis is non-zero, like every other field
    #[default]
    Sparse,
    Always,
    Hidden,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub orientation: OrientationPolicy,
}

/// Current state of every button, stick and the motion sensor
///
/// Starts all-zero/false. The only way to change it is [`apply`](Self::apply)
/// (or [`set`](Self::set) with an already-resolved update).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub buttons: DigitalButtons,
    pub pressure: AnalogButtons,
    pub left_stick: AnalogStick,
    pub right_stick: AnalogStick,
    pub orientation: Orientation,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one decoded event.
    ///
    /// Touches at most one field. Sync markers, unknown event classes and
    /// unknown codes leave the state untouched; that is deliberate, not a
    /// missing error path.
    pub fn apply(&mut self, event: &EventRecord) {
        if let Some(update) = dispatch::resolve(event) {
            self.set(update);
        }
    }

    pub fn set(&mut self, update: Update) {
        match update {
            Update::Flag(button, pressed) => *self.buttons.slot(button) = pressed,
            Update::Pressure(button, value) => *self.pressure.slot(button) = value,
            Update::Stick(axis, value) => *self.stick_slot(axis) = value,
            Update::Orientation(axis, value) => match axis {
                OrientationAxis::X => self.orientation.x = value,
                OrientationAxis::Y => self.orientation.y = value,
                OrientationAxis::Z => self.orientation.z = value,
            },
        }
    }

    pub fn stick(&self, axis: StickAxis) -> i32 {
        match axis {
            StickAxis::LeftX => self.left_stick.x,
            StickAxis::LeftY => self.left_stick.y,
            StickAxis::RightX => self.right_stick.x,
            StickAxis::RightY => self.right_stick.y,
        }
    }

    fn stick_slot(&mut self, axis: StickAxis) -> &mut i32 {
        match axis {
            StickAxis::LeftX => &mut self.left_stick.x,
            StickAxis::LeftY => &mut self.left_stick.y,
            StickAxis::RightX => &mut self.right_stick.x,
            StickAxis::RightY => &mut self.right_stick.y,
        }
    }

    /// Human-readable summary of every non-default field.
    ///
    /// Order is fixed: sticks, d-pad, shoulders, face buttons, digital
    /// buttons, then orientation as the policy allows.
    pub fn render(&self, options: &RenderOptions) -> String {
        let mut items: Vec<String> = Vec::new();

        for axis in StickAxis::ALL {
            let value = self.stick(axis);
            if value != 0 {
                items.push(format!("{}={:+03}", axis.label(), value));
            }
        }

        for button in AnalogButton::ALL {
            let value = self.pressure.get(button);
            if value != 0 {
                items.push(format!("{}={}", button.label(), value));
            }
        }

        for button in DigitalButton::ALL {
            if self.buttons.get(button) {
                items.push(button.label().to_string());
            }
        }

        let show_orientation = match options.orientation {
            OrientationPolicy::Sparse => !self.orientation.is_zero(),
            OrientationPolicy::Always => true,
            OrientationPolicy::Hidden => false,
        };
        if show_orientation {
            items.push(format!(
                "orientation({:+04}, {:+04}, {:+04})",
                self.orientation.x, self.orientation.y, self.orientation.z
            ));
        }

        format!("Sixaxis{{{}}}", items.join(" "))
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&RenderOptions::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::dispatch::{EV_ABS, EV_KEY};

    fn sparse() -> RenderOptions {
        RenderOptions::default()
    }

    #[test]
    fn fresh_state_renders_empty() {
        assert_eq!(ControllerState::new().render(&sparse()), "Sixaxis{}");
        assert_eq!(ControllerState::new().to_string(), "Sixaxis{}");
    }

    #[test]
    fn select_renders_alone() {
        let mut state = ControllerState::new();
        state.apply(&EventRecord::new(EV_KEY, 288, 1));
        assert_eq!(state.render(&sparse()), "Sixaxis{select}");
    }

    #[test]
    fn negative_stick_is_zero_padded() {
        let mut state = ControllerState::new();
        state.apply(&EventRecord::new(EV_ABS, 0, -5));
        assert_eq!(state.render(&sparse()), "Sixaxis{LX=-05}");
    }

    #[test]
    fn render_order_is_fixed() {
        let mut state = ControllerState::new();
        // applied in scrambled order
        for (event_type, code, value) in [
            (EV_KEY, 304, 1),
            (EV_ABS, 55, 7),
            (EV_ABS, 3, 127),
            (EV_ABS, 44, 200),
            (EV_KEY, 288, 1),
            (EV_ABS, 50, 12),
            (EV_ABS, 0, -128),
            (EV_ABS, 48, 255),
        ] {
            state.apply(&EventRecord::new(event_type, code, value));
        }
        assert_eq!(
            state.render(&sparse()),
            "Sixaxis{LX=-128 RY=+127 up=200 L1=12 L2=255 square=7 select PS}"
        );
    }

    #[test]
    fn released_button_disappears() {
        let mut state = ControllerState::new();
        state.apply(&EventRecord::new(EV_KEY, 291, 1));
        assert_eq!(state.render(&sparse()), "Sixaxis{start}");
        state.apply(&EventRecord::new(EV_KEY, 291, 0));
        assert_eq!(state.render(&sparse()), "Sixaxis{}");
    }

    #[test]
    fn orientation_policies() {
        let idle = ControllerState::new();
        let always = RenderOptions {
            orientation: OrientationPolicy::Always,
        };
        let hidden = RenderOptions {
            orientation: OrientationPolicy::Hidden,
        };

        assert_eq!(idle.render(&sparse()), "Sixaxis{}");
        assert_eq!(
            idle.render(&always),
            "Sixaxis{orientation(+000, +000, +000)}"
        );

        let mut tilted = ControllerState::new();
        tilted.apply(&EventRecord::new(EV_ABS, 4, 12));
        tilted.apply(&EventRecord::new(EV_ABS, 6, -512));
        assert_eq!(
            tilted.render(&sparse()),
            "Sixaxis{orientation(+012, +000, -512)}"
        );
        assert_eq!(tilted.render(&hidden), "Sixaxis{}");
    }

    #[test]
    fn set_touches_one_field() {
        let mut state = ControllerState::new();
        state.set(Update::Pressure(AnalogButton::Circle, 99));
        let expected = ControllerState {
            pressure: AnalogButtons {
                circle: 99,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(state, expected);
    }
}
