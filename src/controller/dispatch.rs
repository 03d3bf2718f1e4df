//! Update Dispatcher - `(type, code)` to field selection
//!
//! The recognized code set is data, not control flow: two constant tables map
//! an evdev code to the field it drives. Everything outside the tables is
//! dropped on purpose. Sixaxis firmware and driver revisions disagree on what
//! else they emit (the digital duplicates of every pressure-sensitive button,
//! for one), so an unknown code or event class must never become an error.

use tracing::trace;

use super::event_record::EventRecord;

/// Synchronization marker, carries nothing.
pub const EV_SYN: u16 = 0x00;
/// Digital event class, value is 0 or 1.
pub const EV_KEY: u16 = 0x01;
/// Analog event class, value is a raw magnitude.
pub const EV_ABS: u16 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalButton {
    Select,
    L3,
    R3,
    Start,
    Ps,
}

impl DigitalButton {
    pub const ALL: [DigitalButton; 5] = [
        DigitalButton::Select,
        DigitalButton::L3,
        DigitalButton::R3,
        DigitalButton::Start,
        DigitalButton::Ps,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            DigitalButton::Select => "select",
            DigitalButton::L3 => "L3",
            DigitalButton::R3 => "R3",
            DigitalButton::Start => "start",
            DigitalButton::Ps => "PS",
        }
    }
}

/// Pressure-sensitive buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogButton {
    Up,
    Down,
    Left,
    Right,
    L1,
    L2,
    R1,
    R2,
    Triangle,
    Circle,
    Cross,
    Square,
}

impl AnalogButton {
    /// Render order: d-pad, shoulders, face buttons.
    pub const ALL: [AnalogButton; 12] = [
        AnalogButton::Up,
        AnalogButton::Down,
        AnalogButton::Left,
        AnalogButton::Right,
        AnalogButton::L1,
        AnalogButton::L2,
        AnalogButton::R1,
        AnalogButton::R2,
        AnalogButton::Triangle,
        AnalogButton::Circle,
        AnalogButton::Cross,
        AnalogButton::Square,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AnalogButton::Up => "up",
            AnalogButton::Down => "down",
            AnalogButton::Left => "left",
            AnalogButton::Right => "right",
            AnalogButton::L1 => "L1",
            AnalogButton::L2 => "L2",
            AnalogButton::R1 => "R1",
            AnalogButton::R2 => "R2",
            AnalogButton::Triangle => "triangle",
            AnalogButton::Circle => "circle",
            AnalogButton::Cross => "cross",
            AnalogButton::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

impl StickAxis {
    pub const ALL: [StickAxis; 4] = [
        StickAxis::LeftX,
        StickAxis::LeftY,
        StickAxis::RightX,
        StickAxis::RightY,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            StickAxis::LeftX => "LX",
            StickAxis::LeftY => "LY",
            StickAxis::RightX => "RX",
            StickAxis::RightY => "RY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrientationAxis {
    /// Tilt left/right
    X,
    /// Tilt forwards/backwards
    Y,
    /// Up/down
    Z,
}

impl OrientationAxis {
    pub const ALL: [OrientationAxis; 3] = [OrientationAxis::X, OrientationAxis::Y, OrientationAxis::Z];
}

/// Tagged reference to exactly one field of the controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSelector {
    Flag(DigitalButton),
    Stick(StickAxis),
    Orientation(OrientationAxis),
    Pressure(AnalogButton),
}

/// A field selector paired with the value to store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Flag(DigitalButton, bool),
    Stick(StickAxis, i32),
    Orientation(OrientationAxis, i32),
    Pressure(AnalogButton, i32),
}

/// EV_KEY codes that map to a field.
///
/// Codes 292..=303 report the pressure buttons as plain on/off; they are
/// shadows of the EV_ABS codes below and are intentionally absent.
pub const DIGITAL_CODES: [(u16, DigitalButton); 5] = [
    (288, DigitalButton::Select),
    (289, DigitalButton::L3),
    (290, DigitalButton::R3),
    (291, DigitalButton::Start),
    (304, DigitalButton::Ps),
];

/// EV_ABS codes that map to a field.
pub const ANALOG_CODES: [(u16, FieldSelector); 19] = [
    (0, FieldSelector::Stick(StickAxis::LeftX)),
    (1, FieldSelector::Stick(StickAxis::LeftY)),
    (2, FieldSelector::Stick(StickAxis::RightX)),
    (3, FieldSelector::Stick(StickAxis::RightY)),
    (4, FieldSelector::Orientation(OrientationAxis::X)),
    (5, FieldSelector::Orientation(OrientationAxis::Y)),
    (6, FieldSelector::Orientation(OrientationAxis::Z)),
    (44, FieldSelector::Pressure(AnalogButton::Up)),
    (45, FieldSelector::Pressure(AnalogButton::Right)),
    (46, FieldSelector::Pressure(AnalogButton::Down)),
    (47, FieldSelector::Pressure(AnalogButton::Left)),
    (48, FieldSelector::Pressure(AnalogButton::L2)),
    (49, FieldSelector::Pressure(AnalogButton::R2)),
    (50, FieldSelector::Pressure(AnalogButton::L1)),
    (51, FieldSelector::Pressure(AnalogButton::R1)),
    (52, FieldSelector::Pressure(AnalogButton::Triangle)),
    (53, FieldSelector::Pressure(AnalogButton::Circle)),
    (54, FieldSelector::Pressure(AnalogButton::Cross)),
    (55, FieldSelector::Pressure(AnalogButton::Square)),
];

/// Finds the field an event of this class and code drives, if any.
pub fn lookup(event_type: u16, code: u16) -> Option<FieldSelector> {
    match event_type {
        EV_KEY => DIGITAL_CODES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, button)| FieldSelector::Flag(*button)),
        EV_ABS => ANALOG_CODES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, selector)| *selector),
        _ => None,
    }
}

/// Turns an event into the single field update it implies.
///
/// Returns `None` for sync markers, unknown event classes and unknown codes.
/// None of these are errors.
pub fn resolve(event: &EventRecord) -> Option<Update> {
    if event.event_type == EV_SYN {
        return None;
    }

    let Some(selector) = lookup(event.event_type, event.code) else {
        trace!(
            "Ignoring event type={:04} code={:04} value={:08}",
            event.event_type,
            event.code,
            event.value
        );
        return None;
    };

    Some(match selector {
        FieldSelector::Flag(button) => Update::Flag(button, event.value == 1),
        FieldSelector::Stick(axis) => Update::Stick(axis, event.value),
        FieldSelector::Orientation(axis) => Update::Orientation(axis, event.value),
        FieldSelector::Pressure(button) => Update::Pressure(button, event.value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_code_maps_to_a_distinct_field() {
        let digital: HashSet<_> = DIGITAL_CODES.iter().map(|(_, b)| *b).collect();
        assert_eq!(digital.len(), DIGITAL_CODES.len());

        let analog: HashSet<_> = ANALOG_CODES.iter().map(|(_, s)| *s).collect();
        assert_eq!(analog.len(), ANALOG_CODES.len());

        let codes: HashSet<_> = ANALOG_CODES.iter().map(|(c, _)| *c).collect();
        assert_eq!(codes.len(), ANALOG_CODES.len());
    }

    #[test]
    fn tables_cover_every_field() {
        for button in DigitalButton::ALL {
            assert!(DIGITAL_CODES.iter().any(|(_, b)| *b == button));
        }
        for button in AnalogButton::ALL {
            assert!(ANALOG_CODES
                .iter()
                .any(|(_, s)| *s == FieldSelector::Pressure(button)));
        }
        for axis in StickAxis::ALL {
            assert!(ANALOG_CODES
                .iter()
                .any(|(_, s)| *s == FieldSelector::Stick(axis)));
        }
        for axis in OrientationAxis::ALL {
            assert!(ANALOG_CODES
                .iter()
                .any(|(_, s)| *s == FieldSelector::Orientation(axis)));
        }
    }

    #[test]
    fn lookup_is_keyed_on_event_class() {
        assert_eq!(
            lookup(EV_KEY, 288),
            Some(FieldSelector::Flag(DigitalButton::Select))
        );
        assert_eq!(
            lookup(EV_ABS, 0),
            Some(FieldSelector::Stick(StickAxis::LeftX))
        );
        // same numbers, wrong class
        assert_eq!(lookup(EV_ABS, 288), None);
        assert_eq!(lookup(EV_KEY, 0), None);
        assert_eq!(lookup(EV_SYN, 0), None);
        assert_eq!(lookup(0x04, 4), None);
    }

    #[test]
    fn digital_shadow_codes_are_dropped() {
        for code in 292..=303 {
            assert_eq!(resolve(&EventRecord::new(EV_KEY, code, 1)), None);
        }
    }

    #[test]
    fn digital_value_is_boolean() {
        assert_eq!(
            resolve(&EventRecord::new(EV_KEY, 304, 1)),
            Some(Update::Flag(DigitalButton::Ps, true))
        );
        assert_eq!(
            resolve(&EventRecord::new(EV_KEY, 304, 0)),
            Some(Update::Flag(DigitalButton::Ps, false))
        );
        // autorepeat (2) is not a press
        assert_eq!(
            resolve(&EventRecord::new(EV_KEY, 304, 2)),
            Some(Update::Flag(DigitalButton::Ps, false))
        );
    }

    #[test]
    fn analog_value_passes_through() {
        assert_eq!(
            resolve(&EventRecord::new(EV_ABS, 55, 1_000)),
            Some(Update::Pressure(AnalogButton::Square, 1_000))
        );
        assert_eq!(
            resolve(&EventRecord::new(EV_ABS, 6, i32::MIN)),
            Some(Update::Orientation(OrientationAxis::Z, i32::MIN))
        );
    }

    #[test]
    fn sync_events_resolve_to_nothing() {
        assert_eq!(resolve(&EventRecord::new(EV_SYN, 0, 0)), None);
        assert_eq!(resolve(&EventRecord::new(EV_SYN, 288, 1)), None);
    }
}
