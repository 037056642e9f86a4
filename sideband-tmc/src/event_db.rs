// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The ALERT-C event-code database (ISO 14819-2).
//!
//! Events are kept as semicolon-separated rows, in the interchange layout used by the
//! published event list: code, plain description, description with a `(Q)` quantifier slot,
//! nature, quantifier type, duration type, directionality, urgency, and update class.
//! Unknown codes decode to an empty event.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::csv;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuantifierType {
    SmallNumber = 0,
    Number = 1,
    LessThanMetres = 2,
    Percent = 3,
    UptoKmh = 4,
    UptoTime = 5,
    DegreesCelsius = 6,
    Time = 7,
    Tonnes = 8,
    Metres = 9,
    UptoMillimetres = 10,
    MHz = 11,
    KHz = 12,
}

impl QuantifierType {
    fn from_index(index: i32) -> Option<Self> {
        use QuantifierType::*;
        match index {
            0 => Some(SmallNumber),
            1 => Some(Number),
            2 => Some(LessThanMetres),
            3 => Some(Percent),
            4 => Some(UptoKmh),
            5 => Some(UptoTime),
            6 => Some(DegreesCelsius),
            7 => Some(Time),
            8 => Some(Tonnes),
            9 => Some(Metres),
            10 => Some(UptoMillimetres),
            11 => Some(MHz),
            12 => Some(KHz),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EventNature {
    #[default]
    Event,
    Forecast,
    Silent,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EventDirectionality {
    #[default]
    Single,
    Both,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EventUrgency {
    #[default]
    None,
    U,
    X,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DurationType {
    #[default]
    Dynamic,
    LongerLasting,
}

#[derive(Clone, Debug, Default)]
pub struct Event {
    pub description: String,
    pub description_with_quantifier: String,
    pub nature: EventNature,
    pub quantifier_type: Option<QuantifierType>,
    pub duration_type: DurationType,
    pub directionality: EventDirectionality,
    pub urgency: EventUrgency,
    pub update_class: u16,
    pub allows_quantifier: bool,
    pub show_duration: bool,
}

/// Width of a quantifier field in bits.
pub fn quantifier_size(qtype: QuantifierType) -> u32 {
    use QuantifierType::*;
    match qtype {
        SmallNumber | Number | LessThanMetres | Percent | UptoKmh | UptoTime => 5,
        DegreesCelsius | Time | Tonnes | Metres | UptoMillimetres | MHz | KHz => 8,
    }
}

pub fn urgency_string(urgency: EventUrgency) -> &'static str {
    match urgency {
        EventUrgency::None => "none",
        EventUrgency::U => "U",
        EventUrgency::X => "X",
    }
}

// A condensed extract of the ALERT-C event list. The full list has 1 553 rows; this carries
// the event classes seen in the captures the decoder is tested against.
const EVENT_DATA: &str = "\
Code;Description;Description with Q;N;Q;T;D;U;C
1;traffic problem;;;;D;;;1
2;queuing traffic;queuing traffic (with average speeds (Q));;4;D;;;1
55;traffic building up;traffic building up (with average speeds (Q));;4;D;;;1
82;roadworks. Heavy traffic has to be expected;;;;L;;;32
101;stationary traffic;;;;D;;;1
102;stationary traffic for 1 km;;;;D;;;1
129;bridge blocked;;;;L;;;9
201;accident;;;;D;;U;2
241;road closed;;;;L;;;3
401;lane closures;(Q) lanes closed;;0;L;;;5
474;carriageway closed;;;;L;;;5
513;single alternate line traffic;;;;L;2;;5
601;slippery road;slippery road (above (Q));;9;L;2;;9
701;roadworks;;;;L;;;11
704;resurfacing work;;;;L;;;11
803;construction work;;;;L;;;11
908;reduced visibility;reduced visibility to (Q);;2;D;2;;18
1301;dangerous driving conditions;;;;D;2;;9
1473;temperature;temperature (Q);;6;D;2;;22
1509;heavy frost expected;;F;;D;2;;24
1601;delays;delays (Q);;5;D;;;20
1607;delays of uncertain duration;;;;D;;;20
1701;vehicles on wrong carriageway;;;;D;2;X;23
2000;closed for heavy vehicles;closed for heavy vehicles (over (Q));;8;L;;;5
";

const SUPPLEMENTARY_DATA: &str = "\
1;in the roadworks area
2;in both directions
3;only heavy vehicles affected
4;danger of aquaplaning
5;approach with care
6;in the city centre
7;on the motorway
8;alternating one-way traffic
";

struct Database {
    events: HashMap<u16, Event>,
    supplementary: HashMap<u16, String>,
}

static DATABASE: Lazy<Database> = Lazy::new(|| {
    let mut events = HashMap::new();
    let table = csv::parse_csv_with_titles(EVENT_DATA, ';');

    for row in &table.rows {
        let Some(code) = table.get_u16(row, "Code") else { continue };

        let mut event = Event {
            description: table.get_string(row, "Description").unwrap_or_default().to_string(),
            description_with_quantifier: table
                .get_string(row, "Description with Q")
                .unwrap_or_default()
                .to_string(),
            show_duration: true,
            ..Default::default()
        };

        match table.get_string(row, "N") {
            Some("F") => event.nature = EventNature::Forecast,
            Some("S") => event.nature = EventNature::Silent,
            _ => (),
        }

        if table.row_contains(row, "Q") {
            event.quantifier_type =
                table.get_i32(row, "Q").and_then(QuantifierType::from_index);
        }
        event.allows_quantifier = !event.description_with_quantifier.is_empty();

        match table.get_string(row, "U") {
            Some("U") => event.urgency = EventUrgency::U,
            Some("X") => event.urgency = EventUrgency::X,
            _ => (),
        }

        if let Some(t) = table.get_string(row, "T") {
            if t.contains('D') {
                event.duration_type = DurationType::Dynamic;
            }
            else if t.contains('L') {
                event.duration_type = DurationType::LongerLasting;
            }
            if t.contains('(') {
                event.show_duration = false;
            }
        }

        if table.get_i32(row, "D") == Some(2) {
            event.directionality = EventDirectionality::Both;
        }

        event.update_class = table.get_u16(row, "C").unwrap_or(0);

        events.insert(code, event);
    }

    let mut supplementary = HashMap::new();
    for row in csv::parse_csv(SUPPLEMENTARY_DATA, ';') {
        if row.len() < 2 {
            continue;
        }
        let (Some(code), Some(desc)) = (row.get(0), row.get(1)) else { continue };
        if let Ok(code) = code.parse::<u16>() {
            supplementary.insert(code, desc.to_string());
        }
    }

    Database { events, supplementary }
});

pub fn is_valid_event_code(code: u16) -> bool {
    DATABASE.events.contains_key(&code)
}

/// Returns a predefined TMC event by its code, or an empty event for unknown codes.
pub fn event(code: u16) -> Event {
    DATABASE.events.get(&code).cloned().unwrap_or_default()
}

pub fn is_valid_supplementary_code(code: u16) -> bool {
    DATABASE.supplementary.contains_key(&code)
}

pub fn supplementary_description(code: u16) -> String {
    DATABASE.supplementary.get(&code).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_event_lookup() {
        assert!(is_valid_event_code(701));
        assert_eq!(event(701).description, "roadworks");
        assert_eq!(event(701).update_class, 11);
        assert_eq!(event(701).duration_type, DurationType::LongerLasting);

        assert!(!is_valid_event_code(9999));
        assert_eq!(event(9999).description, "");
    }

    #[test]
    fn verify_quantifier_parsing() {
        let delays = event(1601);
        assert!(delays.allows_quantifier);
        assert_eq!(delays.quantifier_type, Some(QuantifierType::UptoTime));
        assert_eq!(quantifier_size(QuantifierType::UptoTime), 5);
        assert_eq!(quantifier_size(QuantifierType::Tonnes), 8);
    }

    #[test]
    fn verify_directionality_and_urgency() {
        assert_eq!(event(513).directionality, EventDirectionality::Both);
        assert_eq!(event(201).urgency, EventUrgency::U);
        assert_eq!(event(1701).urgency, EventUrgency::X);
        assert_eq!(urgency_string(EventUrgency::X), "X");
    }

    #[test]
    fn verify_supplementary_lookup() {
        assert!(is_valid_supplementary_code(1));
        assert_eq!(supplementary_description(1), "in the roadworks area");
        assert!(!is_valid_supplementary_code(999));
    }
}
