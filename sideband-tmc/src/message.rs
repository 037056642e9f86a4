// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-group and multi-group ALERT-C event messages (ISO 14819-1, section 5).

use std::collections::HashMap;
use std::collections::VecDeque;

use serde_json::Value;

use sideband_core::tree;
use sideband_core::units::{Band, CarrierFrequency};
use sideband_core::util::bits::{get_bits, get_bool};
use sideband_core::util::fmt::hours_minutes_string;

use crate::event_db::{
    self, event, quantifier_size, DurationType, EventDirectionality, EventUrgency, QuantifierType,
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    #[default]
    Positive,
    Negative,
}

/// Labels of the free-form fields of a multi-group message (ISO 14819-1, section 5.5).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FieldLabel {
    Duration = 0,
    ControlCode = 1,
    AffectedLength = 2,
    SpeedLimit = 3,
    Quantifier5bit = 4,
    Quantifier8bit = 5,
    Supplementary = 6,
    StartTime = 7,
    StopTime = 8,
    AdditionalEvent = 9,
    DetailedDiversion = 10,
    Destination = 11,
    // 12 is reserved for future use
    CrossLinkage = 13,
    Separator = 14,
}

impl FieldLabel {
    fn from_index(index: u16) -> Option<Self> {
        use FieldLabel::*;
        match index {
            0 => Some(Duration),
            1 => Some(ControlCode),
            2 => Some(AffectedLength),
            3 => Some(SpeedLimit),
            4 => Some(Quantifier5bit),
            5 => Some(Quantifier8bit),
            6 => Some(Supplementary),
            7 => Some(StartTime),
            8 => Some(StopTime),
            9 => Some(AdditionalEvent),
            10 => Some(DetailedDiversion),
            11 => Some(Destination),
            13 => Some(CrossLinkage),
            14 => Some(Separator),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ControlCode {
    IncreaseUrgency = 0,
    ReduceUrgency = 1,
    ChangeDirectionality = 2,
    ChangeDurationType = 3,
    // 4 toggles spoken/unspoken, not carried in the output
    SetDiversion = 5,
    IncreaseExtentBy8 = 6,
    IncreaseExtentBy16 = 7,
}

impl ControlCode {
    fn from_index(index: u16) -> Option<Self> {
        use ControlCode::*;
        match index {
            0 => Some(IncreaseUrgency),
            1 => Some(ReduceUrgency),
            2 => Some(ChangeDirectionality),
            3 => Some(ChangeDurationType),
            5 => Some(SetDiversion),
            6 => Some(IncreaseExtentBy8),
            7 => Some(IncreaseExtentBy16),
            _ => None,
        }
    }
}

/// The key for decrypting an encrypted service's location codes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceKey {
    pub xorval: u16,
    pub xorstart: u16,
    pub nrot: u16,
}

#[derive(Clone, Copy, Debug, Default)]
struct MessagePart {
    is_received: bool,
    data: [u16; 2],
}

#[derive(Clone, Copy, Debug)]
struct FreeformField {
    label: FieldLabel,
    data: u16,
}

fn pop_bits(bits: &mut VecDeque<bool>, len: u32) -> u16 {
    debug_assert!(len <= 16);
    let mut result: u16 = 0;
    if bits.len() >= len as usize {
        for _ in 0..len {
            result = (result << 1) | u16::from(bits.pop_front().unwrap());
        }
    }
    result
}

// Slice the concatenated free-form payload into labelled fields (ISO 14819-1: 5.5).
fn freeform_fields(parts: &[MessagePart; 5]) -> Vec<FreeformField> {
    const FIELD_SIZE: [u32; 16] = [3, 3, 5, 5, 5, 8, 8, 8, 8, 11, 16, 16, 16, 16, 0, 0];

    let second_gsi = usize::from(get_bits(parts[1].data[0], 12, 2));

    // Concatenate the used groups' payloads, the usage being derived from the GSI of the
    // second group.
    let mut freeform_bits: VecDeque<bool> = VecDeque::new();
    for (i, part) in parts.iter().enumerate().skip(1) {
        if !part.is_received {
            break;
        }

        if i == 1 || i >= parts.len() - second_gsi {
            for b in 0..12 {
                freeform_bits.push_back((part.data[0] >> (11 - b)) & 1 == 1);
            }
            for b in 0..16 {
                freeform_bits.push_back((part.data[1] >> (15 - b)) & 1 == 1);
            }
        }
    }

    let mut result = Vec::new();
    while freeform_bits.len() > 4 {
        let label_bits = pop_bits(&mut freeform_bits, 4);
        if freeform_bits.len() < FIELD_SIZE[usize::from(label_bits)] as usize {
            break;
        }

        let data = pop_bits(&mut freeform_bits, FIELD_SIZE[usize::from(label_bits)]);

        if label_bits == 0 && data == 0 {
            break;
        }

        if let Some(label) = FieldLabel::from_index(label_bits) {
            result.push(FreeformField { label, data });
        }
    }

    result
}

// Start and stop times (ISO 14819-1, section 6.6.3)
fn time_string(field_data: u16) -> String {
    if field_data <= 95 {
        hours_minutes_string(u32::from(field_data) / 4, 15 * (u32::from(field_data) % 4))
    }
    else if field_data <= 200 {
        let days = (field_data - 96) / 24;
        let hour = u32::from((field_data - 96) % 24);
        match days {
            0 => format!("at {}", hours_minutes_string(hour, 0)),
            1 => format!("after 1 day at {}", hours_minutes_string(hour, 0)),
            _ => format!("after {} days at {}", days, hours_minutes_string(hour, 0)),
        }
    }
    else if field_data <= 231 {
        format!("day {} of the month", field_data - 200)
    }
    else {
        let month = usize::from(field_data - 232) / 2;
        let end_or_mid = (field_data - 232) % 2 == 1;
        const MONTH_NAMES: [&str; 12] = [
            "January", "February", "March", "April", "May", "June", "July", "August", "September",
            "October", "November", "December",
        ];
        if month < 12 {
            if end_or_mid {
                format!("end of {}", MONTH_NAMES[month])
            }
            else {
                format!("mid-{}", MONTH_NAMES[month])
            }
        }
        else {
            String::new()
        }
    }
}

// Render the quantifier phrase and substitute it into the event's "(Q)" slot.
fn description_with_quantifier(event: &event_db::Event, q_value: u16) -> String {
    let Some(qtype) = event.quantifier_type else {
        return event.description.clone();
    };

    let q_value =
        if quantifier_size(qtype) == 5 && q_value == 0 { 32 } else { q_value };

    let text = match qtype {
        QuantifierType::SmallNumber => {
            let mut num = i32::from(q_value);
            if num > 28 {
                num += num - 28;
            }
            num.to_string()
        }
        QuantifierType::Number => {
            let q = i32::from(q_value);
            let num = if q <= 4 {
                q
            }
            else if q <= 14 {
                (q - 4) * 10
            }
            else {
                (q - 12) * 50
            };
            num.to_string()
        }
        QuantifierType::LessThanMetres => format!("less than {} metres", q_value * 10),
        QuantifierType::Percent => {
            format!("{} %", if q_value == 32 { 0 } else { q_value * 5 })
        }
        QuantifierType::UptoKmh => format!("of up to {} km/h", q_value * 5),
        QuantifierType::UptoTime => {
            if q_value <= 10 {
                format!("of up to {} minutes", q_value * 5)
            }
            else if q_value <= 22 {
                format!("of up to {} hours", q_value - 10)
            }
            else {
                format!("of up to {} hours", (q_value - 20) * 6)
            }
        }
        QuantifierType::DegreesCelsius => {
            format!("{} degrees Celsius", i32::from(q_value) - 51)
        }
        QuantifierType::Time => {
            let minutes = (u32::from(q_value).max(1) - 1) * 10;
            hours_minutes_string(minutes / 60, minutes % 60)
        }
        QuantifierType::Tonnes => {
            let decitonnes =
                if q_value <= 100 { u32::from(q_value) } else { 100 + (u32::from(q_value) - 100) * 5 };
            format!("{}.{} tonnes", decitonnes / 10, decitonnes % 10)
        }
        QuantifierType::Metres => {
            let decimetres =
                if q_value <= 100 { u32::from(q_value) } else { 100 + (u32::from(q_value) - 100) * 5 };
            format!("{}.{} metres", decimetres / 10, decimetres % 10)
        }
        QuantifierType::UptoMillimetres => format!("of up to {} millimetres", q_value),
        QuantifierType::MHz => CarrierFrequency::new(q_value, Band::Fm).to_display_string(),
        QuantifierType::KHz => CarrierFrequency::new(q_value, Band::LfMf).to_display_string(),
    };

    event.description_with_quantifier.replacen("(Q)", &text, 1)
}

fn ucfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// One ALERT-C event message, either single-group or assembled from up to five groups.
#[derive(Clone, Debug)]
pub struct Message {
    is_encrypted: bool,
    was_encrypted: bool,
    duration: u16,
    duration_type: DurationType,
    diversion_advised: bool,
    direction: Direction,
    extent: u16,
    events: Vec<u16>,
    supplementary: Vec<u16>,
    quantifiers: HashMap<usize, u16>,
    diversion: Vec<u16>,
    location: u16,
    encrypted_location: u16,
    is_complete: bool,
    length_affected: Option<u16>,
    time_until: Option<u16>,
    time_starts: Option<u16>,
    speed_limit: Option<u16>,
    directionality: EventDirectionality,
    urgency: EventUrgency,
    continuity_index: u16,
    parts: [MessagePart; 5],
}

impl Message {
    pub fn new(is_location_encrypted: bool) -> Self {
        Message {
            is_encrypted: is_location_encrypted,
            was_encrypted: is_location_encrypted,
            duration: 0,
            duration_type: DurationType::default(),
            diversion_advised: false,
            direction: Direction::default(),
            extent: 0,
            events: Vec::new(),
            supplementary: Vec::new(),
            quantifiers: HashMap::new(),
            diversion: Vec::new(),
            location: 0,
            encrypted_location: 0,
            is_complete: false,
            length_affected: None,
            time_until: None,
            time_starts: None,
            speed_limit: None,
            directionality: EventDirectionality::default(),
            urgency: EventUrgency::default(),
            continuity_index: 0,
            parts: [MessagePart::default(); 5],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn continuity_index(&self) -> u16 {
        self.continuity_index
    }

    pub fn has_location(&self) -> bool {
        self.location != 0
    }

    pub fn location(&self) -> u16 {
        self.location
    }

    /// Signed extent: negative when the message runs against the road's positive direction.
    pub fn extent(&self) -> i32 {
        let sign = if self.direction == Direction::Negative { -1 } else { 1 };
        sign * i32::from(self.extent)
    }

    pub fn push_single(&mut self, x: u16, y: u16, z: u16) {
        self.duration = get_bits(x, 0, 3);
        self.diversion_advised = get_bool(y, 15);
        self.direction = if get_bool(y, 14) { Direction::Negative } else { Direction::Positive };
        self.extent = get_bits(y, 11, 3);
        self.events.push(get_bits(y, 0, 11));
        if self.is_encrypted {
            self.encrypted_location = z;
        }
        else {
            self.location = z;
        }

        let first = event(self.events[0]);
        self.directionality = first.directionality;
        self.urgency = first.urgency;
        self.duration_type = first.duration_type;

        self.is_complete = true;
    }

    pub fn push_multi(&mut self, x: u16, y: u16, z: u16) {
        self.continuity_index = get_bits(x, 0, 3);

        let is_first_group = get_bool(y, 15);
        let mut is_last_group = false;

        let current_group: usize = if is_first_group {
            0
        }
        else if get_bool(y, 14) {
            // Second group carries its own indicator bit
            is_last_group = get_bits(y, 12, 2) == 0;
            1
        }
        else {
            let group_sequence_indicator = get_bits(y, 12, 2);
            is_last_group = group_sequence_indicator == 0;
            4 - usize::from(group_sequence_indicator)
        };

        self.parts[current_group] = MessagePart { is_received: true, data: [y, z] };

        if is_last_group {
            self.decode_multi();
            self.clear_parts();
        }
    }

    fn decode_multi(&mut self) {
        // Need at least the first group
        if !self.parts[0].is_received {
            return;
        }

        self.is_complete = true;

        // First group
        self.direction =
            if get_bool(self.parts[0].data[0], 14) { Direction::Negative } else { Direction::Positive };
        self.extent = get_bits(self.parts[0].data[0], 11, 3);
        self.events.push(get_bits(self.parts[0].data[0], 0, 11));
        if self.is_encrypted {
            self.encrypted_location = self.parts[0].data[1];
        }
        else {
            self.location = self.parts[0].data[1];
        }

        let first = event(self.events[0]);
        self.directionality = first.directionality;
        self.urgency = first.urgency;
        self.duration_type = first.duration_type;

        // Subsequent groups
        if !self.parts[1].is_received {
            return;
        }

        for field in freeform_fields(&self.parts) {
            match field.label {
                FieldLabel::Duration => self.duration = field.data,

                FieldLabel::ControlCode => self.apply_control_code(field.data),

                FieldLabel::AffectedLength => self.length_affected = Some(field.data),

                FieldLabel::SpeedLimit => self.speed_limit = Some(field.data * 5),

                FieldLabel::Quantifier5bit => self.insert_quantifier(field.data, 5),

                FieldLabel::Quantifier8bit => self.insert_quantifier(field.data, 8),

                FieldLabel::Supplementary => self.supplementary.push(field.data),

                FieldLabel::StartTime => self.time_starts = Some(field.data),

                FieldLabel::StopTime => self.time_until = Some(field.data),

                FieldLabel::AdditionalEvent => self.events.push(field.data),

                FieldLabel::DetailedDiversion => self.diversion.push(field.data),

                FieldLabel::Destination | FieldLabel::CrossLinkage | FieldLabel::Separator => (),
            }
        }
    }

    fn apply_control_code(&mut self, data: u16) {
        let Some(code) = ControlCode::from_index(data) else { return };

        match code {
            ControlCode::IncreaseUrgency => {
                self.urgency = match self.urgency {
                    EventUrgency::None => EventUrgency::U,
                    EventUrgency::U => EventUrgency::X,
                    EventUrgency::X => EventUrgency::None,
                };
            }
            ControlCode::ReduceUrgency => {
                self.urgency = match self.urgency {
                    EventUrgency::None => EventUrgency::X,
                    EventUrgency::U => EventUrgency::None,
                    EventUrgency::X => EventUrgency::U,
                };
            }
            ControlCode::ChangeDirectionality => {
                self.directionality = match self.directionality {
                    EventDirectionality::Single => EventDirectionality::Both,
                    EventDirectionality::Both => EventDirectionality::Single,
                };
            }
            ControlCode::ChangeDurationType => {
                self.duration_type = match self.duration_type {
                    DurationType::Dynamic => DurationType::LongerLasting,
                    DurationType::LongerLasting => DurationType::Dynamic,
                };
            }
            ControlCode::SetDiversion => self.diversion_advised = true,
            ControlCode::IncreaseExtentBy8 => self.extent += 8,
            ControlCode::IncreaseExtentBy16 => self.extent += 16,
        }
    }

    fn insert_quantifier(&mut self, value: u16, size: u32) {
        let Some(&last_event) = self.events.last() else { return };
        let index = self.events.len() - 1;

        let last = event(last_event);
        let matches_size = last.quantifier_type.map(quantifier_size) == Some(size);

        if !self.quantifiers.contains_key(&index) && last.allows_quantifier && matches_size {
            self.quantifiers.insert(index, value);
        }
    }

    fn clear_parts(&mut self) {
        for part in self.parts.iter_mut() {
            part.is_received = false;
        }
        self.continuity_index = 0;
    }

    /// A hierarchical representation of the message, reflecting the JSON end result.
    pub fn to_tree(&self) -> Value {
        let mut element = Value::Null;

        if !self.is_complete || self.events.is_empty() {
            return element;
        }

        for &code in &self.events {
            tree::push(&mut element, &["event_codes"], code);
        }
        for &code in &self.supplementary {
            tree::push(&mut element, &["supplementary_codes"], code);
        }

        let mut sentences: Vec<String> = Vec::new();
        for (i, &code) in self.events.iter().enumerate() {
            if event_db::is_valid_event_code(code) {
                let this_event = event(code);
                let description = match self.quantifiers.get(&i) {
                    Some(&q) => description_with_quantifier(&this_event, q),
                    None => this_event.description.clone(),
                };
                sentences.push(ucfirst(&description));
            }
        }

        if event_db::is_valid_event_code(self.events[0]) {
            tree::set(&mut element, &["update_class"], event(self.events[0]).update_class);
        }

        for &code in &self.supplementary {
            if event_db::is_valid_supplementary_code(code) {
                sentences.push(ucfirst(&event_db::supplementary_description(code)));
            }
        }

        if !sentences.is_empty() {
            tree::set(&mut element, &["description"], sentences.join(". ") + ".");
        }

        if let Some(speed_limit) = self.speed_limit {
            tree::set(&mut element, &["speed_limit"], format!("{} km/h", speed_limit));
        }

        for &code in &self.diversion {
            tree::push(&mut element, &["diversion_route"], code);
        }

        if self.was_encrypted {
            tree::set(&mut element, &["encrypted_location"], self.encrypted_location);
        }

        if !self.is_encrypted {
            tree::set(&mut element, &["location"], self.location);
        }

        tree::set(
            &mut element,
            &["direction"],
            if self.directionality == EventDirectionality::Single { "single" } else { "both" },
        );

        let extent_sign = if self.direction == Direction::Negative { "-" } else { "+" };
        tree::set(&mut element, &["extent"], format!("{}{}", extent_sign, self.extent));

        if let Some(starts) = self.time_starts {
            tree::set(&mut element, &["starts"], time_string(starts));
        }
        if let Some(until) = self.time_until {
            tree::set(&mut element, &["until"], time_string(until));
        }

        tree::set(&mut element, &["urgency"], event_db::urgency_string(self.urgency));

        element
    }

    /// Decrypts the location code with the service key (ISO 14819-6).
    pub fn decrypt(&mut self, key: ServiceKey) {
        if !self.is_encrypted {
            return;
        }

        self.location =
            (self.encrypted_location ^ (key.xorval << key.xorstart)).rotate_left(u32::from(key.nrot));
        self.is_encrypted = false;
    }
}
