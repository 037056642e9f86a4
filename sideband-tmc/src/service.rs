// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-station TMC service state machine: system groups announce the service, user
//! groups carry tuning information and the actual event messages.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::{Lazy, OnceCell};
use serde_json::Value;

use sideband_core::text::RdsString;
use sideband_core::tree;
use sideband_core::units::AltFreqList;
use sideband_core::util::bits::{get_bits, get_bool, get_u8};
use sideband_core::util::fmt::prefixed_hex_string;

use crate::csv;
use crate::location_db::{self, LocationDatabase};
use crate::message::{Message, ServiceKey};

static LOCATION_DATABASES: OnceCell<HashMap<u16, LocationDatabase>> = OnceCell::new();

// Decryption keys are not distributed with the decoder; they can be supplied in a local
// table keyed by encryption id.
static SERVICE_KEY_TABLE: Lazy<HashMap<u16, ServiceKey>> = Lazy::new(|| {
    let mut result = HashMap::new();

    for row in csv::read_csv(Path::new("service_key_table.csv"), ',') {
        if row.len() < 4 {
            continue;
        }
        let parse = |i: usize| row.get(i).and_then(|s| s.trim().parse::<u16>().ok());
        let (Some(encid), Some(xorval), Some(xorstart), Some(nrot)) =
            (parse(0), parse(1), parse(2), parse(3))
        else {
            continue;
        };

        result.insert(encid, ServiceKey { xorval, xorstart, nrot });
    }

    result
});

/// Loads the given location-table directories into the process-wide registry. Must be called
/// before the first TMC group is decoded; later calls have no effect. Returns one info
/// record per loaded table.
pub fn load_location_tables(directories: &[PathBuf]) -> Vec<Value> {
    let mut infos = Vec::new();

    let _ = LOCATION_DATABASES.get_or_init(|| {
        let mut databases = HashMap::new();
        for directory in directories {
            let ltn = location_db::read_ltn(directory);
            let database = location_db::load_location_database(directory);
            infos.push(database.info());
            databases.insert(ltn, database);
        }
        databases
    });

    infos
}

fn location_database(ltn: u16) -> Option<&'static LocationDatabase> {
    LOCATION_DATABASES.get()?.get(&ltn)
}

fn scope_strings(mgs: u16) -> Vec<&'static str> {
    let mut scope = Vec::new();
    if get_bool(mgs, 3) {
        scope.push("inter-road");
    }
    if get_bool(mgs, 2) {
        scope.push("national");
    }
    if get_bool(mgs, 1) {
        scope.push("regional");
    }
    if get_bool(mgs, 0) {
        scope.push("urban");
    }
    scope
}

// Resolve the location code against the loaded database and annotate the message record
// with coordinates and road names.
fn decode_location(message: &Message, ltn: u16, out: &mut Value) {
    let Some(db) = location_database(ltn) else { return };
    if db.ltn != ltn || db.ltn == 0 || !tree::contains(out, &["tmc", "message", "location"]) {
        return;
    }

    let lcd = message.location();
    let extent = message.extent();
    let is_positive = extent >= 0;

    if !db.points.contains_key(&lcd) {
        return;
    }

    let mut points = Vec::new();
    let mut points_left = extent.unsigned_abs() + 1;
    let mut this_lcd = lcd;
    while points_left > 0 {
        let Some(point) = db.points.get(&this_lcd) else { break };
        points.push(point);
        this_lcd = if is_positive { point.pos_off } else { point.neg_off };
        points_left -= 1;
    }

    for (i, point) in points.iter().enumerate() {
        let coordinates = tree::node(out, &["tmc", "message", "coordinates"]);
        if !coordinates.is_array() {
            *coordinates = Value::Array(Vec::new());
        }
        let list = coordinates.as_array_mut().unwrap();
        if list.len() <= i {
            list.resize(i + 1, Value::Null);
        }
        tree::set(&mut list[i], &["lat"], f64::from(point.lat));
        tree::set(&mut list[i], &["lon"], f64::from(point.lon));
    }

    if points.len() > 1 && !points[0].name1.is_empty() && !points[points.len() - 1].name1.is_empty()
    {
        tree::set(out, &["tmc", "message", "span_from"], points[0].name1.clone());
        tree::set(out, &["tmc", "message", "span_to"], points[points.len() - 1].name1.clone());
    }

    let roa_lcd = db.points[&lcd].roa_lcd;
    if let Some(road) = db.roads.get(&roa_lcd) {
        if !road.road_number.is_empty() {
            tree::set(out, &["tmc", "message", "road_number"], road.road_number.clone());
        }
        if !road.name.is_empty() {
            tree::set(out, &["tmc", "message", "road_name"], road.name.clone());
        }
        else if !db.points[&lcd].road_name.is_empty() {
            tree::set(out, &["tmc", "message", "road_name"], db.points[&lcd].road_name.clone());
        }
    }
}

/// TMC state for one tuned service.
#[derive(Debug)]
pub struct TmcService {
    is_initialized: bool,
    is_encrypted: bool,
    has_encid: bool,
    ltn: u16,
    sid: u16,
    encid: u16,
    ltcc: u16,
    message: Message,
    service_provider: RdsString,
    other_network_freqs: HashMap<u16, AltFreqList>,
    country_lookup: fn(u16, u16) -> &'static str,
}

impl TmcService {
    /// `country_lookup` maps (country code, extended country code) to an ISO country string;
    /// the caller supplies it so the static RDS tables stay outside this crate.
    pub fn new(country_lookup: fn(u16, u16) -> &'static str) -> Self {
        TmcService {
            is_initialized: false,
            is_encrypted: false,
            has_encid: false,
            ltn: 0,
            sid: 0,
            encid: 0,
            ltcc: 0,
            message: Message::new(false),
            service_provider: RdsString::new(8),
            other_network_freqs: HashMap::new(),
            country_lookup,
        }
    }

    /// Handles the ODA message bits of a type 3A group (ISO 14819-1, section 7.5).
    pub fn receive_system_group(&mut self, message: u16, out: &mut Value) {
        let variant = get_bits(message, 14, 2);

        match variant {
            0 => {
                self.is_initialized = true;
                let ltn = get_bits(message, 6, 6);

                self.is_encrypted = ltn == 0;
                tree::set(out, &["tmc", "system_info", "is_encrypted"], self.is_encrypted);

                if !self.is_encrypted {
                    self.ltn = ltn;
                    tree::set(out, &["tmc", "system_info", "location_table"], self.ltn);
                }

                let afi = get_bool(message, 5);
                let mgs = get_bits(message, 0, 4);

                tree::set(out, &["tmc", "system_info", "is_on_alt_freqs"], afi);

                for scope in scope_strings(mgs) {
                    tree::push(out, &["tmc", "system_info", "scope"], scope);
                }
            }
            1 => {
                self.sid = get_bits(message, 6, 6);
                tree::set(out, &["tmc", "system_info", "service_id"], self.sid);

                const GAP_VALUES: [i32; 4] = [3, 5, 8, 11];
                let g = get_bits(message, 12, 2);
                tree::set(out, &["tmc", "system_info", "gap"], GAP_VALUES[usize::from(g)]);

                self.ltcc = get_bits(message, 0, 4);
                if self.ltcc > 0 {
                    tree::set(out, &["tmc", "system_info", "ltcc"], self.ltcc);
                }
            }
            2 => {
                let ltecc = u16::from(get_u8(message, 0));
                if ltecc > 0 {
                    tree::set(out, &["tmc", "system_info", "ltecc"], ltecc);
                    if self.ltcc > 0 {
                        tree::set(
                            out,
                            &["tmc", "system_info", "country"],
                            (self.country_lookup)(self.ltcc, ltecc),
                        );
                    }
                }
            }
            _ => (),
        }
    }

    /// Handles a TMC user group: `x` is the low 5 bits of block 2, `y` and `z` are blocks
    /// 3 and 4.
    pub fn receive_user_group(&mut self, x: u16, y: u16, z: u16, out: &mut Value) {
        if !self.is_initialized {
            return;
        }

        let t = get_bool(x, 4);

        if get_bits(x, 0, 5) == 0x00 {
            // Encryption administration group
            self.sid = get_bits(y, 5, 6);
            self.encid = get_bits(y, 0, 5);
            self.ltn = get_bits(z, 10, 6);
            self.has_encid = true;

            tree::set(out, &["tmc", "system_info", "service_id"], self.sid);
            tree::set(out, &["tmc", "system_info", "encryption_id"], self.encid);
            tree::set(out, &["tmc", "system_info", "location_table"], self.ltn);
        }
        else if t {
            self.receive_tuning_group(x, y, z, out);
        }
        else {
            self.receive_user_message(x, y, z, out);
        }
    }

    fn receive_tuning_group(&mut self, x: u16, y: u16, z: u16, out: &mut Value) {
        let variant = get_bits(x, 0, 4);

        match variant {
            4 | 5 => {
                let pos = 4 * (usize::from(variant) - 4);

                self.service_provider.set(pos, get_u8(y, 8));
                self.service_provider.set(pos + 1, get_u8(y, 0));
                self.service_provider.set(pos + 2, get_u8(z, 8));
                self.service_provider.set(pos + 3, get_u8(z, 0));

                if self.service_provider.is_complete() {
                    tree::set(
                        out,
                        &["tmc", "service_provider"],
                        self.service_provider.last_complete_string(),
                    );
                }
            }

            6 => {
                let on_pi = z;
                let list = self.other_network_freqs.entry(on_pi).or_default();

                list.insert(get_u8(y, 8));
                list.insert(get_u8(y, 0));

                // The alternative frequencies are printed right away; some networks never
                // announce the total length of the list.
                tree::set(
                    out,
                    &["tmc", "other_network", "pi"],
                    prefixed_hex_string(u32::from(on_pi), 4),
                );
                for &frequency in self.other_network_freqs[&on_pi].raw_list() {
                    tree::push(out, &["tmc", "other_network", "frequencies_khz"], frequency);
                }
                self.other_network_freqs.clear();
            }

            8 => {
                if y == 0 || z == 0 || y == z {
                    tree::set(
                        out,
                        &["tmc", "other_network", "pi"],
                        prefixed_hex_string(u32::from(y), 4),
                    );
                }
                else {
                    for pi in [y, z] {
                        tree::push(
                            out,
                            &["tmc", "other_network", "pi_codes"],
                            prefixed_hex_string(u32::from(pi), 4),
                        );
                    }
                }
            }

            9 => {
                let on_pi = z;
                let on_sid = get_bits(y, 0, 6);
                let on_mgs = get_bits(y, 6, 4);
                let on_ltn = get_bits(y, 10, 6);

                tree::set(
                    out,
                    &["tmc", "other_network", "pi"],
                    prefixed_hex_string(u32::from(on_pi), 4),
                );
                tree::set(out, &["tmc", "other_network", "service_id"], on_sid);
                tree::set(out, &["tmc", "other_network", "location_table"], on_ltn);

                for scope in scope_strings(on_mgs) {
                    tree::push(out, &["tmc", "other_network", "scope"], scope);
                }
            }

            _ => {
                tree::push(
                    out,
                    &["debug"],
                    format!("TODO: TMC tuning info variant {}", variant),
                );
            }
        }
    }

    fn receive_user_message(&mut self, x: u16, y: u16, z: u16, out: &mut Value) {
        if self.is_encrypted && !self.has_encid {
            return;
        }

        let is_single_group = get_bool(x, 3);

        if is_single_group {
            let mut single_message = Message::new(self.is_encrypted);
            single_message.push_single(x, y, z);

            if self.is_encrypted {
                if let Some(&key) = SERVICE_KEY_TABLE.get(&self.encid) {
                    single_message.decrypt(key);
                }
            }

            let message_tree = single_message.to_tree();
            if !tree::is_empty(&message_tree) {
                *tree::node(out, &["tmc", "message"]) = message_tree;
                decode_location(&single_message, self.ltn, out);
            }
        }
        else {
            // Part of a multi-group message
            let continuity_index = get_bits(x, 0, 3);

            if continuity_index != self.message.continuity_index() {
                self.message = Message::new(self.is_encrypted);
            }

            self.message.push_multi(x, y, z);
            if self.message.is_complete() {
                if self.is_encrypted {
                    if let Some(&key) = SERVICE_KEY_TABLE.get(&self.encid) {
                        self.message.decrypt(key);
                    }
                }

                let message_tree = self.message.to_tree();
                if !tree::is_empty(&message_tree) {
                    *tree::node(out, &["tmc", "message"]) = message_tree;
                    decode_location(&self.message, self.ltn, out);
                }
                self.message = Message::new(self.is_encrypted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_country(_cc: u16, _ecc: u16) -> &'static str {
        "--"
    }

    #[test]
    fn verify_system_info() {
        let mut tmc = TmcService::new(no_country);
        let mut out = Value::Null;

        // DR P4 København: variant 0, location table 9
        tmc.receive_system_group(0x0267, &mut out);
        assert_eq!(out["tmc"]["system_info"]["is_encrypted"], false);
        assert_eq!(out["tmc"]["system_info"]["location_table"], 9);

        // Variant 1: service id 45, gap 5, ltcc 9
        let mut out = Value::Null;
        tmc.receive_system_group(0x5B49, &mut out);
        assert_eq!(out["tmc"]["system_info"]["service_id"], 45);
        assert_eq!(out["tmc"]["system_info"]["gap"], 5);
        assert_eq!(out["tmc"]["system_info"]["ltcc"], 9);
    }

    #[test]
    fn verify_single_group_user_message() {
        let mut tmc = TmcService::new(no_country);
        let mut out = Value::Null;
        tmc.receive_system_group(0x0267, &mut out);

        let mut out = Value::Null;
        tmc.receive_user_group(0x08, 0xC852, 9552, &mut out);
        assert_eq!(out["tmc"]["message"]["event_codes"][0], 82);
        assert_eq!(out["tmc"]["message"]["location"], 9552);
        assert_eq!(out["tmc"]["message"]["extent"], "-1");
    }

    #[test]
    fn verify_groups_ignored_before_system_group() {
        let mut tmc = TmcService::new(no_country);
        let mut out = Value::Null;
        tmc.receive_user_group(0x08, 0xC852, 9552, &mut out);
        assert!(tree::is_empty(&out));
    }

    #[test]
    fn verify_multi_group_user_message() {
        let mut tmc = TmcService::new(no_country);
        let mut out = Value::Null;
        tmc.receive_system_group(0x0064, &mut out);

        let mut out = Value::Null;
        tmc.receive_user_group(0x03, 0xC641, 0x8097, &mut out);
        assert!(tree::is_empty(&out));

        let mut out = Value::Null;
        tmc.receive_user_group(0x03, 0x441F, 0x4865, &mut out);
        assert_eq!(
            out["tmc"]["message"]["description"],
            "Delays of up to 15 minutes. Stationary traffic."
        );
    }
}
