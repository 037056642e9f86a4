// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoders for the standard RDS group types. Each decoder reads the group's information
//! words and writes named fields into the output record.

pub mod oda;

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use sideband_core::tree;
use sideband_core::units::{AltFreqList, Band, CarrierFrequency};
use sideband_core::util::bits::{get_bits, get_bits_u32, get_bool, get_u8};
use sideband_core::util::fmt::{hex_string, hours_minutes_string, prefixed_hex_string, rtrim};

use crate::group::{BlockNumber::*, Group, Version};
use crate::rft::{ChunkCrc, RftFile};
use crate::tables;
use crate::text::{ProgramServiceName, PtyName, RadioText, RdsString};

/// State from the slow labelling codes of group 1A.
#[derive(Clone, Debug, Default)]
pub struct SlowLabelingCodes {
    pub pin: u16,
    pub ecc: u8,
    pub cc: u16,
    pub tmc_id: u16,
    pub linkage_la: bool,
    pub has_country: bool,
}

/// Programme Item Number (IEC 62106:2015, section 6.1.5.2).
/// Returns false if the fields are out of range.
pub fn decode_pin(pin: u16, tree: &mut Value) -> bool {
    let day = get_bits(pin, 11, 5);
    let hour = get_bits(pin, 6, 5);
    let minute = get_bits(pin, 0, 6);

    if day >= 1 && hour <= 24 && minute <= 59 {
        tree::set(tree, &["prog_item_number"], pin);
        tree::set(tree, &["prog_item_started", "day"], day);
        tree::set(
            tree,
            &["prog_item_started", "time"],
            hours_minutes_string(u32::from(hour), u32::from(minute)),
        );
        true
    }
    else {
        false
    }
}

/// Basic information common to (almost) all groups.
pub fn decode_basics(group: &Group, tree: &mut Value, rbds: bool) {
    if group.group_type().version == Version::C {
        tree::set(tree, &["group"], "C");
    }
    else if group.has(Block2) {
        let pty = get_bits(group.get(Block2), 5, 5);

        if group.has_type() {
            tree::set(tree, &["group"], group.group_type().as_display_string());
        }

        tree::set(tree, &["tp"], get_bool(group.get(Block2), 10));
        tree::set(
            tree,
            &["prog_type"],
            if rbds { tables::pty_name_rbds(pty) } else { tables::pty_name(pty) },
        );
    }
    else if group.group_type().number == 15
        && group.group_type().version == Version::B
        && group.has(Block4)
    {
        // 15B repeats block 2 in block 4
        let pty = get_bits(group.get(Block4), 5, 5);

        tree::set(tree, &["group"], group.group_type().as_display_string());
        tree::set(tree, &["tp"], get_bool(group.get(Block4), 10));
        tree::set(
            tree,
            &["prog_type"],
            if rbds { tables::pty_name_rbds(pty) } else { tables::pty_name(pty) },
        );
    }
}

// Method B AF lists come in pairs that contain the tuned frequency; the other one is either
// an alternative (pair in ascending order) or a regional variant (descending).
fn decode_af_method_b(raw_khz: &[i32], tree: &mut Value) {
    let tuned_frequency = raw_khz[0];

    let mut alternative_frequencies = Vec::new();
    let mut unique_alternatives = HashSet::new();
    let mut regional_variants = Vec::new();
    let mut unique_regionals = HashSet::new();

    for pair in raw_khz[1..].chunks_exact(2) {
        let (freq1, freq2) = (pair[0], pair[1]);
        let non_tuned = if freq1 == tuned_frequency { freq2 } else { freq1 };

        if freq1 < freq2 {
            alternative_frequencies.push(non_tuned);
            unique_alternatives.insert(non_tuned);
        }
        else {
            regional_variants.push(non_tuned);
            unique_regionals.insert(non_tuned);
        }
    }

    // In noisy conditions many 0A groups are missed; this catches lists that contain
    // multiple copies of some frequencies.
    let expected_number_of_afs = raw_khz.len() / 2;
    let number_of_unique_afs = unique_alternatives.len() + unique_regionals.len();
    if number_of_unique_afs != expected_number_of_afs {
        return;
    }

    tree::set(tree, &["alt_frequencies_b", "tuned_frequency"], tuned_frequency);
    for frequency in alternative_frequencies {
        tree::push(tree, &["alt_frequencies_b", "same_programme"], frequency);
    }
    for frequency in regional_variants {
        tree::push(tree, &["alt_frequencies_b", "regional_variants"], frequency);
    }
}

/// Group 0: Basic tuning and switching information.
pub fn decode_type0(
    group: &Group,
    tree: &mut Value,
    alt_freq_list: &mut AltFreqList,
    ps: &mut ProgramServiceName,
    show_partial: bool,
) {
    // Block 2: Flags
    let segment_address = get_bits(group.get(Block2), 0, 2);
    let is_di = get_bool(group.get(Block2), 2);
    tree::set(tree, &["di", tables::di_code_string(segment_address)], is_di);
    tree::set(tree, &["ta"], get_bool(group.get(Block2), 4));
    tree::set(tree, &["is_music"], get_bool(group.get(Block2), 3));

    if !group.has(Block3) {
        // Reset a Method B list to prevent mixing up different lists
        if alt_freq_list.is_method_b() {
            alt_freq_list.clear();
        }
        return;
    }

    if group.group_type().version == Version::A {
        // Block 3: Alternative frequencies
        alt_freq_list.insert(get_u8(group.get(Block3), 8));
        alt_freq_list.insert(get_u8(group.get(Block3), 0));

        if alt_freq_list.is_complete() {
            if alt_freq_list.is_method_b() {
                decode_af_method_b(alt_freq_list.raw_list(), tree);
            }
            else {
                // AF Method A is a simple list
                for &frequency in alt_freq_list.raw_list() {
                    tree::push(tree, &["alt_frequencies_a"], frequency);
                }
            }

            alt_freq_list.clear();
        }
        else if show_partial {
            // The raw list, without attempting to deduce whether it's Method A or B
            for &frequency in alt_freq_list.raw_list() {
                tree::push(tree, &["partial_alt_frequencies"], frequency);
            }
        }
    }
    else {
        // 0B: Block 3 repeats the PI
        tree::set(tree, &["alt_pi"], prefixed_hex_string(u32::from(group.get(Block3)), 4));
    }

    if !group.has(Block4) {
        return;
    }

    // Block 4: Programme Service name
    ps.update(
        usize::from(segment_address) * 2,
        get_u8(group.get(Block4), 8),
        get_u8(group.get(Block4), 0),
    );

    if ps.text.is_complete() {
        tree::set(tree, &["ps"], ps.text.last_complete_string());
    }
    else if show_partial {
        match ps.text.decode() {
            Ok(text) => tree::set(tree, &["partial_ps"], text),
            Err(err) => tree::push(tree, &["debug"], err.to_string()),
        }
    }
}

/// Group 1: Programme Item Number and slow labelling codes.
pub fn decode_type1(group: &Group, tree: &mut Value, slc: &mut SlowLabelingCodes, pi: u16) {
    if !(group.has(Block3) && group.has(Block4)) {
        return;
    }

    slc.pin = group.get(Block4);

    if slc.pin != 0x0000 && !decode_pin(slc.pin, tree) {
        tree::push(tree, &["debug"], "invalid PIN");
    }

    if group.group_type().version != Version::A {
        return;
    }

    slc.linkage_la = get_bool(group.get(Block3), 15);
    tree::set(tree, &["has_linkage"], slc.linkage_la);

    let slow_label_variant = get_bits(group.get(Block3), 12, 3);

    match slow_label_variant {
        0 => {
            slc.ecc = get_u8(group.get(Block3), 0);
            slc.cc = get_bits(pi, 12, 4);

            if slc.ecc != 0x00 {
                slc.has_country = true;
                tree::set(
                    tree,
                    &["country"],
                    tables::country_string(slc.cc, u16::from(slc.ecc)),
                );
            }
        }

        1 => {
            slc.tmc_id = get_bits(group.get(Block3), 0, 12);
            tree::set(tree, &["tmc_id"], slc.tmc_id);
        }

        // Pager is not implemented
        2 => (),

        3 => {
            tree::set(
                tree,
                &["language"],
                tables::language_string(u16::from(get_u8(group.get(Block3), 0))),
            );
        }

        // SLC variants 4, 5 are not assigned

        6 => {
            tree::set(
                tree,
                &["slc_broadcaster_bits"],
                format!("0x{}", hex_string(u32::from(get_bits(group.get(Block3), 0, 11)), 3)),
            );
        }

        7 => tree::set(tree, &["ews"], get_bits(group.get(Block3), 0, 12)),

        _ => {
            tree::push(tree, &["debug"], format!("TODO: SLC variant {}", slow_label_variant));
        }
    }
}

/// Group 2: RadioText.
///
/// At least three length-signalling practices are seen in the wild: a 0x0D terminator
/// (method A), padding to the full 64 characters (method B), and neither, with the length
/// confirmed only by repetition (method C).
pub fn decode_type2(group: &Group, tree: &mut Value, radiotext: &mut RadioText, show_partial: bool) {
    if !(group.has(Block3) && group.has(Block4)) {
        return;
    }

    let is_version_a = group.group_type().version == Version::A;
    let radiotext_position =
        usize::from(get_bits(group.get(Block2), 0, 4)) * (if is_version_a { 4 } else { 2 });

    let ab = get_bool(group.get(Block2), 4);
    let is_ab_changed = radiotext.is_ab_changed(ab);

    if show_partial {
        tree::set(tree, &["rt_ab"], if ab { "B" } else { "A" });
    }

    // If these heuristics match, it's possible that we just received a full random-length
    // message with no string terminator (method C).
    let mut potentially_complete_message = String::new();
    let mut has_potentially_complete_message = radiotext_position == 0
        && radiotext.text.received_length() > 1
        && !radiotext.text.is_complete()
        && !radiotext.text.has_previously_received_terminators();

    if has_potentially_complete_message {
        match radiotext.text.decode() {
            Ok(text) => potentially_complete_message = rtrim(&text).to_string(),
            Err(err) => {
                tree::push(tree, &["debug"], err.to_string());
                return;
            }
        }

        // Perhaps the terminator was just lost in noise, or the message got interrupted by
        // an A/B change. Wait for a repeat.
        if potentially_complete_message != radiotext.previous_potentially_complete_message {
            has_potentially_complete_message = false;
        }
        radiotext.previous_potentially_complete_message = potentially_complete_message.clone();
    }

    // The transmitter requests a buffer clear (message contents will change).
    // This is sometimes overused in the wild.
    if is_ab_changed {
        radiotext.text.clear();
    }

    if is_version_a {
        radiotext.text.resize(64);
        radiotext.update(
            radiotext_position,
            get_u8(group.get(Block3), 8),
            get_u8(group.get(Block3), 0),
        );
    }
    else {
        radiotext.text.resize(32);
    }

    radiotext.update(
        radiotext_position + if is_version_a { 2 } else { 0 },
        get_u8(group.get(Block4), 8),
        get_u8(group.get(Block4), 0),
    );

    if radiotext.text.is_complete() {
        // The transmitter used method A or B to convey the length.
        tree::set(tree, &["radiotext"], rtrim(radiotext.text.last_complete_string()));
    }
    else if has_potentially_complete_message {
        // Method C was used instead, and was confirmed by a repeat.
        tree::set(tree, &["radiotext"], potentially_complete_message);
    }
    else if show_partial {
        // The string is not complete yet, but the user wants to see it anyway.
        match radiotext.text.decode() {
            Ok(text) => {
                if !rtrim(&text).is_empty() {
                    tree::set(tree, &["partial_radiotext"], text);
                }
            }
            Err(err) => tree::push(tree, &["debug"], err.to_string()),
        }
    }
}

// Modified Julian Date to calendar date, per the conversion in IEC 62106 Annex G.
fn mjd_to_ymd(mjd: i64) -> (i64, i64, i64) {
    let mjd = mjd as f64;
    let mut year = ((mjd - 15_078.2) / 365.25).trunc();
    let mut month = ((mjd - 14_956.1 - (year * 365.25).trunc()) / 30.6001).trunc();
    let day = (mjd - 14_956.0 - (year * 365.25).trunc() - (month * 30.6001).trunc()).trunc();
    if month == 14.0 || month == 15.0 {
        year += 1.0;
        month -= 12.0;
    }

    (year as i64 + 1900, month as i64 - 1, day as i64)
}

/// Group 4A: Clock-time and date.
pub fn decode_type4a(group: &Group, tree: &mut Value) {
    if !(group.has(Block3) && group.has(Block4)) {
        return;
    }

    let modified_julian_date =
        i64::from(get_bits_u32(group.get(Block2), group.get(Block3), 1, 17));

    // Would result in negative years/months
    if modified_julian_date < 15_079 {
        tree::push(tree, &["debug"], "invalid date/time");
        return;
    }

    let hour_utc = get_bits_u32(group.get(Block3), group.get(Block4), 12, 5) as i64;
    let minute_utc = i64::from(get_bits(group.get(Block4), 6, 6));

    let offset_half_hours = (if get_bool(group.get(Block4), 5) { -1i64 } else { 1 })
        * i64::from(get_bits(group.get(Block4), 0, 5));

    let is_date_valid = hour_utc <= 23 && minute_utc <= 59 && offset_half_hours.abs() / 2 <= 14;
    if !is_date_valid {
        tree::push(tree, &["debug"], "invalid date/time");
        return;
    }

    // Apply the local offset, carrying over midnight into the date.
    let total_minutes = hour_utc * 60 + minute_utc + offset_half_hours * 30;
    let local_minutes = total_minutes.rem_euclid(24 * 60);
    let day_shift = total_minutes.div_euclid(24 * 60);

    let (year, month, day) = mjd_to_ymd(modified_julian_date + day_shift);

    let offset_suffix = if offset_half_hours == 0 {
        "Z".to_string()
    }
    else {
        format!(
            "{}{:02}:{:02}",
            if offset_half_hours > 0 { "+" } else { "-" },
            offset_half_hours.abs() / 2,
            (offset_half_hours.abs() % 2) * 30
        )
    };

    tree::set(
        tree,
        &["clock_time"],
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:00{}",
            year,
            month,
            day,
            local_minutes / 60,
            local_minutes % 60,
            offset_suffix
        ),
    );
}

/// Group 5: Transparent data channels.
pub fn decode_type5(group: &Group, tree: &mut Value, full_tdc: &mut RdsString) {
    let address = get_bits(group.get(Block2), 0, 5);
    tree::set(tree, &["transparent_data", "address"], address);

    if group.group_type().version == Version::A {
        let data = [
            get_u8(group.get(Block3), 8),
            get_u8(group.get(Block3), 0),
            get_u8(group.get(Block4), 8),
            get_u8(group.get(Block4), 0),
        ];

        let raw: Vec<String> =
            data.iter().map(|&b| hex_string(u32::from(b), 2)).collect();
        tree::set(tree, &["transparent_data", "raw"], raw.join(" "));

        let mut decoded_text = RdsString::new(4);
        decoded_text.set_pair(0, data[0], data[1]);
        decoded_text.set_pair(2, data[2], data[3]);

        let address = usize::from(address);
        full_tdc.set_pair(address * 4, data[0], data[1]);
        full_tdc.set_pair(address * 4 + 2, data[2], data[3]);
        if full_tdc.is_complete() {
            if let Ok(text) = full_tdc.decode() {
                tree::set(tree, &["transparent_data", "full_text"], text);
            }

            let full_raw: Vec<String> =
                full_tdc.data().iter().map(|&b| hex_string(u32::from(b), 2)).collect();
            tree::set(tree, &["transparent_data", "full_raw"], full_raw.join(" "));
        }

        if let Ok(text) = decoded_text.decode() {
            tree::set(tree, &["transparent_data", "as_text"], text);
        }
    }
    else {
        let data = [get_u8(group.get(Block4), 8), get_u8(group.get(Block4), 0)];

        let raw: Vec<String> =
            data.iter().map(|&b| hex_string(u32::from(b), 2)).collect();
        tree::set(tree, &["transparent_data", "raw"], raw.join(" "));

        let mut decoded_text = RdsString::new(2);
        decoded_text.set_pair(0, data[0], data[1]);
        if let Ok(text) = decoded_text.decode() {
            tree::set(tree, &["transparent_data", "as_text"], text);
        }
    }
}

/// Group 6: In-house applications, printed as raw integers.
pub fn decode_type6(group: &Group, tree: &mut Value) {
    tree::push(tree, &["in_house_data"], get_bits(group.get(Block2), 0, 5));

    if group.group_type().version == Version::A {
        if group.has(Block3) {
            tree::push(tree, &["in_house_data"], group.get(Block3));
            if group.has(Block4) {
                tree::push(tree, &["in_house_data"], group.get(Block4));
            }
        }
    }
    else if group.has(Block4) {
        tree::push(tree, &["in_house_data"], group.get(Block4));
    }
}

/// Group 7A: Radio paging.
pub fn decode_type7a(_group: &Group, tree: &mut Value) {
    tree::push(tree, &["debug"], "TODO: 7A");
}

/// Group 9A: Emergency warning systems.
pub fn decode_type9a(_group: &Group, tree: &mut Value) {
    tree::push(tree, &["debug"], "TODO: 9A");
}

/// Group 10A: Programme Type Name.
pub fn decode_type10a(group: &Group, tree: &mut Value, ptyname: &mut PtyName) {
    if !group.has(Block3) || !group.has(Block4) {
        return;
    }

    let segment_address = get_bits(group.get(Block2), 0, 1);

    if ptyname.is_ab_changed(get_bool(group.get(Block2), 4)) {
        ptyname.text.clear();
    }

    ptyname.update(
        usize::from(segment_address) * 4,
        [
            get_u8(group.get(Block3), 8),
            get_u8(group.get(Block3), 0),
            get_u8(group.get(Block4), 8),
            get_u8(group.get(Block4), 0),
        ],
    );

    if ptyname.text.is_complete() {
        tree::set(tree, &["pty_name"], ptyname.text.last_complete_string());
    }
}

/// Group 14: Enhanced Other Networks information.
pub fn decode_type14(
    group: &Group,
    tree: &mut Value,
    eon_ps_names: &mut HashMap<u16, RdsString>,
    eon_alt_freqs: &mut HashMap<u16, AltFreqList>,
    rbds: bool,
) {
    if !group.has(Block4) {
        return;
    }

    let on_pi = group.get(Block4);
    tree::set(tree, &["other_network", "pi"], prefixed_hex_string(u32::from(on_pi), 4));
    tree::set(tree, &["other_network", "tp"], get_bool(group.get(Block2), 4));

    if group.group_type().version == Version::B {
        tree::set(tree, &["other_network", "ta"], get_bool(group.get(Block2), 3));
        return;
    }

    if !group.has(Block3) {
        return;
    }

    let eon_variant = get_bits(group.get(Block2), 0, 4);
    match eon_variant {
        0..=3 => {
            let ps_name = eon_ps_names.entry(on_pi).or_insert_with(|| RdsString::new(8));

            ps_name.set(2 * usize::from(eon_variant), get_u8(group.get(Block3), 8));
            ps_name.set(2 * usize::from(eon_variant) + 1, get_u8(group.get(Block3), 0));

            if ps_name.is_complete() {
                tree::set(tree, &["other_network", "ps"], ps_name.last_complete_string());
            }
        }

        4 => {
            let list = eon_alt_freqs.entry(on_pi).or_default();

            list.insert(get_u8(group.get(Block3), 8));
            list.insert(get_u8(group.get(Block3), 0));

            if list.is_complete() {
                for &frequency in list.raw_list() {
                    tree::push(tree, &["other_network", "alt_frequencies"], frequency);
                }
                list.clear();
            }
        }

        5..=9 => {
            // Mapped frequency pair: the non-tuned frequency is in the low byte
            let freq_other =
                CarrierFrequency::new(u16::from(get_u8(group.get(Block3), 0)), Band::Fm);

            if freq_other.is_valid() {
                tree::set(tree, &["other_network", "kilohertz"], freq_other.khz());
            }
        }

        // 10, 11 unallocated

        12 => {
            let has_linkage = get_bool(group.get(Block3), 15);
            let lsn = get_bits(group.get(Block3), 0, 12);
            tree::set(tree, &["other_network", "has_linkage"], has_linkage);
            if has_linkage && lsn != 0 {
                tree::set(tree, &["other_network", "linkage_set"], lsn);
            }
        }

        13 => {
            let pty = get_bits(group.get(Block3), 11, 5);
            let ta = get_bool(group.get(Block3), 0);
            tree::set(
                tree,
                &["other_network", "prog_type"],
                if rbds { tables::pty_name_rbds(pty) } else { tables::pty_name(pty) },
            );
            tree::set(tree, &["other_network", "ta"], ta);
        }

        14 => {
            let pin = group.get(Block3);
            if pin != 0x0000 {
                decode_pin(pin, tree::node(tree, &["other_network"]));
            }
        }

        15 => {
            tree::set(
                tree,
                &["other_network", "broadcaster_data"],
                hex_string(u32::from(group.get(Block3)), 4),
            );
        }

        _ => {
            tree::push(tree, &["debug"], format!("TODO: EON variant {}", eon_variant));
        }
    }
}

/// Group 15A: Long PS.
pub fn decode_type15a(
    group: &Group,
    tree: &mut Value,
    long_ps: &mut crate::text::LongPs,
    show_partial: bool,
) {
    let segment_address = usize::from(get_bits(group.get(Block2), 0, 3));

    if group.has(Block3) {
        long_ps.update(segment_address * 4, get_u8(group.get(Block3), 8), get_u8(group.get(Block3), 0));
    }
    if group.has(Block4) {
        long_ps.update(
            segment_address * 4 + 2,
            get_u8(group.get(Block4), 8),
            get_u8(group.get(Block4), 0),
        );
    }

    if (group.has(Block3) || group.has(Block4)) && long_ps.text.is_complete() {
        tree::set(tree, &["long_ps"], rtrim(long_ps.text.last_complete_string()));
    }
    else if show_partial {
        match long_ps.text.decode() {
            Ok(text) => tree::set(tree, &["partial_long_ps"], text),
            Err(err) => tree::push(tree, &["debug"], err.to_string()),
        }
    }
}

/// Group 15B: Fast basic tuning and switching information.
pub fn decode_type15b(group: &Group, tree: &mut Value) {
    let block_num = if group.has(Block2) { Block2 } else { Block4 };
    let segment_address = get_bits(group.get(Block2), 0, 2);
    let is_di = get_bool(group.get(Block2), 2);

    tree::set(tree, &["di", tables::di_code_string(segment_address)], is_di);
    tree::set(tree, &["ta"], get_bool(group.get(block_num), 4));
    tree::set(tree, &["is_music"], get_bool(group.get(block_num), 3));
}

// RFT file data carried in a type C group (IEC 62106-2, page 82).
fn decode_c_rft_data(
    group: &Group,
    tree: &mut Value,
    oda_app_for_pipe: &HashMap<u16, u16>,
    rft_files: &mut [RftFile; 16],
    fn_field: u16,
) {
    let pipe = fn_field & 0b1111;
    let toggle_bit = get_bits(group.get(Block1), 7, 1);
    let segment_address = get_bits_u32(group.get(Block1), group.get(Block2), 8, 15);

    if let Some(&aid) = oda_app_for_pipe.get(&pipe) {
        tree::set(tree, &["open_data_app", "app_name"], tables::app_name(aid));
    }
    tree::set(tree, &["rft", "data", "pipe"], pipe);
    tree::set(tree, &["rft", "data", "toggle"], toggle_bit);
    tree::set(tree, &["rft", "data", "byte_address"], segment_address * 5);

    let file = &mut rft_files[usize::from(pipe)];
    file.receive(toggle_bit, segment_address, group.get(Block2), group.get(Block3), group.get(Block4));

    for byte in [
        get_u8(group.get(Block2), 0),
        get_u8(group.get(Block3), 8),
        get_u8(group.get(Block3), 0),
        get_u8(group.get(Block4), 8),
        get_u8(group.get(Block4), 0),
    ] {
        tree::push(tree, &["rft", "data", "segment_data"], byte);
    }

    // The file is emitted exactly once; the latch only resets on a toggle change.
    if file.has_new_complete_file() {
        tree::set(tree, &["rft", "data", "file_contents"], file.base64_data());
    }
}

// AID and channel number assignment for group type C ODAs (IEC 62106-2, page 48), with the
// RFT file descriptor variants (page 79).
fn decode_c_oda_assignment(
    group: &Group,
    tree: &mut Value,
    oda_app_for_pipe: &mut HashMap<u16, u16>,
    rft_files: &mut [RftFile; 16],
) {
    let assignment_method = get_bits(group.get(Block1), 6, 2) + 1;
    let channel_id = get_bits(group.get(Block1), 0, 6);

    if assignment_method != 1 {
        tree::push(tree, &["debug"], format!("TODO: assignment method {}", assignment_method));
        return;
    }

    tree::set(tree, &["open_data_app", "channel"], channel_id);
    tree::set(tree, &["open_data_app", "oda_aid"], group.get(Block2));
    tree::set(tree, &["open_data_app", "app_name"], tables::app_name(group.get(Block2)));
    oda_app_for_pipe.insert(channel_id, group.get(Block2));

    // Channels 0-15 carry RFT
    if channel_id >= 16 {
        for byte in [
            get_u8(group.get(Block3), 8),
            get_u8(group.get(Block3), 0),
            get_u8(group.get(Block4), 8),
            get_u8(group.get(Block4), 0),
        ] {
            tree::push(tree, &["open_data_app", "app_data"], byte);
        }
        return;
    }

    let variant = get_bits(group.get(Block3), 12, 4);
    let file = &mut rft_files[usize::from(channel_id)];

    if variant == 0 {
        let crc_flag = get_bool(group.get(Block3), 11);
        let file_version = get_bits(group.get(Block3), 8, 3);
        let file_identification = get_bits(group.get(Block3), 2, 6);
        let file_size_bytes = get_bits_u32(group.get(Block3), group.get(Block4), 0, 18);

        file.set_size(file_size_bytes);
        file.set_crc_flag(crc_flag);

        tree::set(tree, &["rft", "file_info", "version"], file_version);
        tree::set(tree, &["rft", "file_info", "id"], file_identification);
        tree::set(tree, &["rft", "file_info", "size"], file_size_bytes);
        tree::set(tree, &["rft", "file_info", "has_crc"], crc_flag);
    }
    else if variant == 1 {
        // CRC (page 80)
        let crc_mode = get_bits(group.get(Block3), 9, 3);
        let chunk_address = get_bits(group.get(Block3), 0, 9);
        let crc = group.get(Block4);

        let chunk_crc =
            ChunkCrc { mode: crc_mode, address_raw: chunk_address, crc, received: false };
        file.receive_crc(chunk_crc);

        match crc_mode {
            0 => tree::set(tree, &["rft", "crc_info", "file_crc16"], crc),
            1..=5 | 7 => {
                tree::set(tree, &["rft", "crc_info", "chunk_crc16"], crc);
                tree::set(tree, &["rft", "crc_info", "chunk_address"], chunk_address);
                tree::set(tree, &["rft", "crc_info", "crc_mode"], crc_mode);
            }
            _ => tree::push(tree, &["debug"], format!("TODO: CRC mode {}", crc_mode)),
        }
    }
    else if variant >= 8 {
        // 8..15: Non-file-related ODA data
        tree::set(
            tree,
            &["open_data_app", "non_file_oda_data"],
            hex_string(get_bits_u32(group.get(Block3), group.get(Block4), 0, 28), 7),
        );
    }
    else {
        // File-related ODA data
        tree::set(
            tree,
            &["open_data_app", "file_oda_data"],
            hex_string(get_bits_u32(group.get(Block3), group.get(Block4), 0, 28), 7),
        );
    }
}

/// Type C groups, only transmitted on RDS2 data streams 1-3.
pub fn decode_c(
    group: &Group,
    tree: &mut Value,
    oda_app_for_pipe: &mut HashMap<u16, u16>,
    rft_files: &mut [RftFile; 16],
) {
    if !(group.has(Block1) && group.has(Block2) && group.has(Block3) && group.has(Block4)) {
        return;
    }

    let fid = get_bits(group.get(Block1), 14, 2);
    let fn_field = get_bits(group.get(Block1), 8, 6);

    if fid == 0 && fn_field == 0 {
        // Page 47: Legacy type A & B transmission
        tree::push(tree, &["debug"], "TODO: Tunnelling A & B over type C");
    }
    else if fid == 0 && (fn_field & 0b11_0000) == 0b10_0000 {
        decode_c_rft_data(group, tree, oda_app_for_pipe, rft_files, fn_field);
    }
    else if fid == 1 {
        // Page 47: Group type C ODA channel; channels 0-15 are reserved for additional data
        tree::set(tree, &["open_data_app", "channel"], fn_field);
        for byte in [
            get_u8(group.get(Block1), 0),
            get_u8(group.get(Block2), 8),
            get_u8(group.get(Block2), 0),
            get_u8(group.get(Block3), 8),
            get_u8(group.get(Block3), 0),
            get_u8(group.get(Block4), 8),
            get_u8(group.get(Block4), 0),
        ] {
            tree::push(tree, &["open_data_app", "app_data"], byte);
        }
    }
    else if fid == 0b10 && fn_field == 0 {
        decode_c_oda_assignment(group, tree, oda_app_for_pipe, rft_files);
    }
    else {
        tree::push(tree, &["debug"], format!("TODO: FID {} FN {}", fid, fn_field));
        for byte in [
            get_u8(group.get(Block2), 8),
            get_u8(group.get(Block2), 0),
            get_u8(group.get(Block3), 8),
            get_u8(group.get(Block3), 0),
            get_u8(group.get(Block4), 8),
            get_u8(group.get(Block4), 0),
        ] {
            tree::push(tree, &["open_data_app", "data"], byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_mjd_conversion() {
        assert_eq!(mjd_to_ymd(57_847), (2017, 4, 4));
        assert_eq!(mjd_to_ymd(58_423), (2018, 11, 1));
        assert_eq!(mjd_to_ymd(59_080), (2020, 8, 19));
        assert_eq!(mjd_to_ymd(59_724), (2022, 5, 25));
        assert_eq!(mjd_to_ymd(59_725), (2022, 5, 26));
    }

    #[test]
    fn verify_pin_validation() {
        let mut tree = Value::Null;
        // Day 15, 17:20
        assert!(decode_pin(0x7C54, &mut tree));
        assert_eq!(tree["prog_item_number"], 31_828);
        assert_eq!(tree["prog_item_started"]["day"], 15);
        assert_eq!(tree["prog_item_started"]["time"], "17:20");

        // Day 0 is invalid
        let mut tree = Value::Null;
        assert!(!decode_pin(0x02C4, &mut tree));
    }
}
