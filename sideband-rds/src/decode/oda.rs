// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Open Data Applications: registration through group 3A and dispatch of the reassigned
//! groups (RT+, eRT, eRT+, TMC, DAB cross-referencing).

use std::collections::HashMap;

use serde_json::Value;

use sideband_core::tree;
use sideband_core::util::bits::{get_bits, get_bits_u32, get_bool, get_u8};
use sideband_core::util::fmt::{hex_string, prefixed_hex_string, rtrim};

use sideband_tmc::TmcService;

use crate::group::{BlockNumber::*, Group, GroupType, Version};
use crate::tables;
use crate::text::{Direction, Encoding, RadioText, Tag};

/// Group 3A: Application identification for Open Data.
pub fn decode_type3a(
    group: &Group,
    tree: &mut Value,
    oda_app_for_group: &mut HashMap<GroupType, u16>,
    radiotext: &mut RadioText,
    ert: &mut RadioText,
    tmc: &mut TmcService,
) {
    if !(group.has(Block3) && group.has(Block4)) {
        return;
    }

    if group.group_type().version != Version::A {
        return;
    }

    let oda_group_type = GroupType::from_code(get_bits(group.get(Block2), 0, 5));
    let oda_message = group.get(Block3);
    let oda_app_id = group.get(Block4);

    oda_app_for_group.insert(oda_group_type, oda_app_id);

    tree::set(tree, &["open_data_app", "oda_group"], oda_group_type.as_display_string());
    tree::set(tree, &["open_data_app", "app_name"], tables::app_name(oda_app_id));

    match oda_app_id {
        // DAB cross-referencing: message bits are not used
        0x0093 => (),

        // RT+
        0x4BD7 => {
            radiotext.plus.exists = true;
            radiotext.plus.cb = get_bool(oda_message, 12);
            radiotext.plus.scb = get_bits(oda_message, 8, 4);
            radiotext.plus.template_num = u16::from(get_u8(oda_message, 0));
        }

        // RT+ for Enhanced RadioText
        0x4BD8 => {
            ert.plus.exists = true;
            ert.plus.cb = get_bool(oda_message, 12);
            ert.plus.scb = get_bits(oda_message, 8, 4);
            ert.plus.template_num = u16::from(get_u8(oda_message, 0));
        }

        // Enhanced RadioText (eRT)
        0x6552 => {
            ert.text.set_encoding(if get_bool(oda_message, 0) {
                Encoding::Utf8
            }
            else {
                Encoding::Ucs2
            });
            ert.text.set_direction(if get_bool(oda_message, 1) {
                Direction::Rtl
            }
            else {
                Direction::Ltr
            });
            ert.uses_chartable_e3 = get_bits(oda_message, 2, 4) == 0;
        }

        // RDS-TMC
        0xCD46 | 0xCD47 => tmc.receive_system_group(oda_message, tree),

        _ => {
            tree::push(
                tree,
                &["debug"],
                format!("TODO: Unimplemented ODA app {}", hex_string(u32::from(oda_app_id), 4)),
            );
            tree::set(tree, &["open_data_app", "message"], oda_message);
        }
    }
}

fn raw_oda_data_string(group: &Group) -> String {
    format!(
        "{} {} {}",
        hex_string(u32::from(group.get(Block2) & 0b11111), 2),
        if group.has(Block3) { hex_string(u32::from(group.get(Block3)), 4) } else { "----".to_string() },
        if group.has(Block4) { hex_string(u32::from(group.get(Block4)), 4) } else { "----".to_string() },
    )
}

/// A group that was reassigned to an Open Data Application by a 3A group.
pub fn decode_oda_group(
    group: &Group,
    tree: &mut Value,
    oda_app_for_group: &HashMap<GroupType, u16>,
    radiotext: &mut RadioText,
    ert: &mut RadioText,
    tmc: &mut TmcService,
) {
    let Some(&oda_app_id) = oda_app_for_group.get(&group.group_type()) else {
        tree::set(tree, &["unknown_oda", "raw_data"], raw_oda_data_string(group));
        return;
    };

    match oda_app_id {
        // DAB cross-referencing
        0x0093 => decode_dab(group, tree),

        // RT+
        0x4BD7 => decode_radiotext_plus(group, radiotext, tree, "radiotext_plus"),

        // RT+ for Enhanced RadioText
        0x4BD8 => decode_radiotext_plus(group, ert, tree, "ert_plus"),

        // Enhanced RadioText (eRT)
        0x6552 => decode_enhanced_rt(group, tree, ert),

        // RDS-TMC
        0xCD46 | 0xCD47 => {
            if group.has(Block2) && group.has(Block3) && group.has(Block4) {
                tmc.receive_user_group(
                    get_bits(group.get(Block2), 0, 5),
                    group.get(Block3),
                    group.get(Block4),
                    tree,
                );
            }
        }

        _ => {
            tree::set(tree, &["unknown_oda", "app_id"], hex_string(u32::from(oda_app_id), 4));
            tree::set(tree, &["unknown_oda", "app_name"], tables::app_name(oda_app_id));
            tree::set(tree, &["unknown_oda", "raw_data"], raw_oda_data_string(group));
        }
    }
}

/// RadioText Plus: content-type tagging for RadioText.
pub fn decode_radiotext_plus(group: &Group, rt: &mut RadioText, tree: &mut Value, key: &str) {
    let item_toggle = get_bool(group.get(Block2), 4);
    let item_running = get_bool(group.get(Block2), 3);

    if item_toggle != rt.plus.toggle || item_running != rt.plus.item_running {
        rt.text.clear();
        rt.plus.toggle = item_toggle;
        rt.plus.item_running = item_running;
    }

    tree::set(tree, &[key, "item_running"], item_running);
    tree::set(tree, &[key, "item_toggle"], u32::from(item_toggle));

    let num_tags = if group.has(Block3) {
        if group.has(Block4) {
            2
        }
        else {
            1
        }
    }
    else {
        0
    };

    let mut tags: Vec<Tag> = Vec::with_capacity(num_tags);
    if num_tags > 0 {
        tags.push(Tag {
            content_type: get_bits_u32(group.get(Block2), group.get(Block3), 13, 6),
            start: get_bits(group.get(Block3), 7, 6),
            length: get_bits(group.get(Block3), 1, 6) + 1,
        });

        if num_tags == 2 {
            tags.push(Tag {
                content_type: get_bits_u32(group.get(Block3), group.get(Block4), 11, 6),
                start: get_bits(group.get(Block4), 5, 6),
                length: get_bits(group.get(Block4), 0, 5) + 1,
            });
        }
    }

    for tag in tags {
        let text =
            rt.text.last_complete_substring(usize::from(tag.start), usize::from(tag.length));

        if !text.is_empty() && tag.content_type != 0 {
            let mut tag_tree = Value::Null;
            tree::set(&mut tag_tree, &["content-type"], tables::rt_plus_content_type(tag.content_type));
            // Some encoders forget that the length field means additional length, so we trim
            tree::set(&mut tag_tree, &["data"], rtrim(&text));
            tree::push(tree, &[key, "tags"], tag_tree);
        }
    }
}

/// RDS2 Enhanced RadioText (eRT).
pub fn decode_enhanced_rt(group: &Group, tree: &mut Value, ert: &mut RadioText) {
    let position = usize::from(get_bits(group.get(Block2), 0, 5)) * 4;

    ert.update(position, get_u8(group.get(Block3), 8), get_u8(group.get(Block3), 0));

    if group.has(Block4) {
        ert.update(position + 2, get_u8(group.get(Block4), 8), get_u8(group.get(Block4), 0));
    }

    if ert.text.is_complete() {
        tree::set(tree, &["enhanced_radiotext"], rtrim(ert.text.last_complete_string()));
    }
}

/// DAB cross-referencing (ETSI EN 301 700 V1.1.1).
pub fn decode_dab(group: &Group, tree: &mut Value) {
    let es_flag = get_bool(group.get(Block2), 4);

    if es_flag {
        // Service table
        tree::push(tree, &["debug"], "TODO: DAB service table");
        return;
    }

    // Ensemble table
    let mode = get_bits(group.get(Block2), 2, 2);
    const MODES: [&str; 4] = ["unspecified", "I", "II or III", "IV"];
    tree::set(tree, &["dab", "mode"], MODES[usize::from(mode)]);

    let freq = 16 * get_bits_u32(group.get(Block2), group.get(Block3), 0, 18);
    tree::set(tree, &["dab", "kilohertz"], freq);

    if let Some(channel) = dab_channel_name(freq) {
        tree::set(tree, &["dab", "channel"], channel);
    }

    tree::set(tree, &["dab", "ensemble_id"], prefixed_hex_string(u32::from(group.get(Block4)), 4));
}

fn dab_channel_name(khz: u32) -> Option<&'static str> {
    let name = match khz {
        174_928 => "5A", 176_640 => "5B", 178_352 => "5C", 180_064 => "5D",
        181_936 => "6A", 183_648 => "6B", 185_360 => "6C", 187_072 => "6D",
        188_928 => "7A", 190_640 => "7B", 192_352 => "7C", 194_064 => "7D",
        195_936 => "8A", 197_648 => "8B", 199_360 => "8C", 201_072 => "8D",
        202_928 => "9A", 204_640 => "9B", 206_352 => "9C", 208_064 => "9D",
        209_936 => "10A", 211_648 => "10B", 213_360 => "10C", 215_072 => "10D",
        216_928 => "11A", 218_640 => "11B", 220_352 => "11C", 222_064 => "11D",
        223_936 => "12A", 225_648 => "12B", 227_360 => "12C", 229_072 => "12D",
        230_784 => "13A", 232_496 => "13B", 234_208 => "13C", 235_776 => "13D",
        237_488 => "13E", 239_200 => "13F", 1_452_960 => "LA", 1_454_672 => "LB",
        1_456_384 => "LC", 1_458_096 => "LD", 1_459_808 => "LE", 1_461_520 => "LF",
        1_463_232 => "LG", 1_464_944 => "LH", 1_466_656 => "LI", 1_468_368 => "LJ",
        1_470_080 => "LK", 1_471_792 => "LL", 1_473_504 => "LM", 1_475_216 => "LN",
        1_476_928 => "LO", 1_478_640 => "LP", 1_480_352 => "LQ", 1_482_064 => "LR",
        1_483_776 => "LS", 1_485_488 => "LT", 1_487_200 => "LU", 1_488_912 => "LV",
        1_490_624 => "LW",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_dab_channel_names() {
        assert_eq!(dab_channel_name(225_648), Some("12B"));
        assert_eq!(dab_channel_name(174_928), Some("5A"));
        assert_eq!(dab_channel_name(123_456), None);
    }
}
