// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Helpers shared by the component tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use serde_json::Value;

use sideband_rds::group::{Block, BlockNumber, Group};
use sideband_rds::{Channel, Options};

/// Simulate losing one block to noise (the same block in every group).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeleteOneBlock {
    Block1 = 0,
    Block2,
    Block3,
    Block4,
    None,
}

/// Converts synchronized hex data (without offset words) into groups. Error correction is
/// omitted and ignored.
pub fn hex2groups(input_data: &[u64], block_to_delete: DeleteOneBlock) -> Vec<Group> {
    input_data
        .iter()
        .map(|&hexgroup| {
            let mut group = Group::new();
            group.disable_offsets();
            for (i, block_num) in [
                BlockNumber::Block1,
                BlockNumber::Block2,
                BlockNumber::Block3,
                BlockNumber::Block4,
            ]
            .into_iter()
            .enumerate()
            {
                let block = Block {
                    data: ((hexgroup >> (16 * (3 - i))) & 0xFFFF) as u16,
                    is_received: i != block_to_delete as usize,
                    ..Default::default()
                };
                group.set_block(block_num, block);
            }
            group
        })
        .collect()
}

/// Runs the full decoder over prebuilt groups and parses the JSON output back into objects.
pub fn groups2json(groups: Vec<Group>, options: &Options, pi: u16, stream: usize) -> Vec<Value> {
    let mut channel = Channel::with_pi(options, pi);
    let mut out = Vec::new();

    for group in groups {
        channel.process_group(group, stream, &mut out);
    }

    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Converts synchronized hex data into JSON records.
pub fn hex2json(input_data: &[u64], options: &Options, pi: u16) -> Vec<Value> {
    hex2json_with(input_data, options, pi, DeleteOneBlock::None)
}

pub fn hex2json_with(
    input_data: &[u64],
    options: &Options,
    pi: u16,
    block_to_delete: DeleteOneBlock,
) -> Vec<Value> {
    groups2json(hex2groups(input_data, block_to_delete), options, pi, 0)
}

/// Converts a string of unsynchronized ASCII bits into JSON records.
pub fn asciibin2json(bindata: &str, options: &Options) -> Vec<Value> {
    let mut channel = Channel::new(options, 0);
    let mut out = Vec::new();

    for ascii_bit in bindata.chars() {
        channel.process_bit(ascii_bit == '1', 0, &mut out);
    }

    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Converts a string of unsynchronized ASCII bits into groups.
pub fn asciibin2groups(bindata: &str, options: &Options) -> Vec<Group> {
    let mut block_stream = sideband_rds::block_sync::BlockStream::new(options.use_fec);
    let mut result = Vec::new();

    for ascii_bit in bindata.chars() {
        if ascii_bit != '0' && ascii_bit != '1' {
            continue;
        }
        block_stream.push_bit(ascii_bit == '1');
        if let Some(group) = block_stream.pop_group() {
            result.push(group);
        }
    }

    result
}

/// Flips a bit in a string of ASCII bits.
pub fn flip_ascii_bit(bits: &mut String, bit_index: usize) {
    let flipped = if bits.as_bytes()[bit_index] == b'0' { "1" } else { "0" };
    bits.replace_range(bit_index..bit_index + 1, flipped);
}
