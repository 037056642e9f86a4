// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Blocks, group types, and the four-block RDS group.

use chrono::{DateTime, Local};

use sideband_core::util::bits::get_bits;
use sideband_core::util::fmt::hex_string;

/// Block position within a group. Usable as an index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockNumber {
    Block1 = 0,
    Block2 = 1,
    Block3 = 2,
    Block4 = 3,
}

pub const BLOCKS: [BlockNumber; 4] =
    [BlockNumber::Block1, BlockNumber::Block2, BlockNumber::Block3, BlockNumber::Block4];

/// The offset word that checked out for a block, identifying its position in the group.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Offset {
    A,
    B,
    C,
    Cprime,
    D,
    #[default]
    Invalid,
}

/// A single 26-bit RDS block.
#[derive(Clone, Copy, Debug, Default)]
pub struct Block {
    /// The block and its checkword, as received.
    pub raw: u32,
    /// The 16-bit information word. Only meaningful if `is_received`.
    pub data: u16,
    pub is_received: bool,
    pub had_errors: bool,
    pub offset: Offset,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Version {
    #[default]
    A,
    B,
    C,
}

/// Group type: a number 0 to 15 and a version. Version C marks RDS2 data-stream groups,
/// which carry no type number.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GroupType {
    pub number: u16,
    pub version: Version,
}

impl GroupType {
    /// Decodes the 5-bit group type code from block 2.
    pub fn from_code(type_code: u16) -> Self {
        GroupType {
            number: (type_code >> 1) & 0xF,
            version: if type_code & 0x1 == 0 { Version::A } else { Version::B },
        }
    }

    pub fn version_c() -> Self {
        GroupType { number: 0, version: Version::C }
    }

    pub fn as_display_string(&self) -> String {
        match self.version {
            Version::A => format!("{}A", self.number),
            Version::B => format!("{}B", self.number),
            Version::C => "C".to_string(),
        }
    }
}

/// A single RDS group transmitted as four 16-bit blocks.
#[derive(Clone, Debug, Default)]
pub struct Group {
    blocks: [Block; 4],
    data_stream: u32,
    group_type: Option<GroupType>,
    time_received: Option<DateTime<Local>>,
    bler: Option<f32>,
    // Seconds from the beginning of the file until the first bit of this group
    time_from_start: Option<f64>,
    has_c_prime: bool,
    no_offsets: bool,
}

impl Group {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, block_num: BlockNumber) -> u16 {
        self.blocks[block_num as usize].data
    }

    pub fn has(&self, block_num: BlockNumber) -> bool {
        self.blocks[block_num as usize].is_received
    }

    pub fn block(&self, block_num: BlockNumber) -> &Block {
        &self.blocks[block_num as usize]
    }

    pub fn is_empty(&self) -> bool {
        !BLOCKS.iter().any(|&b| self.has(b))
    }

    pub fn has_pi(&self) -> bool {
        self.group_type().version != Version::C
            && (self.blocks[0].is_received
                || (self.blocks[2].is_received && self.blocks[2].offset == Offset::Cprime))
    }

    /// The programme identification code. Check `has_pi` first.
    pub fn pi(&self) -> u16 {
        if self.blocks[0].is_received {
            self.blocks[0].data
        }
        else if self.blocks[2].is_received && self.blocks[2].offset == Offset::Cprime {
            self.blocks[2].data
        }
        else {
            0x0000
        }
    }

    pub fn has_type(&self) -> bool {
        self.group_type.is_some()
    }

    /// The deduced group type, or the all-default type if it could not be deduced yet.
    pub fn group_type(&self) -> GroupType {
        self.group_type.unwrap_or_default()
    }

    /// Number of blocks that were either missing or corrected.
    pub fn num_errors(&self) -> u32 {
        self.blocks.iter().map(|b| u32::from(b.had_errors || !b.is_received)).sum()
    }

    pub fn data_stream(&self) -> u32 {
        self.data_stream
    }

    pub fn bler(&self) -> Option<f32> {
        self.bler
    }

    pub fn rx_time(&self) -> Option<DateTime<Local>> {
        self.time_received
    }

    pub fn time_from_start(&self) -> Option<f64> {
        self.time_from_start
    }

    /// Don't expect the C' offset for version B groups (e.g. hex input).
    pub fn disable_offsets(&mut self) {
        self.no_offsets = true;
    }

    /// Group is version C (RDS2 extra data streams).
    pub fn set_version_c(&mut self) {
        self.group_type = Some(GroupType::version_c());
    }

    pub fn set_data_stream(&mut self, stream: u32) {
        self.data_stream = stream;
    }

    pub fn set_rx_time(&mut self, t: DateTime<Local>) {
        self.time_received = Some(t);
    }

    /// `bler` is the block error rate in percent.
    pub fn set_average_bler(&mut self, bler: f32) {
        self.bler = Some(bler);
    }

    pub fn set_time_from_start(&mut self, time_from_start: f64) {
        self.time_from_start = Some(time_from_start);
    }

    pub fn set_block(&mut self, block_num: BlockNumber, block: Block) {
        self.blocks[block_num as usize] = block;

        if block.offset == Offset::Cprime {
            self.has_c_prime = true;
        }

        // Try to find out the group type if unknown so far
        if self.group_type.is_none() {
            match block_num {
                BlockNumber::Block2 => {
                    let deduced = GroupType::from_code(get_bits(block.data, 11, 5));
                    // A version B type is deferred until C' confirms it, unless offsets
                    // aren't in use at all.
                    if deduced.version == Version::A || self.has_c_prime || self.no_offsets {
                        self.group_type = Some(deduced);
                    }
                }
                BlockNumber::Block4 => {
                    // Blocks received out of order: a 15B group repeats its type in block 4.
                    if self.has_c_prime {
                        let potential = GroupType::from_code(get_bits(block.data, 11, 5));
                        if potential.number == 15 && potential.version == Version::B {
                            self.group_type = Some(potential);
                        }
                    }
                }
                _ => (),
            }

            if block.offset == Offset::Cprime && self.has(BlockNumber::Block2) {
                let deduced =
                    GroupType::from_code(get_bits(self.get(BlockNumber::Block2), 11, 5));
                if deduced.version == Version::B {
                    self.group_type = Some(deduced);
                }
            }
        }
    }

    /// The raw group data encoded as hex, like in RDS Spy. Invalid blocks are replaced with
    /// `----`.
    pub fn as_hex(&self) -> String {
        let mut result = String::with_capacity(4 * 4 + 3);
        for (i, &block_num) in BLOCKS.iter().enumerate() {
            if self.has(block_num) {
                result += &hex_string(u32::from(self.get(block_num)), 4);
            }
            else {
                result += "----";
            }
            if i != 3 {
                result.push(' ');
            }
        }

        result
    }
}
