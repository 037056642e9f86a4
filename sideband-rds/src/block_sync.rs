// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Block synchronization and burst-error correction (IEC 62106:2015, Annex B).
//!
//! The bitstream carries no block markers; block boundaries are found by sliding a 26-bit
//! window until the syndromes of consecutive windows match the cyclic sequence of offset
//! words. Short error bursts are corrected with a precomputed syndrome lookup.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use sideband_core::util::RunningSum;

use crate::group::{Block, BlockNumber, Group, Offset};

// If the block error rate (0-100) exceeds this value over a longer period, assume that it's
// because we lost synchronization. A lower value will make the decoder give up in noisy
// conditions.
const MAX_TOLERABLE_BLER: i32 = 85;

const MAX_ERRORS_TOLERATED_OVER_50_BLOCKS: i32 = MAX_TOLERABLE_BLER / 2;

const BLOCK_LENGTH: u32 = 26;
const BLOCK_BITMASK: u32 = (1 << BLOCK_LENGTH) - 1;
const CHECKWORD_LENGTH: u32 = 10;

// Each offset word is associated with one block number
fn block_number_for_offset(offset: Offset) -> BlockNumber {
    match offset {
        Offset::A => BlockNumber::Block1,
        Offset::B => BlockNumber::Block2,
        Offset::C | Offset::Cprime => BlockNumber::Block3,
        Offset::D => BlockNumber::Block4,
        Offset::Invalid => BlockNumber::Block1,
    }
}

// Which offset is expected to follow this offset?
fn next_offset_for(offset: Offset) -> Offset {
    match offset {
        Offset::A => Offset::B,
        Offset::B => Offset::C,
        Offset::C => Offset::D,
        Offset::Cprime => Offset::D,
        Offset::D => Offset::A,
        Offset::Invalid => Offset::A,
    }
}

// IEC 62106:2015 section B.3.1 Table B.1
fn offset_for_syndrome(syndrome: u32) -> Offset {
    match syndrome {
        0b1111011000 => Offset::A,
        0b1111010100 => Offset::B,
        0b1001011100 => Offset::C,
        0b1111001100 => Offset::Cprime,
        0b1001011000 => Offset::D,
        _ => Offset::Invalid,
    }
}

/// Computes the 10-bit syndrome of a 26-bit block.
pub fn calculate_syndrome(vec: u32) -> u32 {
    #[rustfmt::skip]
    const PARITY_CHECK_MATRIX: [u32; 26] = [
        0b1000000000,
        0b0100000000,
        0b0010000000,
        0b0001000000,
        0b0000100000,
        0b0000010000,
        0b0000001000,
        0b0000000100,
        0b0000000010,
        0b0000000001,
        0b1011011100,
        0b0101101110,
        0b0010110111,
        0b1010000111,
        0b1110011111,
        0b1100010011,
        0b1101010101,
        0b1101110110,
        0b0110111011,
        0b1000000001,
        0b1111011100,
        0b0111101110,
        0b0011110111,
        0b1010100111,
        0b1110001111,
        0b1100011011,
    ];

    // EN 50067:1998, section B.1.1: the matrix product is the modulo-two sum of all rows
    // whose corresponding coefficient in the vector is 1.
    let mut result = 0;
    for (k, row) in PARITY_CHECK_MATRIX.iter().rev().enumerate() {
        result ^= row * ((vec >> k) & 1);
    }

    result
}

// Table B.1
const OFFSET_WORDS: [(Offset, u32); 5] = [
    (Offset::A, 0b0011111100),
    (Offset::B, 0b0110011000),
    (Offset::C, 0b0101101000),
    (Offset::Cprime, 0b1101010000),
    (Offset::D, 0b0110110100),
];

fn offset_index(offset: Offset) -> usize {
    match offset {
        Offset::A => 0,
        Offset::B => 1,
        Offset::C => 2,
        Offset::Cprime => 3,
        Offset::D => 4,
        Offset::Invalid => 0,
    }
}

// Precomputed mapping of syndromes to error vectors, one map per offset word.
//
// Kopitz & Marks 1999: "RDS: The Radio Data System", p. 224: "...the error-correction system
// should be enabled, but should be restricted by attempting to correct bursts of errors
// spanning one or two bits."
static ERROR_LOOKUP_TABLE: Lazy<[HashMap<u32, u32>; 5]> = Lazy::new(|| {
    let mut table: [HashMap<u32, u32>; 5] = Default::default();

    for &(offset, word) in &OFFSET_WORDS {
        for error_bits in [0b1u32, 0b11u32] {
            for shift in 0..BLOCK_LENGTH {
                let error_vector = (error_bits << shift) & BLOCK_BITMASK;
                let syndrome = calculate_syndrome(error_vector ^ word);
                table[offset_index(offset)].insert(syndrome, error_vector);
            }
        }
    }

    table
});

// EN 50067:1998, section B.2.2
fn correct_burst_errors(block: &Block, expected_offset: Offset) -> Option<u32> {
    let syndrome = calculate_syndrome(block.raw);
    ERROR_LOOKUP_TABLE[offset_index(expected_offset)]
        .get(&syndrome)
        .map(|error_vector| block.raw ^ error_vector)
}

#[derive(Clone, Copy, Debug, Default)]
struct SyncPulse {
    offset: Offset,
    bit_position: u32,
}

impl SyncPulse {
    // Could this pulse realistically follow `other`?
    fn could_follow(&self, other: &SyncPulse) -> bool {
        // Overflows after 41 days of continuous data, possibly discarding one valid sync
        // pulse at that exact moment.
        let sync_distance = self.bit_position.wrapping_sub(other.bit_position);

        sync_distance % BLOCK_LENGTH == 0
            && sync_distance / BLOCK_LENGTH <= 6
            && self.offset != Offset::Invalid
            && other.offset != Offset::Invalid
            && (block_number_for_offset(other.offset) as u32 + sync_distance / BLOCK_LENGTH) % 4
                == block_number_for_offset(self.offset) as u32
    }
}

#[derive(Clone, Debug, Default)]
struct SyncPulseBuffer {
    pulses: [SyncPulse; 4],
}

impl SyncPulseBuffer {
    fn push(&mut self, offset: Offset, bitcount: u32) {
        for i in 0..self.pulses.len() - 1 {
            self.pulses[i] = self.pulses[i + 1];
        }
        self.pulses[3] = SyncPulse { offset, bit_position: bitcount };
    }

    // Search for three sync pulses in the correct cyclic rhythm
    fn is_sequence_found(&self) -> bool {
        let third = &self.pulses[3];

        for i_first in 0..self.pulses.len() - 2 {
            for i_second in i_first + 1..self.pulses.len() - 1 {
                if third.could_follow(&self.pulses[i_second])
                    && self.pulses[i_second].could_follow(&self.pulses[i_first])
                {
                    return true;
                }
            }
        }
        false
    }
}

/// Groups a bitstream into blocks and blocks into groups.
#[derive(Clone, Debug)]
pub struct BlockStream {
    bitcount: u32,
    num_bits_until_next_block: u32,
    input_register: u32,
    expected_offset: Offset,
    is_in_sync: bool,
    block_error_sum50: RunningSum<50>,
    use_fec: bool,
    current_group: Group,
    ready_group: Option<Group>,
    num_bits_since_sync_lost: u32,
    sync_buffer: SyncPulseBuffer,
}

impl BlockStream {
    pub fn new(use_fec: bool) -> Self {
        BlockStream {
            bitcount: 0,
            num_bits_until_next_block: 1,
            input_register: 0,
            expected_offset: Offset::A,
            is_in_sync: false,
            block_error_sum50: RunningSum::new(),
            use_fec,
            current_group: Group::new(),
            ready_group: None,
            num_bits_since_sync_lost: 0,
            sync_buffer: SyncPulseBuffer::default(),
        }
    }

    // Try to find a cyclic pattern in the offset words.
    fn acquire_sync(&mut self, block: &Block) {
        if self.is_in_sync {
            return;
        }

        self.num_bits_since_sync_lost += 1;

        if block.offset != Offset::Invalid {
            self.sync_buffer.push(block.offset, self.bitcount);

            if self.sync_buffer.is_sequence_found() {
                self.is_in_sync = true;
                self.expected_offset = block.offset;
                self.current_group = Group::new();
                self.num_bits_since_sync_lost = 0;
            }
        }
    }

    /// Receives one bit.
    pub fn push_bit(&mut self, bit: bool) {
        self.input_register = (self.input_register << 1) + u32::from(bit);
        self.num_bits_until_next_block -= 1;
        self.bitcount = self.bitcount.wrapping_add(1);

        if self.num_bits_until_next_block == 0 {
            self.find_block_in_input_register();

            self.num_bits_until_next_block = if self.is_in_sync { BLOCK_LENGTH } else { 1 };
        }
    }

    // Search the input register for block data + offset. If found, add it to the group.
    fn find_block_in_input_register(&mut self) {
        let mut block = Block {
            raw: self.input_register & BLOCK_BITMASK,
            ..Default::default()
        };
        block.offset = offset_for_syndrome(calculate_syndrome(block.raw));

        self.acquire_sync(&block);

        if !self.is_in_sync {
            return;
        }

        if self.expected_offset == Offset::C && block.offset == Offset::Cprime {
            self.expected_offset = Offset::Cprime;
        }

        block.had_errors = block.offset != self.expected_offset;
        self.block_error_sum50.push(i32::from(block.had_errors));

        // EN 50067:1998, section C.1.2:
        // Sync is dropped when too many of the previous syndromes failed
        if self.block_error_sum50.sum() > MAX_ERRORS_TOLERATED_OVER_50_BLOCKS {
            self.is_in_sync = false;
            self.block_error_sum50.clear();
            return;
        }

        block.data = (block.raw >> CHECKWORD_LENGTH) as u16;

        if block.had_errors && self.use_fec {
            if let Some(corrected_bits) = correct_burst_errors(&block, self.expected_offset) {
                block.data = (corrected_bits >> CHECKWORD_LENGTH) as u16;
                block.offset = self.expected_offset;
            }
        }

        // Error-free block received or errors successfully corrected
        if block.offset == self.expected_offset {
            block.is_received = true;
            self.current_group.set_block(block_number_for_offset(self.expected_offset), block);
        }

        let next_offset = next_offset_for(self.expected_offset);

        // A whole group of four blocks has been received
        if next_offset == Offset::A {
            self.ready_group = Some(std::mem::take(&mut self.current_group));
        }

        self.expected_offset = next_offset;
    }

    /// Takes the completed group, if the last pushed bit finished one.
    pub fn pop_group(&mut self) -> Option<Group> {
        self.ready_group.take()
    }

    /// The group under construction. Some blocks may be missing.
    pub fn flush_current_group(&self) -> Group {
        self.current_group.clone()
    }

    pub fn num_bits_since_sync_lost(&self) -> u32 {
        self.num_bits_since_sync_lost
    }
}
