// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RDS file transfer (RFT), carried in type C groups on the RDS2 data streams
//! (IEC 62106-2 ED2:2021).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use sideband_core::checksum::crc16_ccitt;
use sideband_core::util::bits::{divide_rounding_up, get_u8};

/// Segment addresses are 15 bits.
pub const MAX_NUM_SEGMENTS: usize = 1 << 15;

/// Each type C group carries 5 file bytes.
pub const SEGMENT_SIZE: usize = 5;

const MAX_NUM_CRCS: usize = 512;

const CRC_MODE_ENTIRE_FILE: u16 = 0;
const CRC_MODE_AUTO: u16 = 7;

/// A CRC descriptor for one chunk of the file, from an ODA variant 1 group.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkCrc {
    pub mode: u16,
    pub address_raw: u16,
    pub crc: u16,
    pub received: bool,
}

impl ChunkCrc {
    // In auto mode the chunk size follows from the file size.
    fn actual_mode(&self, file_size_bytes: u32) -> u16 {
        if self.mode == CRC_MODE_AUTO {
            if file_size_bytes <= 40_960 {
                1
            }
            else if file_size_bytes <= 81_920 {
                2
            }
            else {
                3
            }
        }
        else {
            self.mode
        }
    }

    /// Chunk length in bytes, based on the mode and file size.
    pub fn chunk_length(&self, file_size_bytes: u32) -> u32 {
        if self.mode == CRC_MODE_ENTIRE_FILE {
            return file_size_bytes;
        }

        SEGMENT_SIZE as u32 * (8 << self.actual_mode(file_size_bytes))
    }

    /// Starting byte address of the chunk.
    pub fn byte_address(&self, file_size_bytes: u32) -> u32 {
        if self.mode == CRC_MODE_ENTIRE_FILE {
            return 0;
        }

        u32::from(self.address_raw) * self.chunk_length(file_size_bytes)
    }
}

/// Reassembly buffer for one file, on one of the 16 ODA pipes.
///
/// The 163 kB data buffer is only allocated once the first segment arrives on the pipe.
#[derive(Clone, Debug, Default)]
pub struct RftFile {
    data: Vec<u8>,
    received: Vec<bool>,
    crc_chunks: Vec<ChunkCrc>,
    expected_size_bytes: u32,
    is_emitted: bool,
    expect_crc: bool,
    prev_toggle: u16,
}

impl RftFile {
    pub fn new() -> Self {
        Default::default()
    }

    /// Does nothing if the size exceeds what the segment address space can carry.
    pub fn set_size(&mut self, size: u32) {
        const MAX_SIZE: u32 = (MAX_NUM_SEGMENTS * SEGMENT_SIZE) as u32;
        if size <= MAX_SIZE {
            self.expected_size_bytes = size;
        }
    }

    pub fn clear(&mut self) {
        for received in self.received.iter_mut() {
            *received = false;
        }
        self.is_emitted = false;
        self.crc_chunks.clear();
    }

    /// `flag` comes from the variant 0 file descriptor: true when CRCs will be sent.
    pub fn set_crc_flag(&mut self, flag: bool) {
        self.expect_crc = flag;
    }

    pub fn is_crc_expected(&self) -> bool {
        self.expect_crc
    }

    pub fn receive_crc(&mut self, chunk_crc: ChunkCrc) {
        if usize::from(chunk_crc.address_raw) >= MAX_NUM_CRCS {
            return;
        }
        self.crc_chunks.resize(MAX_NUM_CRCS, ChunkCrc::default());
        self.crc_chunks[usize::from(chunk_crc.address_raw)] =
            ChunkCrc { received: true, ..chunk_crc };
    }

    /// Receives segment data for this file.
    pub fn receive(&mut self, toggle: u16, segment_address: u32, block2: u16, block3: u16, block4: u16) {
        // Memory is allocated on the first group received on this pipe, so that idle pipes
        // don't hold 16 x 170 kB of buffers.
        self.received.resize(MAX_NUM_SEGMENTS, false);
        self.data.resize(MAX_NUM_SEGMENTS * SEGMENT_SIZE, 0);

        // File contents changed
        if toggle != self.prev_toggle {
            self.clear();
        }
        self.prev_toggle = toggle;

        if (segment_address as usize) < MAX_NUM_SEGMENTS {
            let start = segment_address as usize * SEGMENT_SIZE;
            self.data[start..start + SEGMENT_SIZE].copy_from_slice(&[
                get_u8(block2, 0),
                get_u8(block3, 8),
                get_u8(block3, 0),
                get_u8(block4, 8),
                get_u8(block4, 0),
            ]);
            self.received[segment_address as usize] = true;
        }
    }

    /// True when every expected segment has arrived and the file was not yet emitted.
    pub fn has_new_complete_file(&self) -> bool {
        if self.is_emitted || self.expected_size_bytes == 0 || self.received.is_empty() {
            return false;
        }

        let expected_num_segments = divide_rounding_up(self.expected_size_bytes, SEGMENT_SIZE as u32);
        (0..expected_num_segments as usize).all(|i| self.received[i])
    }

    /// The file contents encoded as Base64. Marks the file as emitted.
    pub fn base64_data(&mut self) -> String {
        self.is_emitted = true;
        BASE64.encode(&self.data[..self.expected_size_bytes as usize])
    }

    /// Verifies all received CRC chunks over the buffer.
    pub fn check_crc(&self) -> bool {
        self.crc_chunks.iter().filter(|c| c.received).all(|chunk| {
            let start = chunk.byte_address(self.expected_size_bytes) as usize;
            let length = chunk.chunk_length(self.expected_size_bytes) as usize;
            let end = (start + length).min(self.data.len());
            start < end && crc16_ccitt(&self.data[start..end]) == chunk.crc
        })
    }
}
