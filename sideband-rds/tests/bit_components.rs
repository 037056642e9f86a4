// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Component tests for bit-level functionality: synchronization and error correction.

mod common;

use common::{asciibin2groups, asciibin2json, flip_ascii_bit};
use sideband_rds::group::BlockNumber;
use sideband_rds::Options;

#[test]
fn accepts_new_pi_from_three_repeats() {
    // Vikerraadio (ee)
    let options = Options::default();
    let json_lines = asciibin2json(
        concat!(
            "001",
            "1110110110111010011100010101001000010100001110000010",
            "0010001011100001011100110000100101100000111100111110",
            "0010000001100101101101001101101001001000000110111110",
            "0010001011100001011100110000000101100010010011100000",
            "1010011010110011111010010101010011010011000101010101",
            "0010001011100001011100110000100101100001001010101000",
            "0111001101100001010000011001100001000011010111000111",
            "001000",
        ),
        &options,
    );

    assert_eq!(json_lines.len(), 1);
    assert_eq!(json_lines[0]["pi"], "0x22E1");
}

#[test]
fn ignores_phantom_sync_caused_by_data_mimicking() {
    // Noise that shouldn't even sync. It also happens to look like two repeats of PI 0x40AF.
    let options = Options::default();
    let groups = asciibin2groups(
        concat!(
            "1100001001000011110110110010101010011101101100110001010011111011",
            "1110001001000001100101000011111110101011001100100011010111001100",
            "0100010001001110001101001001000000011011001010100000001011110001",
            "1100110001010011000010111010101000101000001001000101100110000110",
            "0001000000101011111000100001000110111101011000010110000010011101",
            "0010111010001101001010011011100100000011000101010000101100101010",
            "0100100110000101110000010101101011011100000100100010010010110100",
            "0001010010100010010100000010101101100010011100001000101111110011",
            "0001001000100100111110100000100110110011110110000111010100000000",
        ),
        &options,
    );

    assert!(groups.is_empty());
}

// One correctly coded group: four blocks of PI 0x22E1, offsets applied.
fn correct_group() -> String {
    concat!(
        "0010001011100001",
        "0111001100",
        "0010010110000011",
        "1100111110",
        "0010000001100101",
        "1011010011",
        "0110100100100000",
        "0110111110",
    )
    .to_string()
}

#[test]
fn detects_error_free_group() {
    let options = Options::default();
    let test_data = correct_group() + &correct_group();
    let groups = asciibin2groups(&test_data, &options);

    assert_eq!(groups.last().unwrap().num_errors(), 0);
}

#[test]
fn detects_long_error_burst() {
    let options = Options::default();
    let mut broken = correct_group();
    flip_ascii_bit(&mut broken, 1);
    flip_ascii_bit(&mut broken, 2);
    flip_ascii_bit(&mut broken, 9);
    flip_ascii_bit(&mut broken, 10);

    let test_data = correct_group() + &correct_group() + &broken;
    let groups = asciibin2groups(&test_data, &options);

    assert_eq!(groups.last().unwrap().num_errors(), 1);
}

#[test]
fn corrects_double_bit_flip() {
    let options = Options::default();
    let mut broken = correct_group();
    flip_ascii_bit(&mut broken, 1);
    flip_ascii_bit(&mut broken, 2);

    let test_data = correct_group() + &correct_group() + &broken;
    let groups = asciibin2groups(&test_data, &options);

    let last = groups.last().unwrap();
    assert_eq!(last.num_errors(), 1);
    assert!(last.has(BlockNumber::Block1));
    assert_eq!(last.get(BlockNumber::Block1), 0x22E1);
}

#[test]
fn rejects_triple_bit_flip() {
    let options = Options::default();
    let mut broken = correct_group();
    flip_ascii_bit(&mut broken, 1);
    flip_ascii_bit(&mut broken, 2);
    flip_ascii_bit(&mut broken, 3);

    let test_data = correct_group() + &correct_group() + &broken;
    let groups = asciibin2groups(&test_data, &options);

    let last = groups.last().unwrap();
    assert_eq!(last.num_errors(), 1);
    assert!(!last.has(BlockNumber::Block1));
    assert_eq!(last.get(BlockNumber::Block1), 0x0000);
}

#[test]
fn rejects_double_bit_flip_without_fec() {
    let options = Options { use_fec: false, ..Options::default() };
    let mut broken = correct_group();
    flip_ascii_bit(&mut broken, 1);
    flip_ascii_bit(&mut broken, 2);

    let test_data = correct_group() + &correct_group() + &broken;
    let groups = asciibin2groups(&test_data, &options);

    let last = groups.last().unwrap();
    assert_eq!(last.num_errors(), 1);
    assert!(!last.has(BlockNumber::Block1));
    assert_eq!(last.get(BlockNumber::Block1), 0x0000);
}
