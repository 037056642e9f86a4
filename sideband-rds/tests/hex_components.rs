// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Component tests for synchronized hex input: all the kinds of messages the decoder can
//! receive. The test vectors are off-air captures.

mod common;

use common::{hex2json, hex2json_with, DeleteOneBlock};
use serde_json::json;
use sideband_rds::Options;

#[test]
fn basic_info_with_group_0a() {
    // YLE X3M (fi) 2016-09-15
    let options = Options::default();
    let json_lines = hex2json(
        &[0x6204_0130_966B_594C, 0x6204_0131_93CD_4520, 0x6204_0132_E472_5833, 0x6204_0137_966B_4D20],
        &options,
        0x6204,
    );

    assert_eq!(json_lines.len(), 4);

    for group in &json_lines {
        assert_eq!(group["pi"], "0x6204");
        assert_eq!(group["group"], "0A");
        assert_eq!(group["tp"], false);
        assert_eq!(group["ta"], true);
    }
    assert_eq!(json_lines[0]["prog_type"], "Varied");
    assert_eq!(json_lines[0]["is_music"], false);

    assert_eq!(json_lines[0]["di"]["dynamic_pty"], false);
    assert_eq!(json_lines[1]["di"]["compressed"], false);
    assert_eq!(json_lines[2]["di"]["artificial_head"], false);
    assert_eq!(json_lines[3]["di"]["stereo"], true);

    assert_eq!(json_lines[3]["ps"], "YLE X3M ");
}

#[test]
fn basic_info_with_group_0b() {
    // Radio Krka (si)
    let options = Options::default();
    let json_lines = hex2json(
        &[0x9423_0800_0000_2020, 0x9423_0801_0000_4B52, 0x9423_0802_0000_4B41, 0x9423_0807_0000_2020],
        &options,
        0x9423,
    );

    assert_eq!(json_lines.last().unwrap()["pi"], "0x9423");
    assert_eq!(json_lines.last().unwrap()["ps"], "  KRKA  ");
}

#[test]
fn basic_info_with_group_15b() {
    // Дорожное 2017-07-03
    let options = Options::default();
    let json_lines = hex2json(&[0x7827_F928_7827_F928], &options, 0x7827);

    assert_eq!(json_lines[0]["group"], "15B");
    assert_eq!(json_lines[0]["prog_type"], "Varied");
    assert_eq!(json_lines[0]["tp"], false);
}

#[test]
fn basic_info_with_group_15b_block2_lost() {
    let options = Options::default();
    let json_lines =
        hex2json_with(&[0x7827_F928_7827_F928], &options, 0x7827, DeleteOneBlock::Block2);

    assert_eq!(json_lines[0]["group"], "15B");
    assert_eq!(json_lines[0]["prog_type"], "Varied");
    assert_eq!(json_lines[0]["tp"], false);
}

#[test]
fn pty_name() {
    // walczakp/rds-spy-logs/Poland/3ABC - 2019-05-04 22-36-23.spy
    let options = Options::default();
    let json_lines =
        hex2json(&[0x3ABC_A750_4352_492E, 0x3ABC_A751_434E_0D0D], &options, 0x3ABC);

    assert_eq!(json_lines.len(), 2);
    assert_eq!(json_lines[1]["pty_name"], "CRI.CN ");
}

#[test]
fn pin_and_slc_variants_0_and_3() {
    // YLE Yksi (fi) 2016-09-15
    // NOTE: PIN disappeared from the RDS standard in 2021; these bits are now RFU.
    let options = Options::default();
    let json_lines =
        hex2json(&[0x6201_10E0_00E1_7C54, 0x6201_10E0_3027_7C54], &options, 0x6201);

    assert_eq!(json_lines.len(), 2);
    assert_eq!(json_lines[0]["prog_item_number"], 31828);
    assert_eq!(json_lines[0]["prog_item_started"]["day"], 15);
    assert_eq!(json_lines[0]["prog_item_started"]["time"], "17:20");
    assert_eq!(json_lines[0]["country"], "fi");
    assert_eq!(json_lines[1]["language"], "Finnish");
}

#[test]
fn slc_variant_6() {
    // RTL 102.5 (it) 2019-05-04
    let options = Options::default();
    let json_lines = hex2json(&[0x5218_1520_6DAB_0000], &options, 0x5218);

    assert_eq!(json_lines.len(), 1);
    assert_eq!(json_lines[0]["slc_broadcaster_bits"], "0x5AB");
}

#[test]
fn callsign_for_rbds_station() {
    // 98.5 KFOX (KUFX) (us) 2020-08-19
    let options = Options { rbds: true, ..Options::default() };
    let json_lines = hex2json(&[0x4569_00C8_CDCD_416E], &options, 0x4569);

    assert_eq!(json_lines.last().unwrap()["callsign"], "KUFX");
}

#[test]
fn callsign_uncertain_for_tmc_station() {
    // walczakp/rds-spy-logs/USA/16C6 - 2019-05-04 21-43-25.spy
    let options = Options { rbds: true, ..Options::default() };
    let json_lines = hex2json(&[0x16C6_00EA_E0CD_6F77], &options, 0x16C6);

    assert_eq!(json_lines.last().unwrap()["callsign_uncertain"], "KCOS");
}

#[test]
fn callsign_for_nationally_linked_station() {
    // CBC Radio 2 (ca)
    let options = Options { rbds: true, ..Options::default() };
    let json_lines = hex2json(&[0xB203_21C1_5553_4943], &options, 0xB203);

    assert_eq!(json_lines.last().unwrap()["callsign"], "CBC English - Radio Two");
}

#[test]
fn no_callsign_for_non_rbds_station() {
    let options = Options::default();
    let json_lines = hex2json(&[0x4569_00C8_CDCD_416E], &options, 0x4569);

    assert!(json_lines.last().unwrap().get("callsign").is_none());
}

#[test]
fn radiotext_length_method_a_terminator() {
    // JACK 96.9 (ca) 2019-05-05
    let options = Options { rbds: true, ..Options::default() };
    let json_lines = hex2json(
        &[
            0xC954_24F0_4A41_434B, // "JACK"
            0xC954_24F1_2039_362E, // " 96."
            0xC954_24F2_390D_0000, // "9\r  "
        ],
        &options,
        0xC954,
    );

    assert_eq!(json_lines.len(), 3);
    assert_eq!(json_lines.last().unwrap()["radiotext"], "JACK 96.9");

    // Earlier lines shouldn't have RadioText
    for line in &json_lines[..2] {
        assert!(line.get("radiotext").is_none());
    }
}

#[test]
fn radiotext_length_method_b_padded() {
    // Radio Grün-Weiß (at) 2021-07-18
    let options = Options::default();
    let json_lines = hex2json(
        &[
            0xA959_2410_4641_4E43, // "FANC"
            0xA959_2411_5920_2D20, // "Y - "
            0xA959_2412_426F_6C65, // "Bole"
            0xA959_2413_726F_2020, // "ro  "
            0xA959_2414_2020_2020, // "    "
            0xA959_2415_2020_2020,
            0xA959_2416_2020_2020,
            0xA959_2417_2020_2020,
            0xA959_2418_2020_2020,
            0xA959_2419_2020_2020,
            0xA959_241A_2020_2020,
            0xA959_241B_2020_2020,
            0xA959_241C_2020_2020,
            0xA959_241D_2020_2020,
            0xA959_241E_2020_2020,
            0xA959_241F_2020_2020,
        ],
        &options,
        0xA959,
    );

    assert_eq!(json_lines.len(), 16);
    assert_eq!(json_lines.last().unwrap()["radiotext"], "FANCY - Bolero");

    for line in &json_lines[..15] {
        assert!(line.get("radiotext").is_none());
    }
}

#[test]
fn radiotext_length_method_b_group_2b() {
    // Radio Krka (si)
    let options = Options::default();
    let json_lines = hex2json(
        &[
            0x9423_2800_0000_5052,
            0x9423_2801_0000_494A,
            0x9423_2802_0000_4554,
            0x9423_2803_0000_4E4F,
            0x9423_2804_0000_2050,
            0x9423_2805_0000_4F53,
            0x9423_2806_0000_4C55,
            0x9423_2807_0000_5341,
            0x9423_2808_0000_4E4A,
            0x9423_2809_0000_4520,
            0x9423_280A_0000_5241,
            0x9423_280B_0000_4449,
            0x9423_280C_0000_4120,
            0x9423_280D_0000_4B52,
            0x9423_280E_0000_4B41,
            0x9423_280F_0000_2020,
        ],
        &options,
        0x9423,
    );

    assert_eq!(json_lines.len(), 16);
    assert_eq!(json_lines.last().unwrap()["radiotext"], "PRIJETNO POSLUSANJE RADIA KRKA");
}

#[test]
fn radiotext_length_method_c_confirmed_by_repeat() {
    // Antenne Kärnten (at) 2021-07-26
    let options = Options::default();
    let repeat = [
        0xA540_2540_526F_6262, // "Robb"
        0xA540_2541_6965_2057, // "ie W"
        0xA540_2542_696C_6C69, // "illi"
        0xA540_2543_616D_7320, // "ams "
        0xA540_2544_2D20_4665, // "- Fe"
        0xA540_2545_656C_2020, // "el  "
    ];
    let mut input = Vec::new();
    input.extend_from_slice(&repeat);
    input.extend_from_slice(&repeat);
    input.push(repeat[0]); // Third repeat starts - length confirmed

    let json_lines = hex2json(&input, &options, 0xA540);

    assert_eq!(json_lines.len(), 13);
    assert_eq!(json_lines.last().unwrap()["radiotext"], "Robbie Williams - Feel");

    for line in &json_lines[..12] {
        assert!(line.get("radiotext").is_none());
    }
}

#[test]
fn radiotext_non_ascii_basic_charset() {
    // YLE Vega (fi) 2016-09-15
    let options = Options::default();
    let json_lines = hex2json(
        &[
            0x6205_2440_5665_6761, // "Vega"
            0x6205_2441_204B_7691, // " kvä"
            0x6205_2442_6C6C_2020, // "ll  "
            0x6205_2443_2020_2020,
            0x6205_2444_2020_2020,
            0x6205_2445_2020_2020,
            0x6205_2446_2020_2020,
            0x6205_2447_2020_2020,
            0x6205_2448_2020_2020,
            0x6205_2449_2020_2020,
            0x6205_244A_2020_2020,
            0x6205_244B_2020_2020,
            0x6205_244C_2020_2020,
            0x6205_244D_2020_2020,
            0x6205_244E_2020_2020,
            0x6205_244F_2020_2020,
        ],
        &options,
        0x6205,
    );

    assert_eq!(json_lines.len(), 16);
    assert_eq!(json_lines.last().unwrap()["radiotext"], "Vega Kväll");
}

#[test]
fn radiotext_partial() {
    // Antenne Kärnten (at) 2021-07-26
    let options = Options { show_partial: true, ..Options::default() };
    let json_lines = hex2json(
        &[
            0xA540_2540_526F_6262, // "Robb"
            0xA540_2541_6965_2057, // "ie W"
            0xA540_2542_696C_6C69, // "illi"
            0xA540_2543_616D_7320, // "ams "
            0xA540_2544_2D20_4665, // "- Fe"
        ],
        &options,
        0xA540,
    );

    assert_eq!(json_lines.len(), 5);
    let expected = format!("{}{}", "Robbie Williams - Fe", " ".repeat(44));
    assert_eq!(json_lines.last().unwrap()["partial_radiotext"], expected);
    assert_eq!(json_lines.last().unwrap()["rt_ab"], "A");

    for line in &json_lines {
        assert!(line.get("partial_radiotext").is_some());
    }
}

#[test]
fn enhanced_radiotext() {
    // Järviradio (fi)
    let options = Options::default();
    let json_lines = hex2json(
        &[
            // eRT ODA identifier
            0x6255_3538_0001_6552,
            // Text data
            0x6255_C520_4AC3_A472,
            0x6255_C521_7669_7261,
            0x6255_C522_6469_6F20,
            0x6255_C523_5244_5332,
            0x6255_C524_2045_5254,
            0x6255_C525_0D0D_0D0D,
        ],
        &options,
        0x6255,
    );

    assert_eq!(json_lines.last().unwrap()["enhanced_radiotext"], "Järviradio RDS2 ERT");
}

#[test]
fn enhanced_radiotext_invalid_multibyte_is_clean() {
    // Järviradio (fi), eRT ODA identifier with a mistake
    let options = Options::default();
    let json_lines = hex2json(
        &[
            0x6255_3538_000A_6552,
            0x6255_C520_4AC3_A472,
            0x6255_C521_7669_7261,
            0x6255_C522_6469_6F20,
            0x6255_C523_5244_5332,
            0x6255_C524_2045_5254,
            0x6255_C525_0D0D_0D0D,
        ],
        &options,
        0x6255,
    );

    // Must not panic; the malformed text field is simply dropped.
    for line in &json_lines {
        assert!(line.get("enhanced_radiotext").is_none());
    }
}

#[test]
fn radiotext_plus_tags() {
    // Off-by-one encoder bug workaround: some encoders forget that the RT+ length field
    // means additional length, so trailing spaces are trimmed.
    let options = Options::default();
    let mut input = vec![
        // RT+ ODA identifier
        0x53C5_3558_0000_4BD7,
        // RT+
        0x53C5_C548_8020_0A6A,
        // RT message
        0x53C5_2550_4649_4F52,
        0x53C5_2551_454C_4C41,
        0x53C5_2552_204D_414E,
        0x53C5_2553_4E4F_4941,
        0x53C5_2554_202D_2047,
        0x53C5_2555_4C49_2041,
        0x53C5_2556_4D41_4E54,
        0x53C5_2557_4920_2020,
        0x53C5_2558_2020_2020,
        0x53C5_2559_2020_2020,
        0x53C5_255A_2020_2020,
        0x53C5_255B_2020_2020,
        0x53C5_255C_2020_2020,
        0x53C5_255D_2020_2020,
        0x53C5_255E_2020_2020,
        0x53C5_255F_2020_2020,
    ];
    // RT+ (second one)
    input.push(0x53C5_C548_8020_0A6A);

    let json_lines = hex2json(&input, &options, 0x53C5);

    let last = json_lines.last().unwrap();
    assert!(last.get("radiotext_plus").is_some());
    assert_eq!(last["radiotext_plus"]["tags"].as_array().unwrap().len(), 2);
    assert_eq!(last["radiotext_plus"]["tags"][0]["content-type"], "item.artist");
    assert_eq!(last["radiotext_plus"]["tags"][0]["data"], "FIORELLA MANNOIA");
    assert_eq!(last["radiotext_plus"]["tags"][1]["content-type"], "item.title");
    assert_eq!(last["radiotext_plus"]["tags"][1]["data"], "GLI AMANTI");
}

#[test]
fn radiotext_plus_non_ascii() {
    // Antenne 2016-09-17: tag positions count characters, not UTF-8 bytes
    let options = Options::default();
    let json_lines = hex2json(
        &[
            // RT+ ODA identifier
            0xD318_3558_0000_4BD7,
            // RT+ (two are needed to confirm)
            0xD318_C558_8D20_0DCF,
            // RT message
            0xD318_2540_6A65_747A,
            0xD318_2541_7420_6175,
            0xD318_2542_6620_414E,
            0xD318_2543_5445_4E4E,
            0xD318_2544_4520_4241,
            0xD318_2545_5945_524E,
            0xD318_2546_3A20_4368,
            0xD318_2547_7269_7374,
            0xD318_2548_696E_6120,
            0xD318_2549_5374_9972,
            0xD318_254A_6D65_7220,
            0xD318_254B_2D20_4569,
            0xD318_254C_6E20_5465,
            0xD318_254D_696C_2076,
            0xD318_254E_6F6E_206D,
            0xD318_254F_6972_2020,
            // RT+ (second one)
            0xD318_C558_8D20_0DCF,
        ],
        &options,
        0xD318,
    );

    let last = json_lines.last().unwrap();
    assert_eq!(last["radiotext_plus"]["tags"].as_array().unwrap().len(), 2);
    assert_eq!(last["radiotext_plus"]["tags"][0]["content-type"], "item.artist");
    assert_eq!(last["radiotext_plus"]["tags"][0]["data"], "Christina Stürmer");
    assert_eq!(last["radiotext_plus"]["tags"][1]["content-type"], "item.title");
    assert_eq!(last["radiotext_plus"]["tags"][1]["data"], "Ein Teil von mir");
}

#[test]
fn long_ps_space_padded() {
    // The Breeze Gold Coast 100.6 (au) 2024-05-17
    let options = Options::default();
    let json_lines = hex2json(
        &[
            0x49B1_F180_4272_6565,
            0x49B1_F181_7A65_2031,
            0x49B1_F182_3030_2E36,
            0x49B1_F183_2047_6F6C,
            0x49B1_F184_6420_436F,
            0x49B1_F185_6173_7400,
            0x49B1_F186_0000_0000,
            0x49B1_F187_0000_0000,
        ],
        &options,
        0x49B1,
    );

    assert_eq!(json_lines.last().unwrap()["long_ps"], "Breeze 100.6 Gold Coast");
}

#[test]
fn long_ps_terminated_with_utf8() {
    // Järviradio (fi)
    let options = Options::default();
    let json_lines = hex2json(
        &[0x6255_F520_4AC3_A452, 0x6255_F521_5649_5241, 0x6255_F522_4449_4F0D],
        &options,
        0x6255,
    );

    assert_eq!(json_lines.last().unwrap()["long_ps"], "JäRVIRADIO"); // sic
}

#[test]
fn alternative_frequencies_method_a() {
    // YLE Yksi (fi) 2016-09-15
    let options = Options::default();
    let json_lines = hex2json(
        &[0x6201_00F7_E704_5349, 0x6201_00F0_2217_594C, 0x6201_00F1_1139_4520, 0x6201_00F2_0A14_594B],
        &options,
        0x6201,
    );

    assert_eq!(json_lines.len(), 4);
    assert_eq!(
        json_lines.last().unwrap()["alt_frequencies_a"],
        json!([87_900, 90_900, 89_800, 89_200, 93_200, 88_500, 89_500])
    );
}

#[test]
fn alternative_frequencies_method_b() {
    // YLE Helsinki (fi) 2016-09-15
    let options = Options::default();
    let json_lines = hex2json(
        &[
            0x6403_0447_F741_4920,
            0x6403_0440_415F_594C,
            0x6403_0441_4441_4520,
            0x6403_0442_5541_484B,
            0x6403_0447_1C41_4920,
            0x6403_0440_6841_594C,
            0x6403_0441_5E41_4520,
            0x6403_0442_414B_484B,
            0x6403_0447_4156_4920,
            0x6403_0440_CB41_594C,
            0x6403_0441_B741_4520,
            0x6403_0442_4174_484B,
        ],
        &options,
        0x6403,
    );

    assert_eq!(json_lines.len(), 12);
    let last = json_lines.last().unwrap();
    assert_eq!(last["alt_frequencies_b"]["tuned_frequency"], 94_000);
    assert_eq!(
        last["alt_frequencies_b"]["same_programme"],
        json!([97_000, 90_300, 95_000, 96_100, 99_100])
    );
    assert_eq!(
        last["alt_frequencies_b"]["regional_variants"],
        json!([94_300, 96_000, 97_900, 96_900, 107_800, 105_800])
    );
}

#[test]
fn alternative_frequencies_partial() {
    // YLE Helsinki (fi) 2016-09-15
    let options = Options { show_partial: true, ..Options::default() };
    let json_lines = hex2json(
        &[0x6403_0447_F741_4920, 0x6403_0440_415F_594C, 0x6403_0441_4441_4520, 0x6403_0442_5541_484B],
        &options,
        0x6403,
    );

    assert_eq!(json_lines.len(), 4);
    assert_eq!(json_lines[0]["partial_alt_frequencies"], json!([94_000]));
    assert!(json_lines[1].get("partial_alt_frequencies").is_some());
}

#[test]
fn clock_time_during_dst() {
    // BR-KLASSIK (de) 2017-04-04
    let options = Options::default();
    let json_lines = hex2json(&[0xD314_41C1_C3EF_5AC4], &options, 0xD314);

    assert_eq!(json_lines.len(), 1);
    assert_eq!(json_lines[0]["clock_time"], "2017-04-04T23:43:00+02:00");
}

#[test]
fn clock_time_outside_dst() {
    // 104.6RTL (de) 2018-11-01
    let options = Options::default();
    let json_lines = hex2json(&[0xD42A_4541_C86E_D482], &options, 0xD42A);

    assert_eq!(json_lines[0]["clock_time"], "2018-11-01T14:18:00+01:00");
}

#[test]
fn clock_time_negative_utc_offset() {
    // 98.5 KFOX (KUFX) (us) 2020-08-19
    let options = Options { rbds: true, ..Options::default() };
    let json_lines = hex2json(&[0x4569_40DD_CD92_3BAE], &options, 0x4569);

    assert_eq!(json_lines[0]["clock_time"], "2020-08-19T20:46:00-07:00");
}

#[test]
fn clock_time_zero_utc_offset() {
    // Vikerraadio (ee) 2016-07-18 (though ee is not actually UTC+0)
    let options = Options::default();
    let json_lines = hex2json(&[0x22E1_4581_C1E7_4280], &options, 0x22E1);

    assert_eq!(json_lines[0]["clock_time"], "2016-07-18T20:10:00Z");
}

#[test]
fn clock_time_across_local_midnight() {
    let options = Options::default();
    let json_lines =
        hex2json(&[0xF201_441D_D299_5EC4, 0xF201_441D_D299_6004], &options, 0xF201);

    assert_eq!(json_lines.len(), 2);
    assert_eq!(json_lines[0]["clock_time"], "2022-05-25T23:59:00+02:00");
    assert_eq!(json_lines[1]["clock_time"], "2022-05-26T00:00:00+02:00");
}

#[test]
fn clock_time_across_utc_midnight() {
    let options = Options::default();
    let json_lines =
        hex2json(&[0xF201_441D_D299_7EC4, 0xF201_441D_D29A_0004], &options, 0xF201);

    assert_eq!(json_lines.len(), 2);
    assert_eq!(json_lines[0]["clock_time"], "2022-05-26T01:59:00+02:00");
    assert_eq!(json_lines[1]["clock_time"], "2022-05-26T02:00:00+02:00");
}

#[test]
fn clock_time_invalid_mjd_handled_cleanly() {
    // MJD = 15000, below the minimum of 15079
    let options = Options::default();
    let json_lines = hex2json(&[0xD314_41C0_7530_5AC4], &options, 0xD314);

    assert_eq!(json_lines.len(), 1);
    assert!(json_lines[0].get("clock_time").is_none());
}

#[test]
fn transparent_data_channels() {
    // Radio 10 (nl) 2019-05-04. The TRDS4001 encoder fills the TDC fields with its version
    // string and some unknown binary data.
    let options = Options::default();
    let json_lines = hex2json(
        &[
            0x83D2_5540_00C8_006D,
            0x83D2_5541_FF00_0000,
            0x83D2_5542_00E2_00E3,
            0x83D2_5543_00C8_00E0,
            0x83D2_5544_00DE_00D8,
            0x83D2_5545_00DF_00E4,
            0x83D2_5546_5452_4453,
            0x83D2_5547_3430_3031,
            0x83D2_5548_2052_656C,
            0x83D2_5549_6561_7365,
            0x83D2_554A_2030_3230,
            0x83D2_554B_3130_3930,
            0x83D2_554C_3020_3136,
            0x83D2_554D_2F30_362F,
            0x83D2_554E_3230_3033,
            0x83D2_554F_202D_2052,
            0x83D2_5550_5652_2045,
            0x83D2_5551_6C65_7474,
            0x83D2_5552_726F_6E69,
            0x83D2_5553_6361_2053,
            0x83D2_5554_7061_0037,
            0x83D2_5555_0020_2037,
            0x83D2_5556_0020_2037,
            0x83D2_5557_0020_2020,
            0x83D2_5558_2020_2020,
            0x83D2_5559_2020_2020,
            0x83D2_555A_2020_2020,
            0x83D2_555B_2020_2020,
            0x83D2_555C_2020_2020,
            0x83D2_555D_2020_2020,
            0x83D2_555E_2020_2020,
            0x83D2_555F_2053_20AC,
        ],
        &options,
        0x83D2,
    );

    assert_eq!(json_lines.len(), 32);
    let full_text = json_lines.last().unwrap()["transparent_data"]["full_text"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(full_text.contains("TRDS4001 Release 02010900 16/06/2003 - RVR Elettronica"));
}

#[test]
fn in_house_applications() {
    // BR-KLASSIK (de) 2017-04-04
    let options = Options::default();
    let json_lines = hex2json(
        &[
            0xD314_61C0_AFFE_AFFE,
            0xD314_61C1_D100_0A19,
            0xD314_61C2_0000_0B01,
            0xD314_61C3_2005_2015,
            0xD314_61DF_0000_D314,
        ],
        &options,
        0xD314,
    );

    assert_eq!(json_lines.len(), 5);
    assert_eq!(json_lines[0]["in_house_data"], json!([0x00, 0xAFFE, 0xAFFE]));
    assert_eq!(json_lines[1]["in_house_data"], json!([0x01, 0xD100, 0x0A19]));
    assert_eq!(json_lines[2]["in_house_data"], json!([0x02, 0x0000, 0x0B01]));
    assert_eq!(json_lines[3]["in_house_data"], json!([0x03, 0x2005, 0x2015]));
    assert_eq!(json_lines[4]["in_house_data"], json!([0x1F, 0x0000, 0xD314]));
}

#[test]
fn eon_with_14a_groups() {
    // YLE X (fi) 2016-09-15; refers to YLE Suomi 94.0 MHz
    let options = Options::default();
    let json_lines = hex2json(
        &[
            0x6202_E150_594C_6203,
            0x6202_E151_4553_6203,
            0x6202_E152_554F_6203,
            0x6202_E153_4D49_6203,
            0x6202_E155_2C41_6203,
            0x6202_E15C_0000_6203,
            0x6202_E15D_4800_6203,
            0x6202_E15E_7C83_6203,
        ],
        &options,
        0x6202,
    );

    assert_eq!(json_lines.len(), 8);
    assert_eq!(json_lines[3]["pi"], "0x6202");
    assert_eq!(json_lines[3]["other_network"]["pi"], "0x6203");
    assert_eq!(json_lines[3]["other_network"]["ps"], "YLESUOMI");
    assert_eq!(json_lines[4]["other_network"]["kilohertz"], 94_000);
    assert_eq!(json_lines[5]["other_network"]["has_linkage"], false);
    assert_eq!(json_lines[5]["other_network"]["tp"], true);
    assert_eq!(json_lines[6]["other_network"]["prog_type"], "Varied");
    assert_eq!(json_lines[6]["other_network"]["ta"], false);
    assert_eq!(json_lines[7]["other_network"]["prog_item_number"], 31875);
    assert_eq!(json_lines[7]["other_network"]["prog_item_started"]["day"], 15);
    assert_eq!(json_lines[7]["other_network"]["prog_item_started"]["time"], "18:03");
}

#[test]
fn eon_with_14b_groups() {
    // Deutschlandfunk Kultur (de) 2016-12-25; refers to Bayern 3
    let options = Options::default();
    let json_lines = hex2json(&[0xD220_EA90_D220_D313], &options, 0xD220);

    let last = json_lines.last().unwrap();
    assert_eq!(last["pi"], "0xD220");
    assert_eq!(last["other_network"]["pi"], "0xD313");
    assert_eq!(last["other_network"]["tp"], true);
    assert_eq!(last["other_network"]["ta"], false);
}

#[test]
fn eon_alt_frequencies() {
    // Radio Gioconda (it)
    let options = Options::default();
    let json_lines =
        hex2json(&[0x53C5_E554_E2AD_53C6, 0x53C5_E554_C2CD_53C6], &options, 0x53C5);

    assert_eq!(json_lines.len(), 2);
    assert_eq!(
        json_lines.last().unwrap()["other_network"]["alt_frequencies"],
        json!([104_800, 106_900])
    );
}

#[test]
fn dab_cross_referencing() {
    // BBC Radio 4 (gb) 2015-09-27
    let options = Options::default();
    let json_lines =
        hex2json(&[0xC204_3138_0000_0093, 0xC204_C124_3717_CE15], &options, 0xC204);

    assert_eq!(json_lines.len(), 2);
    assert_eq!(json_lines.last().unwrap()["dab"]["channel"], "12B");
    assert_eq!(json_lines.last().unwrap()["dab"]["kilohertz"], 225_648);
}

#[test]
fn unspecified_oda() {
    // WDR 5 (de) 2019-05-05
    let options = Options::default();
    let json_lines = hex2json(&[0xD395_B065_279A_0020], &options, 0xD395);

    assert_eq!(json_lines.len(), 1);
    assert_eq!(json_lines[0]["group"], "11A");
    assert_eq!(json_lines[0]["unknown_oda"]["raw_data"], "05 279A 0020");
}

#[test]
fn bler_reporting_disabled() {
    let options = Options::default();
    let json_lines =
        hex2json_with(&[0x7827_F928_7827_F928], &options, 0x7827, DeleteOneBlock::Block2);

    assert!(!json_lines.is_empty());
    assert!(json_lines.last().unwrap().get("bler").is_none());
}

#[test]
fn bler_reporting_enabled() {
    let options = Options { bler: true, ..Options::default() };
    let json_lines =
        hex2json_with(&[0x7827_F928_7827_F928], &options, 0x7827, DeleteOneBlock::Block2);

    assert!(!json_lines.is_empty());
    // 1 erroneous block out of 4 * 12 in the averaging window
    assert_eq!(json_lines.last().unwrap()["bler"], 100 / (4 * 12));
}

#[test]
fn invalid_utf8_handled_cleanly() {
    let options = Options::default();
    // Must not panic
    let _ = hex2json(
        &[0xE24D_4401_D02F_1942, 0xE24D_E400_E24D_0000, 0xE24D_F400_E20D_FC20],
        &options,
        0xE24D,
    );
}

#[test]
fn rx_time_disabled() {
    let options = Options::default();
    let json_lines = hex2json(&[0x7827_F928_7827_F928], &options, 0x7827);

    assert!(!json_lines.is_empty());
    assert!(json_lines.last().unwrap().get("rx_time").is_none());
}

#[test]
fn rx_time_enabled() {
    let options =
        Options { timestamp: true, time_format: "%H:%M:%S".to_string(), ..Options::default() };
    let json_lines = hex2json(&[0x7827_F928_7827_F928], &options, 0x7827);

    assert!(!json_lines.is_empty());
    assert!(json_lines.last().unwrap().get("rx_time").is_some());
}
