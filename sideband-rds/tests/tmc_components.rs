// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Component tests for TMC messages arriving through the full group-dispatch path.

mod common;

use common::hex2json;
use serde_json::json;
use sideband_rds::Options;

#[test]
fn tmc_system_info() {
    // DR P4 København (da) 2019-05-04
    let options = Options::default();
    let json_lines =
        hex2json(&[0x9602_3410_0267_CD46, 0x9602_3410_5B49_CD46], &options, 0x9602);

    assert_eq!(json_lines.len(), 2);
    assert_eq!(json_lines[0]["open_data_app"]["oda_group"], "8A");
    assert_eq!(json_lines[0]["open_data_app"]["app_name"], "RDS-TMC: ALERT-C");
    assert_eq!(json_lines[0]["tmc"]["system_info"]["is_encrypted"], false);
    assert_eq!(json_lines[0]["tmc"]["system_info"]["location_table"], 9);
    assert_eq!(json_lines[1]["tmc"]["system_info"]["service_id"], 45);
    assert_eq!(json_lines[1]["tmc"]["system_info"]["gap"], 5);
    assert_eq!(json_lines[1]["tmc"]["system_info"]["ltcc"], 9);
}

#[test]
fn tmc_multi_group_message_with_stop_time() {
    // DR P4 København (da) 2019-05-04
    let options = Options::default();
    let json_lines = hex2json(
        &[0x9602_3410_0267_CD46, 0x9602_8405_C852_2550, 0x9602_8405_48F4_0000],
        &options,
        0x9602,
    );

    assert_eq!(json_lines.len(), 3);
    let message = &json_lines[2]["tmc"]["message"];
    assert_eq!(message["event_codes"], json!([82]));
    assert_eq!(message["update_class"], 32);
    assert_eq!(message["description"], "Roadworks. Heavy traffic has to be expected.");
    assert_eq!(message["location"], 9552);
    assert_eq!(message["direction"], "single");
    assert_eq!(message["extent"], "-1");
    assert_eq!(message["until"], "mid-July");
    assert_eq!(message["urgency"], "none");
}

#[test]
fn tmc_message_with_speed_limit() {
    // DR P4 København (da) 2019-05-04
    let options = Options::default();
    let json_lines = hex2json(
        &[0x9602_3410_0267_CD46, 0x9602_8406_D2BD_06DB, 0x9602_8406_4384_7E00],
        &options,
        0x9602,
    );

    let message = &json_lines[2]["tmc"]["message"];
    assert_eq!(message["event_codes"], json!([701]));
    assert_eq!(message["update_class"], 11);
    assert_eq!(message["description"], "Roadworks.");
    assert_eq!(message["speed_limit"], "80 km/h");
    assert_eq!(message["location"], 1755);
    assert_eq!(message["direction"], "single");
    assert_eq!(message["extent"], "-2");
    assert_eq!(message["until"], "mid-November");
    assert_eq!(message["urgency"], "none");
}

#[test]
fn tmc_multi_event_message() {
    // Radio-K (at) 2021-07-26
    let options = Options::default();
    let json_lines = hex2json(
        &[0xA502_3410_0064_CD46, 0xA502_8405_C201_7BEB, 0xA502_8405_415D_2C8C],
        &options,
        0xA502,
    );

    assert_eq!(json_lines.len(), 3);
    let message = &json_lines[2]["tmc"]["message"];
    assert_eq!(message["event_codes"], json!([513, 803]));
    assert_eq!(message["update_class"], 5);
    assert_eq!(message["description"], "Single alternate line traffic. Construction work.");
    assert_eq!(message["location"], 31723);
    assert_eq!(message["direction"], "single");
    assert_eq!(message["extent"], "-0");
    assert_eq!(message["urgency"], "none");
}

#[test]
fn tmc_multi_event_with_quantifier() {
    // Ö1 (at) 2017-12-27
    let options = Options::default();
    let json_lines = hex2json(
        &[0xA201_3010_0064_CD46, 0xA201_8003_C641_8097, 0xA201_8003_441F_4865],
        &options,
        0xA201,
    );

    assert_eq!(json_lines.len(), 3);
    assert_eq!(
        json_lines[2]["tmc"]["message"]["description"],
        "Delays of up to 15 minutes. Stationary traffic."
    );
}
