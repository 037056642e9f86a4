// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A `Station` holds the decode state for one broadcast carrier, identified by its RDS PI
//! code, and dispatches incoming groups to the per-type decoders.

use std::collections::HashMap;
use std::io::Write;

use serde_json::Value;

use sideband_core::tree;
use sideband_core::units::AltFreqList;
use sideband_core::util::bits::get_bits;
use sideband_core::util::fmt::prefixed_hex_string;

use sideband_tmc::TmcService;

use crate::decode::{self, oda, SlowLabelingCodes};
use crate::group::{BlockNumber::*, Group, GroupType, Version};
use crate::options::Options;
use crate::output;
use crate::rft::RftFile;
use crate::tables;
use crate::text::{LongPs, ProgramServiceName, PtyName, RadioText, RdsString};

pub struct Station {
    pi: u16,
    has_pi: bool,
    options: Options,
    which_channel: usize,
    ps: ProgramServiceName,
    long_ps: LongPs,
    radiotext: RadioText,
    ert: RadioText,
    ptyname: PtyName,
    full_tdc: RdsString,
    slc: SlowLabelingCodes,
    oda_app_for_group: HashMap<GroupType, u16>,
    oda_app_for_pipe: HashMap<u16, u16>,
    eon_ps_names: HashMap<u16, RdsString>,
    eon_alt_freqs: HashMap<u16, AltFreqList>,
    last_group_had_pi: bool,
    alt_freq_list: AltFreqList,
    tmc: TmcService,
    // One RFT file per pipe
    rft_files: [RftFile; 16],
}

impl Station {
    pub fn new(options: &Options, which_channel: usize) -> Self {
        Station {
            pi: 0,
            has_pi: false,
            options: options.clone(),
            which_channel,
            ps: ProgramServiceName::new(),
            long_ps: LongPs::new(),
            radiotext: RadioText::new(),
            ert: RadioText::new(),
            ptyname: PtyName::new(),
            full_tdc: RdsString::new(32 * 4),
            slc: SlowLabelingCodes::default(),
            oda_app_for_group: HashMap::new(),
            oda_app_for_pipe: HashMap::new(),
            eon_ps_names: HashMap::new(),
            eon_alt_freqs: HashMap::new(),
            last_group_had_pi: false,
            alt_freq_list: AltFreqList::new(),
            tmc: TmcService::new(tables::country_string),
            rft_files: Default::default(),
        }
    }

    pub fn with_pi(options: &Options, which_channel: usize, pi: u16) -> Self {
        let mut station = Station::new(options, which_channel);
        station.pi = pi;
        station.has_pi = true;
        station
    }

    pub fn pi(&self) -> u16 {
        self.pi
    }

    /// Decodes one group and prints the resulting record, if any.
    pub fn update_and_print(&mut self, group: &Group, stream: &mut dyn Write) {
        if !self.has_pi {
            return;
        }

        let mut tree = Value::Null;

        if self.options.streams {
            tree::set(&mut tree, &["stream"], group.data_stream());
        }

        if group.group_type().version != Version::C {
            // Allow 1 group with missed PI. For subsequent misses, don't process at all.
            if group.has_pi() {
                self.last_group_had_pi = true;
            }
            else if self.last_group_had_pi {
                self.last_group_had_pi = false;
            }
            else {
                return;
            }

            if group.is_empty() {
                return;
            }

            tree::set(&mut tree, &["pi"], prefixed_hex_string(u32::from(self.pi), 4));
            if self.options.rbds {
                if let Some(callsign) = tables::callsign_from_pi(self.pi) {
                    // The back-calculation is known to fail for most TMC stations
                    if (self.pi & 0xF000) == 0x1000 {
                        tree::set(&mut tree, &["callsign_uncertain"], callsign);
                    }
                    else {
                        tree::set(&mut tree, &["callsign"], callsign);
                    }
                }
            }
        }

        if self.options.timestamp {
            if let Some(rx_time) = group.rx_time() {
                tree::set(
                    &mut tree,
                    &["rx_time"],
                    output::time_point_string(rx_time, &self.options.time_format),
                );
            }
        }

        if let Some(bler) = group.bler() {
            tree::set(&mut tree, &["bler"], bler.round() as i64);
        }

        if self.options.num_channels > 1 {
            tree::set(&mut tree, &["channel"], self.which_channel);
        }

        if self.options.show_raw {
            tree::set(&mut tree, &["raw_data"], group.as_hex());
        }

        decode::decode_basics(group, &mut tree, self.options.rbds);

        if group.has_type() {
            self.dispatch(group, &mut tree);
        }

        if self.options.time_from_start {
            if let Some(time_from_start) = group.time_from_start() {
                tree::set(&mut tree, &["time_from_start"], time_from_start);
            }
        }

        if tree::is_empty(&tree) {
            return;
        }

        output::print_json(&tree, stream);
    }

    // ODA support in groups
    // ---------------------
    //
    // -  can't be used for ODA
    // o  can be used for ODA
    // O  ODA only
    //
    //             111111
    //   0123456789012345
    // A -----ooooo-OOo--
    // B ---OOooOOOOOOO--
    fn dispatch(&mut self, group: &Group, tree: &mut Value) {
        let group_type = group.group_type();

        match (group_type.number, group_type.version) {
            (_, Version::C) => {
                decode::decode_c(group, tree, &mut self.oda_app_for_pipe, &mut self.rft_files);
            }

            // These groups can't be used for ODA
            (0, _) => decode::decode_type0(
                group,
                tree,
                &mut self.alt_freq_list,
                &mut self.ps,
                self.options.show_partial,
            ),
            (1, _) => decode::decode_type1(group, tree, &mut self.slc, self.pi),
            (2, _) => {
                decode::decode_type2(group, tree, &mut self.radiotext, self.options.show_partial)
            }
            (3, Version::A) => oda::decode_type3a(
                group,
                tree,
                &mut self.oda_app_for_group,
                &mut self.radiotext,
                &mut self.ert,
                &mut self.tmc,
            ),
            (4, Version::A) => decode::decode_type4a(group, tree),
            (10, Version::A) => decode::decode_type10a(group, tree, &mut self.ptyname),
            (14, _) => decode::decode_type14(
                group,
                tree,
                &mut self.eon_ps_names,
                &mut self.eon_alt_freqs,
                self.options.rbds,
            ),
            (15, Version::B) => decode::decode_type15b(group, tree),

            // Other groups can be reassigned for ODA by a 3A group
            _ if self.oda_app_for_group.contains_key(&group_type) => {
                oda::decode_oda_group(
                    group,
                    tree,
                    &self.oda_app_for_group,
                    &mut self.radiotext,
                    &mut self.ert,
                    &mut self.tmc,
                );
            }

            // Below: groups that could optionally be used for ODA but have another primary
            // function
            (5, _) => decode::decode_type5(group, tree, &mut self.full_tdc),
            (6, _) => decode::decode_type6(group, tree),
            (7, Version::A) => decode::decode_type7a(group, tree),
            (8, Version::A) => {
                if group.has(Block2) && group.has(Block3) && group.has(Block4) {
                    self.tmc.receive_user_group(
                        get_bits(group.get(Block2), 0, 5),
                        group.get(Block3),
                        group.get(Block4),
                        tree,
                    );
                }
            }
            (9, Version::A) => decode::decode_type9a(group, tree),
            (15, Version::A) => {
                decode::decode_type15a(group, tree, &mut self.long_ps, self.options.show_partial)
            }

            // ODA-only groups with no 3A registration seen:
            // 3B, 4B, 7B, 8B, 9B, 10B, 11A, 11B, 12A, 12B, 13A, 13B
            _ => {
                oda::decode_oda_group(
                    group,
                    tree,
                    &self.oda_app_for_group,
                    &mut self.radiotext,
                    &mut self.ert,
                    &mut self.tmc,
                );
            }
        }
    }
}
