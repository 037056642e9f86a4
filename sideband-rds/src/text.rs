// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wrappers around [`RdsString`] for the text fields a station carries: RadioText, the
//! Programme Service name, Long PS, and the PTY name.

pub use sideband_core::text::{Direction, Encoding, RdsString};

/// State for the RT+ (RadioText Plus) tagging application.
#[derive(Clone, Debug, Default)]
pub struct RadioTextPlus {
    pub exists: bool,
    pub cb: bool,
    pub scb: u16,
    pub template_num: u16,
    pub toggle: bool,
    pub item_running: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Tag {
    pub content_type: u32,
    pub start: u16,
    pub length: u16,
}

/// RadioText (2A/2B) or Enhanced RadioText, with its associated RT+ state.
#[derive(Clone, Debug)]
pub struct RadioText {
    pub text: RdsString,
    pub plus: RadioTextPlus,
    pub uses_chartable_e3: bool,
    /// The last full-buffer decode seen while waiting for a length-method-C repeat.
    pub previous_potentially_complete_message: String,
    ab: bool,
}

impl Default for RadioText {
    fn default() -> Self {
        RadioText {
            text: RdsString::new(64),
            plus: RadioTextPlus::default(),
            uses_chartable_e3: false,
            previous_potentially_complete_message: String::new(),
            ab: false,
        }
    }
}

impl RadioText {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records the A/B flag; true if it changed, which requests a buffer clear.
    pub fn is_ab_changed(&mut self, new_ab: bool) -> bool {
        let changed = self.ab != new_ab;
        self.ab = new_ab;
        changed
    }

    pub fn update(&mut self, pos: usize, byte1: u8, byte2: u8) {
        self.text.set_pair(pos, byte1, byte2);
    }
}

/// The 8-character Programme Service name (group 0).
#[derive(Clone, Debug)]
pub struct ProgramServiceName {
    pub text: RdsString,
}

impl Default for ProgramServiceName {
    fn default() -> Self {
        ProgramServiceName { text: RdsString::new(8) }
    }
}

impl ProgramServiceName {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn update(&mut self, pos: usize, byte1: u8, byte2: u8) {
        self.text.set_pair(pos, byte1, byte2);
    }
}

/// The UTF-8 encoded Long PS (group 15A).
#[derive(Clone, Debug)]
pub struct LongPs {
    pub text: RdsString,
}

impl Default for LongPs {
    fn default() -> Self {
        let mut text = RdsString::new(32);
        text.set_encoding(Encoding::Utf8);
        LongPs { text }
    }
}

impl LongPs {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn update(&mut self, pos: usize, byte1: u8, byte2: u8) {
        self.text.set_pair(pos, byte1, byte2);
    }
}

/// The 8-character Programme Type name (group 10A).
#[derive(Clone, Debug)]
pub struct PtyName {
    pub text: RdsString,
    ab: bool,
}

impl Default for PtyName {
    fn default() -> Self {
        PtyName { text: RdsString::new(8), ab: false }
    }
}

impl PtyName {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_ab_changed(&mut self, new_ab: bool) -> bool {
        let changed = self.ab != new_ab;
        self.ab = new_ab;
        changed
    }

    pub fn update(&mut self, pos: usize, chars: [u8; 4]) {
        self.text.set_pair(pos, chars[0], chars[1]);
        self.text.set_pair(pos + 2, chars[2], chars[3]);
    }
}
