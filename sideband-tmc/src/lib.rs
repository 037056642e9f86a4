// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoder for the RDS Traffic Message Channel (TMC), carrying ALERT-C coded traffic events
//! per ISO 14819-1.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod csv;
pub mod event_db;
pub mod location_db;
pub mod message;
pub mod service;

pub use message::{Message, ServiceKey};
pub use service::TmcService;
