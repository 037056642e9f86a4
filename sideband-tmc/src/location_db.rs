// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loader for TMC location databases in the TMC Exchange format: a directory of
//! semicolon-separated `.DAT` files describing points, roads, and segments.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{json, Value};

use crate::csv;

#[derive(Clone, Debug, Default)]
pub struct Point {
    pub lcd: u16,
    pub name1: String,
    pub road_name: String,
    pub roa_lcd: u16,
    pub seg_lcd: u16,
    pub neg_off: u16,
    pub pos_off: u16,
    pub lon: f32,
    pub lat: f32,
}

#[derive(Clone, Debug, Default)]
pub struct Road {
    pub lcd: u16,
    pub road_number: String,
    pub name: String,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Segment {
    pub lcd: u16,
    pub roa_lcd: u16,
}

#[derive(Clone, Debug, Default)]
pub struct AdminArea {
    pub lcd: u16,
    pub name: String,
}

#[derive(Clone, Debug, Default)]
pub struct LocationDatabase {
    pub ltn: u16,
    pub points: HashMap<u16, Point>,
    pub roads: HashMap<u16, Road>,
    pub names: HashMap<i32, String>,
    pub segments: HashMap<u16, Segment>,
    pub admin_areas: HashMap<u16, AdminArea>,
}

impl LocationDatabase {
    /// A one-line summary record, printed once after loading.
    pub fn info(&self) -> Value {
        json!({
            "location_table_info": {
                "ltn": self.ltn,
                "num_points": self.points.len(),
                "num_roads": self.roads.len(),
                "num_names": self.names.len(),
            }
        })
    }
}

/// Reads the location table number announced in `LOCATIONDATASETS.DAT`.
pub fn read_ltn(directory: &Path) -> u16 {
    let table = csv::read_csv_with_titles(&directory.join("LOCATIONDATASETS.DAT"), ';');

    let mut ltn = 0;
    for row in &table.rows {
        if let Some(value) = table.get_u16(row, "TABCD") {
            ltn = value;
        }
    }
    ltn
}

pub fn load_location_database(directory: &Path) -> LocationDatabase {
    let mut db = LocationDatabase::default();

    let table = csv::read_csv_with_titles_lossy(&directory.join("NAMES.DAT"), ';');
    for row in &table.rows {
        let (Some(nid), Some(name)) = (table.get_i32(row, "NID"), table.get_string(row, "NAME"))
        else {
            continue;
        };
        db.names.insert(nid, name.to_string());
    }

    let table = csv::read_csv_with_titles(&directory.join("ROADS.DAT"), ';');
    for row in &table.rows {
        let Some(lcd) = table.get_u16(row, "LCD") else { continue };
        let mut road = Road {
            lcd,
            road_number: table.get_string(row, "ROADNUMBER").unwrap_or_default().to_string(),
            name: String::new(),
        };
        if let Some(rnid) = table.get_i32(row, "RNID") {
            if let Some(name) = db.names.get(&rnid) {
                road.name = name.clone();
            }
        }
        db.roads.insert(lcd, road);
    }

    let table = csv::read_csv_with_titles(&directory.join("SEGMENTS.DAT"), ';');
    for row in &table.rows {
        let (Some(lcd), Some(roa_lcd)) = (table.get_u16(row, "LCD"), table.get_u16(row, "ROA_LCD"))
        else {
            continue;
        };
        db.segments.insert(lcd, Segment { lcd, roa_lcd });
    }

    let table = csv::read_csv_with_titles(&directory.join("POINTS.DAT"), ';');
    for row in &table.rows {
        let Some(lcd) = table.get_u16(row, "LCD") else { continue };
        if let Some(tabcd) = table.get_u16(row, "TABCD") {
            db.ltn = tabcd;
        }

        let mut point = Point { lcd, ..Default::default() };
        if let Some(n1id) = table.get_i32(row, "N1ID") {
            if let Some(name) = db.names.get(&n1id) {
                point.name1 = name.clone();
            }
        }
        if let Some(x) = table.get_i32(row, "XCOORD") {
            point.lon = x as f32 * 1e-5;
        }
        if let Some(y) = table.get_i32(row, "YCOORD") {
            point.lat = y as f32 * 1e-5;
        }
        point.roa_lcd = table.get_u16(row, "ROA_LCD").unwrap_or(0);
        point.seg_lcd = table.get_u16(row, "SEG_LCD").unwrap_or(0);

        if let Some(rnid) = table.get_i32(row, "RNID") {
            if let Some(name) = db.names.get(&rnid) {
                point.road_name = name.clone();
            }
        }

        // Points tied to a segment rather than a road inherit the segment's road.
        if point.roa_lcd == 0 {
            if let Some(segment) = db.segments.get(&point.seg_lcd) {
                point.roa_lcd = segment.roa_lcd;
            }
        }

        db.points.insert(lcd, point);
    }

    let table = csv::read_csv_with_titles(&directory.join("POFFSETS.DAT"), ';');
    for row in &table.rows {
        let (Some(lcd), Some(neg), Some(pos)) = (
            table.get_u16(row, "LCD"),
            table.get_u16(row, "NEG_OFF_LCD"),
            table.get_u16(row, "POS_OFF_LCD"),
        ) else {
            continue;
        };
        if let Some(point) = db.points.get_mut(&lcd) {
            point.neg_off = neg;
            point.pos_off = pos;
        }
    }

    let table = csv::read_csv_with_titles(&directory.join("ADMINISTRATIVEAREA.DAT"), ';');
    for row in &table.rows {
        let (Some(lcd), Some(name)) = (table.get_u16(row, "LCD"), table.get_string(row, "NID"))
        else {
            continue;
        };
        db.admin_areas.insert(lcd, AdminArea { lcd, name: name.to_string() });
    }

    log::info!("loaded location table {} ({} points)", db.ltn, db.points.len());

    db
}
