// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A minimal reader for the delimiter-separated tables used by TMC: the embedded event list
//! and the TMC Exchange location database files. The format has no quoting or escapes.

use std::fs;
use std::path::Path;

#[derive(Clone, Debug)]
pub struct CsvRow {
    fields: Vec<String>,
}

impl CsvRow {
    fn parse(line: &str, delimiter: char) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        CsvRow { fields: line.split(delimiter).map(str::to_string).collect() }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct CsvTable {
    titles: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    fn title_index(&self, title: &str) -> Option<usize> {
        self.titles.iter().position(|t| t == title)
    }

    pub fn get_string<'a>(&self, row: &'a CsvRow, title: &str) -> Option<&'a str> {
        row.get(self.title_index(title)?)
    }

    pub fn get_i32(&self, row: &CsvRow, title: &str) -> Option<i32> {
        self.get_string(row, title)?.trim().parse().ok()
    }

    pub fn get_u16(&self, row: &CsvRow, title: &str) -> Option<u16> {
        self.get_string(row, title)?.trim().parse().ok()
    }

    /// True if the row has a non-empty value in the titled column.
    pub fn row_contains(&self, row: &CsvRow, title: &str) -> bool {
        self.get_string(row, title).is_some_and(|s| !s.is_empty())
    }
}

pub fn parse_csv(text: &str, delimiter: char) -> Vec<CsvRow> {
    text.lines().map(|line| CsvRow::parse(line, delimiter)).collect()
}

pub fn parse_csv_with_titles(text: &str, delimiter: char) -> CsvTable {
    let mut rows = parse_csv(text, delimiter);
    if rows.is_empty() {
        return CsvTable::default();
    }
    let titles = rows.remove(0);
    CsvTable { titles: titles.fields, rows }
}

/// Reads a delimiter-separated file. A missing or unreadable file yields no rows.
pub fn read_csv(path: &Path, delimiter: char) -> Vec<CsvRow> {
    match fs::read_to_string(path) {
        Ok(text) => parse_csv(&text, delimiter),
        Err(_) => Vec::new(),
    }
}

pub fn read_csv_with_titles(path: &Path, delimiter: char) -> CsvTable {
    match fs::read_to_string(path) {
        Ok(text) => parse_csv_with_titles(&text, delimiter),
        Err(_) => CsvTable::default(),
    }
}

/// Reads a file that may be Latin-1 rather than UTF-8, substituting characters as needed.
pub fn read_csv_with_titles_lossy(path: &Path, delimiter: char) -> CsvTable {
    match fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => parse_csv_with_titles(&text, delimiter),
            Err(err) => {
                // Not UTF-8: decode as Latin-1, which maps bytes to code points directly.
                let text: String =
                    err.as_bytes().iter().map(|&b| char::from_u32(u32::from(b)).unwrap()).collect();
                parse_csv_with_titles(&text, delimiter)
            }
        },
        Err(_) => CsvTable::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_parse_with_titles() {
        let table = parse_csv_with_titles("LCD;NAME\r\n1;Main Road\r\n2;Ring\r\n", ';');
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.get_string(&table.rows[0], "NAME"), Some("Main Road"));
        assert_eq!(table.get_u16(&table.rows[1], "LCD"), Some(2));
        assert!(!table.row_contains(&table.rows[0], "MISSING"));
    }

    #[test]
    fn verify_short_rows_are_tolerated() {
        let table = parse_csv_with_titles("A;B;C\n1;2\n", ';');
        assert_eq!(table.get_string(&table.rows[0], "C"), None);
        assert_eq!(table.get_i32(&table.rows[0], "B"), Some(2));
    }
}
