// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command-line option parsing and validation.

use std::path::PathBuf;

use clap::{App, Arg};
use log::warn;

use sideband_rds::{Options, OutputType, MAXIMUM_SAMPLE_RATE_HZ, MINIMUM_SAMPLE_RATE_HZ, TARGET_SAMPLE_RATE_HZ};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputType {
    MpxStdin,
    MpxSndfile,
    AsciiBits,
    Hex,
    Tef6686,
}

#[derive(Clone, Debug)]
pub struct CliOptions {
    pub input_type: InputType,
    pub feed_thru: bool,
    pub samplerate: f32,
    pub is_rate_defined: bool,
    pub is_num_channels_defined: bool,
    pub sndfilename: String,
    pub loctable_dirs: Vec<PathBuf>,
    pub print_usage: bool,
    pub print_version: bool,
    pub decoder: Options,
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions {
            input_type: InputType::MpxStdin,
            feed_thru: false,
            samplerate: 0.0,
            is_rate_defined: false,
            is_num_channels_defined: false,
            sndfilename: String::new(),
            loctable_dirs: Vec::new(),
            print_usage: false,
            print_version: false,
            decoder: Options::default(),
        }
    }
}

// Channels take up memory, and we don't want to fill it up by accident.
const MAX_NUM_CHANNELS: i64 = 32;

/// Parses a possibly SI-suffixed number ("171k", "40M").
fn parse_si(text: &str) -> Option<f32> {
    let text = text.trim();
    let (number, factor) = match text.chars().last() {
        Some('k') | Some('K') => (&text[..text.len() - 1], 1e3),
        Some('M') => (&text[..text.len() - 1], 1e6),
        _ => (text, 1.0),
    };

    number.parse::<f32>().ok().map(|value| value * factor)
}

fn build_app() -> App<'static> {
    App::new("sideband")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(Arg::new("input-bits").short('b').long("input-bits"))
        .arg(Arg::new("channels").short('c').long("channels").takes_value(true))
        .arg(Arg::new("feed-through").short('e').long("feed-through"))
        .arg(Arg::new("bler").short('E').long("bler"))
        .arg(Arg::new("file").short('f').long("file").takes_value(true))
        .arg(Arg::new("input-hex").short('h').long("input-hex"))
        .arg(Arg::new("input").short('i').long("input").takes_value(true))
        .arg(
            Arg::new("loctable")
                .short('l')
                .long("loctable")
                .takes_value(true)
                .multiple_occurrences(true),
        )
        .arg(Arg::new("output").short('o').long("output").takes_value(true))
        .arg(Arg::new("show-partial").short('p').long("show-partial"))
        .arg(Arg::new("samplerate").short('r').long("samplerate").takes_value(true))
        .arg(Arg::new("show-raw").short('R').long("show-raw"))
        .arg(Arg::new("streams").short('s').long("streams"))
        .arg(Arg::new("timestamp").short('t').long("timestamp").takes_value(true))
        .arg(Arg::new("rbds").short('u').long("rbds"))
        .arg(Arg::new("version").short('v').long("version"))
        .arg(Arg::new("output-hex").short('x').long("output-hex"))
        .arg(Arg::new("no-fec").long("no-fec"))
        .arg(Arg::new("time-from-start").long("time-from-start"))
        .arg(Arg::new("help").long("help"))
}

/// Parses and validates the command line. Fatal inconsistencies come back as `Err`;
/// surprising-but-workable combinations only log a warning.
pub fn get_options<I, T>(args: I) -> Result<CliOptions, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches =
        build_app().try_get_matches_from(args).map_err(|err| err.to_string())?;

    let mut options = CliOptions::default();
    let mut has_custom_input_type = false;

    if matches.is_present("input-bits") {
        // For backwards compatibility
        options.input_type = InputType::AsciiBits;
        has_custom_input_type = true;
    }

    if let Some(channels) = matches.value_of("channels") {
        let parsed = parse_si(channels).map(|v| v as i64);
        match parsed {
            Some(n) if n > 0 && n <= MAX_NUM_CHANNELS => {
                options.decoder.num_channels = n as u32;
                options.is_num_channels_defined = true;
            }
            _ => return Err("check the number of channels".to_string()),
        }
    }

    options.feed_thru = matches.is_present("feed-through");
    options.decoder.bler = matches.is_present("bler");

    if let Some(filename) = matches.value_of("file") {
        options.sndfilename = filename.to_string();
        options.input_type = InputType::MpxSndfile;
    }

    if matches.is_present("input-hex") {
        // For backwards compatibility
        options.input_type = InputType::Hex;
        has_custom_input_type = true;
    }

    if let Some(input_type) = matches.value_of("input") {
        options.input_type = match input_type {
            "hex" => InputType::Hex,
            "mpx" => InputType::MpxStdin,
            "tef" => InputType::Tef6686,
            "bits" => InputType::AsciiBits,
            _ => return Err(format!("unknown input format '{}'", input_type)),
        };
        has_custom_input_type = true;
    }

    if let Some(output_type) = matches.value_of("output") {
        options.decoder.output_type = match output_type {
            "hex" => OutputType::Hex,
            "json" => OutputType::Json,
            _ => return Err(format!("unknown output format '{}'", output_type)),
        };
    }
    if matches.is_present("output-hex") {
        // For backwards compatibility
        options.decoder.output_type = OutputType::Hex;
    }

    options.decoder.show_partial = matches.is_present("show-partial");

    if let Some(rate) = matches.value_of("samplerate") {
        let parsed =
            parse_si(rate).ok_or_else(|| "check the sample rate parameter".to_string())?;
        if parsed < MINIMUM_SAMPLE_RATE_HZ || parsed > MAXIMUM_SAMPLE_RATE_HZ {
            return Err(format!(
                "sample rate was set to {}, but it must be between {} and {} Hz",
                parsed, MINIMUM_SAMPLE_RATE_HZ, MAXIMUM_SAMPLE_RATE_HZ
            ));
        }
        options.samplerate = parsed;
        options.is_rate_defined = true;
    }

    options.decoder.show_raw = matches.is_present("show-raw");
    options.decoder.streams = matches.is_present("streams");

    if let Some(format) = matches.value_of("timestamp") {
        options.decoder.timestamp = true;
        options.decoder.time_format = format.to_string();
    }

    options.decoder.rbds = matches.is_present("rbds");

    if let Some(dirs) = matches.values_of("loctable") {
        options.loctable_dirs = dirs.map(PathBuf::from).collect();
    }

    options.print_version = matches.is_present("version");
    options.print_usage = matches.is_present("help");
    options.decoder.use_fec = !matches.is_present("no-fec");
    options.decoder.time_from_start = matches.is_present("time-from-start");

    //
    // Fatal validation errors - we don't know what the user asked for
    //

    if has_custom_input_type && !options.sndfilename.is_empty() {
        return Err("incompatible options: --input and --file".to_string());
    }

    if options.feed_thru && options.input_type == InputType::MpxSndfile {
        return Err("feed-thru is not supported for MPX file input (try via stdin)".to_string());
    }

    if options.decoder.num_channels > 1
        && options.input_type != InputType::MpxStdin
        && options.input_type != InputType::MpxSndfile
    {
        return Err("multi-channel input is only supported for MPX signals".to_string());
    }

    if options.decoder.streams
        && options.input_type != InputType::MpxSndfile
        && options.input_type != InputType::MpxStdin
        && options.input_type != InputType::Hex
    {
        return Err("RDS2 data streams are only supported for MPX and hex input".to_string());
    }

    if options.decoder.time_from_start
        && options.input_type != InputType::MpxStdin
        && options.input_type != InputType::MpxSndfile
    {
        return Err("--time-from-start only works for MPX input".to_string());
    }

    if options.is_rate_defined
        && options.input_type != InputType::MpxStdin
        && options.input_type != InputType::MpxSndfile
    {
        return Err("sample rate is only supported for MPX input".to_string());
    }

    //
    // Warnings - we can start, but results may be surprising
    //

    if !options.decoder.use_fec
        && (options.input_type == InputType::Hex || options.input_type == InputType::Tef6686)
    {
        warn!("--no-fec ignored for hex or tef6686 input");
    }

    if options.decoder.show_partial && options.decoder.output_type == OutputType::Hex {
        warn!("--show-partial ignored for hex output");
    }

    if options.decoder.show_raw && options.decoder.output_type == OutputType::Hex {
        warn!("--show-raw ignored for hex output");
    }

    if !options.loctable_dirs.is_empty() && options.decoder.output_type == OutputType::Hex {
        warn!("--loctable ignored for hex output");
    }

    if options.decoder.bler && options.decoder.output_type == OutputType::Hex {
        warn!("--bler ignored for hex output");
    }

    let assuming_raw_mpx = options.input_type == InputType::MpxStdin
        && !options.print_usage
        && !options.print_version;

    if assuming_raw_mpx && !options.is_rate_defined {
        warn!("raw MPX sample rate not defined, assuming {} Hz", TARGET_SAMPLE_RATE_HZ as u32);
        options.samplerate = TARGET_SAMPLE_RATE_HZ;
    }

    if options.decoder.streams && options.input_type == InputType::Hex {
        warn!("--streams has no effect for hex input (streams are read automatically)");
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_defaults() {
        let options = get_options(["sideband"]).unwrap();
        assert_eq!(options.input_type, InputType::MpxStdin);
        assert_eq!(options.decoder.output_type, OutputType::Json);
        assert!(options.decoder.use_fec);
        assert_eq!(options.samplerate, TARGET_SAMPLE_RATE_HZ);
    }

    #[test]
    fn verify_si_suffixes() {
        assert_eq!(parse_si("171k"), Some(171_000.0));
        assert_eq!(parse_si("40M"), Some(40_000_000.0));
        assert_eq!(parse_si("250000"), Some(250_000.0));
        assert_eq!(parse_si("bogus"), None);
    }

    #[test]
    fn verify_input_selection() {
        let options = get_options(["sideband", "-i", "hex"]).unwrap();
        assert_eq!(options.input_type, InputType::Hex);

        let options = get_options(["sideband", "--input", "bits", "--no-fec"]).unwrap();
        assert_eq!(options.input_type, InputType::AsciiBits);
        assert!(!options.decoder.use_fec);

        assert!(get_options(["sideband", "-i", "nonsense"]).is_err());
    }

    #[test]
    fn verify_incompatible_options_rejected() {
        assert!(get_options(["sideband", "-i", "hex", "-f", "x.wav"]).is_err());
        assert!(get_options(["sideband", "-e", "-f", "x.wav"]).is_err());
        assert!(get_options(["sideband", "-c", "2", "-i", "bits"]).is_err());
        assert!(get_options(["sideband", "-r", "10k"]).is_err());
    }

    #[test]
    fn verify_timestamp_format_captured() {
        let options = get_options(["sideband", "-i", "hex", "-t", "%H:%M:%S"]).unwrap();
        assert!(options.decoder.timestamp);
        assert_eq!(options.decoder.time_format, "%H:%M:%S");
    }
}
