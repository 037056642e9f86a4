// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `sideband` command-line RDS decoder.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod input;
mod options;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use log::error;

use sideband_rds::demod::SubcarrierSet;
use sideband_rds::{output, Channel};

use crate::input::{read_hex_group, read_tef_group, AsciiBitReader, MpxReader};
use crate::options::{CliOptions, InputType};

fn print_usage() {
    print!(
        "radio_command | sideband [OPTIONS]\n\
         sideband [OPTIONS] < raw_signal_file.s16\n\
         \n\
         By default, a 171 kHz single-channel 16-bit MPX signal is expected via stdin.\n\
         \n\
         -c, --channels CHANS   Number of channels in the raw input signal. Channels are\n\
         \x20                      interleaved streams of samples that are demodulated\n\
         \x20                      independently.\n\
         \n\
         -e, --feed-through     Echo the input signal to stdout and print decoded groups\n\
         \x20                      to stderr.\n\
         \n\
         -E, --bler             Display the average block error rate, or the percentage\n\
         \x20                      of blocks that had errors before error correction.\n\
         \x20                      Averaged over the last 12 groups. For hex input, this is\n\
         \x20                      the percentage of missing blocks.\n\
         \n\
         -f, --file FILENAME    Use an audio file as MPX input.\n\
         \n\
         -i, --input FORMAT     Decode stdin as FORMAT:\n\
         \x20                       bits Unsynchronized ASCII bit stream (011010110...).\n\
         \x20                            All characters but '0' and '1' are ignored.\n\
         \x20                       hex  RDS Spy hex format.\n\
         \x20                       mpx  Mono S16LE PCM-encoded MPX waveform (default).\n\
         \x20                       tef  Serial data from the TEF6686 tuner.\n\
         \n\
         -l, --loctable DIR     Load TMC location table from a directory in TMC Exchange\n\
         \x20                      format. May be given multiple times to load several\n\
         \x20                      location tables.\n\
         \n\
         -p, --show-partial     Display PS names, RadioText, and alternative frequencies\n\
         \x20                      even while they're incomplete, as partial_{{ps,radiotext,\n\
         \x20                      alt_frequencies}}.\n\
         \n\
         -r, --samplerate RATE  Set stdin sample frequency in Hz. Will resample (slow)\n\
         \x20                      if this differs from 171000 Hz.\n\
         \n\
         -R, --show-raw         Show raw group data as hex in the JSON stream.\n\
         \n\
         -s, --streams          Decode all four RDS2 data streams.\n\
         \n\
         -t, --timestamp FORMAT Add time of decoding to JSON groups; see man strftime\n\
         \x20                      for formatting options (or try \"%c\"). Use \"%f\" to add\n\
         \x20                      hundredths of seconds.\n\
         \n\
         -u, --rbds             RBDS mode; use North American programme-type names and\n\
         \x20                      \"back-calculate\" the station's callsign from its PI\n\
         \x20                      code. This calculation gives an incorrect callsign for\n\
         \x20                      most stations that transmit TMC.\n\
         \n\
         -v, --version          Print version string and exit.\n\
         \n\
         -x, --output-hex       Output hex groups in the RDS Spy format, suppressing\n\
         \x20                      JSON output.\n"
    );
}

fn print_version() {
    println!("sideband {}", env!("CARGO_PKG_VERSION"));
}

// The decoded output goes to stdout, unless the input signal is echoed there.
fn output_stream(options: &CliOptions) -> Box<dyn Write> {
    if options.feed_thru {
        Box::new(io::stderr())
    }
    else {
        Box::new(io::stdout())
    }
}

fn load_location_tables(options: &CliOptions, out: &mut dyn Write) {
    if options.loctable_dirs.is_empty() {
        return;
    }

    for info in sideband_tmc::service::load_location_tables(&options.loctable_dirs) {
        output::print_json(&info, out);
    }
}

fn process_mpx_input(options: &CliOptions) -> ExitCode {
    let mut mpx = match MpxReader::init(options) {
        Ok(mpx) => mpx,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut options = options.clone();
    options.decoder.num_channels = mpx.num_channels() as u32;
    options.samplerate = mpx.samplerate();

    let mut out = output_stream(&options);
    load_location_tables(&options, out.as_mut());

    let num_streams = if options.decoder.streams { 4 } else { 1 };

    let mut channels: Vec<Channel> = (0..mpx.num_channels())
        .map(|ch| Channel::new(&options.decoder, ch))
        .collect();
    let mut subcarriers: Vec<SubcarrierSet> = Vec::new();
    for _ in 0..mpx.num_channels() {
        match SubcarrierSet::new(mpx.samplerate()) {
            Ok(set) => subcarriers.push(set),
            Err(err) => {
                error!("{}", err);
                return ExitCode::FAILURE;
            }
        }
    }

    while !mpx.eof() {
        mpx.fill_buffer();
        for (i, channel) in channels.iter_mut().enumerate() {
            let chunk = mpx.read_chunk(i);
            let bits = subcarriers[i].process_chunk(chunk, num_streams);
            channel.process_bits(&bits, out.as_mut());
        }
    }

    for channel in channels.iter_mut() {
        channel.flush(out.as_mut());
    }

    ExitCode::SUCCESS
}

fn process_ascii_bits_input(options: &CliOptions) -> ExitCode {
    let mut out = output_stream(options);
    load_location_tables(options, out.as_mut());

    let mut channel = Channel::new(&options.decoder, 0);
    let mut reader = AsciiBitReader::new(options);

    while let Some(bit) = reader.read_bit() {
        channel.process_bit(bit, 0, out.as_mut());
    }

    channel.flush(out.as_mut());

    ExitCode::SUCCESS
}

fn process_hex_input(options: &CliOptions) -> ExitCode {
    let mut out = output_stream(options);
    load_location_tables(options, out.as_mut());

    let mut channel = Channel::new(&options.decoder, 0);
    let stdin = io::stdin();
    let mut reader = stdin.lock();

    while let Some(group) =
        read_hex_group(&mut reader, options.feed_thru, options.decoder.timestamp)
    {
        let stream = group.data_stream() as usize;
        channel.process_group(group, stream, out.as_mut());
    }

    ExitCode::SUCCESS
}

fn process_tef_input(options: &CliOptions) -> ExitCode {
    let mut out = output_stream(options);
    load_location_tables(options, out.as_mut());

    let mut channel = Channel::new(&options.decoder, 0);
    let stdin = io::stdin();
    let mut reader: Box<dyn BufRead> = Box::new(stdin.lock());

    while let Some(group) = read_tef_group(reader.as_mut(), options.feed_thru) {
        channel.process_group(group, 0, out.as_mut());
    }

    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    let options = match options::get_options(std::env::args()) {
        Ok(options) => options,
        Err(message) => {
            error!("{}", message);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if options.print_usage {
        print_usage();
        return ExitCode::SUCCESS;
    }

    if options.print_version {
        print_version();
        return ExitCode::SUCCESS;
    }

    match options.input_type {
        InputType::MpxStdin | InputType::MpxSndfile => process_mpx_input(&options),
        InputType::AsciiBits => process_ascii_bits_input(&options),
        InputType::Hex => process_hex_input(&options),
        InputType::Tef6686 => process_tef_input(&options),
    }
}
