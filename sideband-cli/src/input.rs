// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input readers: raw MPX via stdin, audio files, ASCII bit streams, RDS Spy hex logs, and
//! TEF6686 serial output.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;

use chrono::Local;
use log::warn;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use sideband_core::errors::{unsupported_error, Result, SidebandError};
use sideband_rds::demod::{MpxBuffer, INPUT_CHUNK_SIZE};
use sideband_rds::group::{Block, BlockNumber, Group};
use sideband_rds::{MAXIMUM_SAMPLE_RATE_HZ, MINIMUM_SAMPLE_RATE_HZ};

use crate::options::{CliOptions, InputType};

enum Source {
    RawStdin,
    File {
        format: Box<dyn FormatReader>,
        decoder: Box<dyn Decoder>,
        track_id: u32,
        sample_buf: Option<SampleBuffer<f32>>,
        pending: VecDeque<f32>,
    },
}

/// Reads an FM multiplex signal from an audio file or raw PCM via stdin, separates it into
/// channels, and converts it to chunks of floating-point samples.
pub struct MpxReader {
    source: Source,
    num_channels: usize,
    samplerate: f32,
    feed_thru: bool,
    chunk_size: usize,
    buffer: MpxBuffer,
    buffer_singlechan: MpxBuffer,
    is_eof: bool,
}

impl MpxReader {
    pub fn init(options: &CliOptions) -> Result<Self> {
        let (source, samplerate, num_channels) = match options.input_type {
            InputType::MpxStdin => {
                (Source::RawStdin, options.samplerate, options.decoder.num_channels as usize)
            }
            InputType::MpxSndfile => {
                let (source, samplerate, num_channels) = open_audio_file(&options.sndfilename)?;

                if options.is_rate_defined {
                    warn!("ignoring sample rate parameter");
                }
                if options.is_num_channels_defined {
                    warn!("ignoring number of channels parameter");
                }

                (source, samplerate, num_channels)
            }
            _ => return unsupported_error("input type is not MPX"),
        };

        if samplerate < MINIMUM_SAMPLE_RATE_HZ {
            return Err(SidebandError::Other("sample rate must be 128000 Hz or higher"));
        }
        if options.decoder.streams && samplerate < 171_000.0 {
            return Err(SidebandError::Other(
                "RDS2 data streams require a sample rate of 171 kHz or higher",
            ));
        }
        if samplerate > MAXIMUM_SAMPLE_RATE_HZ {
            return Err(SidebandError::Other("sample rate must be no higher than 40 MHz"));
        }

        let chunk_size = (INPUT_CHUNK_SIZE / num_channels) * num_channels;

        Ok(MpxReader {
            source,
            num_channels,
            samplerate,
            feed_thru: options.feed_thru,
            chunk_size,
            buffer: MpxBuffer::new(),
            buffer_singlechan: MpxBuffer::new(),
            is_eof: false,
        })
    }

    pub fn eof(&self) -> bool {
        self.is_eof
    }

    pub fn samplerate(&self) -> f32 {
        self.samplerate
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Fills the internal buffer with fresh samples. Call before reading the first channel.
    pub fn fill_buffer(&mut self) {
        self.buffer.data.clear();

        match &mut self.source {
            Source::RawStdin => {
                let mut bytes = vec![0u8; self.chunk_size * 2];
                let num_bytes = read_fully(&mut io::stdin().lock(), &mut bytes);

                if self.feed_thru {
                    let _ = io::stdout().write_all(&bytes[..num_bytes]);
                }

                for sample in bytes[..num_bytes & !1].chunks_exact(2) {
                    let value = i16::from_le_bytes([sample[0], sample[1]]);
                    self.buffer.data.push(f32::from(value) / 32_768.0);
                }
            }
            Source::File { format, decoder, track_id, sample_buf, pending } => {
                while pending.len() < self.chunk_size {
                    let packet = match format.next_packet() {
                        Ok(packet) => packet,
                        Err(_) => break,
                    };

                    if packet.track_id() != *track_id {
                        continue;
                    }

                    match decoder.decode(&packet) {
                        Ok(decoded) => {
                            let buf = sample_buf.get_or_insert_with(|| {
                                SampleBuffer::<f32>::new(
                                    decoded.capacity() as u64,
                                    *decoded.spec(),
                                )
                            });
                            buf.copy_interleaved_ref(decoded);
                            pending.extend(buf.samples().iter().copied());
                        }
                        Err(symphonia::core::errors::Error::DecodeError(err)) => {
                            warn!("decode error: {}", err);
                            continue;
                        }
                        Err(_) => break,
                    }
                }

                let take = pending.len().min(self.chunk_size);
                self.buffer.data.extend(pending.drain(..take));
            }
        }

        self.buffer.time_received = Local::now();

        if self.buffer.data.len() < self.chunk_size {
            self.is_eof = true;
        }
    }

    /// Reads the current chunk of samples on the given PCM channel. Call `fill_buffer`
    /// first.
    pub fn read_chunk(&mut self, channel: usize) -> &MpxBuffer {
        assert!(channel < self.num_channels);

        if self.num_channels == 1 {
            &self.buffer
        }
        else {
            self.buffer_singlechan.data.clear();
            self.buffer_singlechan.data.extend(
                self.buffer.data.iter().skip(channel).step_by(self.num_channels).copied(),
            );
            self.buffer_singlechan.time_received = self.buffer.time_received;
            &self.buffer_singlechan
        }
    }
}

fn read_fully(reader: &mut dyn Read, buffer: &mut [u8]) -> usize {
    let mut total = 0;
    while total < buffer.len() {
        match reader.read(&mut buffer[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    total
}

fn open_audio_file(path: &str) -> Result<(Source, f32, usize)> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = Path::new(path).extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|_| SidebandError::Other("unsupported audio file format"))?;

    let format = probed.format;
    let track = format
        .default_track()
        .ok_or(SidebandError::Other("audio file contains no decodable track"))?;

    let samplerate = track
        .codec_params
        .sample_rate
        .ok_or(SidebandError::Other("audio file does not declare a sample rate"))?;
    let num_channels = track
        .codec_params
        .channels
        .map(|channels| channels.count())
        .ok_or(SidebandError::Other("audio file does not declare its channels"))?;

    let decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|_| SidebandError::Other("unsupported audio codec"))?;
    let track_id = track.id;

    Ok((
        Source::File { format, decoder, track_id, sample_buf: None, pending: VecDeque::new() },
        samplerate as f32,
        num_channels,
    ))
}

/// Reads an unsynchronized serial bitstream as '0' and '1' characters. All other characters
/// are ignored.
pub struct AsciiBitReader<R: BufRead> {
    reader: R,
    feed_thru: bool,
}

impl AsciiBitReader<io::BufReader<io::Stdin>> {
    pub fn new(options: &CliOptions) -> Self {
        AsciiBitReader { reader: io::BufReader::new(io::stdin()), feed_thru: options.feed_thru }
    }
}

impl<R: BufRead> AsciiBitReader<R> {
    pub fn with_reader(reader: R, feed_thru: bool) -> Self {
        AsciiBitReader { reader, feed_thru }
    }

    /// The next bit, or `None` at end of input.
    pub fn read_bit(&mut self) -> Option<bool> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return None,
                Ok(_) => {
                    if self.feed_thru {
                        let _ = io::stdout().write_all(&byte);
                    }
                    match byte[0] {
                        b'0' => return Some(false),
                        b'1' => return Some(true),
                        _ => continue,
                    }
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return None,
            }
        }
    }
}

/// Reads a single line containing an RDS group in the RDS Spy hex format.
/// Returns `None` at end of input.
pub fn read_hex_group(reader: &mut dyn BufRead, feed_thru: bool, timestamp: bool) -> Option<Group> {
    let mut group = Group::new();
    group.disable_offsets();

    let mut group_complete = false;
    let mut saw_any_line = false;

    while !group_complete {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        saw_any_line = true;

        if feed_thru {
            let _ = io::stdout().write_all(line.as_bytes());
        }

        let mut line = line.trim_end_matches(['\r', '\n']).to_string();
        if line.len() < 16 {
            continue;
        }

        // RDS Spy marks the RDS2 data stream number with a prefix like "#S1 "
        let mut stream = 0;
        if line.len() >= 20 && (line.starts_with("#S1 ") || line.starts_with("#S2 ") || line.starts_with("#S3 "))
        {
            stream = line.as_bytes()[2] - b'0';
            line = line[4..].to_string();
        }
        group.set_data_stream(u32::from(stream));
        if stream != 0 {
            group.set_version_c();
        }

        let mut chars = line.chars().peekable();

        for block_num in
            [BlockNumber::Block1, BlockNumber::Block2, BlockNumber::Block3, BlockNumber::Block4]
        {
            let mut block = Block::default();
            let mut block_still_valid = true;

            let mut which_nibble = 0;
            while which_nibble < 4 {
                let Some(c) = chars.next() else {
                    group_complete = true;
                    break;
                };

                if c != ' ' {
                    match c.to_digit(16) {
                        Some(value) => block.data = (block.data << 4) + value as u16,
                        None => block_still_valid = false,
                    }
                    which_nibble += 1;
                }
            }

            if block_still_valid && which_nibble == 4 {
                block.is_received = true;
                group.set_block(block_num, block);
            }

            if block_num == BlockNumber::Block4 {
                group_complete = true;
            }
        }
    }

    if !saw_any_line && group.is_empty() {
        return None;
    }

    if timestamp {
        group.set_rx_time(Local::now());
    }

    Some(group)
}

/// Reads one group in the TEF6686 tuner's serial output format.
/// Returns `None` at end of input.
pub fn read_tef_group(reader: &mut dyn BufRead, feed_thru: bool) -> Option<Group> {
    let mut group = Group::new();
    group.disable_offsets();
    let mut saw_any_line = false;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        saw_any_line = true;

        if feed_thru {
            let _ = io::stdout().write_all(line.as_bytes());
        }

        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(rest) = line.strip_prefix('P') {
            // 'P' lines carry the PI code, e.g. PA540
            let Ok(data) = u16::from_str_radix(rest.trim(), 16) else { continue };
            let block1 = Block { data, is_received: true, ..Default::default() };
            group.set_block(BlockNumber::Block1, block1);
        }
        else if line.starts_with('R') && line.len() >= 15 {
            // 'R' lines carry the remaining blocks plus error flags,
            // e.g. R0549000000000F (3 x 4 nibbles + 2 nibbles of flags)
            let parse = |range: std::ops::Range<usize>| u16::from_str_radix(&line[range], 16);

            let (Ok(b2), Ok(b3), Ok(b4), Ok(rds_err)) =
                (parse(1..5), parse(5..9), parse(9..13), parse(13..15))
            else {
                break;
            };

            // Each block has a 2-bit error field: 00110000 marks block 2, and so on
            for (block_num, data, shift) in [
                (BlockNumber::Block2, b2, 4u16),
                (BlockNumber::Block3, b3, 2),
                (BlockNumber::Block4, b4, 0),
            ] {
                let block = Block {
                    data,
                    is_received: (rds_err >> shift) & 0b11 == 0,
                    ..Default::default()
                };
                group.set_block(block_num, block);
            }
            break;
        }
    }

    if !saw_any_line && group.is_empty() {
        return None;
    }

    Some(group)
}
