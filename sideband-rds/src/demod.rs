// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Demodulation of the RDS DPSK subcarriers from an FM multiplex signal.
//!
//! Per data stream: mix down with a phase-coherent oscillator, lowpass, decimate, recover
//! symbol timing, demodulate BPSK with a carrier phase-locked loop, decode the biphase
//! symbol pairs, and differentially decode into bits.

use chrono::{DateTime, Local};

use sideband_core::dsp::agc::Agc;
use sideband_core::dsp::complex::Complex;
use sideband_core::dsp::fir::FirFilter;
use sideband_core::dsp::nco::Nco;
use sideband_core::dsp::resampler::{Resampler, MAX_OUTPUTS_PER_INPUT};
use sideband_core::dsp::symsync::SymSync;
use sideband_core::dsp::{angular_freq, PI};
use sideband_core::errors::Result;

use crate::{BITS_PER_SECOND, TARGET_SAMPLE_RATE_HZ};

/// Samples read from the source at a time.
pub const INPUT_CHUNK_SIZE: usize = 8192;

/// Chunk capacity after resampling up from the minimum sample rate
/// (`INPUT_CHUNK_SIZE * MAX_RESAMPLE_RATIO`, plus one for rounding).
pub const CHUNK_BUFFER_SIZE: usize = 10_945;

const AGC_BANDWIDTH_HZ: f32 = 500.0;
const AGC_INITIAL_GAIN: f32 = 0.08;
const LOWPASS_ORDER: usize = 255;
const LOWPASS_CUTOFF_HZ: f32 = 2400.0;
const SYMSYNC_BANDWIDTH_HZ: f32 = 2200.0;
const SYMSYNC_DELAY: usize = 3;
const RESAMPLER_DELAY: usize = 13;
const SYMSYNC_BETA: f32 = 0.8;
const PLL_BANDWIDTH_HZ: f32 = 0.03;
const PLL_MULTIPLIER: f32 = 12.0;
const NUM_SYMSYNC_FILTERS: usize = 32;

const SAMPLES_PER_SYMBOL: usize = 3;

// 171000 / 1187.5 / 2 / 3 = 24: the lowpass output only needs to be evaluated at 7.125 kHz.
const DECIMATE_RATIO: u32 =
    (TARGET_SAMPLE_RATE_HZ / BITS_PER_SECOND / 2.0 / SAMPLES_PER_SYMBOL as f32) as u32;

/// One demodulated bit with its time offset, in seconds, from the start of the chunk.
#[derive(Clone, Copy, Debug)]
pub struct TimedBit {
    pub value: bool,
    pub time_from_chunk_start: f32,
}

/// Bits demodulated from one chunk of MPX.
#[derive(Clone, Debug)]
pub struct BitBuffer {
    /// Timestamp for when the last sample of the chunk was received, in system time.
    pub time_received: DateTime<Local>,
    /// Time offset of the first sample of the chunk, in seconds from the start of the input.
    pub chunk_time_from_start: f64,
    /// Number of data streams (1 to 4).
    pub num_streams: usize,
    /// One vector per data stream.
    pub bits: [Vec<TimedBit>; 4],
}

/// A chunk of single-channel MPX samples.
#[derive(Clone, Debug)]
pub struct MpxBuffer {
    pub data: Vec<f32>,
    pub time_received: DateTime<Local>,
}

impl MpxBuffer {
    pub fn new() -> Self {
        MpxBuffer { data: Vec::with_capacity(CHUNK_BUFFER_SIZE), time_received: Local::now() }
    }
}

impl Default for MpxBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes biphase symbols from PSK symbols.
///
/// At the correct clock phase, a symbol in constellation {-1, 0} maps to 0 and {1, 0} to 1.
/// Only every second difference is a biphase symbol; the correct parity is chosen by
/// periodically comparing signal energy between even and odd phases.
#[derive(Clone, Debug)]
pub struct BiphaseDecoder {
    prev_psk_symbol: Complex,
    clock_history: [f32; 128],
    clock: usize,
    clock_polarity: usize,
}

impl Default for BiphaseDecoder {
    fn default() -> Self {
        BiphaseDecoder {
            prev_psk_symbol: Complex::default(),
            clock_history: [0.0; 128],
            clock: 0,
            clock_polarity: 0,
        }
    }
}

impl BiphaseDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the biphase symbol when the clock phase is right, otherwise `None`.
    pub fn push(&mut self, psk_symbol: Complex) -> Option<bool> {
        let biphase_symbol = (psk_symbol - self.prev_psk_symbol) * 0.5;
        let value = biphase_symbol.re >= 0.0;
        let is_valid_phase = self.clock % 2 == self.clock_polarity;
        self.prev_psk_symbol = psk_symbol;

        self.clock_history[self.clock] = biphase_symbol.re.abs();
        self.clock += 1;

        // Periodically evaluate the validity of the chosen clock polarity
        if self.clock == self.clock_history.len() {
            let mut even = 0.0;
            let mut odd = 0.0;

            for (i, energy) in self.clock_history.iter_mut().enumerate() {
                if i % 2 == 0 {
                    even += *energy;
                }
                else {
                    odd += *energy;
                }
                *energy = 0.0;
            }

            if even > odd {
                self.clock_polarity = 0;
            }
            else if odd > even {
                self.clock_polarity = 1;
            }

            self.clock = 0;
        }

        is_valid_phase.then_some(value)
    }
}

/// Differential decoder: RDS data is differentially coded, so a bit is the change between
/// consecutive symbols.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeltaDecoder {
    prev: bool,
}

impl DeltaDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn decode(&mut self, symbol: bool) -> bool {
        let bit = symbol != self.prev;
        self.prev = symbol;
        bit
    }
}

// Phase distance of a symbol from the nearest point of the BPSK constellation.
fn bpsk_phase_error(symbol: Complex) -> f32 {
    if symbol.re >= 0.0 {
        symbol.im.atan2(symbol.re)
    }
    else {
        (-symbol.im).atan2(-symbol.re)
    }
}

// Demodulation context for one subcarrier.
struct Demod {
    agc: Agc,
    fir_lpf: FirFilter,
    symsync: SymSync,
    oscillator: Nco,
    biphase_decoder: BiphaseDecoder,
    delta_decoder: DeltaDecoder,
}

impl Demod {
    fn new() -> Self {
        let mut symsync =
            SymSync::rrc(SAMPLES_PER_SYMBOL, SYMSYNC_DELAY, SYMSYNC_BETA, NUM_SYMSYNC_FILTERS);
        symsync.set_bandwidth(SYMSYNC_BANDWIDTH_HZ / TARGET_SAMPLE_RATE_HZ);

        let mut oscillator = Nco::new(angular_freq(57_000.0, TARGET_SAMPLE_RATE_HZ));
        oscillator.set_pll_bandwidth(PLL_BANDWIDTH_HZ / TARGET_SAMPLE_RATE_HZ);

        Demod {
            agc: Agc::new(AGC_BANDWIDTH_HZ / TARGET_SAMPLE_RATE_HZ, AGC_INITIAL_GAIN),
            fir_lpf: FirFilter::lowpass(
                LOWPASS_ORDER,
                LOWPASS_CUTOFF_HZ / TARGET_SAMPLE_RATE_HZ,
                60.0,
            ),
            symsync,
            oscillator,
            biphase_decoder: BiphaseDecoder::new(),
            delta_decoder: DeltaDecoder::new(),
        }
    }
}

/// A bank of 1 (RDS) to 4 (RDS2) subcarrier demodulators sharing one sample clock.
pub struct SubcarrierSet {
    resample_ratio: f32,
    resampler: Resampler,
    demods: [Demod; 4],
    resampled: Vec<f32>,
    // Samples since the start of the input; overflows (and resets the time offset) every 7 h.
    sample_num: u32,
    sample_num_since_reset: u32,
}

impl SubcarrierSet {
    pub fn new(samplerate: f32) -> Result<Self> {
        let resample_ratio = TARGET_SAMPLE_RATE_HZ / samplerate;
        let mut resampler = Resampler::new(RESAMPLER_DELAY);
        resampler.set_ratio(resample_ratio)?;

        Ok(SubcarrierSet {
            resample_ratio,
            resampler,
            demods: [Demod::new(), Demod::new(), Demod::new(), Demod::new()],
            resampled: Vec::with_capacity(CHUNK_BUFFER_SIZE),
            sample_num: 0,
            sample_num_since_reset: 0,
        })
    }

    /// Resets the symbol-timing and carrier recovery. Called on the 7-hour counter rollover
    /// to avoid a phase discontinuity; never during normal decoding.
    pub fn reset(&mut self) {
        for demod in self.demods.iter_mut() {
            demod.symsync.reset();
            demod.oscillator.reset();
        }
        self.sample_num_since_reset = 0;
    }

    /// Seconds of signal processed since the last reset.
    /// Not to be used for measurements; it loses precision as the counter grows.
    pub fn seconds_since_last_reset(&self) -> f32 {
        self.sample_num_since_reset as f32 / TARGET_SAMPLE_RATE_HZ
    }

    fn resample_chunk(&mut self, chunk: &MpxBuffer) {
        self.resampled.clear();
        let mut out = [0.0f32; MAX_OUTPUTS_PER_INPUT];
        for &sample in &chunk.data {
            let num_resampled = self.resampler.execute(sample, &mut out);
            self.resampled.extend_from_slice(&out[..num_resampled]);
        }
    }

    /// Processes a chunk of MPX into raw bits, without any block synchronization.
    pub fn process_chunk(&mut self, chunk: &MpxBuffer, num_streams: usize) -> BitBuffer {
        let needs_resampling = self.resample_ratio != 1.0;
        if needs_resampling {
            self.resample_chunk(chunk);
        }

        let mut bitbuffer = BitBuffer {
            time_received: chunk.time_received,
            chunk_time_from_start: f64::from(self.sample_num) / f64::from(TARGET_SAMPLE_RATE_HZ),
            num_streams,
            bits: Default::default(),
        };

        let num_samples =
            if needs_resampling { self.resampled.len() } else { chunk.data.len() };

        // Pre-allocate the bit vectors
        let expected_num_bits =
            (num_samples as f32 * BITS_PER_SECOND / TARGET_SAMPLE_RATE_HZ * 1.1) as usize;
        for bits in bitbuffer.bits.iter_mut().take(num_streams) {
            bits.reserve(expected_num_bits);
        }

        // The whole processing delay at 171 kHz, for timestamping bits
        let processing_delay_samples = (RESAMPLER_DELAY as f32 * self.resample_ratio
            + self.demods[0].fir_lpf.group_delay()
            + 1.5 * (SYMSYNC_DELAY as u32 * DECIMATE_RATIO) as f32)
            .round() as i64;

        let mut must_reset = false;

        for i_sample in 0..num_samples {
            let sample = if needs_resampling {
                self.resampled[i_sample]
            }
            else {
                chunk.data[i_sample]
            };

            for (n_stream, demod) in self.demods.iter_mut().enumerate().take(num_streams) {
                // Running at 171 kHz (receiver's clock)

                // Mix down to baseband
                let baseband = demod.oscillator.mix_down(Complex::new(sample, 0.0), n_stream);
                demod.fir_lpf.push(baseband);

                if self.sample_num_since_reset % DECIMATE_RATIO == 0 {
                    // Running at 7.125 kHz (receiver's clock)
                    let lowpassed = demod.agc.execute(demod.fir_lpf.execute());

                    // Synchronize to the transmitter's biphase data clock
                    if let Some(symbol) = demod.symsync.execute(lowpassed) {
                        // Running at 2.375 kHz (transmitter's clock)
                        let phase_error = bpsk_phase_error(symbol).clamp(-PI, PI);
                        demod.oscillator.pll_step(phase_error * PLL_MULTIPLIER);

                        // One biphase symbol for every 2 PSK symbols
                        if let Some(biphase) = demod.biphase_decoder.push(symbol) {
                            // Running at 1.1875 kHz (transmitter's clock)
                            let bit = demod.delta_decoder.decode(biphase);
                            bitbuffer.bits[n_stream].push(TimedBit {
                                value: bit,
                                time_from_chunk_start: (i_sample as i64
                                    - processing_delay_samples)
                                    as f32
                                    / TARGET_SAMPLE_RATE_HZ,
                            });
                        }
                    }
                }

                demod.oscillator.step();
            }

            self.sample_num = self.sample_num.wrapping_add(1);

            // The rollover happens every (2^32) / 171000 Hz = 6 h 58 min. The symbol
            // synchronizer would otherwise see a sudden phase jump at that moment.
            let (next, rolled_over) = self.sample_num_since_reset.overflowing_add(1);
            self.sample_num_since_reset = next;
            must_reset |= rolled_over;
        }

        if must_reset {
            self.reset();
        }

        bitbuffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_delta_decoder() {
        let mut delta = DeltaDecoder::new();
        // 0 0 1 1 1 0 -> 0 0 1 0 0 1
        let input = [false, false, true, true, true, false];
        let output: Vec<bool> = input.iter().map(|&b| delta.decode(b)).collect();
        assert_eq!(output, [false, false, true, false, false, true]);
    }

    #[test]
    fn verify_biphase_decoder_rate() {
        let mut biphase = BiphaseDecoder::new();

        // Alternating ±1 PSK symbols: one output per two inputs
        let mut num_out = 0;
        for i in 0..256 {
            let s = Complex::new(if i % 2 == 0 { 1.0 } else { -1.0 }, 0.0);
            if biphase.push(s).is_some() {
                num_out += 1;
            }
        }
        assert_eq!(num_out, 128);
    }

    #[test]
    fn verify_bpsk_phase_error_sign() {
        // A slight counterclockwise rotation gives a positive error near either point
        assert!(bpsk_phase_error(Complex::new(1.0, 0.1)) > 0.0);
        assert!(bpsk_phase_error(Complex::new(-1.0, -0.1)) > 0.0);
        assert!(bpsk_phase_error(Complex::new(1.0, -0.1)) < 0.0);
        assert_eq!(bpsk_phase_error(Complex::new(1.0, 0.0)), 0.0);
    }

    #[test]
    fn verify_decimate_ratio() {
        assert_eq!(DECIMATE_RATIO, 24);
    }

    #[test]
    fn verify_chunk_processing_produces_bits() {
        let mut subcarriers = SubcarrierSet::new(TARGET_SAMPLE_RATE_HZ).unwrap();

        // A pure 57 kHz tone carries no data, but the pipeline must still clock out bits at
        // about 1187.5 bit/s once the synchronizers settle.
        let mut chunk = MpxBuffer::new();
        for i in 0..INPUT_CHUNK_SIZE {
            let t = i as f32 / TARGET_SAMPLE_RATE_HZ;
            chunk.data.push((2.0 * PI * 57_000.0 * t).sin() * 0.1);
        }

        let bits = subcarriers.process_chunk(&chunk, 1);
        let expected = INPUT_CHUNK_SIZE as f32 * BITS_PER_SECOND / TARGET_SAMPLE_RATE_HZ;

        assert!(bits.num_streams == 1);
        assert!((bits.bits[0].len() as f32 - expected).abs() <= 2.0);
        assert!(bits.bits[1].is_empty());
    }

    #[test]
    fn verify_out_of_range_sample_rate_rejected() {
        assert!(SubcarrierSet::new(48_000.0).is_err());
        assert!(SubcarrierSet::new(128_000.0).is_ok());
    }
}
