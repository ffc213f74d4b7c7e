// SPDX-FileCopyrightText: 2026 roqa contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Behavioral model of the decoder core's serial interface.
//!
//! Pin-accurate far side of the link: it sees only the host-driven line
//! levels and presents a data-out level, exactly like the silicon. Input
//! bits are sampled on rising clock edges while the select line is low;
//! raising select marks a frame boundary and clears any partial frame.
//!
//! The model reproduces the core's externally observable decode function
//! (dequantization plus the prediction-filter contribution of the loaded
//! history and weight registers). It performs no weight adaptation; it is
//! a protocol-level stand-in for the RTL, not the production codec.

use roqa_common::dequant;
use roqa_common::{Sample, HISTORY_DEPTH, WEIGHT_COUNT};
use roqa_link::{HostLines, LinkBus};
use roqa_session::Instruction;

/// What the input shifter is currently accumulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Receiver {
    /// The next 8 bits form an instruction frame.
    Instruction,
    /// The next 16 bits are the payload of a decoded load.
    Payload { weight: bool, index: u8 },
}

/// Simulated decoder core behind the [`LinkBus`] pin boundary.
pub struct DeviceModel {
    lines: HostLines,
    cycles: u64,

    receiver: Receiver,
    shift_in: u16,
    bits_in: u32,

    /// Response shifter; while non-empty, rising edges present bits on
    /// data-out instead of sampling data-in.
    shift_out: u16,
    bits_out: u32,
    data_out: bool,

    history: [Sample; HISTORY_DEPTH],
    weights: [Sample; WEIGHT_COUNT],
    latched: Sample,
}

impl DeviceModel {
    pub fn new() -> Self {
        Self {
            lines: HostLines::IDLE,
            cycles: 0,
            receiver: Receiver::Instruction,
            shift_in: 0,
            bits_in: 0,
            shift_out: 0,
            bits_out: 0,
            data_out: false,
            history: [0; HISTORY_DEPTH],
            weights: [0; WEIGHT_COUNT],
            latched: 0,
        }
    }

    /// Restore power-on state: registers cleared, shifters empty, lines
    /// forgotten.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Link cycles elapsed since power-on.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// History register file, for white-box assertions.
    pub fn history(&self) -> &[Sample; HISTORY_DEPTH] {
        &self.history
    }

    /// Weight register file, for white-box assertions.
    pub fn weights(&self) -> &[Sample; WEIGHT_COUNT] {
        &self.weights
    }

    /// Sample currently latched for readback.
    pub fn latched_sample(&self) -> Sample {
        self.latched
    }

    /// Decode function of the core: dequantized residual plus the
    /// prediction-filter output, saturated to 16 bits.
    fn decode(&self, scale_factor: u8, residual: u8) -> Sample {
        let mut prediction: i64 = 0;
        for (h, w) in self.history.iter().zip(self.weights.iter()) {
            prediction += *h as i64 * *w as i64;
        }
        let dequantized = dequant::lookup(scale_factor, residual) as i64;
        ((prediction >> 13) + dequantized).clamp(i16::MIN as i64, i16::MAX as i64) as Sample
    }

    /// One rising clock edge with the device selected.
    fn rising_edge(&mut self, data_in: bool) {
        if self.bits_out > 0 {
            // Response bits take priority: present the next bit and ignore
            // the host's neutral data line.
            self.data_out = self.shift_out & 0x8000 != 0;
            self.shift_out <<= 1;
            self.bits_out -= 1;
            return;
        }

        self.shift_in = (self.shift_in << 1) | data_in as u16;
        self.bits_in += 1;

        match self.receiver {
            Receiver::Instruction => {
                if self.bits_in == 8 {
                    let byte = self.shift_in as u8;
                    self.clear_input();
                    self.execute(byte);
                }
            }
            Receiver::Payload { weight, index } => {
                if self.bits_in == 16 {
                    let value = self.shift_in as Sample;
                    self.clear_input();
                    self.receiver = Receiver::Instruction;
                    if weight {
                        self.weights[index as usize] = value;
                    } else {
                        self.history[index as usize] = value;
                    }
                    log::trace!(
                        "device: {}[{}] <- {}",
                        if weight { "weight" } else { "history" },
                        index,
                        value
                    );
                }
            }
        }
    }

    /// Act on a completed instruction frame.
    fn execute(&mut self, byte: u8) {
        match Instruction::decode(byte) {
            Ok(Instruction::LoadHistory { index }) => {
                self.receiver = Receiver::Payload {
                    weight: false,
                    index,
                };
            }
            Ok(Instruction::LoadWeight { index }) => {
                self.receiver = Receiver::Payload {
                    weight: true,
                    index,
                };
            }
            Ok(Instruction::PushSample {
                scale_factor,
                residual,
            }) => {
                self.latched = self.decode(scale_factor, residual);
                log::trace!(
                    "device: push sf={} qr={} -> latched {}",
                    scale_factor,
                    residual,
                    self.latched
                );
            }
            Ok(Instruction::ReadSample) => {
                self.shift_out = self.latched as u16;
                self.bits_out = 16;
            }
            Err(e) => {
                log::warn!("device: {}", e);
            }
        }
    }

    fn clear_input(&mut self) {
        self.shift_in = 0;
        self.bits_in = 0;
    }
}

impl Default for DeviceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkBus for DeviceModel {
    fn drive(&mut self, lines: HostLines) {
        // Frame boundary: deselecting abandons any partial frame and an
        // unread response.
        if lines.select && !self.lines.select {
            self.clear_input();
            self.receiver = Receiver::Instruction;
            self.shift_out = 0;
            self.bits_out = 0;
        }

        if lines.clock && !self.lines.clock && !lines.select {
            self.rising_edge(lines.data);
        }

        self.lines = lines;
    }

    fn data_out(&self) -> bool {
        self.data_out
    }

    fn step(&mut self, cycles: u32) {
        self.cycles += cycles as u64;
    }
}
