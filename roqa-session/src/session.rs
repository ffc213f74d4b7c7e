// SPDX-FileCopyrightText: 2026 roqa contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transaction sequencing over the bit-serial link.
//!
//! A session runs one transaction at a time through a fixed phase cycle:
//!
//! ```text
//! Idle -> SendingInstruction -> SendingPayload ----------------------> Idle
//! Idle -> SendingInstruction -> AwaitingProcessing
//!      -> SendingReadback -> ReceivingResponse ----------------------> Idle
//! ```
//!
//! The link is half-duplex and select-exclusive, so transactions are
//! strictly sequential; nothing persists between them beyond the link's
//! idle baseline.

use roqa_common::{
    sample_from_raw, raw_from_sample, LinkTiming, Sample, INSTRUCTION_BITS, SAMPLE_BITS,
};
use roqa_link::{LinkBus, LinkDriver};

use crate::instruction::{Instruction, LoadTarget};

/// Protocol phase, tracked for trace logging and state assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    SendingInstruction,
    SendingPayload,
    AwaitingProcessing,
    SendingReadback,
    ReceivingResponse,
}

/// One protocol session against a decoder core.
pub struct Session<B: LinkBus> {
    link: LinkDriver<B>,
    timing: LinkTiming,
    phase: Phase,
}

impl<B: LinkBus> Session<B> {
    /// Wrap a bus in a session. Call [`open`](Self::open) before the first
    /// transaction.
    pub fn new(bus: B, timing: LinkTiming) -> Self {
        Self {
            link: LinkDriver::new(bus, timing.settle_cycles),
            timing,
            phase: Phase::Idle,
        }
    }

    /// Run the link's open sequence, establishing the idle baseline.
    pub fn open(&mut self) {
        debug_assert_eq!(self.phase, Phase::Idle);
        self.link.open_link();
    }

    /// Load a 16-bit value into a history or weight register.
    pub fn load(&mut self, target: LoadTarget, index: u8, value: Sample) {
        log::debug!("session: load {:?}[{}] = {}", target, index, value);
        let control = Instruction::load(target, index).encode();

        self.enter(Phase::SendingInstruction);
        self.link.write_bits(control as u16, INSTRUCTION_BITS);

        self.enter(Phase::SendingPayload);
        self.link.write_bits(raw_from_sample(value), SAMPLE_BITS);

        self.enter(Phase::Idle);
        self.link.idle(self.timing.frame_gap_cycles);
    }

    /// Push a quantized residual through the decoder and read the decoded
    /// sample back.
    pub fn sample(&mut self, scale_factor: u8, residual: u8) -> Sample {
        let op = Instruction::PushSample {
            scale_factor,
            residual,
        };

        self.enter(Phase::SendingInstruction);
        self.link.write_bits(op.encode() as u16, INSTRUCTION_BITS);
        self.link.idle(self.timing.frame_gap_cycles);

        self.enter(Phase::AwaitingProcessing);
        self.link.release(self.timing.processing_cycles);

        self.enter(Phase::SendingReadback);
        self.link
            .write_bits(Instruction::ReadSample.encode() as u16, INSTRUCTION_BITS);

        self.enter(Phase::ReceivingResponse);
        let raw = self.link.read_bits(SAMPLE_BITS);
        let sample = sample_from_raw(raw);
        log::debug!(
            "session: sample sf={} qr={} -> raw=0x{:04X} ({})",
            scale_factor,
            residual,
            raw,
            sample
        );

        self.enter(Phase::Idle);
        self.link.idle(self.timing.frame_gap_cycles);
        sample
    }

    pub fn bus(&self) -> &B {
        self.link.bus()
    }

    pub fn bus_mut(&mut self) -> &mut B {
        self.link.bus_mut()
    }

    pub fn into_bus(self) -> B {
        self.link.into_bus()
    }

    fn enter(&mut self, phase: Phase) {
        log::trace!("session: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
