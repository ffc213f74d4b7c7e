// SPDX-FileCopyrightText: 2026 roqa contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod bus;
pub mod driver;

pub use bus::{HostLines, LinkBus};
pub use driver::{LinkDriver, LinkState};
