// SPDX-FileCopyrightText: 2026 roqa contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod checker;
pub mod vectors;

pub use checker::{Report, TransactionResult};
pub use vectors::{TestVector, VectorError};
