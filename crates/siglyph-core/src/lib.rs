// SPDX-License-Identifier: AGPL-3.0-or-later
// Part of Siglyph — Licensed under AGPL-3.0-or-later.

//! Core value types shared by the siglyph symbolic-signal pipeline:
//! the uniform-domain [`Signal`] capability, the 7-letter symbolic
//! alphabet with its [`Segment`]/[`SymbolicString`] records, and the
//! tracing initialisation helper.

pub mod signal;
pub mod symbolic;
pub mod telemetry;

pub use signal::{Signal, SignalError};
pub use symbolic::{
    entropy_of, Letter, Motif, MotifClass, Segment, SymbolicError, SymbolicString, ALPHABET,
};
