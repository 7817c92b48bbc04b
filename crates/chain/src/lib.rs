// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod client;
mod contracts;
mod error;
mod provider;
mod wallet;

pub use client::*;
pub use contracts::*;
pub use error::*;
pub use provider::*;
pub use wallet::*;
