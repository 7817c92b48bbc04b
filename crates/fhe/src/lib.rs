// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod bfv;
pub mod eip712;
mod error;
pub mod proof;
mod provider;
pub mod relayer;
pub mod sdk;
mod types;

pub use error::*;
pub use provider::*;
pub use relayer::RelayerProvider;
pub use types::*;
