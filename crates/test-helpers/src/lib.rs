// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod coprocessor;
mod mock_chain;
mod mock_relayer;
mod utils;

pub use coprocessor::*;
pub use mock_chain::*;
pub use mock_relayer::*;
pub use utils::*;
