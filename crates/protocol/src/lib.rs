// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod error;
mod guard;
mod protocol;
mod session;
mod stage;

pub use error::*;
pub use protocol::*;
pub use session::*;
pub use stage::*;
