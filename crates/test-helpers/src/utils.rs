// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{FakeCoprocessor, MockChain, MockRelayer};
use std::sync::Arc;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Route logs of the current test through the test writer. Keep the guard alive for the
/// whole test.
pub fn test_tracing(filter: &str) -> DefaultGuard {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// A ledger and relayer sharing one coprocessor
pub fn mock_backends() -> (Arc<MockChain>, Arc<MockRelayer>) {
    let coprocessor = FakeCoprocessor::new();
    (
        Arc::new(MockChain::new(coprocessor.clone())),
        Arc::new(MockRelayer::new(coprocessor)),
    )
}
