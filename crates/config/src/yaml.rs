// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, Result};
use std::{fs, path::Path};

/// Read a yaml file expanding `${VAR}` references from the environment
pub fn load_yaml_with_env(file_path: &Path) -> Result<String> {
    let content = fs::read_to_string(file_path)?;
    let expanded = shellexpand::env(&content).map_err(|e| {
        anyhow!(
            "Could not expand environment variable `{}` in {}: {}",
            e.var_name,
            file_path.display(),
            e.cause
        )
    })?;
    Ok(expanded.into_owned())
}
