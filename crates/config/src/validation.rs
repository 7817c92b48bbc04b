// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Context, Result};
use std::str::FromStr;
use url::Url;

/// An http(s) endpoint given on the command line, such as the OTLP collector
#[derive(Clone, Debug)]
pub struct ValidUrl(Url);

impl FromStr for ValidUrl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let url = Url::parse(s).with_context(|| format!("'{}' is not a valid url", s))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Expected an http:// or https:// url, got {}://", url.scheme());
        }
        Ok(ValidUrl(url))
    }
}

impl From<ValidUrl> for String {
    fn from(value: ValidUrl) -> Self {
        value.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_url() -> Result<()> {
        let url: ValidUrl = "http://localhost:4317".parse()?;
        assert_eq!(String::from(url), "http://localhost:4317/");
        assert!("localhost:4317".parse::<ValidUrl>().is_err());
        assert!("ws://localhost:4317".parse::<ValidUrl>().is_err());
        Ok(())
    }
}
