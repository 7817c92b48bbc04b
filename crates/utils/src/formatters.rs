// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

/// Hex encode bytes, shortening anything longer than a 32 byte word so handles and
/// hashes stay readable in logs while proofs and ciphertexts do not flood them.
pub fn short_hex(data: &[u8]) -> String {
    truncate(data.iter().map(|b| format!("{:02x}", b)).collect::<String>())
}

/// truncate a string
fn truncate(s: String) -> String {
    let threshold = 64;
    let limit = 16;
    let cutoff = limit / 2;
    if s.len() <= threshold {
        format!("0x{}", s)
    } else {
        let start = &s[..cutoff];
        let end = &s[s.len() - (limit - cutoff)..];
        format!("<bytes({}):0x{}..{}>", s.len() / 2, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::short_hex;

    #[test]
    fn test_short_hex() {
        assert_eq!(short_hex(&[0xde, 0xad]), "0xdead");
        assert_eq!(short_hex(&[0u8; 32]), format!("0x{}", "0".repeat(64)));

        let long = [0xabu8; 100];
        assert_eq!(short_hex(&long), "<bytes(100):0xabababab..abababab>");
    }
}
