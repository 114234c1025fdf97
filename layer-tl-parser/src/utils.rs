//! Opt-in constructor ID derivation for declarations without an explicit `#id`.

/// CRC32 of the normalized declaration text.
///
/// The declaration is stripped of its `#id`, trailing `;` and `{}` braces,
/// `<`/`>` are turned into spaces and whitespace is collapsed, so that
/// `boolFalse = Bool` hashes to `0xbc799737`. Declarations that use flags
/// may need a different canonical form; plug in your own hasher through
/// [`crate::ParseOptions::id_hasher`] in that case.
pub fn crc32_id(declaration: &str) -> u32 {
    crc32(&normalize(declaration))
}

fn normalize(declaration: &str) -> String {
    let decl = declaration.trim().trim_end_matches(';');
    let mut out = String::with_capacity(decl.len());
    for (i, token) in decl.split_whitespace().enumerate() {
        // only the head `name#id` loses its id; `flags:#` stays intact
        let token = match token.split_once('#') {
            Some((name, _)) if i == 0 => name.to_owned(),
            _ => token.to_owned(),
        };
        let token = token
            .replace(['{', '}'], "")
            .replace('<', " ")
            .replace('>', "");
        for part in token.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(part);
        }
    }
    out
}

/// Standard CRC-32 (ISO 3309 / ITU-T V.42).
fn crc32(data: &str) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for byte in data.bytes() {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids() {
        assert_eq!(crc32_id("boolFalse = Bool"), 0xbc799737);
        assert_eq!(crc32_id("boolTrue#997275b5 = Bool;"), 0x997275b5);
    }

    #[test]
    fn normalization_drops_id_and_spacing() {
        assert_eq!(normalize("  user#12ab   id:long  = User; "), "user id:long = User");
        assert_eq!(normalize("a flags:# x:Vector<int> = A;"), "a flags:# x:Vector int = A");
    }
}
