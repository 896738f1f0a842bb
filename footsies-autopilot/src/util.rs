use anyhow::{anyhow, Context, Result};

/// Decimal or `0x`-prefixed hex.
pub fn parse_seed(seed: &str) -> Result<u32> {
    let s = seed.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {s}"));
    }
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    s.parse::<u32>()
        .with_context(|| format!("invalid decimal seed: {s}"))
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

/// Comma separated items with blanks dropped.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    let seeds = split_list(input)
        .iter()
        .map(|token| parse_seed(token))
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        return Err(anyhow!("no seeds parsed from --seeds"));
    }
    Ok(seeds)
}

/// `count` seeds from an LCG walk starting at `start`.
pub fn seed_sequence(start: u32, count: u32) -> Vec<u32> {
    std::iter::successors(Some(start), |cur| {
        Some(cur.wrapping_mul(1_664_525).wrapping_add(1_013_904_223))
    })
    .take(count as usize)
    .collect()
}

/// File-name-safe form of a bot spec such as `policy:models/a.json`.
pub fn safe_name(spec: &str) -> String {
    spec.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal_seeds() {
        assert_eq!(parse_seed("0x10").unwrap(), 16);
        assert_eq!(parse_seed(" 42 ").unwrap(), 42);
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0xzz").is_err());
    }

    #[test]
    fn seed_csv_skips_blanks() {
        assert_eq!(parse_seed_csv("1, ,0x2,").unwrap(), vec![1, 2]);
        assert!(parse_seed_csv(" , ").is_err());
    }

    #[test]
    fn seed_sequence_is_deterministic() {
        let seeds = seed_sequence(7, 3);
        assert_eq!(seeds.len(), 3);
        assert_eq!(seeds[0], 7);
        assert_eq!(seeds, seed_sequence(7, 3));
    }

    #[test]
    fn safe_name_replaces_path_characters() {
        assert_eq!(safe_name("policy:m/a.json"), "policy-m-a-json");
    }
}
