use anyhow::{Result, bail};

/// Seed used when no tokens resolve to anything.
pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed tokens into a de-duplicated list, preserving order.
///
/// Accepts decimal integers (negative values use their magnitude), `0x`
/// hexadecimal, and `a..b` / `a..=b` ranges.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        for seed in parse_token(token)? {
            if !seeds.contains(&seed) {
                seeds.push(seed);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_token(token: &str) -> Result<Vec<u64>> {
    if let Some((start, end)) = token.split_once("..=") {
        return expand_range(parse_single(start)?, parse_single(end)?, token);
    }
    if let Some((start, end)) = token.split_once("..") {
        let end = parse_single(end)?;
        if end == 0 {
            bail!("Empty seed range: {token}");
        }
        return expand_range(parse_single(start)?, end - 1, token);
    }
    Ok(vec![parse_single(token)?])
}

fn expand_range(start: u64, end: u64, token: &str) -> Result<Vec<u64>> {
    if end < start {
        bail!("Empty seed range: {token}");
    }
    if end - start >= 10_000 {
        bail!("Seed range too large: {token}");
    }
    Ok((start..=end).collect())
}

fn parse_single(token: &str) -> Result<u64> {
    let token = token.trim();
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        && let Ok(value) = u64::from_str_radix(hex, 16)
    {
        return Ok(value);
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    bail!("Unrecognized seed token: {token}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn resolves_numeric_hex_and_negative() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xff", "18446744073709551615"]))
            .unwrap();
        assert_eq!(seeds, vec![42, 7, 255, u64::MAX]);
    }

    #[test]
    fn expands_ranges_and_dedupes() {
        let seeds = resolve_seed_inputs(&tokens(&["1..4", "3..=5", "1"])).unwrap();
        assert_eq!(seeds, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        assert_eq!(resolve_seed_inputs(&tokens(&["", " "])).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn rejects_garbage_and_reversed_ranges() {
        assert!(resolve_seed_inputs(&tokens(&["banana"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["9..3"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..100000"])).is_err());
    }
}
