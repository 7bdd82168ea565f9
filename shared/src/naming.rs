//! Batch name helpers
//!
//! New batches are named `{PREFIX}-{NNNN}`, the prefix taken from the genetic
//! name. The allocator only reads names; these helpers serve hosts creating rows.

const UNKNOWN_PREFIX: &str = "UNK";

/// Upper-cased first three alphanumeric characters of a genetic name
pub fn batch_name_prefix(genetic_name: &str) -> String {
    let prefix: String = genetic_name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(3)
        .flat_map(char::to_uppercase)
        .collect();

    if prefix.is_empty() {
        UNKNOWN_PREFIX.to_string()
    } else {
        prefix
    }
}

/// Generate a batch name
pub fn generate_batch_name(prefix: &str, sequence: u32) -> String {
    format!("{}-{:04}", prefix, sequence)
}

/// Split a generated name into prefix and sequence
pub fn parse_batch_name(name: &str) -> Option<(&str, u32)> {
    let (prefix, digits) = name.rsplit_once('-')?;
    if prefix.is_empty() || digits.len() < 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|seq| (prefix, seq))
}

/// Next free name for a genetic line, given the names already in use
pub fn next_batch_name<'a, I>(existing: I, genetic_name: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = batch_name_prefix(genetic_name);
    let last = existing
        .into_iter()
        .filter_map(parse_batch_name)
        .filter(|(p, _)| *p == prefix)
        .map(|(_, seq)| seq)
        .max()
        .unwrap_or(0);

    generate_batch_name(&prefix, last.saturating_add(1))
}
