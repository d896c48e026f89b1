use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Loads the static override table: one `raw_label: canonical_label` per
/// line, `#` comments and blank lines ignored, first `:` delimits. Any
/// malformed line fails the whole load so a typo is caught at startup.
pub fn load_overrides(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("error reading override file {}", path.display()))?;

    parse_overrides(&content)
}

fn parse_overrides(content: &str) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((raw, canonical)) = line.split_once(':') else {
            bail!("invalid override on line {}: missing ':'", number + 1);
        };

        let raw = raw.trim();
        let canonical = canonical.trim();
        if raw.is_empty() || canonical.is_empty() {
            bail!("invalid override on line {}: empty side", number + 1);
        }

        map.insert(raw.to_owned(), canonical.to_owned());
    }

    Ok(map)
}
