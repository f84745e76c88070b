// src/schema/alias.rs

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::Path};
use tracing::{debug, instrument};

use super::load::{read_resource_lines, ResourceLine};

/// Marks an alias line whose target is not implemented yet.
pub const NYI_MARKER: &str = "NYI";

/// Raw header keyword → canonical field name. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    map: HashMap<String, String>,
}

impl AliasTable {
    /// Look up the canonical key for a header keyword (case-insensitive).
    pub fn get(&self, raw_key: &str) -> Option<&str> {
        self.map
            .get(&raw_key.trim().to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into().trim().to_ascii_uppercase(), v.into()))
            .collect();
        Self { map }
    }
}

/// Parse alias resource text: two cells per line, `rawHeaderKey, canonicalKey`.
#[instrument(level = "debug", skip(contents, source), fields(source = %source))]
pub fn parse_aliases(contents: &str, source: &str) -> Result<AliasTable> {
    let mut map = HashMap::new();

    for ResourceLine { line, cells } in read_resource_lines(contents, source)? {
        if cells.len() != 2 {
            debug!(line, found = cells.len(), "alias line has wrong field count, skipped");
            continue;
        }
        let (raw, canonical) = (&cells[0], &cells[1]);
        if raw.eq_ignore_ascii_case(NYI_MARKER) || canonical.eq_ignore_ascii_case(NYI_MARKER) {
            continue;
        }
        if raw.is_empty() || canonical.is_empty() {
            debug!(line, "alias line has an empty cell, skipped");
            continue;
        }
        if let Some(prev) = map.insert(raw.to_ascii_uppercase(), canonical.clone()) {
            debug!(line, raw = %raw, previous = %prev, "alias redefined");
        }
    }

    debug!(aliases = map.len(), "parsed aliases");
    Ok(AliasTable { map })
}

/// Load an alias resource from disk.
pub fn load_aliases<P: AsRef<Path>>(path: P) -> Result<AliasTable> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading aliases {}", path.display()))?;
    parse_aliases(&contents, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_skips_markers() -> Result<()> {
        let text = "\
# header keyword, canonical key
EXPTIME, t_exptime
EFFEXPTM, t_exptime
MJD-OBS, NYI
NYI, s_fov
one,two,three
lonely
";
        let aliases = parse_aliases(text, "test")?;
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases.get("EXPTIME"), Some("t_exptime"));
        assert_eq!(aliases.get("effexptm"), Some("t_exptime"));
        assert_eq!(aliases.get("MJD-OBS"), None);
        Ok(())
    }

    #[test]
    fn later_definition_wins() -> Result<()> {
        let aliases = parse_aliases("FILTER,filter\nFILTER,band\n", "test")?;
        assert_eq!(aliases.get("FILTER"), Some("band"));
        Ok(())
    }

    #[test]
    fn collects_from_pairs() {
        let aliases: AliasTable = [("naxis1", "im_naxis1")].into_iter().collect();
        assert_eq!(aliases.get("NAXIS1"), Some("im_naxis1"));
    }
}
