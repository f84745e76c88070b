// src/fits/header.rs

use std::{
    fmt,
    fs::File,
    io::{BufReader, ErrorKind, Read, Seek, SeekFrom},
    path::Path,
};
use tracing::{debug, instrument, trace};

use super::{DecodeError, HeaderFields, HeaderSource};

pub const BLOCK_LEN: usize = 2880;
pub const CARD_LEN: usize = 80;

/// Keywords that never carry a value.
const COMMENTARY: [&str; 3] = ["COMMENT", "HISTORY", "CONTINUE"];

/// Which header/data unit supplies the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HduSelector {
    Index(usize),
    /// First unit whose `EXTNAME` matches (case-insensitive).
    Name(String),
}

impl Default for HduSelector {
    fn default() -> Self {
        HduSelector::Index(0)
    }
}

impl HduSelector {
    fn matches(&self, unit: usize, header: &HeaderFields) -> bool {
        match self {
            HduSelector::Index(i) => *i == unit,
            HduSelector::Name(name) => header
                .get("EXTNAME")
                .is_some_and(|ext| ext.eq_ignore_ascii_case(name)),
        }
    }
}

impl fmt::Display for HduSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HduSelector::Index(i) => write!(f, "#{}", i),
            HduSelector::Name(n) => write!(f, "{:?}", n),
        }
    }
}

/// Reads header cards only; data sections are skipped, never decoded.
#[derive(Debug, Clone, Default)]
pub struct FitsHeaderReader {
    selector: HduSelector,
    merge_primary: bool,
}

impl FitsHeaderReader {
    /// `merge_primary`: an extension header inherits the primary header's
    /// cards, its own values taking precedence.
    pub fn new(selector: HduSelector, merge_primary: bool) -> Self {
        Self {
            selector,
            merge_primary,
        }
    }

    pub fn read_from<R: Read + Seek>(&self, reader: &mut R) -> Result<HeaderFields, DecodeError> {
        let mut primary: Option<HeaderFields> = None;
        let mut unit = 0;

        loop {
            let Some(header) = read_unit(reader, unit)? else {
                return Err(DecodeError::HduNotFound(self.selector.to_string()));
            };

            if self.selector.matches(unit, &header) {
                debug!(unit, cards = header.len(), "selected header unit");
                return Ok(match primary {
                    Some(mut merged) if unit > 0 => {
                        merged.merge(header);
                        merged
                    }
                    _ => header,
                });
            }

            let skip = data_len(&header, unit)?;
            trace!(unit, skip, "skipping data section");
            let offset = i64::try_from(skip).map_err(|_| DecodeError::InvalidKeyword {
                keyword: "NAXIS".to_string(),
                value: skip.to_string(),
            })?;
            reader.seek(SeekFrom::Current(offset))?;

            if unit == 0 && self.merge_primary {
                primary = Some(header);
            }
            unit += 1;
        }
    }
}

impl HeaderSource for FitsHeaderReader {
    #[instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    fn read_header(&self, path: &Path) -> Result<HeaderFields, DecodeError> {
        let mut reader = BufReader::new(File::open(path)?);
        self.read_from(&mut reader)
    }
}

/// Fill `buf` unless the stream ends first; returns the bytes read.
fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Read one header unit. `Ok(None)` when the stream ends cleanly before it.
fn read_unit<R: Read>(reader: &mut R, unit: usize) -> Result<Option<HeaderFields>, DecodeError> {
    let mut header = HeaderFields::new();
    let mut block = [0u8; BLOCK_LEN];
    let mut first = true;

    loop {
        let n = read_block(reader, &mut block)?;
        if n == 0 && first {
            return Ok(None);
        }
        if n < BLOCK_LEN {
            return Err(DecodeError::Truncated(unit));
        }

        for card in block.chunks_exact(CARD_LEN) {
            let keyword = card_keyword(card);
            if first {
                first = false;
                let expected = if unit == 0 { "SIMPLE" } else { "XTENSION" };
                if keyword != expected {
                    if unit > 0 {
                        // trailing bytes after the last unit
                        debug!(unit, found = %keyword, "no further extensions");
                        return Ok(None);
                    }
                    return Err(DecodeError::NotFits(
                        String::from_utf8_lossy(card).trim_end().to_string(),
                    ));
                }
            }
            if keyword == "END" {
                return Ok(Some(header));
            }
            if let Some((k, v)) = parse_card(card) {
                header.insert(k, v);
            }
        }
    }
}

fn card_keyword(card: &[u8]) -> String {
    String::from_utf8_lossy(&card[..8]).trim().to_ascii_uppercase()
}

/// Split a card into keyword and value; `None` for cards without a value.
fn parse_card(card: &[u8]) -> Option<(String, String)> {
    let keyword = card_keyword(card);
    if keyword.is_empty() || COMMENTARY.contains(&keyword.as_str()) {
        return None;
    }
    if card.get(8..10) != Some(b"= ".as_slice()) {
        return None;
    }
    let value = parse_value(&String::from_utf8_lossy(&card[10..]));
    Some((keyword, value))
}

/// Quoted strings lose their quotes, `''` escapes and trailing blanks;
/// anything else is cut at the `/` comment delimiter.
fn parse_value(field: &str) -> String {
    let field = field.trim_start();
    if let Some(rest) = field.strip_prefix('\'') {
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        out.trim_end().to_string()
    } else {
        field.split('/').next().unwrap_or_default().trim().to_string()
    }
}

/// Padded size of the data section that follows `header`.
pub(crate) fn data_len(header: &HeaderFields, unit: usize) -> Result<u64, DecodeError> {
    let invalid = |keyword: &str| DecodeError::InvalidKeyword {
        keyword: keyword.to_string(),
        value: header.get(keyword).unwrap_or_default().to_string(),
    };

    let naxis = header.i64("NAXIS").unwrap_or(0);
    if naxis <= 0 {
        return Ok(0);
    }
    let bitpix = header.i64("BITPIX").ok_or_else(|| invalid("BITPIX"))?;

    let mut elements: u64 = 1;
    for axis in 1..=naxis {
        let key = format!("NAXIS{}", axis);
        let n = header
            .i64(&key)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| invalid(&key))?;
        elements = elements.checked_mul(n).ok_or_else(|| invalid(&key))?;
    }
    let pcount = header
        .i64("PCOUNT")
        .map_or(Ok(0), u64::try_from)
        .map_err(|_| invalid("PCOUNT"))?;
    let gcount = header
        .i64("GCOUNT")
        .map_or(Ok(1), u64::try_from)
        .map_err(|_| invalid("GCOUNT"))?;

    let bytes = (bitpix.unsigned_abs() / 8)
        .checked_mul(gcount)
        .and_then(|b| pcount.checked_add(elements).and_then(|n| b.checked_mul(n)))
        .ok_or_else(|| invalid("NAXIS"))?;
    let padded = bytes
        .div_ceil(BLOCK_LEN as u64)
        .checked_mul(BLOCK_LEN as u64)
        .ok_or_else(|| invalid("NAXIS"))?;
    trace!(unit, bytes, padded, "data section size");
    Ok(padded)
}
