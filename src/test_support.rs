// Shared helpers for unit tests.

use std::{fs, path::Path};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::fits::{
    header::{data_len, BLOCK_LEN, CARD_LEN},
    HeaderFields,
};

pub fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Cards of one header/data unit. Values are written verbatim, so strings
/// must carry their own quotes.
pub struct HduSpec {
    cards: Vec<(String, String)>,
}

impl HduSpec {
    pub fn new(cards: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    /// Header cards and `END`, padded to whole blocks.
    pub fn header_block(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (k, v) in &self.cards {
            let card = if k == "COMMENT" || k == "HISTORY" {
                format!("{:<8}{:<72}", k, v)
            } else {
                format!("{:<8}= {:<70}", k, v)
            };
            out.extend_from_slice(&card.as_bytes()[..CARD_LEN]);
        }
        out.extend_from_slice(format!("{:<80}", "END").as_bytes());
        pad(&mut out, b' ');
        out
    }

    fn data_block(&self) -> Vec<u8> {
        let fields: HeaderFields = self
            .cards
            .iter()
            .map(|(k, v)| (k.clone(), v.trim_matches('\'').to_string()))
            .collect();
        let len = data_len(&fields, 0).expect("valid test header");
        vec![0u8; len as usize]
    }
}

fn pad(buf: &mut Vec<u8>, fill: u8) {
    let rem = buf.len() % BLOCK_LEN;
    if rem != 0 {
        buf.resize(buf.len() + BLOCK_LEN - rem, fill);
    }
}

/// Serialise header units (with zeroed data sections) into a FITS byte stream.
pub fn fits_bytes(units: &[HduSpec]) -> Vec<u8> {
    let mut out = Vec::new();
    for unit in units {
        out.extend(unit.header_block());
        out.extend(unit.data_block());
    }
    out
}

/// A small tangent-plane image with the given projection type on axis 1.
pub fn tan_image(ctype1: &str, ctype2: &str) -> HduSpec {
    let cards = [
        ("SIMPLE", "T".to_string()),
        ("BITPIX", "-32".to_string()),
        ("NAXIS", "2".to_string()),
        ("NAXIS1", "40".to_string()),
        ("NAXIS2", "30".to_string()),
        ("CTYPE1", format!("'{}'", ctype1)),
        ("CTYPE2", format!("'{}'", ctype2)),
        ("CRPIX1", "20.5".to_string()),
        ("CRPIX2", "15.5".to_string()),
        ("CRVAL1", "53.25".to_string()),
        ("CRVAL2", "-27.78".to_string()),
        ("CD1_1", "-7.78E-06".to_string()),
        ("CD1_2", "0.0".to_string()),
        ("CD2_1", "0.0".to_string()),
        ("CD2_2", "7.78E-06".to_string()),
        ("INSTRUME", "'NIRCAM'".to_string()),
        ("MODULE", "'B'".to_string()),
        ("FILTER", "'F444W'".to_string()),
        ("EXPTIME", "1288.4".to_string()),
        ("DATE-BEG", "'2022-11-18T03:12:47.123'".to_string()),
        ("TELESCOP", "'JWST'".to_string()),
    ];
    HduSpec::new(cards.into_iter().map(|(k, v)| (k.to_string(), v)))
}

pub fn write_fits(path: &Path, units: &[HduSpec]) {
    fs::write(path, fits_bytes(units)).expect("write test fits");
}
