// src/resolve/rules.rs

use once_cell::{sync::Lazy, unsync::OnceCell};
use regex::Regex;
use std::collections::HashMap;

use super::{AbortReason, FieldsInfo, FileIdentity};
use crate::{
    fits::HeaderFields,
    geometry::{
        filter_resolution, pixel_type, plate_scale_from_header, reference_coordinate, Corner,
        Footprint,
    },
    process::FieldValue,
    wcs::TransformFactory,
};

pub type RuleResult = Result<Option<FieldValue>, AbortReason>;

/// Computes one field. `Ok(None)` leaves it unset.
pub type RuleFn = fn(&RuleContext<'_>, &FieldsInfo) -> RuleResult;

/// Fields that must all be in the schema before the footprint is computed.
pub const CORNER_FIELDS: [&str; 8] = [
    "s_ra_ll", "s_dec_ll", "s_ra_ul", "s_dec_ul", "s_ra_ur", "s_dec_ur", "s_ra_lr", "s_dec_lr",
];

/// Everything a rule may read for the file being resolved.
pub struct RuleContext<'a> {
    pub file: &'a FileIdentity,
    pub header: &'a HeaderFields,
    pub access_url_base: Option<&'a str>,
    transforms: &'a dyn TransformFactory,
    corners_declared: bool,
    footprint: OnceCell<Result<Option<Footprint>, AbortReason>>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        file: &'a FileIdentity,
        header: &'a HeaderFields,
        transforms: &'a dyn TransformFactory,
        corners_declared: bool,
    ) -> Self {
        Self {
            file,
            header,
            access_url_base: None,
            transforms,
            corners_declared,
            footprint: OnceCell::new(),
        }
    }

    pub fn with_access_url_base(mut self, base: Option<&'a str>) -> Self {
        self.access_url_base = base;
        self
    }

    /// The image footprint, computed on first use.
    pub fn footprint(&self) -> Result<Option<Footprint>, AbortReason> {
        if !self.corners_declared {
            return Ok(None);
        }
        self.footprint
            .get_or_init(|| Footprint::compute(self.header, self.transforms))
            .clone()
    }

    /// Field value if resolved, else the raw header value.
    fn text(&self, fields: &FieldsInfo, field: &str, keyword: &str) -> Option<String> {
        fields
            .value(field)
            .map(|v| v.to_string())
            .or_else(|| self.header.get(keyword).map(str::to_string))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Canonical key → rule. Built once per engine.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<&'static str, RuleFn>,
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("s_ra", s_ra);
        registry.register("s_dec", s_dec);
        registry.register("s_ra_ll", s_ra_ll);
        registry.register("s_dec_ll", s_dec_ll);
        registry.register("s_ra_ul", s_ra_ul);
        registry.register("s_dec_ul", s_dec_ul);
        registry.register("s_ra_ur", s_ra_ur);
        registry.register("s_dec_ur", s_dec_ur);
        registry.register("s_ra_lr", s_ra_lr);
        registry.register("s_dec_lr", s_dec_lr);
        registry.register("s_ra_min", s_ra_min);
        registry.register("s_ra_max", s_ra_max);
        registry.register("s_dec_min", s_dec_min);
        registry.register("s_dec_max", s_dec_max);
        registry.register("s_region", s_region);
        registry.register("s_fov", s_fov);
        registry.register("im_scale", im_scale);
        registry.register("im_pixtype", im_pixtype);
        registry.register("s_resolution", s_resolution);
        registry.register("instrument_name", instrument_name);
        registry.register("target_name", target_name);
        registry.register("access_url", access_url);
        registry.register("obs_id", obs_id);
        registry
    }

    /// Add or replace the rule for `key`.
    pub fn register(&mut self, key: &'static str, rule: RuleFn) {
        self.rules.insert(key, rule);
    }

    pub fn get(&self, key: &str) -> Option<RuleFn> {
        self.rules.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("RuleRegistry").field("rules", &keys).finish()
    }
}

fn s_ra(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
    Ok(reference_coordinate(ctx.header)?.map(|c| FieldValue::Double(c.ra)))
}

fn s_dec(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
    Ok(reference_coordinate(ctx.header)?.map(|c| FieldValue::Double(c.dec)))
}

macro_rules! corner_rule {
    ($name:ident, $corner:expr, $axis:ident) => {
        fn $name(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
            Ok(ctx
                .footprint()?
                .map(|fp| FieldValue::Double(fp.corner($corner).$axis)))
        }
    };
}

corner_rule!(s_ra_ll, Corner::LowerLeft, ra);
corner_rule!(s_dec_ll, Corner::LowerLeft, dec);
corner_rule!(s_ra_ul, Corner::UpperLeft, ra);
corner_rule!(s_dec_ul, Corner::UpperLeft, dec);
corner_rule!(s_ra_ur, Corner::UpperRight, ra);
corner_rule!(s_dec_ur, Corner::UpperRight, dec);
corner_rule!(s_ra_lr, Corner::LowerRight, ra);
corner_rule!(s_dec_lr, Corner::LowerRight, dec);

macro_rules! bounds_rule {
    ($name:ident, $limit:ident) => {
        fn $name(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
            Ok(ctx
                .footprint()?
                .map(|fp| FieldValue::Double(fp.bounds().$limit)))
        }
    };
}

bounds_rule!(s_ra_min, ra_min);
bounds_rule!(s_ra_max, ra_max);
bounds_rule!(s_dec_min, dec_min);
bounds_rule!(s_dec_max, dec_max);

fn s_region(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
    let frame = ctx
        .header
        .get("RADESYS")
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or("ICRS");
    Ok(ctx
        .footprint()?
        .map(|fp| FieldValue::String(fp.region(frame))))
}

fn s_fov(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
    let (Some(n1), Some(n2)) = (ctx.header.i64("NAXIS1"), ctx.header.i64("NAXIS2")) else {
        return Ok(None);
    };
    Ok(plate_scale_from_header(ctx.header)
        .map(|scale| FieldValue::Double(n1.max(n2) as f64 * scale / 3600.0)))
}

fn im_scale(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
    Ok(plate_scale_from_header(ctx.header).map(FieldValue::Double))
}

fn im_pixtype(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
    Ok(ctx.header.get("BITPIX").map(|raw| {
        let label = raw.trim().parse::<i64>().map_or(crate::geometry::UNKNOWN_PIXTYPE, pixel_type);
        FieldValue::String(label.to_string())
    }))
}

fn s_resolution(ctx: &RuleContext<'_>, fields: &FieldsInfo) -> RuleResult {
    let Some(filter) = ctx.text(fields, "filter", "FILTER") else {
        return Ok(None);
    };
    let mut fwhm = filter_resolution(&filter);
    // NIRCam pupil-wheel filters are paired with a CLEAR filter wheel
    if fwhm.is_none() && filter.eq_ignore_ascii_case("CLEAR") {
        fwhm = ctx
            .text(fields, "pupil", "PUPIL")
            .and_then(|pupil| filter_resolution(&pupil));
    }
    Ok(fwhm.map(FieldValue::Double))
}

fn instrument_name(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
    let Some(instrument) = ctx.header.get("INSTRUME").map(str::trim).filter(|s| !s.is_empty())
    else {
        return Ok(None);
    };
    let name = match ctx.header.get("MODULE").map(str::trim).filter(|s| !s.is_empty()) {
        Some(module) => format!("{}/{}", instrument, module),
        None => instrument.to_string(),
    };
    Ok(Some(FieldValue::String(name)))
}

/// File-name prefixes of survey mosaics and the field each covers.
static TARGET_PREFIXES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)^(hlsp_)?ceers", "EGS"),
        (r"(?i)^(hlsp_)?jades[-_]?gn", "GOODS-N"),
        (r"(?i)^(hlsp_)?jades", "GOODS-S"),
        (r"(?i)^(hlsp_)?primer[-_]?uds", "UDS"),
        (r"(?i)^(hlsp_)?(primer|cosmos)", "COSMOS"),
        (r"(?i)^(hlsp_)?ngdeep", "HUDF"),
        (r"(?i)^(hlsp_)?(uncover|glass)", "Abell 2744"),
    ]
    .into_iter()
    .map(|(pattern, target)| (Regex::new(pattern).expect("valid target pattern"), target))
    .collect()
});

fn target_name(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
    Ok(TARGET_PREFIXES
        .iter()
        .find(|(re, _)| re.is_match(&ctx.file.name))
        .map(|(_, target)| FieldValue::String(target.to_string())))
}

fn access_url(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
    let url = match ctx.access_url_base {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), ctx.file.name),
        None => format!("file://{}", ctx.file.path.display()),
    };
    Ok(Some(FieldValue::String(url)))
}

fn obs_id(ctx: &RuleContext<'_>, _: &FieldsInfo) -> RuleResult {
    let stem = ctx.file.stem();
    Ok((!stem.is_empty()).then(|| FieldValue::String(stem.to_string())))
}
