// src/resolve/engine.rs

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{
    rules::{RuleContext, RuleRegistry, CORNER_FIELDS},
    AbortReason, FieldsInfo, FileIdentity, Resolution, ResolvedRecord,
};
use crate::{
    fits::HeaderFields,
    process::FieldValue,
    schema::{AliasTable, SchemaTable},
    wcs::{TanTransformFactory, TransformFactory},
};

/// Resolves headers into schema records. Shared read-only across workers.
pub struct Engine {
    schema: Arc<SchemaTable>,
    aliases: Arc<AliasTable>,
    rules: RuleRegistry,
    transforms: Box<dyn TransformFactory>,
    access_url_base: Option<String>,
    corners_declared: bool,
}

impl Engine {
    pub fn new(schema: SchemaTable, aliases: AliasTable) -> Self {
        let corners_declared = CORNER_FIELDS.iter().all(|f| schema.contains(f));
        Self {
            schema: Arc::new(schema),
            aliases: Arc::new(aliases),
            rules: RuleRegistry::standard(),
            transforms: Box::new(TanTransformFactory),
            access_url_base: None,
            corners_declared,
        }
    }

    pub fn with_transforms(mut self, transforms: impl TransformFactory + 'static) -> Self {
        self.transforms = Box::new(transforms);
        self
    }

    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_access_url_base(mut self, base: Option<String>) -> Self {
        self.access_url_base = base;
        self
    }

    pub fn schema(&self) -> &SchemaTable {
        &self.schema
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// A fresh record with every schema field unset.
    pub fn new_record(&self) -> FieldsInfo {
        FieldsInfo::from_schema(&self.schema)
    }

    #[instrument(level = "debug", skip_all, fields(file = %file.name))]
    pub fn resolve(&self, file: &FileIdentity, header: &HeaderFields) -> Resolution {
        let mut fields = self.new_record();

        inject_identity(&mut fields, file);
        self.attach_header(&mut fields, header);
        coerce_sources(&mut fields);
        fill_defaults(&mut fields);
        if let Err(reason) = self.apply_rules(&mut fields, file, header) {
            debug!(%reason, "resolution aborted");
            return Resolution::Aborted(reason);
        }

        let missing = fields.missing_required();
        for name in &missing {
            warn!(field = %name, "required field has no value");
        }
        Resolution::Resolved(ResolvedRecord { fields, missing })
    }

    fn attach_header(&self, fields: &mut FieldsInfo, header: &HeaderFields) {
        for (key, raw) in header.iter() {
            let Some(canonical) = self.aliases.get(key) else {
                continue;
            };
            match fields.get_mut(canonical) {
                Some(record) => {
                    if !record.attach(key, raw) {
                        debug!(field = canonical, keyword = key, "field already has a source");
                    }
                }
                None => debug!(field = canonical, keyword = key, "alias target not in schema"),
            }
        }
    }

    fn apply_rules(
        &self,
        fields: &mut FieldsInfo,
        file: &FileIdentity,
        header: &HeaderFields,
    ) -> Result<(), AbortReason> {
        let ctx = RuleContext::new(file, header, self.transforms.as_ref(), self.corners_declared)
            .with_access_url_base(self.access_url_base.as_deref());

        let pending: Vec<_> = fields
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_set())
            .filter_map(|(pos, r)| self.rules.get(r.name()).map(|rule| (pos, rule)))
            .collect();

        for (pos, rule) in pending {
            let Some(value) = rule(&ctx, fields)? else {
                continue;
            };
            let record = fields.record_mut(pos);
            match record.entry().datatype().and_then(|ty| value.conform(ty)) {
                Ok(v) => {
                    record.resolve(v);
                }
                Err(e) => warn!(field = record.name(), error = %e, "computed value rejected"),
            }
        }
        Ok(())
    }
}

fn set_if_declared(fields: &mut FieldsInfo, name: &str, value: FieldValue) {
    let Some(record) = fields.get_mut(name) else {
        return;
    };
    match record.entry().datatype().and_then(|ty| value.conform(ty)) {
        Ok(v) => {
            record.resolve(v);
        }
        Err(e) => warn!(field = name, error = %e, "file identity value rejected"),
    }
}

fn inject_identity(fields: &mut FieldsInfo, file: &FileIdentity) {
    set_if_declared(fields, "file_name", FieldValue::String(file.name.clone()));
    set_if_declared(
        fields,
        "file_path",
        FieldValue::String(file.path.display().to_string()),
    );
    if let Some(size) = file.size.and_then(|s| i64::try_from(s).ok()) {
        set_if_declared(fields, "file_size", FieldValue::Integer(size));
    }
}

fn coerce_sources(fields: &mut FieldsInfo) {
    for record in fields.iter_mut() {
        if record.is_set() {
            continue;
        }
        let Some((key, raw)) = record.source() else {
            continue;
        };
        match record.entry().coerce(raw) {
            Ok(value) => {
                record.resolve(value);
            }
            Err(e) => warn!(field = record.name(), keyword = key, error = %e, "header value not coerced"),
        }
    }
}

/// Give every unset field with a literal default its coerced default.
/// Applying it again changes nothing.
pub fn fill_defaults(fields: &mut FieldsInfo) {
    for record in fields.iter_mut() {
        if record.is_set() {
            continue;
        }
        match record.entry().default_value() {
            Some(Ok(value)) => {
                record.resolve(value);
            }
            Some(Err(e)) => warn!(field = record.name(), error = %e, "default not coerced"),
            None => {}
        }
    }
}
