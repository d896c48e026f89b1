use anyhow::Result;

use crate::domain::{Direction, Transaction};
use crate::email::EmailMeta;
use crate::error::IngestError;

pub mod build;
pub mod extract;
mod templates;

use extract::{FieldPattern, extract_fields};

/// Where a template's transaction description comes from: a constant label
/// or a captured field.
#[derive(Debug, Clone, Copy)]
pub enum DescriptionRule {
    Label(&'static str),
    Field(&'static str),
}

/// One (institution, notification-type) template: a two-factor match guard
/// plus a declarative field-pattern table and the constants the builder
/// needs. Adding a template is a data addition, never shared-code surgery.
#[derive(Debug)]
pub struct TemplateParser {
    pub name: &'static str,
    pub subject_phrase: &'static str,
    pub body_phrase: &'static str,
    pub institution: &'static str,
    pub currency: &'static str,
    pub direction: Direction,
    pub description: DescriptionRule,
    pub fields: Vec<FieldPattern>,
}

impl TemplateParser {
    /// Subject phrase AND body phrase must both hold, so one institution's
    /// templates cannot cross-match another's.
    pub fn matches(&self, meta: &EmailMeta) -> bool {
        meta.subject.contains(self.subject_phrase) && meta.text.contains(self.body_phrase)
    }

    pub fn parse(&self, meta: &EmailMeta) -> Result<Transaction, IngestError> {
        let fields = extract_fields(&meta.text, &self.fields)?;

        let description = match self.description {
            DescriptionRule::Label(label) => label.to_owned(),
            DescriptionRule::Field(name) => fields
                .get(name)
                .map(|value| value.trim().to_owned())
                .unwrap_or_default(),
        };

        build::build_transaction(
            meta,
            &fields,
            self.institution,
            self.currency,
            self.direction,
            description,
        )
    }
}

/// Explicit ordered registry, built once at startup. First match wins.
pub fn build_registry() -> Result<Vec<TemplateParser>> {
    templates::rbc::parsers()
}

pub fn find<'a>(registry: &'a [TemplateParser], meta: &EmailMeta) -> Option<&'a TemplateParser> {
    registry.iter().find(|parser| parser.matches(meta))
}
