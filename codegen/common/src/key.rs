// Copyright 2024 Oxide Computer Company

use p4::ast::{Control, KeyElement, KeyExpression, UserDefinedType, AST};
use p4::util::resolve_member_parent;
use slog::{trace, Logger};

use crate::descriptor::KeyField;
use crate::error::TableWarning;

/// Resolves the base of a member expression to the aggregate it refers to.
pub trait FieldTypeResolver {
    fn resolve(&self, base: &str) -> Result<UserDefinedType<'_>, String>;
}

/// Resolves names against the parameters of one control.
pub struct ControlScope<'a> {
    pub ast: &'a AST,
    pub control: &'a Control,
}

impl<'a> ControlScope<'a> {
    pub fn new(ast: &'a AST, control: &'a Control) -> Self {
        Self { ast, control }
    }
}

impl FieldTypeResolver for ControlScope<'_> {
    fn resolve(&self, base: &str) -> Result<UserDefinedType<'_>, String> {
        resolve_member_parent(self.ast, self.control, base)
    }
}

/// The key fields of a table in declaration order. Elements that do not
/// resolve to a fixed width member of a struct or header are left out and
/// reported.
pub fn extract_key_fields(
    key: &[KeyElement],
    resolver: &dyn FieldTypeResolver,
    log: &Logger,
) -> (Vec<KeyField>, Vec<TableWarning>) {
    let mut fields = Vec::new();
    let mut warnings = Vec::new();

    for element in key {
        match key_field(&element.expression, resolver) {
            Ok(field) => {
                trace!(log, "key field";
                    "name" => &field.name,
                    "width" => field.width
                );
                fields.push(field);
            }
            Err(reason) => {
                warnings.push(TableWarning::UnresolvedKeyFieldType {
                    expression: element.expression.to_string(),
                    reason,
                });
            }
        }
    }

    (fields, warnings)
}

fn key_field(
    expression: &KeyExpression,
    resolver: &dyn FieldTypeResolver,
) -> Result<KeyField, String> {
    let (base, member) = match expression {
        KeyExpression::Member { base, member } => (base, member),
        KeyExpression::Other(_) => {
            return Err("only struct or header members can be keys".into())
        }
    };
    let parent = resolver.resolve(base)?;
    let ty = parent.member_type(member).ok_or_else(|| {
        format!("{} does not have a member {}", parent.name(), member)
    })?;
    let width = ty
        .fixed_width()
        .ok_or_else(|| format!("member type {} has no fixed width", ty))?;
    Ok(KeyField::new(member.clone(), width))
}
