// Copyright 2022 Oxide Computer Company

use crate::ast::{Control, Type, UserDefinedType, AST};

/// Resolve the aggregate a dotted base path such as `hdr.ipv4` refers to
/// within a control. The first element of the path names a control parameter,
/// every following element names a member of the aggregate before it.
pub fn resolve_member_parent<'a>(
    ast: &'a AST,
    control: &Control,
    base: &str,
) -> Result<UserDefinedType<'a>, String> {
    let mut parts = base.split('.');
    let root = parts.next().unwrap_or_default();
    let mut ty = match control.get_parameter(root) {
        Some(p) => p.ty.clone(),
        None => {
            return Err(format!(
                "{} is not a parameter of control {}",
                root, control.name
            ))
        }
    };
    for part in parts {
        let parent = user_defined(ast, &ty)?;
        ty = match parent.member_type(part) {
            Some(t) => t.clone(),
            None => {
                return Err(format!(
                    "{} does not have a member {}",
                    parent.name(),
                    part
                ))
            }
        };
    }
    user_defined(ast, &ty)
}

fn user_defined<'a>(
    ast: &'a AST,
    ty: &Type,
) -> Result<UserDefinedType<'a>, String> {
    match ty {
        Type::UserDefined(name) => match ast.get_user_defined_type(name) {
            Some(udt) => Ok(udt),
            None => Err(format!("user defined type {} does not exist", name)),
        },
        t => Err(format!("type {} is not a struct or header", t)),
    }
}
