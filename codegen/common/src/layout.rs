// Copyright 2024 Oxide Computer Company

//! Bit layouts of table requests and responses.
//!
//! Every layout packs first field first: the first field occupies the most
//! significant bits of the packed value. Offsets are reported the same way,
//! offset 0 is the most significant bit.

use std::collections::{HashMap, HashSet};

use crate::descriptor::TableDescriptor;
use crate::error::CodegenError;
use crate::naming::{camel_case, enum_tag};

pub const PADDING_FIELD: &str = "padding";
pub const ACTION_TAG_FIELD: &str = "_action";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub width: usize,
}

impl Field {
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// Round `width` up to the next multiple of `alignment`.
pub fn padded_width(width: usize, alignment: usize) -> usize {
    let alignment = alignment.max(1);
    width.div_ceil(alignment) * alignment
}

/// Number of bits needed to tag one of `n` actions, never less than one.
pub fn tag_width(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (usize::BITS - (n - 1).leading_zeros()) as usize
}

/// Number of bits needed to represent the value `n` itself, never less than
/// one.
pub fn bits_for_value(n: usize) -> usize {
    ((usize::BITS - n.leading_zeros()) as usize).max(1)
}

fn offset_in(fields: &[Field], name: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for f in fields {
        if f.name == name {
            return Some((offset, f.width));
        }
        offset += f.width;
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLayout {
    /// Synthetic leading bits that bring the request to the alignment unit.
    pub padding: usize,
    pub key: Vec<Field>,
}

impl RequestLayout {
    pub fn key_width(&self) -> usize {
        self.key.iter().map(|f| f.width).sum()
    }

    pub fn width(&self) -> usize {
        self.padding + self.key_width()
    }

    /// All packed fields, the padding field first when there is one.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::with_capacity(self.key.len() + 1);
        if self.padding > 0 {
            fields.push(Field::new(PADDING_FIELD, self.padding));
        }
        fields.extend(self.key.iter().cloned());
        fields
    }

    /// MSB-first offset and width of a field.
    pub fn offset_of(&self, name: &str) -> Option<(usize, usize)> {
        offset_in(&self.fields(), name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLayout {
    pub tag_width: usize,
    /// The union of all action parameters, in order of first appearance.
    pub parameters: Vec<Field>,
}

impl ResponseLayout {
    pub fn width(&self) -> usize {
        self.tag_width + self.parameters.iter().map(|f| f.width).sum::<usize>()
    }

    /// All packed fields, the action tag first.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::with_capacity(self.parameters.len() + 1);
        fields.push(Field::new(ACTION_TAG_FIELD, self.tag_width));
        fields.extend(self.parameters.iter().cloned());
        fields
    }

    pub fn offset_of(&self, name: &str) -> Option<(usize, usize)> {
        offset_in(&self.fields(), name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub request: RequestLayout,
    pub response: ResponseLayout,
    pub action_count: usize,
}

/// Compute the request and response layouts of a table.
pub fn encode(
    desc: &TableDescriptor,
    alignment: usize,
) -> Result<TableLayout, CodegenError> {
    if desc.actions().is_empty() {
        return Err(CodegenError::EmptyActionList {
            table: desc.name().to_owned(),
        });
    }
    if desc.key_fields().is_empty() {
        return Err(CodegenError::EmptyKey {
            table: desc.name().to_owned(),
        });
    }

    check_key_names(desc)?;
    check_action_names(desc)?;

    let key: Vec<Field> = desc
        .key_fields()
        .iter()
        .map(|k| Field::new(&k.name, k.width))
        .collect();
    let key_width = desc.key_width();
    let request = RequestLayout {
        padding: padded_width(key_width, alignment) - key_width,
        key,
    };

    let response = ResponseLayout {
        tag_width: tag_width(desc.actions().len()),
        parameters: merge_parameters(desc)?,
    };

    Ok(TableLayout {
        request,
        response,
        action_count: desc.actions().len(),
    })
}

/// Key fields become struct members and let bindings of the generated
/// module, so their names must be unique and must not shadow the pad field.
fn check_key_names(desc: &TableDescriptor) -> Result<(), CodegenError> {
    let mut seen = HashSet::new();
    for k in desc.key_fields() {
        if k.name == PADDING_FIELD {
            return Err(CodegenError::ReservedFieldName {
                table: desc.name().to_owned(),
                field: k.name.clone(),
            });
        }
        if !seen.insert(k.name.as_str()) {
            return Err(CodegenError::DuplicateKeyField {
                table: desc.name().to_owned(),
                field: k.name.clone(),
            });
        }
    }
    Ok(())
}

/// Distinct actions must stay distinct as enum tags and union members.
fn check_action_names(desc: &TableDescriptor) -> Result<(), CodegenError> {
    let mut tags: HashMap<String, &str> = HashMap::new();
    let mut members: HashMap<String, &str> = HashMap::new();
    for action in desc.actions() {
        for (emitted, seen) in [
            (enum_tag(&action.name), &mut tags),
            (camel_case(&action.name), &mut members),
        ] {
            if let Some(first) = seen.insert(emitted.clone(), &action.name) {
                return Err(CodegenError::ActionNameClash {
                    table: desc.name().to_owned(),
                    first: first.to_owned(),
                    second: action.name.clone(),
                    emitted,
                });
            }
        }
        let tag = action.parameters.iter().find(|p| p.name == ACTION_TAG_FIELD);
        if let Some(p) = tag {
            return Err(CodegenError::ReservedFieldName {
                table: desc.name().to_owned(),
                field: p.name.clone(),
            });
        }
    }
    Ok(())
}

fn merge_parameters(desc: &TableDescriptor) -> Result<Vec<Field>, CodegenError> {
    let mut merged: Vec<Field> = Vec::new();
    // parameter name -> (index into merged, first declaring action)
    let mut seen: HashMap<&str, (usize, &str)> = HashMap::new();

    for action in desc.actions() {
        for p in &action.parameters {
            match seen.get(p.name.as_str()) {
                Some(&(i, first_action)) => {
                    if merged[i].width != p.width {
                        return Err(CodegenError::ConflictingParameterWidth {
                            table: desc.name().to_owned(),
                            parameter: p.name.clone(),
                            first_action: first_action.to_owned(),
                            first_width: merged[i].width,
                            action: action.name.clone(),
                            width: p.width,
                        });
                    }
                }
                None => {
                    seen.insert(
                        p.name.as_str(),
                        (merged.len(), action.name.as_str()),
                    );
                    merged.push(Field::new(&p.name, p.width));
                }
            }
        }
    }

    Ok(merged)
}
