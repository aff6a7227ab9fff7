// Copyright 2022 Oxide Computer Company

//! The resolved program handed to the table lowering by the front end.
//!
//! Everything here has already been parsed and type checked. Names are
//! resolved, every key element knows whether it is a member access, and every
//! action list element knows whether it is a direct call.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AST {
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub structs: Vec<Struct>,
    #[serde(default)]
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, Copy)]
pub enum UserDefinedType<'a> {
    Struct(&'a Struct),
    Header(&'a Header),
}

impl UserDefinedType<'_> {
    pub fn name(&self) -> &str {
        match self {
            UserDefinedType::Struct(s) => &s.name,
            UserDefinedType::Header(h) => &h.name,
        }
    }

    /// The declared type of the named member, if the aggregate has one.
    pub fn member_type(&self, name: &str) -> Option<&Type> {
        match self {
            UserDefinedType::Struct(s) => {
                s.members.iter().find(|m| m.name == name).map(|m| &m.ty)
            }
            UserDefinedType::Header(h) => {
                h.members.iter().find(|m| m.name == name).map(|m| &m.ty)
            }
        }
    }
}

impl AST {
    pub fn get_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn get_header(&self, name: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.name == name)
    }

    pub fn get_control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.name == name)
    }

    pub fn get_user_defined_type(&self, name: &str) -> Option<UserDefinedType> {
        if let Some(user_struct) = self.get_struct(name) {
            return Some(UserDefinedType::Struct(user_struct));
        }
        if let Some(user_header) = self.get_header(name) {
            return Some(UserDefinedType::Header(user_header));
        }
        None
    }

    /// All tables in the program along with the control they live in, in
    /// declaration order.
    pub fn tables(&self) -> Vec<(&Control, &Table)> {
        let mut result = Vec::new();
        for c in &self.controls {
            for t in &c.tables {
                result.push((c, t));
            }
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Bool,
    Error,
    Bit(usize),
    Varbit(usize),
    Int(usize),
    String,
    UserDefined(String),
    ExternFunction,
    Table,
    Void,
}

impl Type {
    /// Width in bits of fixed width scalar types. Aggregates and variable
    /// width types have no fixed width.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Type::Bool => Some(1),
            Type::Bit(n) => Some(*n),
            Type::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            Type::Bool => write!(f, "bool"),
            Type::Error => write!(f, "error"),
            Type::Bit(size) => write!(f, "bit<{}>", size),
            Type::Varbit(size) => write!(f, "varbit<{}>", size),
            Type::Int(size) => write!(f, "int<{}>", size),
            Type::String => write!(f, "string"),
            Type::UserDefined(name) => write!(f, "{}", name),
            Type::ExternFunction => write!(f, "extern function"),
            Type::Table => write!(f, "table"),
            Type::Void => write!(f, "void"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub members: Vec<HeaderMember>,
}

impl Header {
    pub fn new(name: String) -> Self {
        Header {
            name,
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderMember {
    pub ty: Type,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    pub members: Vec<StructMember>,
}

impl Struct {
    pub fn new(name: String) -> Self {
        Struct {
            name,
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructMember {
    pub ty: Type,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Control {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ControlParameter>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Control {
    pub fn new(name: String) -> Self {
        Self {
            name,
            parameters: Vec::new(),
            actions: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn get_parameter(&self, name: &str) -> Option<&ControlParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn get_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlParameter {
    #[serde(default)]
    pub direction: Direction,
    pub ty: Type,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
    InOut,
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ActionParameter>,
}

impl Action {
    pub fn new(name: String) -> Self {
        Self {
            name,
            parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionParameter {
    pub ty: Type,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,

    /// Value of an `@name("...")` annotation on the table, if present.
    #[serde(default)]
    pub name_annotation: Option<String>,

    /// Position of the table declaration in the program.
    #[serde(default)]
    pub declaration_index: usize,

    #[serde(default)]
    pub key: Vec<KeyElement>,
    #[serde(default)]
    pub actions: Vec<ActionListElement>,
    #[serde(default)]
    pub default_action: Option<String>,

    /// Value of the `size` table property, if present.
    #[serde(default)]
    pub size: Option<usize>,
}

impl Table {
    pub fn new(name: String) -> Self {
        Self {
            name,
            name_annotation: None,
            declaration_index: 0,
            key: Vec::new(),
            actions: Vec::new(),
            default_action: None,
            size: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyElement {
    pub expression: KeyExpression,
    #[serde(default)]
    pub match_kind: MatchKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyExpression {
    /// A member access such as `hdr.ipv4.dst`, split into the base path
    /// `hdr.ipv4` and the member `dst`.
    Member { base: String, member: String },

    /// Any other expression, kept in source form for diagnostics.
    Other(String),
}

impl fmt::Display for KeyExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyExpression::Member { base, member } => {
                write!(f, "{}.{}", base, member)
            }
            KeyExpression::Other(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    #[default]
    Exact,
    Ternary,
    LongestPrefixMatch,
    Range,
}

/// An element of a table's action list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionListElement {
    /// A call of a declared action, e.g. `forward(port)`.
    DirectCall(String),

    /// A bare path naming an action without calling it.
    PathReference(String),

    /// Anything else, kept in source form for diagnostics.
    Unsupported(String),
}

impl fmt::Display for ActionListElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionListElement::DirectCall(name) => write!(f, "{}()", name),
            ActionListElement::PathReference(name) => write!(f, "{}", name),
            ActionListElement::Unsupported(text) => write!(f, "{}", text),
        }
    }
}
