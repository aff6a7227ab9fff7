// Copyright 2024 Oxide Computer Company

/// One field of a table key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyField {
    pub name: String,
    pub width: usize,
}

impl KeyField {
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// One parameter of an action, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParam {
    pub name: String,
    pub width: usize,
}

impl ActionParam {
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    pub name: String,
    pub parameters: Vec<ActionParam>,
}

impl ActionRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, width: usize) -> Self {
        self.parameters.push(ActionParam::new(name, width));
        self
    }
}

/// The resolved description of one match-action table. Built once through
/// [`TableDescriptorBuilder`] and never mutated afterwards.
///
/// The position of an action in [`TableDescriptor::actions`] is its ordinal.
/// Ordinal 0 is the default action whenever the table has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    name: String,
    id: usize,
    capacity: usize,
    key_fields: Vec<KeyField>,
    actions: Vec<ActionRef>,
    default_action: Option<String>,
}

impl TableDescriptor {
    pub fn builder(name: impl Into<String>) -> TableDescriptorBuilder {
        TableDescriptorBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn key_fields(&self) -> &[KeyField] {
        &self.key_fields
    }

    pub fn key_width(&self) -> usize {
        self.key_fields.iter().map(|k| k.width).sum()
    }

    pub fn actions(&self) -> &[ActionRef] {
        &self.actions
    }

    pub fn default_action(&self) -> Option<&str> {
        self.default_action.as_deref()
    }

    pub fn ordinal(&self, action: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.name == action)
    }
}

#[derive(Debug, Clone)]
pub struct TableDescriptorBuilder {
    name: String,
    id: usize,
    capacity: usize,
    key_fields: Vec<KeyField>,
    actions: Vec<ActionRef>,
    default_action: Option<String>,
}

impl TableDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: 0,
            capacity: crate::DEFAULT_TABLE_CAPACITY,
            key_fields: Vec::new(),
            actions: Vec::new(),
            default_action: None,
        }
    }

    pub fn id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn key_field(mut self, name: impl Into<String>, width: usize) -> Self {
        self.key_fields.push(KeyField::new(name, width));
        self
    }

    pub fn key_fields(mut self, fields: Vec<KeyField>) -> Self {
        self.key_fields.extend(fields);
        self
    }

    pub fn action(mut self, action: ActionRef) -> Self {
        self.actions.push(action);
        self
    }

    pub fn actions(mut self, actions: Vec<ActionRef>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn default_action(mut self, name: Option<String>) -> Self {
        self.default_action = name;
        self
    }

    /// Finish the descriptor. The default action, when present in the action
    /// list, is moved to ordinal 0; the remaining actions keep their order.
    pub fn build(mut self) -> TableDescriptor {
        if let Some(default) = &self.default_action {
            if let Some(i) = self.actions.iter().position(|a| &a.name == default)
            {
                let action = self.actions.remove(i);
                self.actions.insert(0, action);
            }
        }
        TableDescriptor {
            name: self.name,
            id: self.id,
            capacity: self.capacity,
            key_fields: self.key_fields,
            actions: self.actions,
            default_action: self.default_action,
        }
    }
}
