// Copyright 2024 Oxide Computer Company

use p4::ast::{ActionListElement, ActionParameter, Control};
use slog::{trace, Logger};

use crate::descriptor::{ActionParam, ActionRef};
use crate::error::TableWarning;

/// Looks up the declared parameters of an action by name.
pub trait ParameterResolver {
    fn parameters(&self, action: &str) -> Option<&[ActionParameter]>;
}

impl ParameterResolver for Control {
    fn parameters(&self, action: &str) -> Option<&[ActionParameter]> {
        self.get_action(action).map(|a| a.parameters.as_slice())
    }
}

/// Build the action catalog of a table. The default action is placed at
/// ordinal 0, all other direct calls follow in the order they are listed.
pub fn build_catalog(
    actions: &[ActionListElement],
    default_action: Option<&str>,
    resolver: &dyn ParameterResolver,
    log: &Logger,
) -> (Vec<ActionRef>, Vec<TableWarning>) {
    let mut catalog: Vec<ActionRef> = Vec::new();
    let mut warnings = Vec::new();

    for element in actions {
        let name = match element {
            ActionListElement::DirectCall(name) => name,
            ActionListElement::PathReference(_)
            | ActionListElement::Unsupported(_) => {
                warnings.push(TableWarning::UnsupportedActionReference {
                    reference: element.to_string(),
                });
                continue;
            }
        };
        if catalog.iter().any(|a| &a.name == name) {
            continue;
        }

        let action = resolve_action(name, resolver, &mut warnings);
        trace!(log, "action";
            "name" => name,
            "parameters" => action.parameters.len()
        );
        if Some(name.as_str()) == default_action {
            catalog.insert(0, action);
        } else {
            catalog.push(action);
        }
    }

    (catalog, warnings)
}

fn resolve_action(
    name: &str,
    resolver: &dyn ParameterResolver,
    warnings: &mut Vec<TableWarning>,
) -> ActionRef {
    let mut action = ActionRef::new(name);
    let declared = match resolver.parameters(name) {
        Some(params) => params,
        None => {
            warnings.push(TableWarning::MissingActionParameters {
                action: name.to_owned(),
            });
            return action;
        }
    };
    for p in declared {
        match p.ty.fixed_width() {
            Some(width) => action.parameters.push(ActionParam::new(&p.name, width)),
            None => warnings.push(TableWarning::UnsizedActionParameter {
                action: name.to_owned(),
                parameter: p.name.clone(),
                ty: p.ty.to_string(),
            }),
        }
    }
    action
}
