// Copyright 2024 Oxide Computer Company

//! Runtime support for generated table simulation backends.
//!
//! Generated code instantiates one [`table::SharedMatchTable`] per table and
//! describes its layout with a [`TableShape`]. The shape knows how to pack
//! keys and action results the same way the hardware types do.

use bitvec::prelude::*;

pub use error::{EncodeError, WidthError};

pub mod arbiter;
pub mod bits;
pub mod error;
pub mod pipeline;
pub mod table;

use bits::Bits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape {
    pub name: &'static str,
    pub width: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionShape {
    pub name: &'static str,
    pub parameters: &'static [FieldShape],
}

/// Layout of one table. Actions are listed in ordinal order, so the index of
/// an action is its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableShape {
    pub name: &'static str,
    pub id: usize,
    pub capacity: usize,
    pub padding: usize,
    pub key: &'static [FieldShape],
    pub tag_width: usize,
    /// Union of all action parameters, in response order.
    pub parameters: &'static [FieldShape],
    pub actions: &'static [ActionShape],
    pub default_action: Option<&'static str>,
}

/// A decoded lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCall {
    pub action: &'static str,
    pub tag: usize,
    /// Values of the parameters of `action` in declaration order.
    pub arguments: Vec<(&'static str, u128)>,
}

impl ActionCall {
    pub fn argument(&self, name: &str) -> Option<u128> {
        self.arguments
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

impl TableShape {
    pub fn key_width(&self) -> usize {
        self.key.iter().map(|f| f.width).sum()
    }

    pub fn request_width(&self) -> usize {
        self.padding + self.key_width()
    }

    pub fn response_width(&self) -> usize {
        self.tag_width + self.parameters.iter().map(|f| f.width).sum::<usize>()
    }

    pub fn ordinal(&self, action: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.name == action)
    }

    /// Pack key values, one per key field, into a request. The padding
    /// field is always zero.
    pub fn encode_request(&self, key: &[u128]) -> Result<Bits, EncodeError> {
        if key.len() != self.key.len() {
            return Err(EncodeError::FieldCount {
                expected: self.key.len(),
                actual: key.len(),
            });
        }
        let mut fields = Vec::with_capacity(key.len() + 1);
        fields.push((0, self.padding));
        fields.extend(key.iter().zip(self.key).map(|(v, f)| (*v, f.width)));
        Ok(bits::pack(&fields))
    }

    /// Pack an action and its arguments, in the action's parameter order,
    /// into a response. Parameters of other actions are zero.
    pub fn encode_response(
        &self,
        action: &str,
        arguments: &[u128],
    ) -> Result<Bits, EncodeError> {
        let tag = self
            .ordinal(action)
            .ok_or_else(|| EncodeError::UnknownAction(action.to_owned()))?;
        let declared = self.actions[tag].parameters;
        if arguments.len() != declared.len() {
            return Err(EncodeError::FieldCount {
                expected: declared.len(),
                actual: arguments.len(),
            });
        }

        let mut fields = Vec::with_capacity(self.parameters.len() + 1);
        fields.push((tag as u128, self.tag_width));
        for p in self.parameters {
            let value = declared
                .iter()
                .position(|d| d.name == p.name)
                .map(|i| arguments[i])
                .unwrap_or(0);
            fields.push((value, p.width));
        }
        Ok(bits::pack(&fields))
    }

    /// Decode a response into the action it selects, projecting out only the
    /// parameters that action declares.
    pub fn decode_response(
        &self,
        response: &BitSlice<u8, Msb0>,
    ) -> Result<ActionCall, EncodeError> {
        let mut widths = vec![self.tag_width];
        widths.extend(self.parameters.iter().map(|f| f.width));
        let values = bits::unpack(response, &widths)?;

        let tag = values[0] as usize;
        let action = self
            .actions
            .get(tag)
            .ok_or(EncodeError::UnknownTag(tag))?;
        let arguments = action
            .parameters
            .iter()
            .map(|d| {
                let i = self
                    .parameters
                    .iter()
                    .position(|p| p.name == d.name)
                    .map(|i| i + 1);
                (d.name, i.map(|i| values[i]).unwrap_or(0))
            })
            .collect();

        Ok(ActionCall {
            action: action.name,
            tag,
            arguments,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use slog::Drain;
    use std::env;

    pub(crate) fn test_logger() -> slog::Logger {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "info");
        }
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_envlogger::new(drain).fuse();
        slog::Logger::root(std::sync::Mutex::new(drain).fuse(), slog::o!())
    }

    const PORT: FieldShape = FieldShape {
        name: "port",
        width: 8,
    };

    pub(crate) const PORT_TBL: TableShape = TableShape {
        name: "port_tbl",
        id: 0,
        capacity: 256,
        padding: 2,
        key: &[
            FieldShape {
                name: "srcPort",
                width: 8,
            },
            FieldShape {
                name: "dstPort",
                width: 8,
            },
        ],
        tag_width: 2,
        parameters: &[PORT],
        actions: &[
            ActionShape {
                name: "default",
                parameters: &[],
            },
            ActionShape {
                name: "forward",
                parameters: &[PORT],
            },
            ActionShape {
                name: "drop",
                parameters: &[],
            },
        ],
        default_action: Some("default"),
    };

    #[test]
    fn widths() {
        assert_eq!(PORT_TBL.key_width(), 16);
        assert_eq!(PORT_TBL.request_width(), 18);
        assert_eq!(PORT_TBL.response_width(), 10);
    }

    #[test]
    fn encode_decode_scenario() {
        let key = PORT_TBL.encode_request(&[80, 443]).unwrap();
        assert_eq!(key.len(), 18);
        assert_eq!(bits::to_u64(&key), (80 << 8) | (443 & 0xff));

        let rsp = PORT_TBL.encode_response("forward", &[5]).unwrap();
        assert_eq!(bits::to_u64(&rsp), (1 << 8) | 5);

        let call = PORT_TBL.decode_response(&rsp).unwrap();
        assert_eq!(call.action, "forward");
        assert_eq!(call.tag, 1);
        assert_eq!(call.argument("port"), Some(5));
    }

    #[test]
    fn projection_drops_foreign_parameters() {
        let rsp = bits::pack(&[(2, 2), (77, 8)]);
        let call = PORT_TBL.decode_response(&rsp).unwrap();
        assert_eq!(call.action, "drop");
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn miss_decodes_to_default() {
        let call = PORT_TBL.decode_response(&bits::zeros(10)).unwrap();
        assert_eq!(call.action, "default");
        assert_eq!(call.tag, 0);
    }

    #[test]
    fn encode_errors() {
        assert_eq!(
            PORT_TBL.encode_request(&[1]),
            Err(EncodeError::FieldCount {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            PORT_TBL.encode_response("mirror", &[]),
            Err(EncodeError::UnknownAction("mirror".into()))
        );
        assert_eq!(
            PORT_TBL.decode_response(&bits::pack(&[(3, 2), (0, 8)])),
            Err(EncodeError::UnknownTag(3))
        );
        assert!(matches!(
            PORT_TBL.decode_response(&bits::zeros(9)),
            Err(EncodeError::Width(_))
        ));
    }
}
