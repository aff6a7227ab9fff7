// Copyright 2024 Oxide Computer Company

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
