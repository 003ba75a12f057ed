// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for dynamical-system construction and composition

use std::fmt;

use crate::state::DType;

/// What a container name is already bound to when an insertion is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// A state cell owned by the container
    Variable,
    /// A child system of the container
    Child,
    /// A built-in container attribute (`name`, `update`, ...)
    Reserved,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Variable => write!(f, "a variable"),
            AttributeKind::Child => write!(f, "a child system"),
            AttributeKind::Reserved => write!(f, "a reserved attribute"),
        }
    }
}

/// Errors raised by neurodyn-dynamics.
///
/// Construction-time violations are reported immediately and no partially
/// built object is returned. Per-step operations (`push`, `pull`, `advance`)
/// never return these; shape and index violations there surface as
/// `ndarray` panics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DynamicsError {
    #[error("delay size must have at least one dimension")]
    EmptySize,

    #[error("delay size must only contain positive extents, got {size:?}")]
    ZeroExtent { size: Vec<usize> },

    #[error("heterogeneous delays only support 1-D sizes, got {ndim} dimensions")]
    HeterogeneousDimensions { ndim: usize },

    #[error("delay time shape {delay:?} does not match delay size {size:?}")]
    DelayShapeMismatch { delay: Vec<usize>, size: Vec<usize> },

    #[error("delay time must be finite and non-negative, got {value}")]
    InvalidDelayTime { value: f64 },

    #[error("delay buffer of {capacity} slices of {size:?} exceeds the addressable size")]
    BufferTooLarge { capacity: usize, size: Vec<usize> },

    #[error("time step must be finite and positive, got {dt}")]
    InvalidTimeStep { dt: f64 },

    #[error("duration must be finite and non-negative, got {duration}")]
    InvalidDuration { duration: f64 },

    #[error("name \"{name}\" is already bound to {bound_to} in \"{container}\"")]
    NameCollision {
        container: String,
        name: String,
        bound_to: AttributeKind,
    },

    #[error("payload dtype {actual:?} does not match variable dtype {expected:?}")]
    PayloadDTypeMismatch { expected: DType, actual: DType },

    #[error("payload shape {actual:?} does not match variable shape {expected:?}")]
    PayloadShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

impl DynamicsError {
    /// Whether this is an invalid size/delay/time-step combination
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DynamicsError::EmptySize
                | DynamicsError::ZeroExtent { .. }
                | DynamicsError::HeterogeneousDimensions { .. }
                | DynamicsError::DelayShapeMismatch { .. }
                | DynamicsError::InvalidDelayTime { .. }
                | DynamicsError::BufferTooLarge { .. }
                | DynamicsError::InvalidTimeStep { .. }
                | DynamicsError::InvalidDuration { .. }
        )
    }

    pub fn is_name_collision(&self) -> bool {
        matches!(self, DynamicsError::NameCollision { .. })
    }
}

/// Result type for neurodyn-dynamics operations
pub type Result<T> = std::result::Result<T, DynamicsError>;
