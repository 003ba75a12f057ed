// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! State cells
//!
//! A [`Variable`] is a shared handle to a mutable tensor. Cloning the handle
//! never copies the payload: every clone observes and mutates the same cell
//! and reports the same [`VarId`]. Collectors deduplicate by that id.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ndarray::{ArrayD, IxDyn};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{DynamicsError, Result};

static NEXT_VAR_ID: AtomicU64 = AtomicU64::new(0);

/// Variable ID (unique for the lifetime of the process)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u64);

impl VarId {
    fn next() -> Self {
        VarId(NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var({})", self.0)
    }
}

/// Semantic role of a state cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VarRole {
    /// Dynamical state mutated every step
    #[default]
    State,
    /// Trainable or fixed parameter
    Parameter,
}

/// Element type tag of a state cell payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F64,
    Index,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F64 => write!(f, "f64"),
            DType::Index => write!(f, "index"),
        }
    }
}

/// Element types a [`Variable`] can hold
pub trait Element: Clone + Default + Send + Sync + fmt::Debug + 'static {
    const DTYPE: DType;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
}

impl Element for usize {
    const DTYPE: DType = DType::Index;
}

struct Cell<T> {
    id: VarId,
    role: VarRole,
    value: RwLock<ArrayD<T>>,
}

/// Shared, identity-tracked mutable tensor
pub struct Variable<T: Element = f64> {
    inner: Arc<Cell<T>>,
}

impl<T: Element> Clone for Variable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Element> Variable<T> {
    /// Create a state variable holding `value`
    pub fn new(value: ArrayD<T>) -> Self {
        Self::with_role(value, VarRole::State)
    }

    /// Create a parameter variable holding `value`
    pub fn parameter(value: ArrayD<T>) -> Self {
        Self::with_role(value, VarRole::Parameter)
    }

    pub fn with_role(value: ArrayD<T>, role: VarRole) -> Self {
        Self {
            inner: Arc::new(Cell {
                id: VarId::next(),
                role,
                value: RwLock::new(value),
            }),
        }
    }

    /// Create a state variable filled with `T::default()` (zero for numbers)
    pub fn zeros(shape: &[usize]) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(shape), T::default()))
    }

    pub fn id(&self) -> VarId {
        self.inner.id
    }

    pub fn role(&self) -> VarRole {
        self.inner.role
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn shape(&self) -> Vec<usize> {
        self.inner.value.read().shape().to_vec()
    }

    /// Borrow the payload for reading
    pub fn read(&self) -> RwLockReadGuard<'_, ArrayD<T>> {
        self.inner.value.read()
    }

    /// Borrow the payload for in-place mutation.
    ///
    /// Writers must keep the payload shape; use [`Variable::set_value`] to
    /// swap the whole payload with a shape check.
    pub fn write(&self) -> RwLockWriteGuard<'_, ArrayD<T>> {
        self.inner.value.write()
    }

    /// Copy of the current payload
    pub fn value(&self) -> ArrayD<T> {
        self.inner.value.read().clone()
    }

    /// Replace the payload, returning the previous one.
    ///
    /// The identity is unchanged. Fails if the new payload has a different shape.
    pub fn set_value(&self, value: ArrayD<T>) -> Result<ArrayD<T>> {
        let mut current = self.inner.value.write();
        if current.shape() != value.shape() {
            return Err(DynamicsError::PayloadShapeMismatch {
                expected: current.shape().to_vec(),
                actual: value.shape().to_vec(),
            });
        }
        Ok(std::mem::replace(&mut *current, value))
    }

    /// Overwrite every element with `T::default()`
    pub fn clear(&self) {
        self.inner.value.write().fill(T::default());
    }

    /// Whether both handles refer to the same cell
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Element> fmt::Debug for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("id", &self.inner.id)
            .field("role", &self.inner.role)
            .field("dtype", &T::DTYPE)
            .field("shape", &self.shape())
            .finish()
    }
}

/// Type-erased state cell, as returned by collection
#[derive(Debug, Clone)]
pub enum AnyVariable {
    F64(Variable<f64>),
    Index(Variable<usize>),
}

impl AnyVariable {
    pub fn id(&self) -> VarId {
        match self {
            AnyVariable::F64(v) => v.id(),
            AnyVariable::Index(v) => v.id(),
        }
    }

    pub fn role(&self) -> VarRole {
        match self {
            AnyVariable::F64(v) => v.role(),
            AnyVariable::Index(v) => v.role(),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            AnyVariable::F64(_) => DType::F64,
            AnyVariable::Index(_) => DType::Index,
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            AnyVariable::F64(v) => v.shape(),
            AnyVariable::Index(v) => v.shape(),
        }
    }

    pub fn as_f64(&self) -> Option<&Variable<f64>> {
        match self {
            AnyVariable::F64(v) => Some(v),
            AnyVariable::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<&Variable<usize>> {
        match self {
            AnyVariable::Index(v) => Some(v),
            AnyVariable::F64(_) => None,
        }
    }
}

/// Owned copy of a type-erased payload
#[derive(Debug, Clone, PartialEq)]
pub enum AnyValue {
    F64(ArrayD<f64>),
    Index(ArrayD<usize>),
}

impl AnyValue {
    pub fn dtype(&self) -> DType {
        match self {
            AnyValue::F64(_) => DType::F64,
            AnyValue::Index(_) => DType::Index,
        }
    }
}

impl AnyVariable {
    /// Copy of the current payload
    pub fn value(&self) -> AnyValue {
        match self {
            AnyVariable::F64(v) => AnyValue::F64(v.value()),
            AnyVariable::Index(v) => AnyValue::Index(v.value()),
        }
    }

    /// Replace the payload, returning the previous one.
    ///
    /// Fails if `value` has a different dtype or shape.
    pub fn set_value(&self, value: AnyValue) -> Result<AnyValue> {
        match (self, value) {
            (AnyVariable::F64(v), AnyValue::F64(value)) => v.set_value(value).map(AnyValue::F64),
            (AnyVariable::Index(v), AnyValue::Index(value)) => {
                v.set_value(value).map(AnyValue::Index)
            }
            (var, value) => Err(DynamicsError::PayloadDTypeMismatch {
                expected: var.dtype(),
                actual: value.dtype(),
            }),
        }
    }
}

impl From<Variable<f64>> for AnyVariable {
    fn from(var: Variable<f64>) -> Self {
        AnyVariable::F64(var)
    }
}

impl From<Variable<usize>> for AnyVariable {
    fn from(var: Variable<usize>) -> Self {
        AnyVariable::Index(var)
    }
}
