// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Constant Delay Line
//!
//! Circular buffer that time-shifts a signal by a fixed number of steps.
//!
//! ```text
//! buffer: (capacity,) + size
//!
//! push(x)    buffer[in_idx]  = x          (uniform)
//!            buffer[in_idx, c] = x[c]     (heterogeneous, per channel c)
//! pull()     buffer[out_idx]              (uniform)
//!            buffer[out_idx[c], c]        (heterogeneous)
//! advance()  in_idx  = (in_idx  + 1) % num_step
//!            out_idx = (out_idx + 1) % num_step
//! ```
//!
//! Uniform mode uses one scalar cursor pair for the whole slice, with
//! `num_step = ceil(delay / dt) + 1`. Heterogeneous mode keeps one cursor pair
//! per channel, with `num_step[c] = round_half_up(delay[c] / dt) + 1`. Every
//! channel wraps modulo its own `num_step`; the shared buffer is only sized to
//! hold the largest one.
//!
//! Quotients within a relative `1e-9` of an integer count as that integer, so
//! `0.3 / 0.1` is three steps rather than four.
//!
//! A value pushed before `k` calls to `advance` is visible to `pull` exactly
//! when `k` equals the channel's delay in steps.

use core::fmt;

use ndarray::{arr0, Array1, ArrayBase, ArrayD, Axis, Data, Dimension, IxDyn, Zip};
use tracing::debug;

use crate::error::{DynamicsError, Result};
use crate::state::{AnyVariable, Variable};
use crate::system::{unique_name, DynamicalSystem};

/// Delay length specification
pub enum DelayTime {
    /// One delay time shared by every element
    Uniform(f64),
    /// One delay time per channel (1-D sizes only)
    PerChannel(Array1<f64>),
    /// Sampled once per channel at construction (1-D sizes only)
    Sampled(Box<dyn FnMut() -> f64 + Send>),
}

impl DelayTime {
    pub fn sampled<F>(sample: F) -> Self
    where
        F: FnMut() -> f64 + Send + 'static,
    {
        DelayTime::Sampled(Box::new(sample))
    }
}

impl fmt::Debug for DelayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayTime::Uniform(value) => f.debug_tuple("Uniform").field(value).finish(),
            DelayTime::PerChannel(values) => f.debug_tuple("PerChannel").field(values).finish(),
            DelayTime::Sampled(_) => f.write_str("Sampled(..)"),
        }
    }
}

impl From<f64> for DelayTime {
    fn from(value: f64) -> Self {
        DelayTime::Uniform(value)
    }
}

impl From<Array1<f64>> for DelayTime {
    fn from(values: Array1<f64>) -> Self {
        DelayTime::PerChannel(values)
    }
}

impl From<Vec<f64>> for DelayTime {
    fn from(values: Vec<f64>) -> Self {
        DelayTime::PerChannel(Array1::from_vec(values))
    }
}

impl From<&[f64]> for DelayTime {
    fn from(values: &[f64]) -> Self {
        DelayTime::PerChannel(Array1::from_vec(values.to_vec()))
    }
}

#[derive(Debug, Clone)]
enum DelayMode {
    Uniform,
    /// `diag[c] == c`, paired with per-channel cursors for simultaneous indexing
    Heterogeneous { diag: ArrayD<usize> },
}

/// Fixed-length delay line over a circular buffer
#[derive(Debug)]
pub struct ConstantDelay {
    name: String,
    size: Vec<usize>,
    dt: f64,
    mode: DelayMode,
    /// 0-d for uniform mode, `[channels]` for heterogeneous mode
    num_step: ArrayD<usize>,
    data: Variable<f64>,
    in_idx: Variable<usize>,
    out_idx: Variable<usize>,
}

impl ConstantDelay {
    /// Create a delay line with an auto-generated name.
    ///
    /// # Arguments
    ///
    /// * `size` - Shape of one time slice
    /// * `delay` - Delay time, in the same unit as `dt`
    /// * `dt` - Simulation step size
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `dt` is not positive, `size` is empty
    /// or has a zero extent, a delay time is negative or not finite, or a
    /// per-channel delay is combined with a multi-dimensional or
    /// mismatching `size`.
    pub fn new(size: &[usize], delay: impl Into<DelayTime>, dt: f64) -> Result<Self> {
        Self::with_name(unique_name("ConstantDelay"), size, delay, dt)
    }

    pub fn with_name(
        name: impl Into<String>,
        size: &[usize],
        delay: impl Into<DelayTime>,
        dt: f64,
    ) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(DynamicsError::InvalidTimeStep { dt });
        }
        if size.is_empty() {
            return Err(DynamicsError::EmptySize);
        }
        if size.contains(&0) {
            return Err(DynamicsError::ZeroExtent {
                size: size.to_vec(),
            });
        }

        let (mode, num_step) = match delay.into() {
            DelayTime::Uniform(value) => {
                let steps = quantize_delay(value, dt, f64::ceil)?;
                (DelayMode::Uniform, arr0(steps + 1).into_dyn())
            }
            DelayTime::PerChannel(values) => {
                let channels = heterogeneous_channels(size)?;
                if values.len() != channels {
                    return Err(DynamicsError::DelayShapeMismatch {
                        delay: values.shape().to_vec(),
                        size: size.to_vec(),
                    });
                }
                heterogeneous_steps(&values, dt)?
            }
            DelayTime::Sampled(mut sample) => {
                let channels = heterogeneous_channels(size)?;
                let values = Array1::from_shape_fn(channels, |_| sample());
                heterogeneous_steps(&values, dt)?
            }
        };

        let capacity = num_step.iter().copied().max().unwrap_or(1);
        check_buffer_len(capacity, size)?;
        let mut buffer_shape = Vec::with_capacity(size.len() + 1);
        buffer_shape.push(capacity);
        buffer_shape.extend_from_slice(size);

        let name = name.into();
        debug!(
            target: "neurodyn-dynamics",
            "Created delay {}: size={:?}, capacity={}, uniform={}",
            name,
            size,
            capacity,
            matches!(mode, DelayMode::Uniform)
        );

        Ok(Self {
            name,
            size: size.to_vec(),
            dt,
            mode,
            in_idx: Variable::new(num_step.mapv(|n| n - 1)),
            out_idx: Variable::new(ArrayD::zeros(num_step.raw_dim())),
            data: Variable::zeros(&buffer_shape),
            num_step,
        })
    }

    /// Read the current delayed slice.
    ///
    /// Uniform: `buffer[out_idx]`. Heterogeneous: `buffer[out_idx[c], c]`.
    pub fn pull(&self) -> ArrayD<f64> {
        let data = self.data.read();
        let out_idx = self.out_idx.read();
        match &self.mode {
            DelayMode::Uniform => data.index_axis(Axis(0), scalar(&out_idx)).to_owned(),
            DelayMode::Heterogeneous { diag } => Zip::from(&*out_idx)
                .and(diag)
                .map_collect(|&row, &channel| data[[row, channel]]),
        }
    }

    /// Read one element (heterogeneous) or one sub-slice (uniform) of the
    /// current delayed slice.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds for the first axis of `size`.
    pub fn pull_at(&self, index: usize) -> ArrayD<f64> {
        let data = self.data.read();
        let out_idx = self.out_idx.read();
        match &self.mode {
            DelayMode::Uniform => data
                .index_axis(Axis(0), scalar(&out_idx))
                .index_axis(Axis(0), index)
                .to_owned(),
            DelayMode::Heterogeneous { .. } => arr0(data[[out_idx[[index]], index]]).into_dyn(),
        }
    }

    /// Write `value` into the current write row(s).
    ///
    /// `value` is broadcast to `size` (a 0-d array writes the same value to
    /// every element).
    ///
    /// # Panics
    ///
    /// Panics if `value` cannot be broadcast to `size`.
    pub fn push<S, D>(&mut self, value: &ArrayBase<S, D>)
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let value = value.view().into_dyn();
        let mut data = self.data.write();
        let in_idx = self.in_idx.read();
        match &self.mode {
            DelayMode::Uniform => data.index_axis_mut(Axis(0), scalar(&in_idx)).assign(&value),
            DelayMode::Heterogeneous { diag } => Zip::from(&*in_idx)
                .and(diag)
                .and_broadcast(&value)
                .for_each(|&row, &channel, &v| data[[row, channel]] = v),
        }
    }

    /// Write one element (heterogeneous) or fill one sub-slice (uniform) of
    /// the current write row.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds for the first axis of `size`.
    pub fn push_at(&mut self, index: usize, value: f64) {
        let mut data = self.data.write();
        let in_idx = self.in_idx.read();
        match &self.mode {
            DelayMode::Uniform => data
                .index_axis_mut(Axis(0), scalar(&in_idx))
                .index_axis_mut(Axis(0), index)
                .fill(value),
            DelayMode::Heterogeneous { .. } => data[[in_idx[[index]], index]] = value,
        }
    }

    /// Move both cursors forward by one step, each modulo its own `num_step`
    pub fn advance(&mut self) {
        for cursor in [&self.in_idx, &self.out_idx] {
            let mut cursor = cursor.write();
            Zip::from(&mut *cursor)
                .and(&self.num_step)
                .for_each(|idx, &period| *idx = (*idx + 1) % period);
        }
    }

    /// Zero the buffer and restore both cursors to their initial offsets
    pub fn clear(&mut self) {
        self.data.clear();
        self.in_idx
            .write()
            .zip_mut_with(&self.num_step, |idx, &period| *idx = period - 1);
        self.out_idx.clear();
    }

    pub fn size(&self) -> &[usize] {
        &self.size
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn is_uniform(&self) -> bool {
        matches!(self.mode, DelayMode::Uniform)
    }

    /// Cycle length per channel (0-d array in uniform mode)
    pub fn num_step(&self) -> &ArrayD<usize> {
        &self.num_step
    }

    /// Delay length in steps per channel (`num_step - 1`)
    pub fn delay_steps(&self) -> ArrayD<usize> {
        self.num_step.mapv(|n| n - 1)
    }

    /// Number of time slices held by the buffer
    pub fn capacity(&self) -> usize {
        self.data.read().len_of(Axis(0))
    }

    /// Handle to the buffer state cell
    pub fn data(&self) -> &Variable<f64> {
        &self.data
    }

    pub fn in_idx(&self) -> ArrayD<usize> {
        self.in_idx.value()
    }

    pub fn out_idx(&self) -> ArrayD<usize> {
        self.out_idx.value()
    }
}

impl DynamicalSystem for ConstantDelay {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, _t: f64, _dt: f64) {
        self.advance();
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn variables(&self) -> Vec<(String, AnyVariable)> {
        vec![
            ("delay_data".to_string(), self.data.clone().into()),
            ("delay_in_idx".to_string(), self.in_idx.clone().into()),
            ("delay_out_idx".to_string(), self.out_idx.clone().into()),
        ]
    }
}

/// Value of a 0-d cursor
fn scalar(cursor: &ArrayD<usize>) -> usize {
    cursor.first().copied().unwrap_or_default()
}

/// Relative distance from an integer treated as division noise
const STEP_TOLERANCE: f64 = 1e-9;

/// Snap `x` to the nearest integer when it only misses it by rounding noise
fn snap(x: f64) -> f64 {
    let nearest = x.round();
    if (x - nearest).abs() <= STEP_TOLERANCE * nearest.abs().max(1.0) {
        nearest
    } else {
        x
    }
}

/// Delay in whole steps, `to_int` applied to the snapped quotient
fn quantize_delay(value: f64, dt: f64, to_int: fn(f64) -> f64) -> Result<usize> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(DynamicsError::InvalidDelayTime { value });
    }
    let steps = to_int(snap(value / dt));
    // One more slot than the delay must still be addressable
    if steps >= isize::MAX as f64 {
        return Err(DynamicsError::InvalidDelayTime { value });
    }
    Ok(steps as usize)
}

/// `capacity` slices of `size` must fit in one ndarray allocation
fn check_buffer_len(capacity: usize, size: &[usize]) -> Result<()> {
    let limit = isize::MAX as usize / std::mem::size_of::<f64>();
    let len = size
        .iter()
        .try_fold(capacity, |len, &extent| len.checked_mul(extent))
        .filter(|&len| len <= limit);
    match len {
        Some(_) => Ok(()),
        None => Err(DynamicsError::BufferTooLarge {
            capacity,
            size: size.to_vec(),
        }),
    }
}

fn heterogeneous_channels(size: &[usize]) -> Result<usize> {
    match size {
        [channels] => Ok(*channels),
        _ => Err(DynamicsError::HeterogeneousDimensions { ndim: size.len() }),
    }
}

/// Per-channel `num_step` (delay rounded to nearest step, `.5` up, plus one)
fn heterogeneous_steps(values: &Array1<f64>, dt: f64) -> Result<(DelayMode, ArrayD<usize>)> {
    let mut num_step: ArrayD<usize> = ArrayD::zeros(IxDyn(&[values.len()]));
    for (slot, &value) in num_step.iter_mut().zip(values.iter()) {
        *slot = quantize_delay(value, dt, |scaled| snap(scaled + 0.5).floor())? + 1;
    }
    let diag: ArrayD<usize> = ArrayD::from_shape_fn(IxDyn(&[values.len()]), |idx| idx[0]);
    Ok((DelayMode::Heterogeneous { diag }, num_step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn at0(a: &ArrayD<usize>) -> usize {
        scalar(a)
    }

    #[test]
    fn test_uniform_construction() {
        let delay = ConstantDelay::new(&[1], 3.0, 1.0).unwrap();
        assert!(delay.is_uniform());
        assert_eq!(at0(delay.num_step()), 4);
        assert_eq!(delay.capacity(), 4);
        assert_eq!(at0(&delay.in_idx()), 3);
        assert_eq!(at0(&delay.out_idx()), 0);
        assert_eq!(delay.data().shape(), vec![4, 1]);
    }

    #[test]
    fn test_uniform_rounds_up() {
        let delay = ConstantDelay::new(&[2], 0.25, 0.1).unwrap();
        assert_eq!(at0(delay.num_step()), 4);
    }

    #[test]
    fn test_inexact_step_multiples_snap_to_whole_steps() {
        for (delay, dt, steps) in [(3.0 * 0.1, 0.1, 3), (4.0 * 0.1, 0.1, 4), (3.0 * 0.2, 0.2, 3)] {
            let uniform = ConstantDelay::new(&[1], delay, dt).unwrap();
            assert_eq!(at0(uniform.num_step()), steps + 1, "uniform {delay} / {dt}");

            let per_channel = ConstantDelay::new(&[1], vec![delay], dt).unwrap();
            assert_eq!(per_channel.delay_steps(), arr1(&[steps]).into_dyn());
        }
        // 0.25 / 0.1 sits just below 2.5 and still rounds half up
        let per_channel = ConstantDelay::new(&[1], vec![0.25], 0.1).unwrap();
        assert_eq!(per_channel.delay_steps(), arr1(&[3]).into_dyn());
    }

    #[test]
    fn test_unrepresentable_delay_is_rejected() {
        let err = ConstantDelay::new(&[1], 1e300, 1.0).unwrap_err();
        assert_eq!(err, DynamicsError::InvalidDelayTime { value: 1e300 });
        assert!(err.is_configuration());

        assert!(ConstantDelay::new(&[2], vec![1.0, 1e300], 1.0).is_err());

        let err = ConstantDelay::new(&[usize::MAX / 2], 3.0, 1.0).unwrap_err();
        assert!(matches!(err, DynamicsError::BufferTooLarge { capacity: 4, .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_concrete_scenario() {
        let mut delay = ConstantDelay::new(&[1], 3.0, 1.0).unwrap();
        delay.push(&arr1(&[5.0]));
        for _ in 0..3 {
            delay.advance();
        }
        assert_eq!(delay.pull(), arr1(&[5.0]).into_dyn());

        delay.advance();
        assert_eq!(delay.pull(), arr1(&[0.0]).into_dyn());
    }

    #[test]
    fn test_zero_delay_has_one_slot() {
        let mut delay = ConstantDelay::new(&[2], 0.0, 0.1).unwrap();
        assert_eq!(delay.capacity(), 1);

        delay.push(&arr1(&[1.0, 2.0]));
        assert_eq!(delay.pull(), arr1(&[1.0, 2.0]).into_dyn());

        delay.advance();
        assert_eq!(delay.pull(), arr1(&[1.0, 2.0]).into_dyn());
    }

    #[test]
    fn test_uniform_multidimensional_slice() {
        let mut delay = ConstantDelay::new(&[2, 2], 1.0, 1.0).unwrap();
        delay.push(&arr2(&[[1.0, 2.0], [3.0, 4.0]]));
        delay.advance();
        assert_eq!(delay.pull(), arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn());
        assert_eq!(delay.pull_at(1), arr1(&[3.0, 4.0]).into_dyn());
    }

    #[test]
    fn test_uniform_scalar_push_broadcasts() {
        let mut delay = ConstantDelay::new(&[3], 1.0, 1.0).unwrap();
        delay.push(&arr0(7.0));
        delay.advance();
        assert_eq!(delay.pull(), arr1(&[7.0, 7.0, 7.0]).into_dyn());
    }

    #[test]
    fn test_heterogeneous_construction() {
        let delay = ConstantDelay::new(&[3], vec![1.0, 2.5, 0.4], 1.0).unwrap();
        assert!(!delay.is_uniform());
        // 1.0 -> 1, 2.5 -> 3 (half rounds up), 0.4 -> 0
        assert_eq!(delay.delay_steps(), arr1(&[1, 3, 0]).into_dyn());
        assert_eq!(delay.capacity(), 4);
        assert_eq!(delay.in_idx(), arr1(&[1, 3, 0]).into_dyn());
        assert_eq!(delay.out_idx(), arr1(&[0, 0, 0]).into_dyn());
    }

    #[test]
    fn test_heterogeneous_channels_wrap_independently() {
        let mut delay = ConstantDelay::new(&[2], vec![1.0, 3.0], 1.0).unwrap();
        delay.push(&arr1(&[10.0, 20.0]));

        delay.advance();
        assert_eq!(delay.pull(), arr1(&[10.0, 0.0]).into_dyn());

        delay.advance();
        delay.advance();
        assert_eq!(delay.pull_at(1), arr0(20.0).into_dyn());

        // channel 0 has period 2 inside a 4-row buffer
        assert_eq!(delay.in_idx()[[0]], 0);
        assert_eq!(delay.in_idx()[[1]], 2);
    }

    #[test]
    fn test_heterogeneous_push_at() {
        let mut delay = ConstantDelay::new(&[2], vec![2.0, 2.0], 1.0).unwrap();
        delay.push_at(1, 9.0);
        delay.advance();
        delay.advance();
        assert_eq!(delay.pull(), arr1(&[0.0, 9.0]).into_dyn());
    }

    #[test]
    fn test_sampled_delay_is_materialized_once_per_channel() {
        let mut next = 0.0;
        let delay = ConstantDelay::new(
            &[4],
            DelayTime::sampled(move || {
                next += 1.0;
                next
            }),
            1.0,
        )
        .unwrap();
        assert_eq!(delay.delay_steps(), arr1(&[1, 2, 3, 4]).into_dyn());
    }

    #[test]
    fn test_heterogeneous_requires_one_dimension() {
        let err = ConstantDelay::new(&[2, 2], vec![1.0, 2.0], 1.0).unwrap_err();
        assert_eq!(err, DynamicsError::HeterogeneousDimensions { ndim: 2 });
        assert!(err.is_configuration());

        let err = ConstantDelay::new(&[2, 2], DelayTime::sampled(|| 1.0), 1.0).unwrap_err();
        assert_eq!(err, DynamicsError::HeterogeneousDimensions { ndim: 2 });
    }

    #[test]
    fn test_heterogeneous_shape_mismatch() {
        let err = ConstantDelay::new(&[3], vec![1.0, 2.0], 1.0).unwrap_err();
        assert_eq!(
            err,
            DynamicsError::DelayShapeMismatch {
                delay: vec![2],
                size: vec![3],
            }
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            ConstantDelay::new(&[1], -1.0, 1.0).unwrap_err(),
            DynamicsError::InvalidDelayTime { value: -1.0 }
        );
        assert_eq!(
            ConstantDelay::new(&[1], 1.0, 0.0).unwrap_err(),
            DynamicsError::InvalidTimeStep { dt: 0.0 }
        );
        assert_eq!(
            ConstantDelay::new(&[], 1.0, 1.0).unwrap_err(),
            DynamicsError::EmptySize
        );
        assert!(ConstantDelay::new(&[2, 0], 1.0, 1.0).is_err());
        assert!(ConstantDelay::new(&[2], vec![1.0, f64::NAN], 1.0).is_err());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut delay = ConstantDelay::new(&[2], vec![1.0, 2.0], 1.0).unwrap();
        let initial_in = delay.in_idx();
        delay.push(&arr1(&[1.0, 1.0]));
        delay.advance();

        delay.reset();
        assert_eq!(delay.in_idx(), initial_in);
        assert_eq!(delay.out_idx(), arr1(&[0, 0]).into_dyn());
        assert!(delay.data().read().iter().all(|&v| v == 0.0));

        delay.reset();
        assert_eq!(delay.in_idx(), initial_in);
    }

    #[test]
    fn test_update_through_trait_advances_cursors() {
        let mut delay = ConstantDelay::new(&[1], 2.0, 0.5).unwrap();
        DynamicalSystem::update(&mut delay, 0.0, 0.5);
        assert_eq!(at0(&delay.in_idx()), 0);
        assert_eq!(at0(&delay.out_idx()), 1);
    }

    #[test]
    fn test_variables_are_stable_handles() {
        let delay = ConstantDelay::new(&[1], 1.0, 1.0).unwrap();
        let first: Vec<_> = delay.variables().into_iter().map(|(k, v)| (k, v.id())).collect();
        let second: Vec<_> = delay.variables().into_iter().map(|(k, v)| (k, v.id())).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].0, "delay_data");
    }
}
