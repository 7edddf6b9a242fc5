//! GrowCut segmentation engine.
//!
//! [`GrowCutEngine`] validates the input volumes, keeps a
//! [`GrowCutContext`] alive between runs on the same geometry, and picks
//! between a full propagation and an incremental one that only revisits the
//! voxels new seeds can claim.
//!
//! Each voxel ends up with the label of the seed reachable at the lowest
//! accumulated cost, where a step from `v` to neighbor `n` costs
//! `|I[v] - I[n]|` plus `distance_penalty` times the physical step length.

mod context;

use common::Buffer3;
use log::{debug, error, info};
use strum_macros::Display;

pub use context::{GrowCutContext, PaddedInputs};

use crate::config::GrowCutConfig;
use crate::error::{GrowCutError, GrowCutResult, VolumeRole};
use crate::fields::{try_filled, PaddedGrid};
use crate::scalar::{IntensityScalar, LabelScalar, ScalarType};
use crate::volume::{ImageGeometry, ScalarBuffer, Volume};

/// Kind of propagation a completed run performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RunKind {
    Full,
    Incremental,
}

/// Requested propagation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum RunMode {
    /// Incremental when the previous run allows it, full otherwise.
    #[default]
    Auto,
    Full,
    /// Fails with [`GrowCutError::NoPreviousState`] instead of falling back.
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Uninitialized,
    Converged(RunKind),
}

/// Work done by one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub kind: RunKind,
    /// Seeds inserted into the heap; unchanged seeds of an incremental run
    /// are not counted.
    pub seeds: usize,
    /// Voxels extracted from the heap.
    pub popped: usize,
    /// Successful neighbor relaxations.
    pub relaxed: usize,
    /// Voxels that fell back to the previous run's label and distance.
    pub restored: usize,
    /// The heap was abandoned once only unreachable voxels remained.
    pub terminated_early: bool,
}

impl RunSummary {
    pub(crate) fn new(kind: RunKind) -> Self {
        Self {
            kind,
            seeds: 0,
            popped: 0,
            relaxed: 0,
            restored: 0,
            terminated_early: false,
        }
    }
}

/// Volumes of one run. Seed and mask volumes must match the intensity
/// geometry.
#[derive(Debug, Clone, Copy)]
pub struct GrowCutInput<'a> {
    pub intensity: &'a Volume,
    /// Integer labels; zero means unseeded.
    pub seeds: &'a Volume,
    /// `u8`; nonzero voxels are excluded and end up unlabeled.
    pub mask: Option<&'a Volume>,
}

impl<'a> GrowCutInput<'a> {
    pub fn new(intensity: &'a Volume, seeds: &'a Volume) -> Self {
        Self {
            intensity,
            seeds,
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: &'a Volume) -> Self {
        self.mask = Some(mask);
        self
    }
}

#[derive(Debug, Clone)]
pub struct GrowCutOutput {
    /// Labels in the seed volume's scalar type, on the intensity geometry.
    pub labels: Volume,
    pub summary: RunSummary,
}

macro_rules! with_intensity {
    ($scalars:expr, $voxels:ident => $body:expr) => {
        match $scalars {
            ScalarBuffer::U8(b) => {
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::I8(b) => {
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::U16(b) => {
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::I16(b) => {
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::U32(b) => {
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::I32(b) => {
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::U64(b) => {
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::I64(b) => {
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::F32(b) => {
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::F64(b) => {
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::Rgb8(_) => {
                return Err(GrowCutError::UnsupportedScalarType {
                    role: VolumeRole::Intensity,
                    scalar_type: ScalarType::Rgb8,
                })
            }
        }
    };
}

macro_rules! with_labels {
    ($scalars:expr, $label:ident, $voxels:ident => $body:expr) => {
        match $scalars {
            ScalarBuffer::U8(b) => {
                type $label = u8;
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::I8(b) => {
                type $label = i8;
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::U16(b) => {
                type $label = u16;
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::I16(b) => {
                type $label = i16;
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::U32(b) => {
                type $label = u32;
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::I32(b) => {
                type $label = i32;
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::U64(b) => {
                type $label = u64;
                let $voxels = b.voxels();
                $body
            }
            ScalarBuffer::I64(b) => {
                type $label = i64;
                let $voxels = b.voxels();
                $body
            }
            other => {
                return Err(GrowCutError::UnsupportedScalarType {
                    role: VolumeRole::Seed,
                    scalar_type: other.scalar_type(),
                })
            }
        }
    };
}

#[derive(Debug, Default)]
pub struct GrowCutEngine {
    config: GrowCutConfig,
    context: Option<GrowCutContext>,
    state: EngineState,
}

impl GrowCutEngine {
    pub fn new(config: GrowCutConfig) -> GrowCutResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            context: None,
            state: EngineState::Uninitialized,
        })
    }

    #[inline]
    pub fn config(&self) -> &GrowCutConfig {
        &self.config
    }

    /// Replaces the configuration. A changed cost model makes the next run
    /// full.
    pub fn set_config(&mut self, config: GrowCutConfig) -> GrowCutResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Drops the session; the next run is full and reallocates its buffers.
    pub fn reset(&mut self) {
        if let Some(context) = self.context.as_mut() {
            context.reset();
        }
        self.context = None;
        self.state = EngineState::Uninitialized;
    }

    /// Distances of the last completed run on the caller grid.
    pub fn distance_field(&self) -> Option<Buffer3<f32>> {
        let context = self.converged_context()?;
        let distance = context.grid().unpad(context.fields().distance());
        Some(Buffer3::new(context.grid().dims(), distance))
    }

    /// Labels of the last completed run on the caller grid, as kept for the
    /// next incremental run.
    pub fn previous_labels(&self) -> Option<Buffer3<i32>> {
        let context = self.converged_context()?;
        let previous = context.fields().previous()?;
        let labels = context.grid().unpad(previous.label());
        Some(Buffer3::new(context.grid().dims(), labels))
    }

    /// Runs in [`RunMode::Auto`] and returns the label volume.
    pub fn segment(&mut self, input: &GrowCutInput<'_>) -> GrowCutResult<Volume> {
        self.run(input, RunMode::Auto).map(|output| output.labels)
    }

    /// Writes the labels into `output` only if the run succeeds.
    pub fn run_into(
        &mut self,
        input: &GrowCutInput<'_>,
        mode: RunMode,
        output: &mut Volume,
    ) -> GrowCutResult<RunSummary> {
        let result = self.run(input, mode)?;
        *output = result.labels;
        Ok(result.summary)
    }

    /// Validates the inputs and runs one segmentation. Inputs are rejected
    /// before the engine state changes.
    pub fn run(
        &mut self,
        input: &GrowCutInput<'_>,
        mode: RunMode,
    ) -> GrowCutResult<GrowCutOutput> {
        self.try_run(input, mode)
            .inspect_err(|err| error!("GrowCut run failed: {err}"))
    }

    fn try_run(&mut self, input: &GrowCutInput<'_>, mode: RunMode) -> GrowCutResult<GrowCutOutput> {
        let geometry = input.intensity.geometry();
        self.check_geometry(input)?;
        let grid = PaddedGrid::new(geometry.dimensions)?;
        check_scalar_types(input)?;

        let excluded = padded_exclusion(&grid, input.mask)?;
        let (summary, labels) = with_labels!(input.seeds.scalars(), Label, seed_voxels => {
            let seeds = padded_seeds(&grid, seed_voxels)?;
            let summary = with_intensity!(input.intensity.scalars(), voxels => {
                let intensity =
                    grid.pad_with(voxels, Default::default(), "padded intensity", |v| v)?;
                let inputs = PaddedInputs { intensity, seeds, excluded };
                self.execute(geometry, grid, &inputs, mode)?
            });
            (summary, self.label_volume::<Label>(geometry)?)
        });

        debug!(
            "GrowCut {} run: {} seeds, {} popped, {} relaxed, {} restored{}",
            summary.kind,
            summary.seeds,
            summary.popped,
            summary.relaxed,
            summary.restored,
            if summary.terminated_early {
                ", terminated early"
            } else {
                ""
            }
        );

        Ok(GrowCutOutput { labels, summary })
    }

    fn check_geometry(&self, input: &GrowCutInput<'_>) -> GrowCutResult<()> {
        let reference = input.intensity.geometry();
        let tolerance = self.config.geometry_tolerance;

        reference
            .check_matches(input.seeds.geometry(), tolerance)
            .map_err(|mismatch| GrowCutError::GeometryMismatch {
                role: VolumeRole::Seed,
                mismatch,
            })?;
        if let Some(mask) = input.mask {
            reference
                .check_matches(mask.geometry(), tolerance)
                .map_err(|mismatch| GrowCutError::GeometryMismatch {
                    role: VolumeRole::Mask,
                    mismatch,
                })?;
        }
        Ok(())
    }

    fn execute<T: IntensityScalar>(
        &mut self,
        geometry: &ImageGeometry,
        grid: PaddedGrid,
        inputs: &PaddedInputs<T>,
        mode: RunMode,
    ) -> GrowCutResult<RunSummary> {
        let context = self.bind_context(geometry, grid, mode)?;

        let kind = match (mode, context.incremental_blocker(inputs)) {
            (RunMode::Full, _) => RunKind::Full,
            (_, None) => RunKind::Incremental,
            (RunMode::Incremental, Some(reason)) => {
                return Err(GrowCutError::NoPreviousState { reason });
            }
            (RunMode::Auto, Some(reason)) => {
                if context.fields().previous().is_some() {
                    info!("running full GrowCut propagation: {reason}");
                }
                RunKind::Full
            }
        };

        let result = match kind {
            RunKind::Full => context.run_full(inputs),
            RunKind::Incremental => context.run_incremental(inputs),
        };
        match result {
            Ok(summary) => {
                self.state = EngineState::Converged(kind);
                Ok(summary)
            }
            Err(err) => {
                // fields are half-written; nothing from this session is usable
                self.context = None;
                self.state = EngineState::Uninitialized;
                Err(err)
            }
        }
    }

    /// Returns a context for `geometry`, rebuilding it when the geometry or the
    /// cost model changed. An explicit incremental run never rebuilds.
    fn bind_context(
        &mut self,
        geometry: &ImageGeometry,
        grid: PaddedGrid,
        mode: RunMode,
    ) -> GrowCutResult<&mut GrowCutContext> {
        let reason = match &self.context {
            Some(context) => context.rebuild_reason(geometry, &self.config),
            None => Some("no previous run is available"),
        };

        if let Some(reason) = reason {
            if mode == RunMode::Incremental {
                return Err(GrowCutError::NoPreviousState { reason });
            }
            if self.context.is_some() {
                info!("rebuilding GrowCut context: {reason}");
            }
            let context = GrowCutContext::create(geometry.clone(), grid, self.config.clone())?;
            self.state = EngineState::Uninitialized;
            return Ok(self.context.insert(context));
        }

        self.context
            .as_mut()
            .ok_or(GrowCutError::NoPreviousState {
                reason: "no previous run is available",
            })
    }

    fn converged_context(&self) -> Option<&GrowCutContext> {
        match self.state {
            EngineState::Converged(_) => self.context.as_ref(),
            EngineState::Uninitialized => None,
        }
    }

    fn label_volume<S: LabelScalar>(&self, geometry: &ImageGeometry) -> GrowCutResult<Volume> {
        let context = self.context.as_ref().ok_or(GrowCutError::NoPreviousState {
            reason: "no previous run is available",
        })?;
        let voxels = context
            .grid()
            .unpad(context.fields().label())
            .into_iter()
            .map(|label| S::from_label(label).unwrap_or_default())
            .collect();
        Volume::from_voxels(geometry.clone(), voxels)
    }
}

fn check_scalar_types(input: &GrowCutInput<'_>) -> GrowCutResult<()> {
    let intensity = input.intensity.scalar_type();
    if intensity == ScalarType::Rgb8 {
        return Err(GrowCutError::UnsupportedScalarType {
            role: VolumeRole::Intensity,
            scalar_type: intensity,
        });
    }

    let seeds = input.seeds.scalar_type();
    if !seeds.is_integer() {
        return Err(GrowCutError::UnsupportedScalarType {
            role: VolumeRole::Seed,
            scalar_type: seeds,
        });
    }

    if let Some(mask) = input.mask {
        if mask.scalar_type() != ScalarType::U8 {
            return Err(GrowCutError::UnsupportedScalarType {
                role: VolumeRole::Mask,
                scalar_type: mask.scalar_type(),
            });
        }
    }
    Ok(())
}

fn padded_seeds<S: LabelScalar>(grid: &PaddedGrid, voxels: &[S]) -> GrowCutResult<Vec<i32>> {
    let out_of_range = voxels
        .iter()
        .enumerate()
        .find(|(_, value)| value.to_label().is_none());
    if let Some((index, value)) = out_of_range {
        return Err(GrowCutError::LabelOutOfRange {
            index,
            value: value.to_i128().unwrap_or_default(),
        });
    }

    grid.pad_with(voxels, 0, "padded seed labels", |value| {
        value.to_label().unwrap_or_default()
    })
}

fn padded_exclusion(grid: &PaddedGrid, mask: Option<&Volume>) -> GrowCutResult<Vec<bool>> {
    match mask.and_then(|mask| mask.voxels::<u8>()) {
        Some(mask) => grid.pad_with(mask, true, "padded mask", |value| value != 0),
        None => {
            let mut excluded = try_filled(grid.padded_len(), true, "padded mask")?;
            for i in grid.interior_indices() {
                excluded[i] = false;
            }
            Ok(excluded)
        }
    }
}
