//! The three per-cycle stages. Each walks its cycles in date order, gates
//! every cycle on artifact freshness and settles it into a report entry.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;

use sealevel_core::events::types::{
    BackupCreatedEvent, MasterWrittenEvent, StageCompleteEvent, StageStartedEvent,
};
use sealevel_core::errors::PipelineError;
use sealevel_core::types::cycle::cycle_schedule;
use sealevel_core::types::{RepeatCycle, Stage};
use sealevel_storage::layout::artifact_date;
use sealevel_storage::master::{concat_masters, MasterProduct};
use sealevel_storage::needs_recompute;

use crate::assembler::{CycleAssembler, GranuleCatalog};
use crate::fine_grid::make_fine_grid;
use crate::indicators::IndicatorEngine;
use crate::resampler::{GaussianResampler, GriddedCycle, ResampleParams};

use super::context::PipelineContext;
use super::report::{CycleOutcome, MergeSummary, StageReport};

/// Granules → gridded cycles, for every cycle up to the anchor source's
/// latest granule.
pub fn run_gridding(ctx: &PipelineContext) -> Result<StageReport, PipelineError> {
    let start = Instant::now();
    let mut report = StageReport::new(Stage::Gridding);
    let sources = &ctx.config.sources;

    let catalog = GranuleCatalog::discover(
        &ctx.data_dir,
        &ctx.config.storage.effective_granule_extension(),
        sources.effective_reference_mission(),
    )?;
    let Some(last) = catalog.last_date(sources.effective_anchor_source()) else {
        tracing::warn!(
            anchor = sources.effective_anchor_source(),
            granules = catalog.len(),
            "anchor source has no granules, nothing to grid"
        );
        return Ok(finish(ctx, report, start));
    };
    let cycles = cycle_schedule(last);
    started(ctx, Stage::Gridding, cycles.len());

    let assembler = CycleAssembler::new(
        &catalog,
        &ctx.refs.validity,
        &ctx.refs.corrections,
        ctx.codec.as_ref(),
        sources.effective_corrected_source(),
    );
    let resampler = GaussianResampler::new(ResampleParams::from_config(&ctx.config.gridding));
    for cycle in &cycles {
        let result = grid_cycle(ctx, &assembler, &resampler, cycle);
        ctx.settle(&mut report, cycle.center, result);
    }
    Ok(finish(ctx, report, start))
}

fn grid_cycle(
    ctx: &PipelineContext,
    assembler: &CycleAssembler<'_>,
    resampler: &GaussianResampler,
    cycle: &RepeatCycle,
) -> Result<CycleOutcome, PipelineError> {
    let granules = assembler.collect_granules(cycle)?;
    let output = ctx.layout.gridded_cycle(cycle.center);
    if !needs_recompute(&output, granules.iter().map(|g| &g.path)) {
        return Ok(CycleOutcome::UpToDate);
    }

    let merged = assembler.merge(&granules)?;
    tracing::debug!(
        cycle = %cycle.center,
        granules = granules.len(),
        points = merged.len(),
        "merged cycle"
    );
    let gridded = resampler.resample(cycle.center, &merged, &ctx.refs.grid)?;
    ctx.codec.write(&gridded.to_dataset(ctx.level())?, &output)?;
    tracing::info!(
        cycle = %cycle.center,
        filled_cells = gridded.filled_cells(),
        path = %output.display(),
        "wrote gridded cycle"
    );
    Ok(CycleOutcome::Produced { path: output })
}

/// Gridded cycles on disk, oldest first.
fn gridded_cycles(ctx: &PipelineContext) -> Result<Vec<(NaiveDate, PathBuf)>, PipelineError> {
    let mut cycles: Vec<_> = ctx
        .layout
        .list(&ctx.layout.gridded_dir())?
        .into_iter()
        .filter_map(|path| artifact_date(&path).map(|date| (date, path)))
        .collect();
    cycles.sort();
    Ok(cycles)
}

/// Gridded cycles → per-cycle indicator, global and pattern-anomaly
/// records, then the master series.
pub fn run_indicators(ctx: &PipelineContext) -> Result<StageReport, PipelineError> {
    let start = Instant::now();
    let mut report = StageReport::new(Stage::Indicators);
    let cycles = gridded_cycles(ctx)?;
    started(ctx, Stage::Indicators, cycles.len());

    let engine = IndicatorEngine::new(&ctx.refs);
    for (center, path) in &cycles {
        let result = indicator_cycle(ctx, &engine, *center, path, &mut report.degenerate_fits);
        ctx.settle(&mut report, *center, result);
    }

    if ctx.layout.list(&ctx.layout.cycle_indicators_dir())?.is_empty() {
        tracing::info!("no per-cycle indicator records, skipping master concatenation");
    } else {
        report.merge = Some(merge_masters(ctx));
    }
    Ok(finish(ctx, report, start))
}

fn indicator_cycle(
    ctx: &PipelineContext,
    engine: &IndicatorEngine<'_>,
    center: NaiveDate,
    gridded_path: &Path,
    degenerate_fits: &mut usize,
) -> Result<CycleOutcome, PipelineError> {
    let layout = &ctx.layout;
    let indicator_path = layout.cycle_indicator(center);
    let globals_path = layout.cycle_globals(center);
    let mut outputs = vec![indicator_path.clone(), globals_path.clone()];
    outputs.extend(
        ctx.refs
            .patterns
            .iter()
            .map(|p| layout.cycle_pattern_anoms(&p.name, center)),
    );
    if !outputs.iter().any(|o| needs_recompute(o, [gridded_path])) {
        return Ok(CycleOutcome::UpToDate);
    }

    let gridded = GriddedCycle::from_dataset(&ctx.codec.read(gridded_path)?)?;
    let result = engine.compute(&gridded)?;
    *degenerate_fits += result.error_count();
    let record = &result.data;
    let level = ctx.level();

    // Written one at a time so a cycle never holds more than its own fields.
    ctx.codec.write(&record.globals_dataset(level)?, &globals_path)?;
    for p in &record.patterns {
        ctx.codec.write(
            &record.pattern_dataset(p, level)?,
            &layout.cycle_pattern_anoms(&p.name, center),
        )?;
    }
    ctx.codec.write(&record.indicator_dataset(level)?, &indicator_path)?;
    tracing::info!(
        cycle = %center,
        spatial_mean = record.spatial_mean,
        degenerate_fits = result.error_count(),
        "wrote indicator records"
    );
    Ok(CycleOutcome::Produced {
        path: indicator_path,
    })
}

fn merge_masters(ctx: &PipelineContext) -> MergeSummary {
    let names: Vec<&str> = ctx.refs.patterns.iter().map(|p| p.name.as_str()).collect();
    let products = MasterProduct::all(&ctx.layout, &names);
    let concat = concat_masters(
        ctx.codec.as_ref(),
        &ctx.layout,
        &products,
        ctx.config.backup.effective_enabled(),
    );
    for master in concat.masters.iter() {
        if let Some(backup) = &master.backup {
            ctx.events.emit_backup_created(&BackupCreatedEvent {
                source: master.path.clone(),
                backup: backup.clone(),
            });
        }
        if master.written {
            ctx.events.emit_master_written(&MasterWrittenEvent {
                product: master.product.clone(),
                path: master.path.clone(),
                records: master.records,
            });
        }
    }
    MergeSummary {
        success: concat.success,
        masters: concat.masters,
        failure: concat.failure.map(|e| e.to_string()),
    }
}

/// Gridded cycles → smoothed fine-grid products.
pub fn run_fine_grid(ctx: &PipelineContext) -> Result<StageReport, PipelineError> {
    let start = Instant::now();
    let mut report = StageReport::new(Stage::FineGrid);
    let cycles = gridded_cycles(ctx)?;
    started(ctx, Stage::FineGrid, cycles.len());

    for (center, path) in &cycles {
        let result = fine_grid_cycle(ctx, *center, path);
        ctx.settle(&mut report, *center, result);
    }
    Ok(finish(ctx, report, start))
}

fn fine_grid_cycle(
    ctx: &PipelineContext,
    center: NaiveDate,
    gridded_path: &Path,
) -> Result<CycleOutcome, PipelineError> {
    let output = ctx.layout.fine_grid(center);
    if !needs_recompute(&output, [gridded_path]) {
        return Ok(CycleOutcome::UpToDate);
    }
    let gridded = GriddedCycle::from_dataset(&ctx.codec.read(gridded_path)?)?;
    let fine = make_fine_grid(
        &gridded,
        &ctx.refs.climatology,
        &ctx.refs.fine_mask,
        &ctx.fine_grid,
    )?;
    ctx.codec.write(&fine.to_dataset(ctx.level())?, &output)?;
    tracing::info!(cycle = %center, path = %output.display(), "wrote fine grid");
    Ok(CycleOutcome::Produced { path: output })
}

fn started(ctx: &PipelineContext, stage: Stage, cycles: usize) {
    tracing::info!(stage = %stage, cycles, "stage started");
    ctx.events
        .emit_stage_started(&StageStartedEvent { stage, cycles });
}

fn finish(ctx: &PipelineContext, mut report: StageReport, start: Instant) -> StageReport {
    report.duration = start.elapsed();
    tracing::info!(
        stage = %report.stage,
        produced = report.produced(),
        up_to_date = report.up_to_date(),
        failed = report.failed(),
        duration_ms = report.duration.as_millis() as u64,
        "stage complete"
    );
    ctx.events.emit_stage_complete(&StageCompleteEvent {
        stage: report.stage,
        produced: report.produced(),
        up_to_date: report.up_to_date(),
        failed: report.failed(),
        duration_ms: report.duration.as_millis() as u64,
    });
    report
}
