//! Cycle assembly and gridding against granules on disk.

mod common;

use sealevel_analysis::assembler::{CycleAssembler, GranuleCatalog};
use sealevel_analysis::reference::{CorrectionTable, OceanGrid, ValidityWindows};
use sealevel_analysis::resampler::{GaussianResampler, ResampleParams};
use sealevel_core::types::RepeatCycle;
use sealevel_storage::ArrayCodec;

use common::{codec, d, write_granule};

const DATASETS: &str = "- ds_name: SNTNL-6A\n  start: 19920101\n  end: Present\n";

fn catalog(root: &std::path::Path) -> GranuleCatalog {
    GranuleCatalog::discover(&root.join("alongtrack-delivery"), codec().extension(), "MERGED_ALT")
        .unwrap()
}

#[test]
fn corrected_source_without_table_entry_is_raw() {
    let dir = tempfile::tempdir().unwrap();
    write_granule(dir.path(), "SNTNL-6A", d(1999, 10, 4), 0.25);
    let catalog = catalog(dir.path());
    let validity = ValidityWindows::from_yaml(DATASETS).unwrap();
    let corrections = CorrectionTable::from_csv("date,value\n19991005,0.5\n").unwrap();
    let codec = codec();
    let assembler = CycleAssembler::new(&catalog, &validity, &corrections, &codec, "SNTNL-6A");

    let cycle = RepeatCycle::new(d(1999, 10, 5));
    assert_eq!(cycle.window().start, d(1999, 9, 30));
    assert_eq!(cycle.window().end, d(1999, 10, 9));
    let granules = assembler.collect_granules(&cycle).unwrap();
    assert_eq!(granules.len(), 1);

    let merged = assembler.merge(&granules).unwrap();
    assert_eq!(merged.sources, vec!["SNTNL-6A".to_string()]);
    assert!(merged.ssha.iter().all(|v| (v - 0.25).abs() < 1e-7));
}

#[test]
fn corrected_source_with_table_entry_is_shifted() {
    let dir = tempfile::tempdir().unwrap();
    write_granule(dir.path(), "SNTNL-6A", d(1999, 10, 4), 0.25);
    write_granule(dir.path(), "MERGED_ALT", d(1999, 10, 4), 0.25);
    let catalog = catalog(dir.path());
    let validity = ValidityWindows::from_yaml(DATASETS).unwrap();
    let corrections = CorrectionTable::from_csv("date,value\n19991004,0.5\n").unwrap();
    let codec = codec();
    let assembler = CycleAssembler::new(&catalog, &validity, &corrections, &codec, "SNTNL-6A");

    let granules = assembler
        .collect_granules(&RepeatCycle::new(d(1999, 10, 5)))
        .unwrap();
    // Other sources first, the reference mission last.
    assert_eq!(granules[0].source, "SNTNL-6A");
    assert_eq!(granules[1].source, "MERGED_ALT");

    let merged = assembler.merge(&granules).unwrap();
    let shifted = merged.ssha.iter().filter(|v| (*v - 0.75).abs() < 1e-7).count();
    let raw = merged.ssha.iter().filter(|v| (*v - 0.25).abs() < 1e-7).count();
    assert_eq!(shifted, raw);
    assert_eq!(shifted + raw, merged.len());
    assert!(merged.time.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn source_outside_validity_window_is_excluded() {
    let dir = tempfile::tempdir().unwrap();
    write_granule(dir.path(), "JASON-1", d(1999, 10, 4), 0.25);
    let catalog = catalog(dir.path());
    let validity = ValidityWindows::from_yaml(
        "- ds_name: JASON-1\n  start: 20020115\n  end: 20130621\n",
    )
    .unwrap();
    let corrections = CorrectionTable::default();
    let codec = codec();
    let assembler = CycleAssembler::new(&catalog, &validity, &corrections, &codec, "SNTNL-6A");
    let err = assembler
        .collect_granules(&RepeatCycle::new(d(1999, 10, 5)))
        .unwrap_err();
    assert_eq!(err.center(), d(1999, 10, 5));
}

#[test]
fn uniform_heights_grid_to_the_same_value() {
    let dir = tempfile::tempdir().unwrap();
    write_granule(dir.path(), "MERGED_ALT", d(1999, 10, 4), 0.10);
    let catalog = catalog(dir.path());
    let validity = ValidityWindows::default();
    let corrections = CorrectionTable::default();
    let codec = codec();
    let assembler = CycleAssembler::new(&catalog, &validity, &corrections, &codec, "SNTNL-6A");
    let cycle = RepeatCycle::new(d(1999, 10, 5));
    let merged = assembler
        .merge(&assembler.collect_granules(&cycle).unwrap())
        .unwrap();

    let mut wet = ndarray::Array2::from_elem((2, 4), true);
    wet[[1, 3]] = false;
    let grid = OceanGrid::new(common::LATS.to_vec(), common::LONS.to_vec(), wet).unwrap();
    let gridded = GaussianResampler::new(ResampleParams::default())
        .resample(cycle.center, &merged, &grid)
        .unwrap();

    for ((&v, &c), &w) in gridded.ssha.iter().zip(&gridded.counts).zip(&gridded.wet) {
        if w {
            assert!((v - 0.10).abs() < 1e-6, "{v}");
            assert!(c > 0.0);
        } else {
            assert!(v.is_nan());
            assert!(c.is_nan());
        }
    }
}
