use protein_props::config::Config;
use protein_props::error::{ErrorKind, Stage};
use protein_props::pipeline::Pipeline;
use protein_props::plot::{self, PlotOptions};
use protein_props::properties::{isoelectric_point, molecular_weight};
use protein_props::table;
use protein_props::types::Property;
use std::path::{Path, PathBuf};

const TEST_FONT: &str = "tests/data/DejaVuSans.ttf";
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

fn test_plot_options() -> PlotOptions {
    PlotOptions {
        font_path: Some(PathBuf::from(TEST_FONT)),
        ..PlotOptions::default()
    }
}

fn config_in(dir: &Path, input: &str) -> Config {
    Config {
        input_path: input.into(),
        mw_table_path: dir.join("output_mw.csv"),
        pi_table_path: dir.join("output_pi.csv"),
        mw_plot_path: dir.join("MW_boxplot.png"),
        pi_plot_path: dir.join("pI_boxplot.jpg"),
        plot: test_plot_options(),
        ..Config::default()
    }
}

fn assert_image(path: &Path, magic: &[u8]) {
    let bytes = std::fs::read(path).unwrap();
    assert!(!bytes.is_empty(), "{} is empty", path.display());
    assert!(
        bytes.starts_with(magic),
        "{} does not start with {:02X?}",
        path.display(),
        magic
    );
}

#[test]
fn test_tables_follow_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "tests/data/two_proteins.fasta");
    let pipeline = Pipeline::new(config.clone());

    let (mw, pi) = pipeline.export_tables().unwrap();
    assert_eq!(mw.ids(), vec!["prot_a", "prot_b"]);
    assert_eq!(pi.ids(), vec!["prot_a", "prot_b"]);

    let mw_values = table::read_numeric_column(&config.mw_table_path, "Molecular_Weight(Da)").unwrap();
    let expected = [
        molecular_weight("ACDEFG").unwrap(),
        molecular_weight("MKV").unwrap(),
    ];
    assert!((expected[0] - 640.2162769984799).abs() < 1e-6);
    assert!((expected[1] - 376.21442652368).abs() < 1e-6);
    for (read, want) in mw_values.iter().zip(expected) {
        assert!((read - want).abs() < 1e-9);
    }

    let pi_values = table::read_numeric_column(&config.pi_table_path, "Isoelectric_Point").unwrap();
    let expected = [
        isoelectric_point("ACDEFG").unwrap(),
        isoelectric_point("MKV").unwrap(),
    ];
    for (read, want) in pi_values.iter().zip(expected) {
        assert!((read - want).abs() < 1e-9);
    }

    let reread = table::read_property_table(&config.pi_table_path, Property::IsoelectricPoint).unwrap();
    assert_eq!(reread.ids(), vec!["prot_a", "prot_b"]);
}

#[test]
fn test_invalid_residue_aborts_before_tables() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "tests/data/invalid_residue.fasta");

    let err = Pipeline::new(config.clone()).export_tables().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Computation);
    assert_eq!(err.stage(), Some(Stage::ComputeProperties));
    assert!(!config.mw_table_path.exists());
    assert!(!config.pi_table_path.exists());
}

#[test]
fn test_empty_input_is_parse_error_from_loader() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "tests/data/empty.fasta");

    let err = Pipeline::new(config).run().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.stage(), Some(Stage::LoadSequences));
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "tests/data/nonexistent.fasta");

    let err = Pipeline::new(config).run().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.stage(), Some(Stage::LoadSequences));
}

#[test]
fn test_single_record_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "tests/data/single.fasta");
    let pipeline = Pipeline::new(config.clone());

    let (mw, pi) = pipeline.export_tables().unwrap();
    assert_eq!(mw.len(), 1);
    assert_eq!(pi.len(), 1);

    let stats = plot::BoxStats::from_values(&mw.values()).unwrap();
    assert_eq!(stats.q1, stats.q3);
    assert_eq!(stats.lower_whisker, stats.upper_whisker);

    let out = pipeline.export_boxplot(Property::MolecularWeight).unwrap();
    assert_eq!(out, config.mw_plot_path);
    assert_image(&out, PNG_MAGIC);
}

#[test]
fn test_full_run_writes_all_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "tests/data/multiline.fasta");

    let report = Pipeline::new(config.clone()).run().unwrap();
    assert_eq!(report.sequences, 3);
    assert_eq!(
        report.outputs,
        vec![
            config.mw_table_path.clone(),
            config.pi_table_path.clone(),
            config.mw_plot_path.clone(),
            config.pi_plot_path.clone(),
        ]
    );
    assert_image(&config.mw_plot_path, PNG_MAGIC);
    assert_image(&config.pi_plot_path, JPEG_MAGIC);
}

#[test]
fn test_plot_failure_keeps_tables() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path(), "tests/data/two_proteins.fasta");
    config.plot.font_path = Some(dir.path().join("missing.ttf"));

    let err = Pipeline::new(config.clone()).run().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(err.stage(), Some(Stage::PlotMolecularWeight));
    assert!(config.mw_table_path.exists());
    assert!(config.pi_table_path.exists());
    assert!(!config.mw_plot_path.exists());
}

#[test]
fn test_later_font_path_takes_effect() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.png");
    plot::render_boxplot(&[1.0, 2.0, 3.0], "Isoelectric_Point", &first, &test_plot_options()).unwrap();
    assert_image(&first, PNG_MAGIC);

    let copied_font = dir.path().join("Copy.ttf");
    std::fs::copy(TEST_FONT, &copied_font).unwrap();
    let options = PlotOptions {
        font_path: Some(copied_font),
        ..PlotOptions::default()
    };
    let second = dir.path().join("second.bmp");
    plot::render_boxplot(&[1.0, 2.0, 3.0], "Isoelectric_Point", &second, &options).unwrap();
    assert_image(&second, b"BM");

    // an explicit path is always honoured, even after another font was registered
    let bad_font = dir.path().join("bad.ttf");
    std::fs::write(&bad_font, b"not a font").unwrap();
    let options = PlotOptions {
        font_path: Some(bad_font),
        ..PlotOptions::default()
    };
    let err = plot::render_boxplot(&[1.0], "Isoelectric_Point", dir.path().join("third.png"), &options)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
}

#[test]
fn test_plot_rejects_bad_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let options = test_plot_options();

    let err = plot::plot_boxplot(
        "tests/data/header_only.csv",
        "Isoelectric_Point",
        dir.path().join("pi.png"),
        &options,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyData);

    let err = plot::plot_boxplot(
        "tests/data/not_numeric.csv",
        "Molecular_Weight(Da)",
        dir.path().join("mw.png"),
        &options,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);

    let err = plot::render_boxplot(&[1.0, 2.0], "Isoelectric_Point", dir.path().join("pi.svg"), &options)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);

    let options = PlotOptions {
        font_path: Some(dir.path().join("missing.ttf")),
        ..PlotOptions::default()
    };
    let err = plot::render_boxplot(&[1.0, 2.0], "Isoelectric_Point", dir.path().join("pi.png"), &options)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert!(err.to_string().contains("missing.ttf"));
}

#[test]
fn test_config_file_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    std::fs::write(
        &path,
        "input_path = \"tests/data/two_proteins.fasta\"\nmass_mode = \"average\"\n",
    )
    .unwrap();

    let config = Config::from_toml_file(&path).unwrap();
    assert_eq!(config.input_path, Path::new("tests/data/two_proteins.fasta"));
    assert_eq!(config.pi_table_path, Path::new("output_pi.csv"));

    let err = Config::from_toml_file(dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_effective_config_dump_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "tests/data/two_proteins.fasta");

    let path = dir.path().join("effective.toml");
    std::fs::write(&path, config.to_toml().unwrap()).unwrap();
    let reloaded = Config::from_toml_file(&path).unwrap();
    assert_eq!(reloaded, config);

    let report = Pipeline::new(reloaded).run().unwrap();
    assert_eq!(report.sequences, 2);
}
