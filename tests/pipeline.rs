//! End-to-end run: configuration file, table files and the processor.

use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use irrigation_demand::file_input::{read_crop_calendar, read_environmental};
use irrigation_demand::{IrrigationError, RunConfig, compute_requirements};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("irrigation_demand_{}_{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_inputs(dir: &Path, calendar_rows: &[(f64, f64, f64, f64)]) {
    let mut enviro = String::from("Month ET0 Re PR\n");
    for m in MONTHS {
        enviro.push_str(&format!("{m} 150.0 30.0 10.0\n"));
    }
    // UTF-16 with BOM, the way the legacy input files are stored
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(enviro.encode_utf16().flat_map(|u| u.to_le_bytes()));
    fs::write(dir.join("enviro.txt"), bytes).unwrap();

    let mut calendar = String::from("stage,D,Kc,SR,DS\n");
    for (i, (d, kc, sr, ds)) in calendar_rows.iter().enumerate() {
        calendar.push_str(&format!("s{i},{d},{kc},{sr},{ds}\n"));
    }
    fs::write(dir.join("calendar.csv"), calendar).unwrap();

    let config = "\
[input]
environmental = \"enviro.txt\"
crop_calendar = \"calendar.csv\"

[run]
first_period = 1
last_period = 12
spreading_period = 1.5
efficiency = 0.5
";
    fs::write(dir.join("irrigation.toml"), config).unwrap();
}

#[test]
fn steady_rice_calendar_from_files() {
    let dir = scratch_dir("steady");
    let rows: Vec<_> = (0..12)
        .flat_map(|_| [(0.5, 1.0, 0.0, 0.0), (0.5, 1.0, 0.0, 0.0)])
        .collect();
    write_inputs(&dir, &rows);

    let config = RunConfig::load(&dir.join("irrigation.toml")).unwrap();
    let env = read_environmental(&config.input.environmental).unwrap();
    let calendar = read_crop_calendar(&config.input.crop_calendar).unwrap();
    assert_eq!(env.periods(), 12);
    assert_eq!(calendar.stages(), 24);

    let result = compute_requirements(&config.run, config.tolerances, &env, &calendar).unwrap();
    // (150 + 10 - 30) / 0.5 in every period
    for value in result.iter() {
        assert_abs_diff_eq!(*value, 260.0, epsilon = 1e-9);
    }
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn malformed_calendar_stops_the_run() {
    let dir = scratch_dir("malformed");
    let rows = vec![(1.0, 1.0, 0.0, 0.0); 13];
    write_inputs(&dir, &rows);

    let config = RunConfig::load(&dir.join("irrigation.toml")).unwrap();
    let env = read_environmental(&config.input.environmental).unwrap();
    let calendar = read_crop_calendar(&config.input.crop_calendar).unwrap();
    let result = compute_requirements(&config.run, config.tolerances, &env, &calendar);
    assert!(matches!(
        result,
        Err(IrrigationError::StageCountMismatch {
            stages: 13,
            periods: 12
        })
    ));
    fs::remove_dir_all(&dir).ok();
}
