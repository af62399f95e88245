use std::io::Write;

use approx::assert_abs_diff_eq;
use tempfile::NamedTempFile;

use super::*;

fn write_table(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn interpolates_and_clamps() {
    let table = DispersionTable::new(vec![(300., 0.02), (100., 0.01)]).unwrap();
    assert_abs_diff_eq!(table.lookup(200.), 0.015, epsilon = 1e-12);
    assert_abs_diff_eq!(table.lookup(100.), 0.01);
    assert_abs_diff_eq!(table.lookup(50.), 0.01);
    assert_abs_diff_eq!(table.lookup(900.), 0.02);
}

#[test]
fn reads_comma_file() {
    let file = write_table("# freq, factor\n90.0, 0.005\n230.0, 0.011\n345.0,0.018\n");
    let table = DispersionTable::from_file(file.path()).unwrap();
    assert_abs_diff_eq!(table.lookup(230.), 0.011);
    assert_abs_diff_eq!(table.lookup(160.), 0.008, epsilon = 1e-12);
}

#[test]
fn reads_whitespace_file() {
    let file = write_table("90.0   0.005\n\n230.0  0.011\n");
    let table = DispersionTable::from_file(file.path()).unwrap();
    assert_abs_diff_eq!(table.lookup(90.), 0.005);
    assert_abs_diff_eq!(table.lookup(230.), 0.011);
}

#[test]
fn malformed_files() {
    let file = write_table("90.0, 0.005, 7\n");
    assert!(matches!(
        DispersionTable::from_file(file.path()),
        Err(ConfigError::MalformedResource { .. })
    ));

    let file = write_table("90.0, lots\n");
    assert!(matches!(
        DispersionTable::from_file(file.path()),
        Err(ConfigError::MalformedResource { .. })
    ));

    let file = write_table("# nothing\n");
    assert!(matches!(
        DispersionTable::from_file(file.path()),
        Err(ConfigError::MalformedResource { .. })
    ));

    assert!(matches!(
        DispersionTable::from_file(Path::new("/nonexistent/dispersion.csv")),
        Err(ConfigError::Io(_))
    ));
}
