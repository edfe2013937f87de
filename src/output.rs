// output.rs
use anyhow::Result;

/// Column labels for the state components: x, y, z for a
/// three-dimensional state, generic y0..yn otherwise.
pub fn state_labels(dims: usize) -> Vec<String> {
    if dims == 3 {
        vec!["x".to_string(), "y".to_string(), "z".to_string()]
    } else {
        (0..dims).map(|i| format!("y{}", i)).collect()
    }
}

/// Writes the sampled trajectory as CSV with a time column followed by
/// one column per state component.
pub fn write_trajectory(path: &str, t_values: &[f64], y_values: &[Vec<f64>]) -> Result<()> {
    let dims = y_values.first().map_or(0, |y| y.len());
    let mut writer = csv::WriterBuilder::new().from_path(path)?;

    let mut header = vec!["t".to_string()];
    header.extend(state_labels(dims));
    writer.write_record(&header)?;

    for (t, y) in t_values.iter().zip(y_values) {
        let mut record = vec![t.to_string()];
        record.extend(y.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
