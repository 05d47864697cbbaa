use std::io::{self, Write};

use nalgebra::DVector;

// Table of the requested periods, one line per period
pub fn write_table<W: Write>(
    out: &mut W,
    requirements: &DVector<f64>,
    first: usize,
    last: usize,
) -> io::Result<()> {
    writeln!(out, "Period, Gross irrigation requirement")?;
    let mut total = 0.0;
    for period in first.max(1)..=last.min(requirements.len()) {
        let value = requirements[period - 1];
        total += value;
        writeln!(out, "{:>6}, {:.3}", period, value)?;
    }
    writeln!(out, " Total, {:.3}", total)
}

// All periods as CSV, ready for a spreadsheet
pub fn write_csv<W: Write>(out: &mut W, requirements: &DVector<f64>) -> io::Result<()> {
    writeln!(out, "period,requirement")?;
    for (i, value) in requirements.iter().enumerate() {
        writeln!(out, "{},{:.3}", i + 1, value)?;
    }
    Ok(())
}
