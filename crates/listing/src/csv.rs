use chrono::NaiveDate;

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn line<F: AsRef<str>>(fields: &[F]) -> String {
    fields
        .iter()
        .map(|field| quote(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Serializes a header row and data rows. Every field is quoted, embedded
/// quotes are doubled, rows are joined with `\n` and emitted in the order
/// given.
pub fn to_csv<H, F>(headers: &[H], rows: &[Vec<F>]) -> String
where
    H: AsRef<str>,
    F: AsRef<str>,
{
    std::iter::once(line(headers))
        .chain(rows.iter().map(|row| line(row)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a number for a CSV cell: integral values without a fraction,
/// non-finite values as `0`.
pub fn number_cell(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    format!("{value}")
}

/// `inventory_levels_2024-03-01.csv`
pub fn export_file_name(stem: &str, date: NaiveDate) -> String {
    format!("{stem}_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
#[path = "tests/csv_tests.rs"]
mod tests;
