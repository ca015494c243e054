use crate::record::Entity;
use anyhow::Context;
use std::path::Path;

/// Writes `rows` as CSV with the schema's export columns. Returns the row count.
pub fn write_csv<E: Entity>(rows: &[&E], out_path: &Path) -> anyhow::Result<usize> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }
    let file = std::fs::File::create(out_path).with_context(|| {
        format!("failed to create output file {}", out_path.to_string_lossy())
    })?;
    let mut w = csv::Writer::from_writer(file);
    write_rows(&mut w, rows)?;
    w.flush()?;
    Ok(rows.len())
}

fn write_rows<E: Entity, W: std::io::Write>(w: &mut csv::Writer<W>, rows: &[&E]) -> anyhow::Result<()> {
    let columns = E::SCHEMA.export_columns;
    w.write_record(columns)?;
    for r in rows {
        let cells = columns
            .iter()
            .map(|c| r.field(c).render().unwrap_or_default());
        w.write_record(cells)?;
    }
    Ok(())
}
