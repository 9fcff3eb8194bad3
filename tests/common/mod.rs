use std::fs::File;
use std::io::Error;
use std::path::Path;

/// Writes a quote request CSV, one row per `(tier, start, end, dangerous)` entry.
pub fn generate_csv(path: &Path, rows: &[(&str, &str, &str, bool)]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["email", "tier", "start", "end", "dangerous"])?;

    for (i, (tier, start, end, dangerous)) in rows.iter().enumerate() {
        wtr.write_record([
            format!("client{i}@example.com").as_str(),
            *tier,
            *start,
            *end,
            if *dangerous { "true" } else { "false" },
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
