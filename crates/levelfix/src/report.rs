//! CSV rendering of the batch report, consumed by the CLI and bundled
//! into the export archive.

use crate::batch::FileReport;

pub fn render_csv(reports: &[FileReport]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    // Written by hand so an empty batch still yields a valid CSV.
    writer.write_record([
        "filename",
        "status",
        "modifications",
        "elapsed_seconds",
        "error",
    ])?;
    for report in reports {
        writer.serialize(report)?;
    }
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}
