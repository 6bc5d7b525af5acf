use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use levelfix::batch::{BatchInput, BatchResult, RepairedFile};
use levelfix::error::AppError;
use levelfix::report::render_csv;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the report bundled into the export archive.
const REPORT_CSV_NAME: &str = "report.csv";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// One file as it travels over the JSON surface. Source encodings are
/// not necessarily UTF-8, so bytes go through base64.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadedFile {
    pub(crate) filename: String,
    pub(crate) content_base64: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RepairedFilePayload {
    pub(crate) filename: String,
    pub(crate) content_base64: String,
}

pub(crate) fn decode_uploads(uploads: Vec<UploadedFile>) -> Result<Vec<BatchInput>, AppError> {
    if uploads.is_empty() {
        return Err(AppError::InvalidRequest("no files supplied".to_string()));
    }

    uploads
        .into_iter()
        .map(|upload| {
            let content = BASE64.decode(upload.content_base64.as_bytes()).map_err(|_| {
                AppError::InvalidRequest(format!(
                    "file '{}' is not valid base64",
                    upload.filename
                ))
            })?;
            Ok(BatchInput {
                filename: upload.filename,
                content,
            })
        })
        .collect()
}

pub(crate) fn encode_outputs(files: &[RepairedFile]) -> Vec<RepairedFilePayload> {
    files
        .iter()
        .map(|file| RepairedFilePayload {
            filename: file.filename.clone(),
            content_base64: BASE64.encode(&file.content),
        })
        .collect()
}

/// Packs every output document plus the CSV report into a deflated ZIP.
pub(crate) fn build_archive(result: &BatchResult) -> Result<Vec<u8>, AppError> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in &result.files {
        archive
            .start_file(file.filename.as_str(), options)
            .map_err(zip_error)?;
        archive.write_all(&file.content)?;
    }

    let report = render_csv(&result.reports)?;
    archive
        .start_file(REPORT_CSV_NAME, options)
        .map_err(zip_error)?;
    archive.write_all(&report)?;

    Ok(archive.finish().map_err(zip_error)?.into_inner())
}

fn zip_error(err: zip::result::ZipError) -> AppError {
    AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelfix::batch::process_batch;
    use levelfix::repair::Repairer;

    #[test]
    fn uploads_round_trip_through_base64() {
        let uploads = vec![UploadedFile {
            filename: "a.xml".to_string(),
            content_base64: BASE64.encode("<Job/>"),
        }];
        let inputs = decode_uploads(uploads).expect("decodes");
        assert_eq!(inputs[0].filename, "a.xml");
        assert_eq!(inputs[0].content, b"<Job/>");
    }

    #[test]
    fn an_empty_upload_set_is_rejected() {
        assert!(matches!(
            decode_uploads(Vec::new()),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn bad_base64_names_the_offending_file() {
        let uploads = vec![UploadedFile {
            filename: "bad.xml".to_string(),
            content_base64: "not base64!!".to_string(),
        }];
        let err = decode_uploads(uploads).unwrap_err();
        assert!(err.to_string().contains("bad.xml"));
    }

    #[test]
    fn the_archive_contains_every_output_and_the_report() {
        let result = process_batch(
            &Repairer::default(),
            vec![
                BatchInput {
                    filename: "ok.xml".to_string(),
                    content: b"<Job><Description>Poste \"A - X\"</Description></Job>".to_vec(),
                },
                BatchInput {
                    filename: "broken.xml".to_string(),
                    content: b"<Job>".to_vec(),
                },
            ],
        );

        let bytes = build_archive(&result).expect("archive builds");
        let mut archive =
            zip::ZipArchive::new(Cursor::new(bytes)).expect("archive reads back");
        let names: Vec<String> = (0..archive.len())
            .map(|index| archive.by_index(index).expect("entry").name().to_string())
            .collect();
        assert_eq!(names, vec!["ok.xml", "ERROR_broken.xml", "report.csv"]);
    }
}
