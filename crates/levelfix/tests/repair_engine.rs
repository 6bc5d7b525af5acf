use levelfix::batch::{process_batch, BatchInput, FileStatus};
use levelfix::repair::{RepairConfig, RepairError, Repairer};

fn repair_text(source: &str) -> (String, usize) {
    let outcome = Repairer::default()
        .repair(source.as_bytes())
        .expect("well-formed input repairs");
    (
        String::from_utf8(outcome.output.clone()).expect("utf-8 output"),
        outcome.modifications(),
    )
}

#[test]
fn adds_a_position_level_extracted_from_the_description() {
    let (text, modifications) = repair_text(
        "<Job><Description>Poste \"A - Peu Qualifié\"</Description><Salary>25000</Salary></Job>",
    );
    assert_eq!(modifications, 1);
    assert!(text.contains("<PositionLevel>A - Peu Qualifié</PositionLevel>"));
    assert!(text.contains("<Salary>25000</Salary>"));
}

#[test]
fn updates_a_truncated_position_level() {
    let (text, modifications) = repair_text(
        "<Job><Description>Poste \"B - Qualifié\"</Description><PositionLevel>B</PositionLevel></Job>",
    );
    assert_eq!(modifications, 1);
    assert!(text.contains("<PositionLevel>B - Qualifié</PositionLevel>"));
    assert_eq!(text.matches("<PositionLevel>").count(), 1);
}

#[test]
fn leaves_a_correct_position_level_untouched() {
    let (text, modifications) = repair_text(
        "<Job><Description>Poste \"C - Très Qualifié\"</Description><PositionLevel>C - Très Qualifié</PositionLevel></Job>",
    );
    assert_eq!(modifications, 0);
    assert_eq!(text.matches("<PositionLevel>").count(), 1);
}

#[test]
fn a_description_without_quotes_is_not_touched() {
    let (text, modifications) =
        repair_text("<Job><Description>Texte sans guillemets</Description></Job>");
    assert_eq!(modifications, 0);
    assert!(!text.contains("PositionLevel"));
}

#[test]
fn namespaced_records_get_a_namespaced_position_level() {
    let (text, modifications) = repair_text(
        "<ns0:Job xmlns:ns0=\"urn:jobs\"><ns0:Description>Contexte \"D - Expert\" confirmé</ns0:Description></ns0:Job>",
    );
    assert_eq!(modifications, 1);
    assert!(text.contains("xmlns:ns0=\"urn:jobs\""));
    assert!(text.contains("<ns0:PositionLevel>D - Expert</ns0:PositionLevel>"));
}

#[test]
fn the_last_quoted_candidate_is_authoritative() {
    let (text, _) = repair_text(
        "<Job><Description>D'abord \"A - Peu Qualifié\" puis \"B - Qualifié\"</Description></Job>",
    );
    assert!(text.contains("<PositionLevel>B - Qualifié</PositionLevel>"));
    assert!(!text.contains("A - Peu Qualifié</PositionLevel>"));
}

#[test]
fn repairing_twice_changes_nothing_further() {
    let sources = [
        "<Job><Description>Poste \"A - Peu Qualifié\"</Description><Salary>25000</Salary></Job>",
        "<Job><Description>Poste \"B - Qualifié\"</Description><PositionLevel>B</PositionLevel></Job>",
        "<Jobs><Job><Description>Un \"A - X\" et deux \"B - Y\"</Description></Job><Job><Description>rien</Description></Job></Jobs>",
        "<Job><Description>Un \"A - X\"</Description><Description>Deux \"B - Y\"</Description></Job>",
    ];
    let repairer = Repairer::default();

    for source in sources {
        let first = repairer.repair(source.as_bytes()).expect("first pass");
        let second = repairer.repair(&first.output).expect("second pass");
        assert_eq!(second.modifications(), 0, "second pass on {source}");
        assert_eq!(second.output, first.output, "stable output for {source}");
    }
}

#[test]
fn malformed_markup_yields_a_parse_error() {
    let err = Repairer::default()
        .repair(b"<Job><Description>Poste \"A - X\"")
        .unwrap_err();
    assert!(matches!(
        err,
        RepairError::Parse(_) | RepairError::UnclosedElement(_)
    ));
}

#[test]
fn latin1_documents_stay_latin1() {
    let source =
        b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><Job><Description>Poste \"A - Peu Qualifi\xe9\"</Description></Job>";
    let outcome = Repairer::default().repair(source).expect("repairs");

    // The label survives and the label value is re-encoded, not UTF-8.
    let text = String::from_utf8_lossy(&outcome.output);
    assert!(text.contains("encoding=\"ISO-8859-1\""));
    assert!(outcome
        .output
        .windows(9)
        .any(|window| window == b"Qualifi\xe9<"));
}

#[test]
fn utf16_documents_come_back_as_utf8() {
    let mut source = vec![0xFF, 0xFE];
    for unit in "<Job><Description>Poste \"A - Peu Qualifié\"</Description></Job>".encode_utf16() {
        source.extend_from_slice(&unit.to_le_bytes());
    }
    let outcome = Repairer::default().repair(&source).expect("repairs");
    let text = String::from_utf8(outcome.output).expect("utf-8 fallback output");
    assert!(text.contains("encoding=\"UTF-8\""));
    assert!(text.contains("<PositionLevel>A - Peu Qualifié</PositionLevel>"));
}

#[test]
fn a_container_tag_can_be_configured() {
    let config = RepairConfig {
        container_tags: vec!["Position".to_string()],
        ..RepairConfig::default()
    };
    let outcome = Repairer::new(config)
        .repair(
            "<Position><Details><Description>Poste \"B - Qualifié\"</Description></Details></Position>"
                .as_bytes(),
        )
        .expect("repairs");
    let text = String::from_utf8(outcome.output).expect("utf-8");

    let details_block = text
        .split("<Details>")
        .nth(1)
        .and_then(|rest| rest.split("</Details>").next())
        .expect("details block");
    assert!(!details_block.contains("PositionLevel"));
    assert!(text.contains("<PositionLevel>B - Qualifié</PositionLevel>"));
}

#[test]
fn batch_repair_isolates_failures_per_file() {
    let result = process_batch(
        &Repairer::default(),
        vec![
            BatchInput {
                filename: "ok.xml".to_string(),
                content: "<Job><Description>Poste \"A - Peu Qualifié\"</Description></Job>"
                    .as_bytes()
                    .to_vec(),
            },
            BatchInput {
                filename: "broken.xml".to_string(),
                content: b"<Job><Description>".to_vec(),
            },
            BatchInput {
                filename: "untouched.xml".to_string(),
                content: b"<Job><Description>rien</Description></Job>".to_vec(),
            },
        ],
    );

    let summary = result.summary();
    assert_eq!(summary.files, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.modifications, 1);

    let names: Vec<&str> = result
        .files
        .iter()
        .map(|file| file.filename.as_str())
        .collect();
    assert_eq!(names, vec!["ok.xml", "ERROR_broken.xml", "untouched.xml"]);

    let broken = &result.files[1];
    assert_eq!(broken.content, b"<Job><Description>");
    assert_eq!(result.reports[1].status, FileStatus::Error);
}
