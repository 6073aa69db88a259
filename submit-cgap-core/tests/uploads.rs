use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use submit_cgap_core::contract::{CloudCredentials, MockCloudCopier, MockPortal, UploadSpec};
use submit_cgap_core::testing::RecordingConsole;
use submit_cgap_core::uploads::{
    do_any_uploads, do_uploads, execute_prearranged_upload, extract_upload_credentials,
    bundle_folder, resume_uploads, upload_file_to_uuid, upload_folder, upload_item_data, UploadSummary,
};
use submit_cgap_core::{Session, SubmitError};

const SOME_SERVER: &str = "http://localhost:7777";
const SOME_FILENAME: &str = "some-filename";
const SOME_UPLOAD_URL: &str = "some-url";
const SOME_UUID: &str = "123-4444-5678";

fn some_upload_credentials() -> Value {
    json!({
        "AccessKeyId": "some-access-key",
        "SecretAccessKey": "some-secret",
        "SessionToken": "some-session-token",
        "upload_url": SOME_UPLOAD_URL,
    })
}

fn some_upload_info() -> Value {
    json!([
        {"uuid": "1234", "filename": "f1.fastq.gz"},
        {"uuid": "9876", "filename": "f2.fastq.gz"}
    ])
}

fn session(
    portal: MockPortal,
    console: RecordingConsole,
    copier: MockCloudCopier,
) -> Session<MockPortal, RecordingConsole, MockCloudCopier> {
    Session::new(SOME_SERVER, portal, console, copier)
}

/// A portal that hands out credentials for any item and a copier that records
/// what it copied, failing for the given uuids.
fn recording_uploads(failing: &[&str]) -> (MockPortal, MockCloudCopier, Arc<Mutex<Vec<PathBuf>>>) {
    let failing: Vec<String> = failing.iter().map(|s| s.to_string()).collect();
    let mut portal = MockPortal::new();
    portal
        .expect_request_upload_credentials()
        .returning(move |uuid, _filename| {
            if failing.iter().any(|f| f == uuid) {
                Ok(json!({"message": "Houston, we have a problem."}))
            } else {
                Ok(json!({"@graph": [{"upload_credentials": some_upload_credentials()}]}))
            }
        });
    let copied = Arc::new(Mutex::new(Vec::new()));
    let recorder = copied.clone();
    let mut copier = MockCloudCopier::new();
    copier.expect_copy().returning(move |source, _target, _creds| {
        recorder.lock().unwrap().push(source.to_path_buf());
        Ok(0)
    });
    (portal, copier, copied)
}

#[tokio::test]
async fn no_upload_info_means_no_question_and_no_uploads() {
    let session = session(MockPortal::new(), RecordingConsole::answering(true), MockCloudCopier::new());
    let summary = do_any_uploads(&session, &json!({"additional_data": {"upload_info": []}}), None)
        .await
        .unwrap();
    assert_eq!(summary, UploadSummary::default());
    assert!(session.console.questions().is_empty());
    assert!(session.console.lines().is_empty());
}

#[tokio::test]
async fn declining_the_batch_attempts_nothing() {
    let session = session(MockPortal::new(), RecordingConsole::answering(false), MockCloudCopier::new());
    let res = json!({"additional_data": {"upload_info": [{"uuid": "1234", "filename": "f1.fastq.gz"}]}});
    let summary = do_any_uploads(&session, &res, Some(Path::new("/some-folder"))).await.unwrap();
    assert_eq!(session.console.questions(), vec!["Upload 1 file?"]);
    assert_eq!(session.console.lines(), vec!["No uploads attempted."]);
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn accepted_batch_uploads_every_file_from_the_folder() {
    let (portal, copier, copied) = recording_uploads(&[]);
    let session = session(portal, RecordingConsole::answering(true), copier).with_no_query(false);
    let res = json!({"additional_data": {"upload_info": some_upload_info()}});
    let summary = do_any_uploads(&session, &res, Some(Path::new("/some-folder"))).await.unwrap();
    assert_eq!(session.console.questions()[0], "Upload 2 files?");
    assert_eq!(summary, UploadSummary { uploaded: 2, skipped: 0, failed: 0 });
    assert_eq!(
        *copied.lock().unwrap(),
        vec![PathBuf::from("/some-folder/f1.fastq.gz"), PathBuf::from("/some-folder/f2.fastq.gz")]
    );
}

#[tokio::test]
async fn no_query_uploads_without_asking() {
    let (portal, copier, copied) = recording_uploads(&[]);
    let session = session(portal, RecordingConsole::answering(false), copier).with_no_query(true);
    let res = json!({"upload_info": some_upload_info()});
    let summary = do_any_uploads(&session, &res, None).await.unwrap();
    assert!(session.console.questions().is_empty());
    assert_eq!(summary.uploaded, 2);
    assert_eq!(copied.lock().unwrap()[0], PathBuf::from("./f1.fastq.gz"));
}

#[tokio::test]
async fn failed_uploads_are_reported_and_do_not_stop_the_batch() {
    let (portal, copier, copied) = recording_uploads(&["2345"]);
    let session = session(portal, RecordingConsole::answering(true), copier);
    let specs = vec![
        UploadSpec { uuid: "1234".into(), filename: "foo.fastq.gz".into() },
        UploadSpec { uuid: "2345".into(), filename: "bar.fastq.gz".into() },
        UploadSpec { uuid: "3456".into(), filename: "baz.fastq.gz".into() },
    ];
    let summary = do_uploads(&session, &specs, None).await;
    assert_eq!(summary, UploadSummary { uploaded: 2, skipped: 0, failed: 1 });
    assert_eq!(copied.lock().unwrap().len(), 2);
    let lines = session.console.lines();
    assert!(lines.contains(&"Uploading ./foo.fastq.gz to item 1234 ...".to_string()));
    assert!(lines.contains(&"Upload of ./foo.fastq.gz to item 1234 was successful.".to_string()));
    assert!(lines.contains(&"Uploading ./bar.fastq.gz to item 2345 ...".to_string()));
    assert!(lines.contains(&"Error: Unable to obtain upload credentials for file ./bar.fastq.gz.".to_string()));
    assert!(lines.contains(&"Upload of ./baz.fastq.gz to item 3456 was successful.".to_string()));
}

#[tokio::test]
async fn declined_files_are_skipped_individually() {
    let (portal, copier, copied) = recording_uploads(&[]);
    let session = session(portal, RecordingConsole::scripted([true, false, true], true), copier);
    let specs = vec![
        UploadSpec { uuid: "1234".into(), filename: "foo.fastq.gz".into() },
        UploadSpec { uuid: "2345".into(), filename: "bar.fastq.gz".into() },
        UploadSpec { uuid: "3456".into(), filename: "baz.fastq.gz".into() },
    ];
    let summary = do_uploads(&session, &specs, Some(Path::new("/x/yy/zzz/"))).await;
    assert_eq!(summary, UploadSummary { uploaded: 2, skipped: 1, failed: 0 });
    assert_eq!(
        *copied.lock().unwrap(),
        vec![PathBuf::from("/x/yy/zzz/foo.fastq.gz"), PathBuf::from("/x/yy/zzz/baz.fastq.gz")]
    );
    let lines = session.console.lines();
    assert_eq!(lines[0], "Uploading /x/yy/zzz/foo.fastq.gz to item 1234 ...");
    assert!(lines.contains(&"OK, not uploading it.".to_string()));
    assert!(!lines.iter().any(|l| l.contains("bar.fastq.gz")));
}

#[tokio::test]
async fn upload_file_to_uuid_patches_with_base_name_and_copies_with_credentials() {
    let mut portal = MockPortal::new();
    portal
        .expect_request_upload_credentials()
        .withf(|uuid, filename| uuid == SOME_UUID && filename == "f1.fastq.gz")
        .times(1)
        .returning(|_, _| Ok(json!({"@graph": [{"upload_credentials": some_upload_credentials()}]})));
    let mut copier = MockCloudCopier::new();
    copier
        .expect_copy()
        .withf(|source, target, creds| {
            source == Path::new("/data/f1.fastq.gz")
                && target == SOME_UPLOAD_URL
                && *creds
                    == CloudCredentials {
                        access_key_id: "some-access-key".into(),
                        secret_access_key: "some-secret".into(),
                        session_token: "some-session-token".into(),
                    }
        })
        .times(1)
        .returning(|_, _, _| Ok(0));
    let session = session(portal, RecordingConsole::default(), copier);
    upload_file_to_uuid(&session, Path::new("/data/f1.fastq.gz"), SOME_UUID)
        .await
        .unwrap();
}

#[tokio::test]
async fn missing_credentials_in_patch_response_is_an_error() {
    let mut portal = MockPortal::new();
    portal
        .expect_request_upload_credentials()
        .returning(|_, _| Ok(json!({"message": "Houston, we have a problem."})));
    let mut copier = MockCloudCopier::new();
    copier.expect_copy().never();
    let session = session(portal, RecordingConsole::default(), copier);
    let err = upload_file_to_uuid(&session, Path::new(SOME_FILENAME), SOME_UUID)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Unable to obtain upload credentials"), "{err}");
}

#[test]
fn credentials_must_come_from_exactly_one_graph_item() {
    let creds = some_upload_credentials();
    assert_eq!(
        extract_upload_credentials(&json!({"@graph": [{"upload_credentials": creds}]})),
        Some(some_upload_credentials())
    );
    assert_eq!(extract_upload_credentials(&json!({"@graph": []})), None);
    assert_eq!(
        extract_upload_credentials(&json!({"@graph": [{"upload_credentials": {}}, {"upload_credentials": {}}]})),
        None
    );
    assert_eq!(extract_upload_credentials(&json!({"@graph": [{"uuid": "x"}]})), None);
}

#[tokio::test]
async fn incomplete_credentials_fail_before_anything_is_shown() {
    let mut copier = MockCloudCopier::new();
    copier.expect_copy().never();
    let session = session(MockPortal::new(), RecordingConsole::default(), copier);
    let mut bad = some_upload_credentials();
    bad.as_object_mut().unwrap().remove("SessionToken");
    let err = execute_prearranged_upload(&session, Path::new("this-file-name-is-not-used"), &bad)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::BadUploadSpecification(_)), "{err:?}");
    assert!(err.to_string().contains("SessionToken"), "{err}");
    assert!(session.console.lines().is_empty());
}

#[tokio::test]
async fn successful_copy_reports_duration() {
    let mut copier = MockCloudCopier::new();
    copier.expect_copy().times(1).returning(|_, _, _| Ok(0));
    let session = session(MockPortal::new(), RecordingConsole::default(), copier);
    execute_prearranged_upload(&session, Path::new(SOME_FILENAME), &some_upload_credentials())
        .await
        .unwrap();
    let lines = session.console.lines();
    assert_eq!(lines[0], "Going to upload some-filename to some-url.");
    assert!(lines[1].starts_with("Uploaded in ") && lines[1].ends_with(" seconds"), "{lines:?}");
}

#[tokio::test]
async fn nonzero_exit_code_is_an_upload_failure() {
    let mut copier = MockCloudCopier::new();
    copier.expect_copy().times(1).returning(|_, _, _| Ok(17));
    let session = session(MockPortal::new(), RecordingConsole::default(), copier);
    let err = execute_prearranged_upload(&session, Path::new(SOME_FILENAME), &some_upload_credentials())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Upload failed with exit code 17");
    assert_eq!(session.console.lines(), vec!["Going to upload some-filename to some-url."]);
}

#[tokio::test]
async fn resume_uploads_offers_the_submissions_files() {
    let (mut portal, copier, copied) = recording_uploads(&[]);
    portal
        .expect_get_ingestion_submission()
        .withf(|uuid| uuid == SOME_UUID)
        .times(1)
        .returning(|_| Ok(json!({"additional_data": {"upload_info": some_upload_info()}})));
    let session = session(portal, RecordingConsole::answering(true), copier);
    let summary = resume_uploads(&session, SOME_UUID, Some(Path::new("/bundles")))
        .await
        .unwrap();
    assert_eq!(summary.uploaded, 2);
    assert_eq!(copied.lock().unwrap()[1], PathBuf::from("/bundles/f2.fastq.gz"));
}

#[tokio::test]
async fn resume_uploads_propagates_portal_errors() {
    let mut portal = MockPortal::new();
    portal.expect_get_ingestion_submission().returning(|_| {
        Err(SubmitError::HttpStatus {
            url: "http://localhost:7777/ingestion-submissions/x?format=json".into(),
            status: 401,
        })
    });
    portal.expect_request_upload_credentials().never();
    let session = session(portal, RecordingConsole::answering(true), MockCloudCopier::new());
    assert!(resume_uploads(&session, SOME_UUID, None).await.is_err());
    assert!(session.console.questions().is_empty());
}

#[tokio::test]
async fn upload_item_data_asks_before_uploading() {
    let (portal, copier, copied) = recording_uploads(&[]);
    let session = session(portal, RecordingConsole::answering(true), copier);
    upload_item_data(&session, Path::new(SOME_FILENAME), SOME_UUID).await.unwrap();
    assert_eq!(session.console.questions(), vec![format!("Upload {SOME_FILENAME} to {SOME_SERVER}?")]);
    assert_eq!(copied.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn declining_upload_item_data_aborts() {
    let mut portal = MockPortal::new();
    portal.expect_request_upload_credentials().never();
    let session = session(portal, RecordingConsole::answering(false), MockCloudCopier::new());
    let err = upload_item_data(&session, Path::new(SOME_FILENAME), SOME_UUID)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Aborted));
    assert_eq!(session.console.lines(), vec!["Aborting submission."]);
}

#[test]
fn upload_folder_prefers_explicit_folder_then_bundle_folder() {
    assert_eq!(
        upload_folder(Some(Path::new("/some-folder/foo.xls")), None),
        Some(PathBuf::from("/some-folder"))
    );
    assert_eq!(
        upload_folder(Some(Path::new("/some-folder/foo.xls")), Some(Path::new("/other/"))),
        Some(PathBuf::from("/other/"))
    );
    assert_eq!(upload_folder(None, None), None);
    assert_eq!(upload_folder(Some(Path::new("foo.xls")), None), None);
}

#[test]
fn bare_bundle_name_has_no_folder() {
    assert_eq!(bundle_folder(Path::new("foo.xls")), None);
    assert_eq!(bundle_folder(Path::new("./foo.xls")), Some(Path::new(".")));
    assert_eq!(bundle_folder(Path::new("/data/foo.xls")), Some(Path::new("/data")));
}

#[tokio::test]
async fn empty_folder_uploads_from_the_current_directory() {
    let (portal, copier, copied) = recording_uploads(&[]);
    let session = session(portal, RecordingConsole::answering(true), copier);
    let res = json!({"upload_info": [{"uuid": "1234", "filename": "f1.fastq.gz"}]});
    let summary = do_any_uploads(&session, &res, Some(Path::new(""))).await.unwrap();
    assert_eq!(summary.uploaded, 1);
    assert_eq!(*copied.lock().unwrap(), vec![PathBuf::from("./f1.fastq.gz")]);
    let lines = session.console.lines();
    assert!(lines.contains(&"Uploading ./f1.fastq.gz to item 1234 ...".to_string()));
    assert!(lines.contains(&"Upload of ./f1.fastq.gz to item 1234 was successful.".to_string()));
}
