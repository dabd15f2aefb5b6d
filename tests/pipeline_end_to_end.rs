// tests/pipeline_end_to_end.rs

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use funcdag::cli::CliArgs;
use funcdag::discovery::ModalityFamily;
use funcdag::errors::PipelineError;
use funcdag::fs::mock::MockFileSystem;
use funcdag::fs::FileSystem;
use funcdag::pipeline::PipelineResult;
use funcdag::run_with_backend;
use funcdag_test_utils::fake_queue::flag_value;
use funcdag_test_utils::{init_tracing, test_vars, with_timeout, DescriptorBuilder, FakeQueue};

const STUDY: &str = "/study";

/// Mock study directory with one subject and the given descriptor.
fn study_with(descriptor: DescriptorBuilder) -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/study/sub01/logs/file_descriptor.json", descriptor.to_json());
    fs
}

fn args(argv: &[&str]) -> CliArgs {
    let mut full = vec!["funcdag"];
    full.extend_from_slice(argv);
    CliArgs::try_parse_from(full).unwrap()
}

async fn run(
    fs: &MockFileSystem,
    queue: &FakeQueue,
    argv: &[&str],
) -> funcdag::errors::Result<Option<PipelineResult>> {
    init_tracing();
    let fs: Arc<dyn FileSystem> = Arc::new(fs.clone());
    with_timeout(run_with_backend(
        &args(argv),
        fs,
        Path::new(STUDY),
        queue.clone(),
        test_vars(),
    ))
    .await
}

#[tokio::test]
async fn two_rest_runs_and_no_task_runs() {
    let fs = study_with(
        DescriptorBuilder::new()
            .structural()
            .rest("0")
            .rest_sbref("0")
            .rest("2")
            .old_path("rfMRI", "0", "/raw/sub01/rest_a.nii.gz")
            .old_path("rfMRI", "2", "/raw/sub01/rest_b.nii.gz"),
    );
    let queue = FakeQueue::new();

    let result = run(&fs, &queue, &["run", "sub01"]).await.unwrap().unwrap();

    assert_eq!(
        queue.job_names(),
        vec![
            "bb_postprocess_struct_sub01",
            "tvb_prepare_gradEchoFieldMap_sub01",
            "bb_prepare_rfMRI_0_sub01",
            "bb_feat_rfMRI_ns_0_sub01",
            "bb_fix_0_sub01",
            "bb_FC_0_sub01",
            "bb_rfMRI_clean_0_sub01",
            "bb_prepare_rfMRI_1_sub01",
            "bb_feat_rfMRI_ns_1_sub01",
            "bb_fix_1_sub01",
            "bb_FC_1_sub01",
            "bb_rfMRI_clean_1_sub01",
        ]
    );

    // Token: exactly the two clean-logs identifiers.
    assert_eq!(result.token(), "106,111");
    assert_eq!(result.skipped_branches, vec![ModalityFamily::Task]);
    assert_eq!(result.non_fatal_error_count(), 1);

    // Each chain step is held on its predecessor; chains are serialized.
    assert_eq!(queue.hold_of("bb_postprocess_struct_sub01").as_deref(), Some("-1"));
    assert_eq!(queue.hold_of("tvb_prepare_gradEchoFieldMap_sub01").as_deref(), Some("100"));
    assert_eq!(queue.hold_of("bb_prepare_rfMRI_0_sub01").as_deref(), Some("101"));
    assert_eq!(queue.hold_of("bb_fix_0_sub01").as_deref(), Some("103"));
    assert_eq!(queue.hold_of("bb_prepare_rfMRI_1_sub01").as_deref(), Some("106"));

    // Queue classes.
    assert_eq!(queue.queue_of("bb_FC_0_sub01").as_deref(), Some("short.q"));
    assert_eq!(queue.queue_of("bb_feat_rfMRI_ns_1_sub01").as_deref(), Some("long.q"));
    assert_eq!(queue.queue_of("bb_fix_1_sub01").as_deref(), Some("bigmem.q"));
    let feat = queue.find("bb_feat_rfMRI_ns_1_sub01").unwrap();
    assert_eq!(flag_value(&feat, "-R").as_deref(), Some("16000"));
    assert!(feat.args.ends_with(&["feat".to_string(), "/study/sub01/fMRI/rfMRI_1.fsf".to_string()]));
    let fix = queue.find("bb_fix_1_sub01").unwrap();
    assert_eq!(flag_value(&fix, "-R"), None);
    assert!(fix.args.ends_with(&[
        "/opt/bb/bb_functional_pipeline/bb_fix".to_string(),
        "sub01".to_string(),
        "2".to_string(),
    ]));

    // Per-job log records and the relocated side-car.
    let log = fs.contents("/study/sub01/logs/bb_FC_0_sub01.log").unwrap();
    assert!(log.starts_with("STANDARD OUT:\n105"));
    assert!(log.contains("STANDARD ERROR:"));
    assert_eq!(
        fs.contents("/study/sub01/fMRI/filenames.txt").as_deref(),
        Some("rfMRI_oldpath_0:/raw/sub01/rest_a.nii.gz\nrfMRI_oldpath_2:/raw/sub01/rest_b.nii.gz\n")
    );
    assert!(!fs.exists(Path::new("/study/sub01/filenames.txt")));
}

#[tokio::test]
async fn task_branch_starts_after_field_map_without_rest_runs() {
    let fs = study_with(DescriptorBuilder::new().task("0").task_sbref("0"));
    let queue = FakeQueue::new();

    let result = run(&fs, &queue, &["run", "sub01"]).await.unwrap().unwrap();

    assert_eq!(queue.job_names().len(), 4);
    assert_eq!(queue.hold_of("bb_prepare_tfMRI_0_sub01").as_deref(), Some("101"));
    assert_eq!(queue.hold_of("bb_feat_tfMRI_0_sub01").as_deref(), Some("102"));
    assert_eq!(result.token(), "103");
    assert_eq!(result.skipped_branches, vec![ModalityFamily::RestingState]);
}

#[tokio::test]
async fn task_branch_waits_for_the_last_rest_chain() {
    let fs = study_with(DescriptorBuilder::new().rest("0").task("0").task("1"));
    let queue = FakeQueue::new();

    let result = run(&fs, &queue, &["run", "sub01"]).await.unwrap().unwrap();

    // 100 postprocess, 101 field map, 102..106 rest chain, 107..110 task chains.
    assert_eq!(queue.hold_of("bb_prepare_tfMRI_0_sub01").as_deref(), Some("106"));
    assert_eq!(queue.hold_of("bb_prepare_tfMRI_1_sub01").as_deref(), Some("108"));
    assert_eq!(result.token(), "106,108,110");
    assert!(result.skipped_branches.is_empty());
}

#[tokio::test]
async fn failed_submission_holds_dependants_on_the_sentinel() {
    let fs = study_with(DescriptorBuilder::new().rest("0").rest("1"));
    let queue = FakeQueue::new().failing("bb_rfMRI_clean_0_sub01");

    let result = run(&fs, &queue, &["run", "sub01"]).await.unwrap().unwrap();

    assert_eq!(queue.job_names().len(), 12);
    assert_eq!(queue.hold_of("bb_prepare_rfMRI_1_sub01").as_deref(), Some("-1"));
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].job_name, "bb_rfMRI_clean_0_sub01");
    // The failed terminal is left out of the token.
    assert_eq!(result.token(), "110");

    let log = fs.contents("/study/sub01/logs/bb_rfMRI_clean_0_sub01.log").unwrap();
    assert!(log.contains("Unable to submit bb_rfMRI_clean_0_sub01"));
}

#[tokio::test]
async fn empty_descriptor_submits_only_the_common_jobs() {
    let fs = study_with(DescriptorBuilder::new().structural());
    let queue = FakeQueue::new();

    let result = run(&fs, &queue, &["run", "sub01"]).await.unwrap().unwrap();

    assert_eq!(queue.job_names().len(), 2);
    assert_eq!(result.token(), "-1");
    assert_eq!(
        result.skipped_branches,
        vec![ModalityFamily::RestingState, ModalityFamily::Task]
    );
    assert_eq!(result.non_fatal_error_count(), 2);
}

#[tokio::test]
async fn external_hold_and_trailing_slash() {
    let fs = study_with(DescriptorBuilder::new().rest("0"));
    let queue = FakeQueue::new();

    run(&fs, &queue, &["run", "sub01/", "--hold", "55,56"]).await.unwrap();

    assert_eq!(queue.hold_of("bb_postprocess_struct_sub01").as_deref(), Some("55,56"));
    let prepare = queue.find("bb_prepare_rfMRI_0_sub01").unwrap();
    assert_eq!(flag_value(&prepare, "-l").as_deref(), Some("/study/sub01/logs"));
}

#[tokio::test]
async fn settings_file_overrides_queue_names() {
    let fs = study_with(DescriptorBuilder::new().rest("0"));
    fs.add_file(
        "/study/funcdag.toml",
        "[queue]\nstandard = \"veryshort.q\"\nhigh_memory_request_mb = 32000\n",
    );
    let queue = FakeQueue::new();

    run(&fs, &queue, &["run", "sub01", "--settings", "/study/funcdag.toml"])
        .await
        .unwrap();

    assert_eq!(queue.queue_of("bb_FC_0_sub01").as_deref(), Some("veryshort.q"));
    let feat = queue.find("bb_feat_rfMRI_ns_0_sub01").unwrap();
    assert_eq!(flag_value(&feat, "-R").as_deref(), Some("32000"));
}

#[tokio::test]
async fn dry_run_submits_nothing_and_leaves_no_side_car() {
    let fs = study_with(
        DescriptorBuilder::new()
            .rest("0")
            .old_path("rfMRI", "0", "/raw/r.nii.gz"),
    );
    let queue = FakeQueue::new();

    let outcome = run(&fs, &queue, &["run", "sub01", "--dry-run"]).await.unwrap();

    assert!(outcome.is_none());
    assert!(queue.invocations().is_empty());
    assert!(!fs.exists(Path::new("/study/sub01/filenames.txt")));
    assert!(!fs.exists(Path::new("/study/sub01/fMRI/filenames.txt")));
}

#[tokio::test]
async fn idp_stage_submits_one_job() {
    let fs = study_with(DescriptorBuilder::new().rest("0"));
    let queue = FakeQueue::new();

    let result = run(&fs, &queue, &["idp", "sub01", "--hold", "106,111"])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(queue.job_names(), vec!["bb_IDP_sub01"]);
    assert_eq!(queue.hold_of("bb_IDP_sub01").as_deref(), Some("106,111"));
    assert_eq!(queue.queue_of("bb_IDP_sub01").as_deref(), Some("short.q"));
    let idp = queue.find("bb_IDP_sub01").unwrap();
    assert!(idp.args.ends_with(&["/opt/bb/bb_IDP/bb_IDP".to_string(), "sub01".to_string()]));
    assert_eq!(result.token(), "100");
}

#[tokio::test]
async fn side_car_staging_failure_stops_before_submission() {
    let fs = study_with(
        DescriptorBuilder::new()
            .rest("0")
            .old_path("rfMRI", "0", "/raw/r.nii.gz"),
    );
    fs.make_read_only("/study/sub01/filenames.txt");
    let queue = FakeQueue::new();

    let err = run(&fs, &queue, &["run", "sub01"]).await.unwrap_err();

    assert!(matches!(err, PipelineError::Other(_)));
    assert!(queue.invocations().is_empty());
}

#[tokio::test]
async fn missing_subject_is_a_configuration_error() {
    let fs = MockFileSystem::new();
    fs.add_dir("/study");
    let queue = FakeQueue::new();

    let err = run(&fs, &queue, &["run", "sub99"]).await.unwrap_err();

    assert!(matches!(err, PipelineError::SubjectNotFound(_)));
    assert_eq!(err.to_string(), "sub99 is not a valid directory");
    assert!(queue.invocations().is_empty());
}

#[tokio::test]
async fn missing_descriptor_is_a_configuration_error() {
    let fs = MockFileSystem::new();
    fs.add_dir("/study/sub01/logs");
    let queue = FakeQueue::new();

    let err = run(&fs, &queue, &["idp", "sub01"]).await.unwrap_err();

    match err {
        PipelineError::ConfigError(msg) => {
            assert!(msg.contains("file_descriptor.json could not be loaded"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
    assert!(queue.invocations().is_empty());
}

#[tokio::test]
async fn idp_rejects_a_malformed_descriptor() {
    let fs = MockFileSystem::new();
    fs.add_file("/study/sub01/logs/file_descriptor.json", "{ not json");
    let queue = FakeQueue::new();

    let err = run(&fs, &queue, &["idp", "sub01"]).await.unwrap_err();

    assert!(matches!(err, PipelineError::JsonError(_)));
    assert!(queue.invocations().is_empty());
}
