//! Orchestration tests against mocked collaborators: sequencing, the build
//! gate and the fail-fast credentials check. No network, no subprocesses.

use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use tempfile::tempdir;

use openapi_client_runner::config::RunnerConfig;
use openapi_client_runner::contract::{
    MockBuildService, MockFileDownloader, MockGitClient, MockImportsFixer, MockProcessRunner,
};
use openapi_client_runner::pipeline::Pipeline;

fn test_config() -> RunnerConfig {
    RunnerConfig::for_library("Test.Generated.Client")
}

fn set_publish_env() {
    std::env::set_var("GH__TOKEN", "token");
    std::env::set_var("GIT__NAME", "Automation");
    std::env::set_var("GIT__EMAIL", "automation@example.com");
}

fn clear_publish_env() {
    std::env::remove_var("GH__TOKEN");
    std::env::remove_var("GIT__NAME");
    std::env::remove_var("GIT__EMAIL");
}

/// Mocks for one happy-path run up to (but excluding) the build result and
/// the push, which each test configures itself.
fn arrange(
    workdir: PathBuf,
) -> (
    MockGitClient,
    MockFileDownloader,
    MockProcessRunner,
    MockBuildService,
    MockImportsFixer,
) {
    let mut git = MockGitClient::new();
    let clone_target = workdir.clone();
    git.expect_clone_to_temp()
        .times(1)
        .returning(move |_, _| Ok(clone_target.clone()));

    let mut downloader = MockFileDownloader::new();
    downloader.expect_download().times(1).returning(|url, dest, ext, _| {
        assert!(url.starts_with("https://"));
        assert_eq!(ext, ".json");
        fs::write(dest, br#"{"openapi":"3.0.0","paths":{}}"#).unwrap();
        Ok(Some(dest.to_path_buf()))
    });

    // Toolchain update, then generation.
    let mut runner = MockProcessRunner::new();
    runner
        .expect_run()
        .times(2)
        .returning(|_, _, _, wait, _| {
            assert!(wait);
            Ok(())
        });

    // Once before import repair, once before the gated build.
    let mut build = MockBuildService::new();
    build.expect_restore().times(2).returning(|_, _| Ok(()));

    let mut imports = MockImportsFixer::new();
    imports
        .expect_add_missing_imports()
        .times(1)
        .returning(|_, write_changes, max_passes, _| {
            assert!(write_changes);
            assert_eq!(max_passes, 5);
            Ok(())
        });

    (git, downloader, runner, build, imports)
}

#[tokio::test]
#[serial]
async fn successful_build_pushes_exactly_once() {
    let workdir = tempdir().unwrap();
    set_publish_env();

    let (mut git, downloader, runner, mut build, imports) = arrange(workdir.path().to_path_buf());

    build.expect_build().times(1).returning(|_, release, configuration, _| {
        assert!(release);
        assert_eq!(configuration, "Release");
        Ok(true)
    });
    git.expect_commit_and_push()
        .times(1)
        .returning(|_, message, auth, _| {
            assert_eq!(message, "Automated update");
            assert_eq!(auth.token, "token");
            Ok(())
        });

    let pipeline = Pipeline::new(test_config(), git, downloader, runner, build, imports);
    let report = pipeline
        .run(&tokio_util::sync::CancellationToken::new())
        .await
        .expect("run should succeed");

    assert!(report.built);
    assert!(report.pushed);
}

#[tokio::test]
#[serial]
async fn failed_build_never_pushes() {
    let workdir = tempdir().unwrap();
    set_publish_env();

    let (mut git, downloader, runner, mut build, imports) = arrange(workdir.path().to_path_buf());

    build.expect_build().times(1).returning(|_, _, _, _| Ok(false));
    git.expect_commit_and_push().times(0);

    let pipeline = Pipeline::new(test_config(), git, downloader, runner, build, imports);
    let report = pipeline
        .run(&tokio_util::sync::CancellationToken::new())
        .await
        .expect("a reported build failure is not a pipeline error");

    assert!(!report.built);
    assert!(!report.pushed);
}

#[tokio::test]
#[serial]
async fn missing_credentials_fail_before_any_push() {
    let workdir = tempdir().unwrap();
    clear_publish_env();

    let (mut git, downloader, runner, mut build, imports) = arrange(workdir.path().to_path_buf());

    build.expect_build().times(1).returning(|_, _, _, _| Ok(true));
    git.expect_commit_and_push().times(0);

    let pipeline = Pipeline::new(test_config(), git, downloader, runner, build, imports);
    let err = pipeline
        .run(&tokio_util::sync::CancellationToken::new())
        .await
        .expect_err("missing credentials must be fatal");

    assert!(err.to_string().contains("GH__TOKEN"));
}

#[tokio::test]
#[serial]
async fn cancellation_observed_by_a_step_aborts_the_run() {
    let workdir = tempdir().unwrap();

    let mut git = MockGitClient::new();
    let clone_target = workdir.path().to_path_buf();
    git.expect_clone_to_temp()
        .times(1)
        .returning(move |_, _| Ok(clone_target.clone()));
    git.expect_commit_and_push().times(0);

    // The download step requests cancellation mid-run; the next step honors
    // the token and nothing after it may execute.
    let mut downloader = MockFileDownloader::new();
    downloader.expect_download().times(1).returning(|_, dest, _, cancel| {
        fs::write(dest, br#"{"openapi":"3.0.0","paths":{}}"#).unwrap();
        cancel.cancel();
        Ok(Some(dest.to_path_buf()))
    });

    let mut runner = MockProcessRunner::new();
    runner
        .expect_run()
        .times(1)
        .returning(|program, _, _, _, cancel| {
            assert_eq!(program, "dotnet");
            if cancel.is_cancelled() {
                Err("toolchain update cancelled".into())
            } else {
                Ok(())
            }
        });

    let mut build = MockBuildService::new();
    build.expect_restore().times(0);
    build.expect_build().times(0);
    let mut imports = MockImportsFixer::new();
    imports.expect_add_missing_imports().times(0);

    let pipeline = Pipeline::new(test_config(), git, downloader, runner, build, imports);
    let err = pipeline
        .run(&tokio_util::sync::CancellationToken::new())
        .await
        .expect_err("a cancelled run must abort");

    assert!(err.to_string().contains("toolchain update"));
}

#[tokio::test]
#[serial]
async fn generated_tree_is_pruned_before_generation() {
    let workdir = tempdir().unwrap();
    set_publish_env();

    let config = test_config();
    let src = config.source_dir(workdir.path());
    fs::create_dir_all(src.join("models")).unwrap();
    fs::write(src.join("models/OldModel.cs"), "class OldModel {}").unwrap();
    let descriptor = config.descriptor_path(workdir.path());
    fs::write(&descriptor, "<Project/>").unwrap();

    let (mut git, downloader, runner, mut build, imports) = arrange(workdir.path().to_path_buf());
    build.expect_build().times(1).returning(|_, _, _, _| Ok(true));
    git.expect_commit_and_push().times(1).returning(|_, _, _, _| Ok(()));

    let pipeline = Pipeline::new(config, git, downloader, runner, build, imports);
    pipeline
        .run(&tokio_util::sync::CancellationToken::new())
        .await
        .expect("run should succeed");

    assert!(descriptor.exists(), "descriptor survives pruning");
    assert!(!src.join("models").exists(), "stale generated sources are gone");
}
