#[cfg(all(test, unix))]
mod tests {

    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::Duration;
    use tokio::runtime::Handle;
    use crate::core::{ConversionOutcome, ConversionRequest, ConversionSettings, RangePolicy, RequestField};
    use crate::video::command::build_args;
    use crate::video::ffmpeg::FfmpegTool;
    use crate::video::{ConversionRunner, SPAWN_LOCK};

    fn stub_tool(dir: &Path, body: &str) -> FfmpegTool {
        let path = dir.join("ffmpeg-stub");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write stub");
        let mut permissions = fs::metadata(&path).expect("Failed to stat stub").permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions).expect("Failed to make stub executable");
        FfmpegTool::new(path)
    }

    fn runner(tool: FfmpegTool) -> ConversionRunner {
        ConversionRunner::new(tool, RangePolicy::PassThrough, Handle::current())
    }

    fn request(dir: &Path) -> ConversionRequest {
        ConversionRequest::new(dir.join("input.webm"), dir.join("output.gif"), ConversionSettings::default())
    }

    #[tokio::test]
    async fn test_successful_conversion() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let args_file = dir.path().join("args.txt");
        let tool = stub_tool(dir.path(), &format!("printf '%s\\n' \"$@\" > '{}'\nexit 0", args_file.display()));
        let runner = runner(tool);
        let request = request(dir.path());

        let outcome = runner.convert(request.clone()).await;
        assert_eq!(outcome, ConversionOutcome::Success);

        // The tool saw exactly the arguments the builder produced
        let recorded = fs::read_to_string(&args_file).expect("Stub did not record its arguments");
        let expected: Vec<String> = build_args(&request)
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(recorded.lines().collect::<Vec<_>>(), expected);

        let snapshot = runner.snapshot();
        assert!(!snapshot.converting);
        assert!(snapshot.active_request.is_none());
        assert_eq!(snapshot.last_outcome, Some(ConversionOutcome::Success));
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.status_line(), "Conversion complete");
    }

    #[tokio::test]
    async fn test_tool_failure_reports_stderr() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let runner = runner(stub_tool(dir.path(), "printf boom >&2\nexit 1"));

        let outcome = runner.convert(request(dir.path())).await;
        assert_eq!(outcome, ConversionOutcome::ToolFailed("boom".to_string()));
        assert_eq!(runner.snapshot().status_line(), "Conversion failed");
    }

    #[tokio::test]
    async fn test_silent_failure_reports_exit_status() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let runner = runner(stub_tool(dir.path(), "exit 3"));

        match runner.convert(request(dir.path())).await {
            ConversionOutcome::ToolFailed(message) => assert!(message.contains('3'), "{}", message),
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let runner = runner(FfmpegTool::new(dir.path().join("not-installed")));

        let outcome = runner.convert(request(dir.path())).await;
        assert_eq!(outcome, ConversionOutcome::ToolNotFound);
        assert!(!runner.snapshot().converting);
    }

    #[tokio::test]
    async fn test_second_request_while_running_is_busy() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let count_file = dir.path().join("count.txt");
        let gate_file = dir.path().join("gate");
        let body = format!(
            "echo run >> '{}'\nwhile [ ! -f '{}' ]; do sleep 0.05; done\nexit 0",
            count_file.display(),
            gate_file.display()
        );
        let runner = runner(stub_tool(dir.path(), &body));
        let first_request = request(dir.path());

        let first = runner.convert(first_request.clone());
        let snapshot = runner.snapshot();
        assert!(snapshot.converting);
        assert_eq!(snapshot.active_request, Some(first_request));
        assert_eq!(snapshot.status_line(), "Converting...");

        let mut second = runner.convert(request(dir.path()));
        assert_eq!(second.try_outcome(), Some(ConversionOutcome::Busy));

        fs::write(&gate_file, b"").expect("Failed to open gate");
        assert_eq!(first.await, ConversionOutcome::Success);

        let runs = fs::read_to_string(&count_file).expect("Stub never ran");
        assert_eq!(runs.lines().count(), 1);
        assert_eq!(runner.snapshot().completed, 1);
    }

    #[tokio::test]
    async fn test_runner_is_idle_again_after_failure() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let flag_file = dir.path().join("failed-once");
        // Fails the first time, succeeds afterwards
        let body = format!(
            "if [ -f '{flag}' ]; then exit 0; fi\ntouch '{flag}'\nprintf 'first run fails' >&2\nexit 1",
            flag = flag_file.display()
        );
        let runner = runner(stub_tool(dir.path(), &body));

        let first = runner.convert(request(dir.path())).await;
        assert_eq!(first, ConversionOutcome::ToolFailed("first run fails".to_string()));
        assert!(!runner.snapshot().converting);

        let second = runner.convert(request(dir.path())).await;
        assert_eq!(second, ConversionOutcome::Success);
        assert_eq!(runner.snapshot().completed, 2);
    }

    #[tokio::test]
    async fn test_empty_paths_never_spawn() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        // A missing tool would report ToolNotFound if anything were spawned
        let runner = runner(FfmpegTool::new(dir.path().join("not-installed")));

        let outcome = runner
            .convert(ConversionRequest::new("", dir.path().join("out.gif"), ConversionSettings::default()))
            .await;
        assert_eq!(outcome, ConversionOutcome::MissingInput(RequestField::Source));

        let outcome = runner
            .convert(ConversionRequest::new(dir.path().join("in.webm"), "", ConversionSettings::default()))
            .await;
        assert_eq!(outcome, ConversionOutcome::MissingInput(RequestField::Destination));

        let snapshot = runner.snapshot();
        assert!(!snapshot.converting);
        assert_eq!(snapshot.completed, 0);
        assert!(snapshot.last_outcome.is_none());
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_before_spawning() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source = dir.path().join("input.webm");
        fs::write(&source, b"video").expect("Failed to write source");
        let runner = ConversionRunner::new(
            FfmpegTool::new(dir.path().join("not-installed")),
            RangePolicy::Reject,
            Handle::current(),
        );

        let mut settings = ConversionSettings::default();
        settings.frame_rate = 60;
        let outcome = runner
            .convert(ConversionRequest::new(&source, dir.path().join("out.gif"), settings))
            .await;

        match outcome {
            ConversionOutcome::InvalidParameter(message) => assert!(message.contains("frame rate")),
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_polling_ticket_from_event_loop() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let runner = runner(stub_tool(dir.path(), "sleep 0.2\nexit 0"));

        let mut ticket = runner.convert(request(dir.path()));
        let mut frames = 0;
        let outcome = loop {
            if let Some(outcome) = ticket.try_outcome() {
                break outcome;
            }
            frames += 1;
            assert!(frames < 500, "Conversion never finished");
            tokio::time::sleep(Duration::from_millis(20)).await;
        };

        assert_eq!(outcome, ConversionOutcome::Success);
        assert!(!runner.snapshot().converting);
    }
}
