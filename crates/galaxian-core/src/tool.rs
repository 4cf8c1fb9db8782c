use crate::prereq::command_exists;
use crate::{combined_output, CoreError};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// The external per-project build system.
///
/// Implementations receive an explicit absolute working directory instead of
/// relying on the process-wide current directory, so a failing unit can
/// never leave the process somewhere unexpected.
pub trait BuildTool: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    /// Build the project in `workdir` for `target`.
    fn build(&self, workdir: &Path, target: &str) -> Result<(), CoreError>;

    /// Install the build output from `workdir` into the staging `prefix`.
    fn install(&self, workdir: &Path, target: &str, prefix: &Path) -> Result<(), CoreError>;
}

/// Name of the make binary for this host. macOS ships a BSD make as `make`;
/// the GNU one is `gmake` there.
pub fn make_program() -> &'static str {
    if cfg!(target_os = "macos") {
        "gmake"
    } else {
        "make"
    }
}

/// Real backend: `make release TP=<target>` then
/// `make install TP=<target> PREFIX=<prefix>`.
pub struct Make;

impl Make {
    fn run(workdir: &Path, args: &[String]) -> Result<(), CoreError> {
        debug!(
            "{} {} (in {})",
            make_program(),
            args.join(" "),
            workdir.display()
        );
        let output = Command::new(make_program())
            .args(args)
            .current_dir(workdir)
            .output()?;
        if !output.status.success() {
            return Err(CoreError::ToolFailed {
                tool: make_program().to_owned(),
                status: output.status.to_string(),
                output: combined_output(&output),
            });
        }
        Ok(())
    }
}

impl BuildTool for Make {
    fn name(&self) -> &str {
        "make"
    }

    fn available(&self) -> bool {
        command_exists(make_program())
    }

    fn build(&self, workdir: &Path, target: &str) -> Result<(), CoreError> {
        Make::run(workdir, &["release".to_owned(), format!("TP={target}")])
    }

    fn install(&self, workdir: &Path, target: &str, prefix: &Path) -> Result<(), CoreError> {
        Make::run(
            workdir,
            &[
                "install".to_owned(),
                format!("TP={target}"),
                format!("PREFIX={}", prefix.display()),
            ],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAction {
    Build,
    Install,
}

/// One recorded mock invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub action: ToolAction,
    pub workdir: PathBuf,
    pub target: String,
    pub prefix: Option<PathBuf>,
}

/// Records invocations instead of spawning anything. Selectable from the
/// CLI for dry pipeline runs; tests keep a handle on the call log.
#[derive(Default, Clone)]
pub struct MockTool {
    calls: Arc<Mutex<Vec<ToolCall>>>,
    fail_on: Option<ToolAction>,
}

impl MockTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that fails every invocation of `action`.
    pub fn failing(action: ToolAction) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: Some(action),
        }
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ToolCall) -> Result<(), CoreError> {
        let action = call.action;
        self.calls.lock().unwrap().push(call);
        if self.fail_on == Some(action) {
            return Err(CoreError::ToolFailed {
                tool: "mock".to_owned(),
                status: "exit status: 2".to_owned(),
                output: format!("mock tool failing {action:?} on request"),
            });
        }
        Ok(())
    }
}

impl BuildTool for MockTool {
    fn name(&self) -> &str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn build(&self, workdir: &Path, target: &str) -> Result<(), CoreError> {
        self.record(ToolCall {
            action: ToolAction::Build,
            workdir: workdir.to_path_buf(),
            target: target.to_owned(),
            prefix: None,
        })
    }

    fn install(&self, workdir: &Path, target: &str, prefix: &Path) -> Result<(), CoreError> {
        self.record(ToolCall {
            action: ToolAction::Install,
            workdir: workdir.to_path_buf(),
            target: target.to_owned(),
            prefix: Some(prefix.to_path_buf()),
        })
    }
}

pub fn select_tool(name: &str) -> Result<Box<dyn BuildTool>, CoreError> {
    match name {
        "make" => Ok(Box::new(Make)),
        "mock" => Ok(Box::new(MockTool::new())),
        other => Err(CoreError::NoSuchTool(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_valid_tools() {
        assert!(select_tool("make").is_ok());
        assert!(select_tool("mock").is_ok());
    }

    #[test]
    fn select_invalid_tool_fails() {
        assert!(select_tool("ninja").is_err());
    }

    #[test]
    fn mock_records_build_and_install() {
        let mock = MockTool::new();
        mock.build(Path::new("/work"), "GBA").unwrap();
        mock.install(Path::new("/work"), "GBA", Path::new("/pkg/opt/aq/xpdevel/agb"))
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].action, ToolAction::Build);
        assert_eq!(calls[0].prefix, None);
        assert_eq!(calls[1].action, ToolAction::Install);
        assert_eq!(
            calls[1].prefix.as_deref(),
            Some(Path::new("/pkg/opt/aq/xpdevel/agb"))
        );
    }

    #[test]
    fn failing_mock_still_records_the_call() {
        let mock = MockTool::failing(ToolAction::Install);
        mock.build(Path::new("/w"), "DOS").unwrap();
        let err = mock.install(Path::new("/w"), "DOS", Path::new("/p")).unwrap_err();
        assert!(matches!(err, CoreError::ToolFailed { .. }));
        assert_eq!(mock.calls().len(), 2);
    }
}
