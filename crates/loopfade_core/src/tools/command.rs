//! Configurable tool invocations.

use std::ffi::OsString;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::errors::Stage;

/// An executable plus the leading arguments it always receives.
///
/// ```toml
/// [tools.decoder]
/// program = "cargo"
/// args = ["run", "-qr", "--manifest-path", "tools/organism/Cargo.toml", "--"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Program name or path.
    pub program: String,
    /// Arguments placed before the per-invocation ones.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    /// A tool invoked by name with no leading arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add leading arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Bind this tool to a pipeline stage with the invocation's own arguments.
    pub fn invoke<I, S>(&self, stage: Stage, args: I) -> StageCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut all_args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        all_args.extend(args.into_iter().map(Into::into));
        StageCommand {
            stage,
            program: self.program.clone(),
            args: all_args,
        }
    }
}

/// A fully-resolved command for one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    /// Which side of the pipeline this is.
    pub stage: Stage,
    /// Program to execute.
    pub program: String,
    /// Complete argument list. Paths are passed through unchanged.
    pub args: Vec<OsString>,
}

impl StageCommand {
    /// Build a tokio command. Standard streams are left to the caller.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        cmd
    }

    /// Shell-like rendering for log output.
    pub fn display(&self) -> String {
        let mut parts = vec![quote(&self.program)];
        parts.extend(self.args.iter().map(|a| quote(&a.to_string_lossy())));
        parts.join(" ")
    }
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        format!("'{}'", arg)
    } else {
        arg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_appends_after_leading_args() {
        let tool = ToolCommand::new("cargo").with_args(["run", "-qr", "--"]);
        let cmd = tool.invoke(Stage::Decoder, vec!["a.org".into(), "3".into()] as Vec<OsString>);
        assert_eq!(cmd.program, "cargo");
        assert_eq!(cmd.args, vec!["run", "-qr", "--", "a.org", "3"]);
        assert_eq!(cmd.stage, Stage::Decoder);
    }

    #[test]
    fn display_quotes_spaces() {
        let cmd = ToolCommand::new("ffmpeg").invoke(
            Stage::Encoder,
            vec!["-metadata".into(), "title=Mimiga Town".into()] as Vec<OsString>,
        );
        assert_eq!(cmd.display(), "ffmpeg -metadata 'title=Mimiga Town'");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_arguments_pass_through() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"/music/\xffboss.org");
        let cmd = ToolCommand::new("organism").invoke(Stage::Decoder, [name]);
        assert_eq!(cmd.args, vec![name.to_os_string()]);
        assert!(cmd.display().contains("boss.org"));
    }
}
