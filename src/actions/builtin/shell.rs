use async_trait::async_trait;
use tokio::process::Command;

use crate::actions::handler::arg;
use crate::actions::ActionHandler;

/// `run_command(cmd)`: runs through the platform shell, no timeout.
pub struct RunCommand;

fn shell(cmd: &str) -> Command {
    let (program, flag) = if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };
    let mut command = Command::new(program);
    command.arg(flag).arg(cmd);
    command
}

fn format_output(stdout: &str, stderr: &str) -> String {
    format!("stdout:\n{stdout}\n\nstderr:\n{stderr}")
}

#[async_trait]
impl ActionHandler for RunCommand {
    async fn call(&self, args: &[String]) -> Result<String, String> {
        let output = shell(arg(args, 0)?)
            .output()
            .await
            .map_err(|e| format!("Error running the command: {e}"))?;

        let text = format_output(
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        );

        if output.status.success() {
            Ok(text)
        } else {
            let code = output
                .status
                .code()
                .map_or_else(|| "none".to_string(), |c| c.to_string());
            Err(format!("{text}\n\nexit code: {code}"))
        }
    }
}
