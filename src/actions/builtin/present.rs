use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::actions::handler::arg;
use crate::actions::ActionHandler;
use crate::events::AgentEvent;

enum Sink {
    Stdout,
    Channel(mpsc::Sender<AgentEvent>),
}

/// `present_result(result)`: hands the final answer to the user.
pub struct PresentResult {
    sink: Sink,
}

impl PresentResult {
    /// Print results on standard output.
    pub fn stdout() -> Self {
        Self { sink: Sink::Stdout }
    }

    /// Deliver results as [`AgentEvent::Presented`].
    pub fn channel(tx: mpsc::Sender<AgentEvent>) -> Self {
        Self {
            sink: Sink::Channel(tx),
        }
    }
}

#[async_trait]
impl ActionHandler for PresentResult {
    async fn call(&self, args: &[String]) -> Result<String, String> {
        let content = arg(args, 0)?;
        match &self.sink {
            Sink::Stdout => {
                let mut stdout = tokio::io::stdout();
                stdout
                    .write_all(format!("{content}\n").as_bytes())
                    .await
                    .map_err(|e| format!("Error presenting result: {e}"))?;
                stdout
                    .flush()
                    .await
                    .map_err(|e| format!("Error presenting result: {e}"))?;
            }
            Sink::Channel(tx) => {
                tx.send(AgentEvent::Presented {
                    content: content.to_string(),
                })
                .await
                .map_err(|_| "Error presenting result: receiver closed".to_string())?;
            }
        }
        Ok("Result presented to the user.".into())
    }
}
