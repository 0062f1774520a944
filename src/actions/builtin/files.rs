use async_trait::async_trait;

use crate::actions::handler::arg;
use crate::actions::ActionHandler;

/// `read_file(path)`: the whole file as text.
pub struct ReadFile;

#[async_trait]
impl ActionHandler for ReadFile {
    async fn call(&self, args: &[String]) -> Result<String, String> {
        tokio::fs::read_to_string(arg(args, 0)?)
            .await
            .map_err(|e| format!("Error reading file: {e}"))
    }
}

/// `write_file(path, data)`: replaces the file's contents.
pub struct WriteFile;

#[async_trait]
impl ActionHandler for WriteFile {
    async fn call(&self, args: &[String]) -> Result<String, String> {
        let (path, data) = (arg(args, 0)?, arg(args, 1)?);
        tokio::fs::write(path, data)
            .await
            .map_err(|e| format!("Error writing file: {e}"))?;
        Ok(format!("Wrote {} bytes to {path}", data.len()))
    }
}
