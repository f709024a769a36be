use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// The human in the loop for interactive browser sessions.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Show `prompt` and block until the operator signals they are done.
    ///
    /// Returns false when no signal can ever arrive (input closed).
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Operator answering by pressing Enter on a line-based input.
pub struct LineOperator<R> {
    input: Mutex<R>,
}

pub type ConsoleOperator = LineOperator<BufReader<Stdin>>;

impl ConsoleOperator {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineOperator<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

#[async_trait]
impl<R> Operator for LineOperator<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&self, prompt: &str) -> bool {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match self.input.lock().await.read_line(&mut line).await {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Failed to read operator input: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_confirm_on_enter() {
        let input = tokio_test::io::Builder::new().read(b"\n").build();
        let operator = LineOperator::new(BufReader::new(input));
        assert!(operator.confirm("Press Enter when done: ").await);
    }

    #[tokio::test]
    async fn test_confirm_consumes_one_line_per_call() {
        let input = tokio_test::io::Builder::new()
            .read(b"done\n")
            .read(b"\n")
            .build();
        let operator = LineOperator::new(BufReader::new(input));
        assert!(operator.confirm("first: ").await);
        assert!(operator.confirm("second: ").await);
        assert!(!operator.confirm("third: ").await);
    }

    #[tokio::test]
    async fn test_closed_input_does_not_confirm() {
        let input = tokio_test::io::Builder::new().build();
        let operator = LineOperator::new(BufReader::new(input));
        assert!(!operator.confirm("Press Enter: ").await);
    }
}
