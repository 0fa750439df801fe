//! Save decoder boundary.
//!
//! The binary save format is decoded by an external collaborator. This
//! module defines the async [`SaveDecoder`] seam and two implementations:
//! one for inputs that already hold the decoder's JSON output, and one that
//! drives an external decoder program over stdin/stdout.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::error::{CareerSaveError, Result};

/// Decoder format version used for current career saves.
pub const DEFAULT_FORMAT_VERSION: u32 = 21;

/// Turns raw save bytes into decoder JSON.
///
/// The returned value is either one table set or an array of table sets;
/// shape checking happens in [`crate::models::DecodedOutput::from_json`].
/// Decoding exposes no cancellation hook, so callers wanting a deadline race
/// the returned future against a timer.
#[async_trait]
pub trait SaveDecoder: Send + Sync {
    /// Decodes `raw` using the given format version.
    async fn decode(&self, raw: &[u8], format_version: u32) -> Result<Value>;

    /// Human-readable decoder name for logs.
    fn name(&self) -> &str;
}

/// Reads input that is already decoder JSON output.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDumpDecoder;

#[async_trait]
impl SaveDecoder for JsonDumpDecoder {
    async fn decode(&self, raw: &[u8], format_version: u32) -> Result<Value> {
        tracing::debug!(
            "Reading {} bytes of decoder JSON (format version {} ignored)",
            raw.len(),
            format_version
        );
        serde_json::from_slice(raw)
            .map_err(|e| CareerSaveError::decode_failed("Input is not valid decoder JSON", e))
    }

    fn name(&self) -> &str {
        "json-dump"
    }
}

/// Non-zero exit of an external decoder process.
#[derive(Debug, Error)]
#[error("decoder exited with {status}: {stderr}")]
pub struct DecoderExit {
    /// Exit status of the decoder process
    pub status: std::process::ExitStatus,
    /// Captured standard error, trimmed
    pub stderr: String,
}

/// Runs an external decoder program.
///
/// The raw save bytes are written to the program's stdin, the format version
/// is passed as `--format-version <n>`, and stdout must hold the JSON result.
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    program: PathBuf,
    args: Vec<String>,
    label: String,
}

impl CommandDecoder {
    /// Creates a decoder for `program` with leading arguments.
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        let label = program.display().to_string();
        Self {
            program,
            args: args.into_iter().map(Into::into).collect(),
            label,
        }
    }

    /// Parses a whitespace-separated command line such as `node decode.js`.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CareerSaveError::configuration("Decoder command is empty"))?;
        Ok(Self::new(program, parts))
    }
}

#[async_trait]
impl SaveDecoder for CommandDecoder {
    async fn decode(&self, raw: &[u8], format_version: u32) -> Result<Value> {
        tracing::debug!(
            "Spawning decoder {} (format version {})",
            self.label,
            format_version
        );

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg("--format-version")
            .arg(format_version.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CareerSaveError::decode_failed(format!("Failed to start decoder {}", self.label), e)
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            CareerSaveError::configuration("Decoder process has no stdin handle")
        })?;

        // Feed stdin while collecting output so a chatty decoder cannot block on a full pipe.
        let writer = async move {
            stdin.write_all(raw).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(writer, child.wait_with_output());

        let output = output.map_err(|e| {
            CareerSaveError::decode_failed(format!("Decoder {} did not complete", self.label), e)
        })?;

        if !output.status.success() {
            return Err(CareerSaveError::decode_failed(
                format!("Decoder {} failed", self.label),
                DecoderExit {
                    status: output.status,
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                },
            ));
        }

        if let Err(e) = written {
            tracing::warn!("Decoder {} closed stdin early: {}", self.label, e);
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            CareerSaveError::decode_failed(
                format!("Decoder {} produced invalid JSON", self.label),
                e,
            )
        })
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Creates the decoder for an optional external command.
///
/// Without a command the input is treated as decoder JSON output.
pub fn create_decoder(command: Option<&str>) -> Result<Box<dyn SaveDecoder>> {
    match command.map(str::trim).filter(|c| !c.is_empty()) {
        Some(command) => Ok(Box::new(CommandDecoder::from_command_line(command)?)),
        None => Ok(Box::new(JsonDumpDecoder)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_json_dump_decoder() {
        let value = JsonDumpDecoder
            .decode(br#"[{"players": []}]"#, DEFAULT_FORMAT_VERSION)
            .await
            .unwrap();
        assert_eq!(value, json!([{"players": []}]));
    }

    #[tokio::test]
    async fn test_json_dump_decoder_rejects_binary() {
        let err = JsonDumpDecoder
            .decode(&[0x00, 0xFF, 0x10], DEFAULT_FORMAT_VERSION)
            .await
            .unwrap_err();
        assert!(matches!(err, CareerSaveError::Decode { .. }));
        assert!(err.is_decode_stage());
    }

    #[test]
    fn test_command_line_parsing() {
        let decoder = CommandDecoder::from_command_line("node  parse.js --quiet").unwrap();
        assert_eq!(decoder.name(), "node");
        assert_eq!(decoder.args, vec!["parse.js", "--quiet"]);

        assert!(CommandDecoder::from_command_line("   ").is_err());
    }

    #[test]
    fn test_create_decoder_defaults_to_json_dump() {
        assert_eq!(create_decoder(None).unwrap().name(), "json-dump");
        assert_eq!(create_decoder(Some("  ")).unwrap().name(), "json-dump");
        assert_eq!(create_decoder(Some("sh -c cat")).unwrap().name(), "sh");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_decoder_pipes_stdin_to_stdout() {
        let decoder = CommandDecoder::new("sh", ["-c", "cat", "decoder"]);
        let value = decoder
            .decode(br#"{"career_users": [{"userid": 1}]}"#, 21)
            .await
            .unwrap();
        assert_eq!(value, json!({"career_users": [{"userid": 1}]}));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_decoder_receives_format_version() {
        let decoder = CommandDecoder::new("sh", ["-c", r#"printf '{"version": %s}' "$2""#, "decoder"]);
        let value = decoder.decode(b"", 21).await.unwrap();
        assert_eq!(value, json!({"version": 21}));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_decoder_nonzero_exit() {
        let decoder = CommandDecoder::new("sh", ["-c", "echo unsupported save >&2; exit 3", "decoder"]);
        let err = decoder.decode(b"raw", 21).await.unwrap_err();

        assert!(matches!(err, CareerSaveError::Decode { .. }));
        let source = std::error::Error::source(&err).map(ToString::to_string).unwrap();
        assert!(source.contains("unsupported save"));
    }

    #[tokio::test]
    async fn test_command_decoder_missing_program() {
        let decoder = CommandDecoder::new("/nonexistent/careersave-decoder", Vec::<String>::new());
        let err = decoder.decode(b"raw", 21).await.unwrap_err();
        assert!(err.to_string().contains("Failed to start decoder"));
    }
}
