//! Thin helpers around the ffmpeg/ffprobe command line tools.

use crate::error::{KlippError, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Run ffmpeg with the given arguments, failing on a non-zero exit.
pub async fn run_ffmpeg(args: &[&str]) -> Result<()> {
    debug!("ffmpeg {}", args.join(" "));

    let result = Command::new("ffmpeg")
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(KlippError::ToolFailed(format!("ffmpeg: {}", err.trim())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(KlippError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(KlippError::ToolFailed(format!("ffmpeg: {}", e))),
    }
}

/// Query the duration of a media file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(KlippError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(KlippError::ToolFailed(format!("ffprobe: {}", e)));
        }
    };

    if !output.status.success() {
        return Err(KlippError::ToolFailed(format!(
            "ffprobe returned error for {}",
            path.display()
        )));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|_| KlippError::ToolFailed("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| {
            KlippError::ToolFailed(format!(
                "Could not determine duration of {}",
                path.display()
            ))
        })
}

/// Quote a text value for use inside a drawtext filter.
///
/// Wraps the text in single quotes; embedded quotes are closed, escaped and
/// reopened, backslashes are doubled, and `%` is escaped so drawtext's
/// expansion sequences stay inert.
pub fn quote_drawtext(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('\'', "'\\''");
    format!("'{}'", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_drawtext_plain() {
        assert_eq!(quote_drawtext("Brand > Price"), "'Brand > Price'");
    }

    #[test]
    fn test_quote_drawtext_embedded_quote() {
        assert_eq!(quote_drawtext("it's"), "'it'\\''s'");
    }

    #[test]
    fn test_quote_drawtext_percent_and_backslash() {
        assert_eq!(quote_drawtext("50% off"), "'50\\% off'");
        assert_eq!(quote_drawtext("a\\b"), "'a\\\\b'");
    }
}
