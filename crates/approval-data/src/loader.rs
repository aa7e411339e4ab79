//! Loading detection requests from disk.
//!
//! A path may point at a single request object, a JSON array of requests,
//! or a directory of `*.json` files (each holding either form).

use std::path::{Path, PathBuf};

use eyre::{Context, Result};

use crate::types::DetectionRequest;

/// Load every detection request reachable from `path`.
///
/// Directory entries are read in file-name order so output is stable
/// across runs. Non-`.json` files in a directory are ignored.
///
/// # Errors
/// Returns an error naming the offending file if it cannot be read or does
/// not contain a request (or array of requests).
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub async fn load_requests(path: &Path) -> Result<Vec<DetectionRequest>> {
    let metadata = tokio::fs::metadata(path)
        .await
        .wrap_err_with(|| format!("failed to stat {}", path.display()))?;

    if !metadata.is_dir() {
        return load_file(path).await;
    }

    let mut files: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(path)
        .await
        .wrap_err_with(|| format!("failed to read directory {}", path.display()))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .wrap_err_with(|| format!("failed to list directory {}", path.display()))?
    {
        let entry_path = entry.path();
        if entry_path.extension().is_some_and(|ext| ext == "json") {
            files.push(entry_path);
        }
    }
    files.sort();

    tracing::debug!(files = files.len(), "loading request directory");

    let mut requests = Vec::new();
    for file in &files {
        requests.extend(load_file(file).await?);
    }
    Ok(requests)
}

async fn load_file(path: &Path) -> Result<Vec<DetectionRequest>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    parse_requests(&raw).wrap_err_with(|| format!("invalid detection request in {}", path.display()))
}

/// Parse a request object or an array of request objects.
pub fn parse_requests(raw: &str) -> Result<Vec<DetectionRequest>> {
    let value: serde_json::Value =
        serde_json::from_str(raw).wrap_err("request is not valid JSON")?;

    if value.is_array() {
        serde_json::from_value(value).wrap_err("failed to decode request array")
    } else {
        let request: DetectionRequest =
            serde_json::from_value(value).wrap_err("failed to decode request")?;
        Ok(vec![request])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
        "chainId": 1,
        "hash": "0xaaa",
        "trace": {"from": "0x123", "to": "0x456", "calls": [], "logs": []}
    }"#;

    #[test]
    fn parse_single_and_array() {
        assert_eq!(parse_requests(REQUEST).unwrap().len(), 1);

        let array = format!("[{REQUEST},{REQUEST}]");
        assert_eq!(parse_requests(&array).unwrap().len(), 2);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_requests("not json").is_err());
        assert!(parse_requests(r#"{"hash": "0x1"}"#).is_err());
    }

    #[test]
    fn parse_accepts_creation_frames() {
        let raw = r#"{"chainId":1,"hash":"0x1","trace":{"from":"0x1","to":"0x2","calls":[{"from":"0x2","type":"CREATE","input":"0x"}],"logs":[]}}"#;

        let requests = parse_requests(raw).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].trace.calls[0].to, "");
    }

    #[tokio::test]
    async fn load_directory_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let second = REQUEST.replace("0xaaa", "0xbbb");
        tokio::fs::write(dir.path().join("b.json"), second).await.unwrap();
        tokio::fs::write(dir.path().join("a.json"), REQUEST).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "ignored").await.unwrap();

        let requests = load_requests(dir.path()).await.unwrap();
        let hashes: Vec<&str> = requests.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, vec!["0xaaa", "0xbbb"]);
    }

    #[tokio::test]
    async fn load_missing_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_requests(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("missing.json"));
    }
}
