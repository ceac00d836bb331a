//! Stage command implementation.

use docsync_core::{AttachmentStager, StagedAttachment, StagingConfig};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Declared metadata and staging location for one file.
#[derive(Debug, Clone, Default)]
pub struct StageOptions {
    /// Declared content type.
    pub content_type: String,
    /// Declared encoding name.
    pub encoding: Option<String>,
    /// Declared decoded length.
    pub length: Option<u64>,
    /// Declared encoded length.
    pub encoded_length: Option<u64>,
    /// Staging directory.
    pub staging_dir: Option<PathBuf>,
}

/// Staging summary.
#[derive(Debug, Serialize)]
pub struct StageResult {
    /// Staging id.
    pub staging_id: String,
    /// Declared content type.
    pub content_type: String,
    /// Resolved encoding.
    pub encoding: String,
    /// Declared decoded length.
    pub length: u64,
    /// Declared encoded length.
    pub encoded_length: u64,
    /// Bytes held in temporary storage.
    pub stored_length: u64,
    /// SHA-256 of the stored bytes.
    pub digest: String,
    /// Length check outcome; `None` when it passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the stage command.
pub fn run(
    path: &Path,
    options: &StageOptions,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let staged = stage_file(path, options)?;
    let result = summarize(&staged);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_result(&result),
    }

    match result.error {
        None => Ok(()),
        Some(error) => Err(error.into()),
    }
}

/// Stages `path` with the declared metadata.
pub fn stage_file(
    path: &Path,
    options: &StageOptions,
) -> Result<StagedAttachment, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let length = options.length.unwrap_or(size);
    let encoded_length = options.encoded_length.unwrap_or(length);

    let config = match &options.staging_dir {
        Some(dir) => StagingConfig::new().with_directory(dir),
        None => StagingConfig::new(),
    };
    let stager = AttachmentStager::new(config);
    Ok(stager.stage_named(
        BufReader::new(file),
        &options.content_type,
        options.encoding.as_deref(),
        length,
        encoded_length,
    )?)
}

fn summarize(staged: &StagedAttachment) -> StageResult {
    let metadata = staged.metadata();
    StageResult {
        staging_id: staged.staging_id().to_string(),
        content_type: metadata.content_type().to_string(),
        encoding: metadata.encoding().to_string(),
        length: metadata.length(),
        encoded_length: metadata.encoded_length(),
        stored_length: staged.stored_length(),
        digest: staged.digest_hex(),
        error: staged.verify().err().map(|e| e.to_string()),
    }
}

fn print_result(result: &StageResult) {
    println!("Staging id:      {}", result.staging_id);
    println!("Content type:    {}", result.content_type);
    println!("Encoding:        {}", result.encoding);
    println!("Length:          {}", result.length);
    println!("Encoded length:  {}", result.encoded_length);
    println!("Stored length:   {}", result.stored_length);
    println!("SHA-256:         {}", result.digest);
    println!();
    match &result.error {
        None => println!("✓ Length check passed"),
        Some(error) => println!("✗ {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_with(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn defaults_to_file_size() {
        let file = file_with(b"hello world");
        let dir = tempfile::tempdir().unwrap();
        let options = StageOptions {
            content_type: "text/plain".into(),
            staging_dir: Some(dir.path().to_path_buf()),
            ..StageOptions::default()
        };
        let staged = stage_file(file.path(), &options).unwrap();
        let result = summarize(&staged);
        assert_eq!(result.stored_length, 11);
        assert_eq!(result.encoding, "identity");
        assert!(result.error.is_none());
    }

    #[test]
    fn reports_length_mismatch() {
        let file = file_with(b"abc");
        let options = StageOptions {
            content_type: "text/plain".into(),
            encoding: Some("gzip".into()),
            length: Some(10),
            encoded_length: Some(7),
            ..StageOptions::default()
        };
        let staged = stage_file(file.path(), &options).unwrap();
        assert!(summarize(&staged).error.is_some());
        assert!(run(file.path(), &options, "json").is_err());
    }

    #[test]
    fn rejects_unknown_encoding() {
        let file = file_with(b"abc");
        let options = StageOptions {
            content_type: "text/plain".into(),
            encoding: Some("zstd".into()),
            ..StageOptions::default()
        };
        assert!(stage_file(file.path(), &options).is_err());
    }
}
