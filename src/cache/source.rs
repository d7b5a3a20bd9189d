//! Access to source documents for preloading

use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Size and modification time of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStat {
    /// Size in bytes
    pub size: u64,
    /// Modification time, ms since epoch
    pub last_modified: i64,
}

/// Trait for source file backends
#[async_trait::async_trait]
pub trait SourceFiles: Send + Sync {
    /// Stat a source file
    async fn stat(&self, path: &str) -> io::Result<SourceStat>;

    /// Read the raw bytes of a source file
    async fn read(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Local filesystem source files
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFiles;

#[async_trait::async_trait]
impl SourceFiles for LocalFiles {
    async fn stat(&self, path: &str) -> io::Result<SourceStat> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
        }

        let last_modified = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        Ok(SourceStat {
            size: metadata.len(),
            last_modified,
        })
    }

    async fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// Markdown file extensions recognised in listings
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd", "mkdn", "mdwn", "mdtxt"];

/// Whether a path names a markdown document
pub fn is_markdown(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MARKDOWN_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
        .unwrap_or(false)
}

/// Last path component, or the whole path when there is none
pub fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// First `max_chars` characters of the content
pub fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((end, _)) => content[..end].to_string(),
        None => content.to_string(),
    }
}
