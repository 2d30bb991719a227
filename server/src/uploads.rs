use anyhow::Result;
use bytes::BufMut;
use futures::{TryFutureExt, TryStreamExt};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use warp::multipart::{FormData, Part};

use crate::error::ApiError;

/// Multipart form, fully buffered in memory.
#[derive(Debug, Default)]
pub struct Upload {
    parts: HashMap<String, Vec<u8>>,
}

impl Upload {
    pub async fn read(form: FormData) -> Result<Self, ApiError> {
        let parts: Vec<(String, Vec<u8>)> = form
            .and_then(|part: Part| {
                let name = part.name().to_string();
                part.stream()
                    .try_fold(Vec::new(), |mut data, buf| async move {
                        data.put(buf);
                        Ok(data)
                    })
                    .map_ok(move |data| (name, data))
            })
            .try_collect()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;

        Ok(Upload {
            parts: parts.into_iter().collect(),
        })
    }

    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// A file part decoded as UTF-8 text.
    pub fn text_file(&self, name: &str) -> Option<Result<&str, ApiError>> {
        self.file(name).map(decode_text)
    }

    pub fn required_text(&self, name: &str, missing: &'static str) -> Result<&str, ApiError> {
        self.text_file(name).ok_or(ApiError::MissingUpload(missing))?
    }

    /// A plain form field, blank values read as absent.
    pub fn field(&self, name: &str) -> Option<String> {
        self.file(name)
            .map(|data| String::from_utf8_lossy(data).trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

pub fn decode_text(data: &[u8]) -> Result<&str, ApiError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ApiError::BadRequest(format!("File is not valid UTF-8 text: {}", e)))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Write an upload under `dir` with a unique name. The file is left on disk.
pub fn persist(dir: &Path, prefix: &str, suffix: &str, data: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    let path = tmp.into_temp_path().keep()?;
    Ok(path)
}

#[cfg(test)]
impl Upload {
    pub(crate) fn from_parts(parts: &[(&str, &[u8])]) -> Self {
        Upload {
            parts: parts
                .iter()
                .map(|(name, data)| (name.to_string(), data.to_vec()))
                .collect(),
        }
    }
}
