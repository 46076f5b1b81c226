// Quire - A component-based CMS built with Rust
// Copyright (C) 2025 Quire Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Validation contract for uploaded media. Storage is left to the caller.

use anyhow::{anyhow, Result};
use std::path::Path;
use uuid::Uuid;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";
const RIFF_MAGIC: &[u8] = b"RIFF";
const PDF_MAGIC: &[u8] = b"%PDF-";

const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Jpeg,
    Png,
    Gif,
    Webp,
    Pdf,
}

impl UploadKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            UploadKind::Jpeg => "image/jpeg",
            UploadKind::Png => "image/png",
            UploadKind::Gif => "image/gif",
            UploadKind::Webp => "image/webp",
            UploadKind::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            UploadKind::Jpeg => "jpg",
            UploadKind::Png => "png",
            UploadKind::Gif => "gif",
            UploadKind::Webp => "webp",
            UploadKind::Pdf => "pdf",
        }
    }

    /// Sniff the type from leading bytes, ignoring any declared type
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(JPEG_MAGIC) {
            Some(UploadKind::Jpeg)
        } else if data.starts_with(PNG_MAGIC) {
            Some(UploadKind::Png)
        } else if data.starts_with(GIF87_MAGIC) || data.starts_with(GIF89_MAGIC) {
            Some(UploadKind::Gif)
        } else if data.starts_with(RIFF_MAGIC) && data.len() >= 12 && &data[8..12] == b"WEBP" {
            Some(UploadKind::Webp)
        } else if data.starts_with(PDF_MAGIC) {
            Some(UploadKind::Pdf)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    /// Unique name to store the file under
    pub stored_name: String,
    pub original_name: String,
    pub kind: UploadKind,
    pub size: usize,
}

impl ValidatedUpload {
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }
}

const DANGEROUS_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "com", "pif", "scr", "vbs", "vbe", "js", "jar", "msi", "app", "deb",
    "rpm", "dmg", "pkg", "run", "sh", "bash", "ps1", "pl", "py", "rb", "php", "phtml", "asp",
    "aspx", "jsp", "cgi", "htm", "html", "svg", "hta", "htaccess", "reg", "ws", "wsf",
];

/// True when any extension segment, not only the last, is executable or scriptable
pub fn is_dangerous_filename(filename: &str) -> bool {
    filename
        .to_lowercase()
        .split('.')
        .skip(1)
        .any(|ext| DANGEROUS_EXTENSIONS.contains(&ext))
}

/// Strip path components and keep letters, digits, dots, dashes and underscores
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let mut cleaned: String = base
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    cleaned = cleaned.trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        return "file".to_string();
    }

    if cleaned.chars().count() > MAX_FILENAME_LEN {
        let ext = Path::new(&cleaned)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let stem: String = cleaned
            .chars()
            .take(MAX_FILENAME_LEN.saturating_sub(ext.chars().count()))
            .collect();
        cleaned = format!("{}{}", stem, ext);
    }

    cleaned
}

/// Check size, sniffed content and filename of an upload
pub fn validate_upload(filename: &str, data: &[u8], max_size: usize) -> Result<ValidatedUpload> {
    if data.is_empty() {
        return Err(anyhow!("File is empty"));
    }
    if data.len() > max_size {
        return Err(anyhow!(
            "File size exceeds maximum allowed size of {} bytes",
            max_size
        ));
    }
    if filename.contains('\0') {
        return Err(anyhow!("Filename contains null bytes"));
    }
    if is_dangerous_filename(filename) {
        return Err(anyhow!("File type not allowed"));
    }

    let kind = UploadKind::detect(data).ok_or_else(|| anyhow!("Unsupported file type"))?;

    let original_name = sanitize_filename(filename);
    let stem = Path::new(&original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("file");
    let stored_name = format!("{}-{}.{}", Uuid::new_v4().simple(), stem, kind.extension());

    Ok(ValidatedUpload {
        stored_name,
        original_name,
        kind,
        size: data.len(),
    })
}
