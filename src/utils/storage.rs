use crate::utils::forms::UploadedFile;
use chrono::{DateTime, Datelike, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// What an upload is for; decides the directory it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Documents,
    Announcements,
    Permissions,
    MedicalLeaves,
}

impl Purpose {
    fn dir(&self) -> &'static str {
        match self {
            Purpose::Documents => "documents",
            Purpose::Announcements => "announcements",
            Purpose::Permissions => "permissions",
            Purpose::MedicalLeaves => "medical_leaves",
        }
    }
}

/// Uploaded files on local disk, laid out as `<root>/<purpose>/<YYYY>/<MM>/<file>`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn relative_path(purpose: Purpose, filename: &str, now: DateTime<Utc>) -> String {
        let tag = Uuid::new_v4().to_string().replace('-', "");
        format!(
            "{}/{:04}/{:02}/{}_{}",
            purpose.dir(),
            now.year(),
            now.month(),
            &tag[..12],
            sanitize_filename(filename)
        )
    }

    /// Writes the file and returns its path relative to the media root.
    pub async fn save(&self, purpose: Purpose, file: &UploadedFile) -> std::io::Result<String> {
        let relative = Self::relative_path(purpose, &file.filename, Utc::now());
        let full = self.root.join(&relative);

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut out = tokio::fs::File::create(&full).await?;
        out.write_all(&file.bytes).await?;
        out.flush().await?;

        tracing::debug!(path = %relative, bytes = file.bytes.len(), "Stored upload");
        Ok(relative)
    }

    /// Deletes a stored upload. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> std::io::Result<()> {
        let Some(full) = self.resolve(relative) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a media path: {}", relative),
            ));
        };

        match tokio::fs::remove_file(&full).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => {
                tracing::debug!(path = %relative, "Removed upload");
                Ok(())
            }
        }
    }

    /// Removes an upload nothing will reference; failures are only logged.
    pub async fn discard(&self, relative: Option<&str>) {
        if let Some(relative) = relative {
            if let Err(e) = self.remove(relative).await {
                tracing::warn!(error = %e, path = %relative, "Failed to remove orphaned upload");
            }
        }
    }

    /// Passes `result` through, discarding `stored` first when it is an error.
    pub async fn keep_if_ok<T, E>(&self, stored: Option<&str>, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            self.discard(stored).await;
        }
        result
    }

    /// Maps a stored relative path back to disk; None for anything that
    /// could step outside the media root.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path = Path::new(relative);
        if relative.is_empty() || !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(path))
    }

    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative)
    }
}

pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .skip_while(|c| *c == '.')
        .take(100)
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Content type from the file extension, for serving stored files back.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn relative_paths_are_namespaced_by_purpose_and_month() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 10, 0, 0).unwrap();
        let path = MediaStore::relative_path(Purpose::MedicalLeaves, "licencia 12.pdf", now);

        assert!(path.starts_with("medical_leaves/2024/03/"), "{path}");
        assert!(path.ends_with("_licencia_12.pdf"), "{path}");
    }

    #[test]
    fn filenames_lose_directories_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\informe final.docx"), "informe_final.docx");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[test]
    fn resolve_rejects_escaping_paths() {
        let store = MediaStore::new("/srv/media", "/media/");
        assert!(store.resolve("../secret").is_none());
        assert!(store.resolve("/etc/passwd").is_none());
        assert!(store.resolve("./documents/a.pdf").is_none());
        assert_eq!(
            store.resolve("documents/2024/03/a.pdf"),
            Some(PathBuf::from("/srv/media/documents/2024/03/a.pdf"))
        );
        assert_eq!(store.url("documents/a.pdf"), "/media/documents/a.pdf");
    }

    #[actix_web::test]
    async fn save_writes_under_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "/media");
        let file = UploadedFile {
            filename: "acta.pdf".into(),
            bytes: b"%PDF-1.4 test".to_vec(),
        };

        let relative = store.save(Purpose::Documents, &file).await.unwrap();
        let full = store.resolve(&relative).unwrap();

        assert_eq!(std::fs::read(full).unwrap(), b"%PDF-1.4 test");
    }

    #[actix_web::test]
    async fn failed_writes_discard_the_stored_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "/media");
        let file = UploadedFile {
            filename: "licencia.pdf".into(),
            bytes: b"%PDF-1.4".to_vec(),
        };

        let kept = store.save(Purpose::MedicalLeaves, &file).await.unwrap();
        let ok: Result<u64, &str> = store.keep_if_ok(Some(kept.as_str()), Ok(7)).await;
        assert_eq!(ok, Ok(7));
        assert!(store.resolve(&kept).unwrap().exists());

        let orphan = store.save(Purpose::MedicalLeaves, &file).await.unwrap();
        let failed: Result<u64, &str> = store.keep_if_ok(Some(orphan.as_str()), Err("duplicate folio")).await;
        assert_eq!(failed, Err("duplicate folio"));
        assert!(!store.resolve(&orphan).unwrap().exists());
    }

    #[actix_web::test]
    async fn remove_tolerates_missing_files_but_not_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "/media");

        assert!(store.remove("permissions/2024/03/gone.pdf").await.is_ok());
        assert!(store.remove("../outside.pdf").await.is_err());
        store.discard(None).await;
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for(Path::new("a/b.PDF")), "application/pdf");
        assert_eq!(content_type_for(Path::new("a/b")), "application/octet-stream");
    }
}
