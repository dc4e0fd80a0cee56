use std::io::Cursor;

use google_drive3::{api::File, api::Scope, DriveHub};
use tokio::runtime::Runtime;

use super::repository::{FileStorage, StorageError, StoredFile};

/// Stores assignment uploads in a Google Drive folder.
///
/// The generated google-drive3 client is async; uploads are driven on a private runtime so the
/// storage seam stays synchronous. Call it from blocking contexts only.
pub struct GoogleDriveStorage<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    hub: DriveHub<C>,
    runtime: Runtime,
    folder_id: Option<String>,
}

impl<C> GoogleDriveStorage<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    pub fn new(hub: DriveHub<C>, runtime: Runtime, folder_id: Option<String>) -> Self {
        Self {
            hub,
            runtime,
            folder_id,
        }
    }

    pub fn with_runtime(hub: DriveHub<C>, folder_id: Option<String>) -> Result<Self, StorageError> {
        let runtime = Runtime::new().map_err(|err| StorageError::Unavailable(err.to_string()))?;
        Ok(Self::new(hub, runtime, folder_id))
    }
}

impl<C> std::fmt::Debug for GoogleDriveStorage<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveStorage")
            .field("folder_id", &self.folder_id)
            .finish_non_exhaustive()
    }
}

/// Drive has no directories in names; `trainees/t1/notes.pdf` becomes `trainees_t1_notes.pdf`.
pub(crate) fn drive_file_name(path: &str) -> String {
    path.trim_matches('/').replace('/', "_")
}

pub(crate) fn upload_mime(content_type: &str) -> mime::Mime {
    content_type
        .parse::<mime::Mime>()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

impl<C> FileStorage for GoogleDriveStorage<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn store(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Rejected("empty upload".to_string()));
        }

        let mime_type = upload_mime(content_type);
        let metadata = File {
            name: Some(drive_file_name(path)),
            mime_type: Some(mime_type.to_string()),
            parents: self.folder_id.as_ref().map(|folder| vec![folder.clone()]),
            ..File::default()
        };

        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .create(metadata)
                .param("fields", "id,webViewLink")
                .supports_all_drives(true)
                .add_scope(Scope::File)
                .upload(Cursor::new(bytes), mime_type)
                .await
        });

        let (_, file) = result.map_err(|err| StorageError::Unavailable(err.to_string()))?;
        let id = file.id.unwrap_or_default();
        let url = file
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{id}/view"));

        Ok(StoredFile {
            path: path.to_string(),
            url,
        })
    }
}
