//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::OpenPage { .. } => "open_page",
        BackendCommand::OpenFavorites { .. } => "open_favorites",
        BackendCommand::Search { .. } => "search",
        BackendCommand::FetchThumb { .. } => "fetch_thumb",
        BackendCommand::FetchContent { .. } => "fetch_content",
        BackendCommand::UploadFiles { .. } => "upload_files",
        BackendCommand::ToggleFavorite { .. } => "toggle_favorite",
        BackendCommand::CreateFolder { .. } => "create_folder",
        BackendCommand::DeleteItem { .. } => "delete_item",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
        }
    }
}
