//! Worker thread owning the tokio runtime and the gallery client. Commands
//! arrive over the bounded crossbeam channel; results and upload progress go
//! back to the shell as [`UiEvent`]s.

use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use gallery_core::{GalleryClient, GalleryEvent, GalleryHandle, UploadFile};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::media;

pub fn launch(server_url: String, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let client = match GalleryClient::new(&server_url) {
                Ok(client) => client,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err:#}"),
                    )));
                    tracing::error!("failed to build gallery client: {err:#}");
                    return;
                }
            };
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            let mut events = client.subscribe_events();
            let ui_tx_events = ui_tx.clone();
            tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    let evt = match event {
                        GalleryEvent::UploadStarted { submitted } => {
                            UiEvent::UploadStarted { submitted }
                        }
                        GalleryEvent::UploadProgress {
                            completed,
                            submitted,
                        } => UiEvent::UploadProgress {
                            completed,
                            submitted,
                        },
                        GalleryEvent::UploadFailed { filename, reason } => {
                            UiEvent::UploadFailed { filename, reason }
                        }
                        GalleryEvent::UploadFinished { submitted } => {
                            UiEvent::UploadFinished { submitted }
                        }
                    };
                    let _ = ui_tx_events.try_send(evt);
                }
            });

            while let Ok(cmd) = cmd_rx.recv() {
                handle_command(&client, cmd, &ui_tx).await;
            }
        });
    });
}

async fn handle_command<H: GalleryHandle>(
    client: &H,
    cmd: BackendCommand,
    ui_tx: &Sender<UiEvent>,
) {
    match cmd {
        BackendCommand::OpenPage { path } => {
            tracing::info!(path = path.as_str(), "backend: open_page");
            match client.fetch_page(&path).await {
                Ok(snapshot) => {
                    let _ = ui_tx.try_send(UiEvent::PageLoaded(snapshot));
                }
                Err(err) => {
                    tracing::error!(path = path.as_str(), "backend: open_page failed: {err:#}");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::LoadPage,
                        format!("{err:#}"),
                    )));
                }
            }
        }
        BackendCommand::OpenFavorites { path } => {
            tracing::info!(path = path.as_str(), "backend: open_favorites");
            match client.fetch_favorites(&path).await {
                Ok(snapshot) => {
                    let _ = ui_tx.try_send(UiEvent::PageLoaded(snapshot));
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::LoadPage,
                        format!("{err:#}"),
                    )));
                }
            }
        }
        BackendCommand::Search { path, keyword } => {
            tracing::info!(path = path.as_str(), keyword = keyword.as_str(), "backend: search");
            match client.search(&path, &keyword).await {
                Ok(snapshot) => {
                    let _ = ui_tx.try_send(UiEvent::PageLoaded(snapshot));
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::LoadPage,
                        format!("{err:#}"),
                    )));
                }
            }
        }
        BackendCommand::FetchThumb { href } => match client.fetch_bytes(&href).await {
            Ok(bytes) => match media::decode_preview_image(&bytes) {
                Ok(image) => {
                    let _ = ui_tx.try_send(UiEvent::ThumbLoaded { href, image });
                }
                Err(reason) => {
                    let _ = ui_tx.try_send(UiEvent::ThumbFailed { href, reason });
                }
            },
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::ThumbFailed {
                    href,
                    reason: format!("{err:#}"),
                });
            }
        },
        BackendCommand::FetchContent { href } => match client.fetch_bytes(&href).await {
            Ok(bytes) => match media::decode_preview_image(&bytes) {
                Ok(image) => {
                    let _ = ui_tx.try_send(UiEvent::ContentLoaded { href, image });
                }
                Err(reason) => {
                    let _ = ui_tx.try_send(UiEvent::ContentFailed { href, reason });
                }
            },
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::ContentFailed {
                    href,
                    reason: format!("{err:#}"),
                });
            }
        },
        BackendCommand::UploadFiles { upload_url, paths } => {
            upload_paths(client, upload_url, paths, ui_tx).await;
        }
        BackendCommand::ToggleFavorite { form, enable } => {
            tracing::info!(enable, "backend: toggle_favorite");
            match client.toggle_favorite(&form, enable).await {
                Ok(()) => {
                    let _ = ui_tx.try_send(UiEvent::FavoriteToggled { enabled: enable });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::Manage,
                        format!("{err:#}"),
                    )));
                }
            }
        }
        BackendCommand::CreateFolder { path, name } => {
            tracing::info!(path = path.as_str(), name = name.as_str(), "backend: create_folder");
            match client.create_folder(&path, &name).await {
                Ok(()) => {
                    let _ = ui_tx.try_send(UiEvent::FolderCreated { name });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::Manage,
                        format!("{err:#}"),
                    )));
                }
            }
        }
        BackendCommand::DeleteItem { path, name } => {
            tracing::info!(path = path.as_str(), name = name.as_str(), "backend: delete_item");
            match client.delete_item(&path, &name).await {
                Ok(()) => {
                    let _ = ui_tx.try_send(UiEvent::ItemDeleted { name });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::Manage,
                        format!("{err:#}"),
                    )));
                }
            }
        }
    }
}

async fn upload_paths<H: GalleryHandle>(
    client: &H,
    upload_url: String,
    paths: Vec<PathBuf>,
    ui_tx: &Sender<UiEvent>,
) {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let mime_type = mime_guess::from_path(&path).first_raw().map(str::to_string);
                files.push(UploadFile {
                    filename,
                    mime_type,
                    bytes,
                });
            }
            Err(err) => {
                // Unreadable entries are reported and excluded before the
                // batch begins, so they cannot stall it.
                let _ = ui_tx.try_send(UiEvent::UploadFailed {
                    filename,
                    reason: format!("failed to read file: {err}"),
                });
            }
        }
    }
    tracing::info!(files = files.len(), "backend: upload_files");
    if let Err(err) = client.upload_files(&upload_url, files).await {
        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
            UiErrorContext::Upload,
            format!("{err:#}"),
        )));
    }
}
