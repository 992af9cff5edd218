//! Backend commands queued from UI to backend worker.

use shared::protocol::FavoriteForm;
use std::path::PathBuf;

pub enum BackendCommand {
    OpenPage {
        path: String,
    },
    OpenFavorites {
        path: String,
    },
    Search {
        path: String,
        keyword: String,
    },
    FetchThumb {
        href: String,
    },
    FetchContent {
        href: String,
    },
    UploadFiles {
        upload_url: String,
        paths: Vec<PathBuf>,
    },
    ToggleFavorite {
        form: FavoriteForm,
        enable: bool,
    },
    CreateFolder {
        path: String,
        name: String,
    },
    DeleteItem {
        path: String,
        name: String,
    },
}
