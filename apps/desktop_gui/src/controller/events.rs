//! UI/backend events and error modeling for the desktop shell controller.

use shared::protocol::PageSnapshot;

use crate::media::PreviewImage;

pub enum UiEvent {
    PageLoaded(PageSnapshot),
    ThumbLoaded {
        href: String,
        image: PreviewImage,
    },
    ThumbFailed {
        href: String,
        reason: String,
    },
    ContentLoaded {
        href: String,
        image: PreviewImage,
    },
    ContentFailed {
        href: String,
        reason: String,
    },
    UploadStarted {
        submitted: usize,
    },
    UploadProgress {
        completed: usize,
        submitted: usize,
    },
    UploadFailed {
        filename: String,
        reason: String,
    },
    UploadFinished {
        submitted: usize,
    },
    FavoriteToggled {
        enabled: bool,
    },
    FolderCreated {
        name: String,
    },
    ItemDeleted {
        name: String,
    },
    Info(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    NotFound,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadPage,
    Upload,
    Manage,
}

/// Turns a raw page-load failure into a message worth showing.
pub fn classify_fetch_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("failed to reach")
        || lower.contains("connection refused")
        || lower.contains("error sending request")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Server unreachable; check the URL/network and reload.".to_string()
    } else if lower.contains("notfound") || lower.contains("404") {
        "Nothing exists at this content path.".to_string()
    } else {
        format!("Vault error: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("notfound")
            || message_lower.contains("not found")
            || message_lower.contains("404")
        {
            UiErrorCategory::NotFound
        } else if message_lower.contains("timed out")
            || message_lower.contains("timeout")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("unreachable")
            || message_lower.contains("failed to reach")
            || message_lower.contains("error sending request")
        {
            UiErrorCategory::Transport
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("unsupported")
        {
            UiErrorCategory::Validation
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
