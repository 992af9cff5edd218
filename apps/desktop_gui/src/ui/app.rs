use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use serde::{Deserialize, Serialize};

use gallery_core::navigate::{
    resolve_arrow, resolve_tree_interaction, swipe_target, ArrowKey, SwipeTracker, TreeAction,
    TreeInteraction,
};
use gallery_core::reveal::LazyReveal;
use shared::domain::{ItemKind, ViewMode};
use shared::protocol::{Breadcrumb, ItemSummary, PageBody, PageSnapshot, TreeNode};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{classify_fetch_failure, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::media::PreviewImage;

/// Delay between a finished upload batch and the page reload it triggers.
const RELOAD_DELAY: Duration = Duration::from_secs(3);

const GRID_TILE_WIDTH: f32 = 160.0;
const GRID_TILE_HEIGHT: f32 = 184.0;
const GRID_THUMB_INSET: f32 = 6.0;
const COLUMN_THUMB_SIZE: f32 = 64.0;

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub server_url: String,
    pub start_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct PersistedSettings {
    view_mode: ViewMode,
    text_scale: f32,
    show_tree_panel: bool,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Grid,
            text_scale: 1.0,
            show_tree_panel: true,
        }
    }
}

fn settings_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("unable to resolve local app data dir"))?;
    Ok(base.join("media_vault_desktop").join("settings.json"))
}

fn load_settings() -> PersistedSettings {
    let path = match settings_path() {
        Ok(path) => path,
        Err(err) => {
            tracing::warn!("settings unavailable: {err}");
            return PersistedSettings::default();
        }
    };
    match fs::read_to_string(&path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        Err(_) => PersistedSettings::default(),
    }
}

fn save_settings(settings: &PersistedSettings) {
    let path = match settings_path() {
        Ok(path) => path,
        Err(err) => {
            tracing::warn!("settings unavailable: {err}");
            return;
        }
    };
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!("failed to prepare settings directory: {err}");
            return;
        }
    }
    match serde_json::to_string_pretty(settings) {
        Ok(raw) => {
            if let Err(err) = fs::write(&path, raw) {
                tracing::warn!("failed to persist settings: {err}");
            }
        }
        Err(err) => tracing::warn!("failed to encode settings: {err}"),
    }
}

#[derive(Debug, Clone)]
struct StatusBanner {
    message: String,
}

enum ThumbState {
    Loading,
    Ready {
        image: PreviewImage,
        texture: Option<TextureHandle>,
    },
    Failed,
}

enum ContentState {
    Idle,
    Loading {
        href: String,
    },
    Ready {
        href: String,
        image: PreviewImage,
        texture: Option<TextureHandle>,
    },
    Unsupported {
        kind: ItemKind,
        raw_url: String,
    },
    Failed(String),
}

#[derive(Default)]
struct UploadUiState {
    active: bool,
    submitted: usize,
    completed: usize,
    done: bool,
    reload_at: Option<Instant>,
    last_failure: Option<String>,
}

enum CentralView {
    Empty,
    Listing(Vec<ItemSummary>),
    Single,
}

pub struct GalleryApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    server_url: String,
    current_path: String,
    page: Option<PageSnapshot>,
    reveal: LazyReveal,
    thumbs: HashMap<String, ThumbState>,
    content: ContentState,
    view_mode: ViewMode,
    text_scale: f32,
    show_tree_panel: bool,
    tree_expanded: HashSet<String>,
    swipe: SwipeTracker,
    hovering_files: bool,
    upload: UploadUiState,
    favorite_checked: bool,
    search_text: String,
    new_folder_name: String,
    show_new_folder: bool,
    show_delete_confirm: bool,
    delete_redirect: Option<String>,
    status: String,
    banner: Option<StatusBanner>,
}

impl GalleryApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        startup: StartupConfig,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Self {
        let settings = load_settings();
        cc.egui_ctx.set_zoom_factor(settings.text_scale);

        let mut app = Self {
            cmd_tx,
            ui_rx,
            server_url: startup.server_url,
            current_path: String::new(),
            page: None,
            reveal: LazyReveal::default(),
            thumbs: HashMap::new(),
            content: ContentState::Idle,
            view_mode: settings.view_mode,
            text_scale: settings.text_scale,
            show_tree_panel: settings.show_tree_panel,
            tree_expanded: HashSet::new(),
            swipe: SwipeTracker::default(),
            hovering_files: false,
            upload: UploadUiState::default(),
            favorite_checked: false,
            search_text: String::new(),
            new_folder_name: String::new(),
            show_new_folder: false,
            show_delete_confirm: false,
            delete_redirect: None,
            status: String::new(),
            banner: None,
        };
        app.open_path(startup.start_path.clone());
        app
    }

    fn persist_settings(&self) {
        save_settings(&PersistedSettings {
            view_mode: self.view_mode,
            text_scale: self.text_scale,
            show_tree_panel: self.show_tree_panel,
        });
    }

    /// Full-page-redirect semantics: the new snapshot replaces everything the
    /// old page put on screen.
    fn open_path(&mut self, path: String) {
        self.current_path = path.clone();
        self.thumbs.clear();
        self.content = ContentState::Idle;
        self.show_delete_confirm = false;
        self.status = format!("Loading {}...", display_path(&path));
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::OpenPage { path },
            &mut self.status,
        );
    }

    fn apply_snapshot(&mut self, snapshot: PageSnapshot) {
        self.current_path = snapshot.path.clone();
        self.thumbs.clear();
        self.content = ContentState::Idle;
        self.favorite_checked = snapshot
            .favorite
            .as_ref()
            .map(|form| form.checked)
            .unwrap_or(false);
        self.tree_expanded.clear();
        collect_selected_keys(&snapshot.tree, &mut self.tree_expanded);

        match &snapshot.body {
            PageBody::Listing { items } => {
                self.reveal.reset(items.iter().map(|item| item.deferred));
                // Anything the server already marked revealed fetches now.
                let eager: Vec<String> = items
                    .iter()
                    .filter(|item| !item.deferred)
                    .filter_map(|item| item.thumb_url.clone())
                    .collect();
                for href in eager {
                    self.request_thumb(href);
                }
            }
            PageBody::Single { content } => {
                self.reveal.reset(std::iter::empty());
                if content.kind == ItemKind::Image {
                    self.content = ContentState::Loading {
                        href: content.raw_url.clone(),
                    };
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::FetchContent {
                            href: content.raw_url.clone(),
                        },
                        &mut self.status,
                    );
                } else {
                    self.content = ContentState::Unsupported {
                        kind: content.kind,
                        raw_url: content.raw_url.clone(),
                    };
                }
            }
        }

        self.status = format!("Loaded {}", display_path(&snapshot.path));
        self.banner = None;
        self.page = Some(snapshot);
    }

    fn request_thumb(&mut self, href: String) {
        if self.thumbs.contains_key(&href) {
            return;
        }
        self.thumbs.insert(href.clone(), ThumbState::Loading);
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::FetchThumb { href },
            &mut self.status,
        );
    }

    fn drain_backend_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::PageLoaded(snapshot) => self.apply_snapshot(snapshot),
                UiEvent::ThumbLoaded { href, image } => {
                    if let Some(state) = self.thumbs.get_mut(&href) {
                        if matches!(state, ThumbState::Loading) {
                            *state = ThumbState::Ready {
                                image,
                                texture: None,
                            };
                        }
                    }
                }
                UiEvent::ThumbFailed { href, reason } => {
                    tracing::warn!(href = href.as_str(), "thumbnail failed: {reason}");
                    if let Some(state) = self.thumbs.get_mut(&href) {
                        if matches!(state, ThumbState::Loading) {
                            *state = ThumbState::Failed;
                        }
                    }
                }
                UiEvent::ContentLoaded { href, image } => {
                    let expected = matches!(&self.content, ContentState::Loading { href: h } if *h == href);
                    if expected {
                        self.content = ContentState::Ready {
                            href,
                            image,
                            texture: None,
                        };
                    }
                }
                UiEvent::ContentFailed { href, reason } => {
                    let expected = matches!(&self.content, ContentState::Loading { href: h } if *h == href);
                    if expected {
                        self.content = ContentState::Failed(reason);
                    }
                }
                UiEvent::UploadStarted { submitted } => {
                    self.upload = UploadUiState {
                        active: true,
                        submitted,
                        completed: 0,
                        done: false,
                        reload_at: None,
                        last_failure: None,
                    };
                }
                UiEvent::UploadProgress {
                    completed,
                    submitted,
                } => {
                    self.upload.completed = completed;
                    self.upload.submitted = submitted;
                }
                UiEvent::UploadFailed { filename, reason } => {
                    tracing::warn!(filename = filename.as_str(), "upload failed: {reason}");
                    self.upload.last_failure = Some(format!("{filename} failed to upload"));
                }
                UiEvent::UploadFinished { submitted } => {
                    self.upload.completed = submitted;
                    self.upload.done = true;
                    self.upload.reload_at = Some(Instant::now() + RELOAD_DELAY);
                }
                UiEvent::FavoriteToggled { enabled } => {
                    self.favorite_checked = enabled;
                    self.status = if enabled {
                        "Added to favorites".to_string()
                    } else {
                        "Removed from favorites".to_string()
                    };
                }
                UiEvent::FolderCreated { name } => {
                    self.status = format!("Created folder '{name}'");
                    let path = self.current_path.clone();
                    self.open_path(path);
                }
                UiEvent::ItemDeleted { name } => {
                    self.status = format!("Deleted '{name}'");
                    let target = self
                        .delete_redirect
                        .take()
                        .unwrap_or_else(|| self.current_path.clone());
                    self.open_path(target);
                }
                UiEvent::Info(text) => {
                    self.status = text;
                }
                UiEvent::Error(err) => {
                    tracing::error!("ui error ({:?}): {}", err.category(), err.message());
                    let friendly = match err.context() {
                        UiErrorContext::LoadPage => classify_fetch_failure(err.message()),
                        _ => err.message().to_string(),
                    };
                    self.banner = Some(StatusBanner { message: friendly });
                }
            }
        }
    }

    fn handle_global_input(&mut self, ctx: &egui::Context) {
        if !ctx.wants_keyboard_input() {
            let arrow = ctx.input(|i| {
                if i.key_pressed(egui::Key::ArrowRight) {
                    Some(ArrowKey::Right)
                } else if i.key_pressed(egui::Key::ArrowLeft) {
                    Some(ArrowKey::Left)
                } else {
                    None
                }
            });
            if let Some(key) = arrow {
                let target = self
                    .page
                    .as_ref()
                    .and_then(|page| resolve_arrow(key, &page.neighbors).map(str::to_string));
                if let Some(target) = target {
                    self.open_path(target);
                }
            }
        }

        let (pressed, released, pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
            )
        });
        if pressed {
            if let Some(pos) = pos {
                self.swipe.begin(pos.x, pos.y);
            }
        }
        if released {
            if ctx.is_using_pointer() {
                // A widget owned this drag; not a page gesture.
                self.swipe.cancel();
            } else if let Some(pos) = pos {
                if let Some(gesture) = self.swipe.finish(pos.x, pos.y) {
                    let target = self
                        .page
                        .as_ref()
                        .and_then(|page| swipe_target(gesture, &page.neighbors).map(str::to_string));
                    if let Some(target) = target {
                        self.open_path(target);
                    }
                }
            } else {
                self.swipe.cancel();
            }
        }
    }

    fn handle_file_drops(&mut self, ctx: &egui::Context) {
        self.hovering_files = ctx.input(|i| !i.raw.hovered_files.is_empty());

        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if dropped.is_empty() {
            return;
        }
        let Some(upload_url) = self.page.as_ref().and_then(|page| page.upload_url.clone()) else {
            // No upload destination on this page; the drop passes through
            // untouched.
            return;
        };
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::UploadFiles {
                upload_url,
                paths: dropped,
            },
            &mut self.status,
        );
    }

    fn process_upload_reload(&mut self, ctx: &egui::Context) {
        let Some(reload_at) = self.upload.reload_at else {
            return;
        };
        let now = Instant::now();
        if now >= reload_at {
            self.upload = UploadUiState::default();
            let path = self.current_path.clone();
            self.open_path(path);
        } else {
            ctx.request_repaint_after(reload_at - now);
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                self.breadcrumb_ui(ui);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.toolbar_ui(ui);
                });
            });
            if let Some(banner) = self.banner.clone() {
                let mut dismissed = false;
                ui.horizontal(|ui| {
                    ui.colored_label(ui.visuals().error_fg_color, &banner.message);
                    if ui.small_button("Dismiss").clicked() {
                        dismissed = true;
                    }
                });
                if dismissed {
                    self.banner = None;
                }
            }
            ui.add_space(4.0);
        });
    }

    fn breadcrumb_ui(&mut self, ui: &mut egui::Ui) {
        let crumbs: Vec<Breadcrumb> = self
            .page
            .as_ref()
            .map(|page| page.breadcrumbs.clone())
            .unwrap_or_default();
        let mut nav = None;
        for (index, crumb) in crumbs.iter().enumerate() {
            if index > 0 {
                ui.label("/");
            }
            match &crumb.href {
                Some(href) => {
                    if ui.link(&crumb.name).clicked() {
                        nav = Some(href.clone());
                    }
                }
                None => {
                    ui.label(&crumb.name);
                }
            }
        }
        if crumbs.is_empty() {
            ui.label(display_path(&self.current_path));
        }
        if let Some(path) = nav {
            self.open_path(path);
        }
    }

    fn toolbar_ui(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("⚙", |ui| {
            let mut scale = self.text_scale;
            ui.add(egui::Slider::new(&mut scale, 0.8..=1.6).text("Text scale"));
            if (scale - self.text_scale).abs() > f32::EPSILON {
                self.text_scale = scale;
                ui.ctx().set_zoom_factor(scale);
                self.persist_settings();
            }
            let mut show_tree = self.show_tree_panel;
            if ui.checkbox(&mut show_tree, "Folder tree").changed() {
                self.show_tree_panel = show_tree;
                self.persist_settings();
            }
        });

        let view_label = match self.view_mode {
            ViewMode::Grid => "List view",
            ViewMode::Column => "Grid view",
        };
        if ui.button(view_label).clicked() {
            self.view_mode = match self.view_mode {
                ViewMode::Grid => ViewMode::Column,
                ViewMode::Column => ViewMode::Grid,
            };
            self.persist_settings();
        }

        if ui.button("★ Favorites").clicked() {
            let path = self.current_path.clone();
            self.status = "Loading favorites...".to_string();
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::OpenFavorites { path },
                &mut self.status,
            );
        }

        let search_response = ui.add(
            egui::TextEdit::singleline(&mut self.search_text)
                .hint_text("Search")
                .desired_width(140.0),
        );
        let search_submitted =
            search_response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if (ui.button("🔍").clicked() || search_submitted) && !self.search_text.trim().is_empty() {
            let keyword = self.search_text.trim().to_string();
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::Search {
                    path: self.current_path.clone(),
                    keyword,
                },
                &mut self.status,
            );
        }

        let (has_favorite, upload_url, is_listing) = match self.page.as_ref() {
            Some(page) => (
                page.favorite.is_some(),
                page.upload_url.clone(),
                page.is_listing(),
            ),
            None => (false, None, false),
        };

        if has_favorite {
            let star = if self.favorite_checked { "★" } else { "☆" };
            if ui.button(star).on_hover_text("Toggle favorite").clicked() {
                if let Some(form) = self.page.as_ref().and_then(|page| page.favorite.clone()) {
                    let enable = !self.favorite_checked;
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::ToggleFavorite { form, enable },
                        &mut self.status,
                    );
                }
            }
        }

        if let Some(upload_url) = upload_url {
            if ui.button("Upload...").clicked() {
                if let Some(paths) = rfd::FileDialog::new().pick_files() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::UploadFiles { upload_url, paths },
                        &mut self.status,
                    );
                }
            }
        }

        if is_listing {
            if ui.button("New folder").clicked() {
                self.show_new_folder = true;
            }
        } else if self.page.is_some() && ui.button("Delete").clicked() {
            self.show_delete_confirm = true;
        }
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(&self.server_url);
                });
            });
        });
    }

    fn show_tree(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("nav_tree")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        let tree = self
                            .page
                            .as_ref()
                            .map(|page| page.tree.clone())
                            .unwrap_or_default();
                        let mut nav = None;
                        for node in &tree {
                            self.tree_node_ui(ui, node, &mut nav);
                        }
                        if let Some(path) = nav {
                            self.open_path(path);
                        }
                    });
            });
    }

    fn tree_node_ui(&mut self, ui: &mut egui::Ui, node: &TreeNode, nav: &mut Option<String>) {
        let key = node_key(node);
        let expanded = self.tree_expanded.contains(&key);
        let marker = if node.has_children() {
            if expanded {
                "▾"
            } else {
                "▸"
            }
        } else {
            " "
        };
        let response = ui.selectable_label(node.selected, format!("{marker} {}", node.name));

        let interaction = if response.double_clicked() {
            Some(TreeInteraction::DoubleClick)
        } else if response.clicked() {
            Some(TreeInteraction::Click)
        } else {
            None
        };
        if let Some(interaction) = interaction {
            match resolve_tree_interaction(node, interaction) {
                TreeAction::ToggleExpanded => {
                    if !self.tree_expanded.remove(&key) {
                        self.tree_expanded.insert(key.clone());
                    }
                }
                TreeAction::Navigate(href) => *nav = Some(href.to_string()),
                TreeAction::Ignore => {}
            }
        }

        if node.has_children() && self.tree_expanded.contains(&key) {
            ui.indent(&key, |ui| {
                for child in &node.children {
                    self.tree_node_ui(ui, child, nav);
                }
            });
        }
    }

    fn show_central(&mut self, ctx: &egui::Context) {
        let view = match self.page.as_ref() {
            None => CentralView::Empty,
            Some(page) => match &page.body {
                PageBody::Listing { items } => CentralView::Listing(items.clone()),
                PageBody::Single { .. } => CentralView::Single,
            },
        };
        egui::CentralPanel::default().show(ctx, |ui| match view {
            CentralView::Empty => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            }
            CentralView::Listing(items) => self.show_listing(ui, &items),
            CentralView::Single => self.show_content(ui),
        });
    }

    fn show_listing(&mut self, ui: &mut egui::Ui, items: &[ItemSummary]) {
        if items.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.weak("This folder is empty");
            });
            return;
        }
        let mut nav = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let viewport_top = ui.clip_rect().top();
                let viewport_height = ui.clip_rect().height();
                match self.view_mode {
                    ViewMode::Grid => self.grid_items_ui(ui, items, viewport_top, &mut nav),
                    ViewMode::Column => self.column_items_ui(ui, items, viewport_top, &mut nav),
                }
                self.sweep_reveal(items, viewport_height);
            });
        if let Some(path) = nav {
            self.open_path(path);
        }
    }

    fn grid_items_ui(
        &mut self,
        ui: &mut egui::Ui,
        items: &[ItemSummary],
        viewport_top: f32,
        nav: &mut Option<String>,
    ) {
        ui.spacing_mut().item_spacing = egui::vec2(10.0, 10.0);
        ui.horizontal_wrapped(|ui| {
            for (index, item) in items.iter().enumerate() {
                let (rect, response) = ui.allocate_exact_size(
                    egui::vec2(GRID_TILE_WIDTH, GRID_TILE_HEIGHT),
                    egui::Sense::click(),
                );
                self.reveal.record_top(index, rect.top() - viewport_top);
                self.paint_tile(ui, rect, item, response.hovered());
                let response = response.on_hover_text(&item.name);
                if response.clicked() {
                    *nav = Some(item.href.clone());
                }
            }
        });
    }

    fn column_items_ui(
        &mut self,
        ui: &mut egui::Ui,
        items: &[ItemSummary],
        viewport_top: f32,
        nav: &mut Option<String>,
    ) {
        for (index, item) in items.iter().enumerate() {
            let (rect, response) = ui.allocate_exact_size(
                egui::vec2(ui.available_width(), COLUMN_THUMB_SIZE + 8.0),
                egui::Sense::click(),
            );
            self.reveal.record_top(index, rect.top() - viewport_top);

            if response.hovered() {
                ui.painter().rect_filled(
                    rect,
                    egui::CornerRadius::same(4),
                    ui.visuals().widgets.hovered.bg_fill,
                );
            }

            let thumb_rect = egui::Rect::from_min_size(
                rect.min + egui::vec2(4.0, 4.0),
                egui::vec2(COLUMN_THUMB_SIZE, COLUMN_THUMB_SIZE),
            );
            if item.thumb_url.is_some() {
                self.paint_thumb(ui, thumb_rect, item);
            } else {
                ui.painter().text(
                    thumb_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    icon_for_kind(item.kind),
                    egui::FontId::proportional(28.0),
                    ui.visuals().text_color(),
                );
            }

            ui.painter().text(
                egui::pos2(thumb_rect.right() + 12.0, rect.center().y),
                egui::Align2::LEFT_CENTER,
                &item.name,
                egui::FontId::proportional(14.0),
                ui.visuals().text_color(),
            );
            ui.painter().text(
                egui::pos2(rect.right() - 12.0, rect.center().y),
                egui::Align2::RIGHT_CENTER,
                kind_label(item.kind),
                egui::FontId::proportional(12.0),
                ui.visuals().weak_text_color(),
            );

            if response.clicked() {
                *nav = Some(item.href.clone());
            }
        }
    }

    fn paint_tile(&mut self, ui: &mut egui::Ui, rect: egui::Rect, item: &ItemSummary, hovered: bool) {
        let fill = if hovered {
            ui.visuals().widgets.hovered.bg_fill
        } else {
            ui.visuals().faint_bg_color
        };
        ui.painter()
            .rect_filled(rect, egui::CornerRadius::same(6), fill);

        let thumb_rect = egui::Rect::from_min_max(
            rect.min + egui::vec2(GRID_THUMB_INSET, GRID_THUMB_INSET),
            egui::pos2(rect.max.x - GRID_THUMB_INSET, rect.max.y - 24.0),
        );
        if item.thumb_url.is_some() {
            self.paint_thumb(ui, thumb_rect, item);
        } else {
            ui.painter().text(
                thumb_rect.center(),
                egui::Align2::CENTER_CENTER,
                icon_for_kind(item.kind),
                egui::FontId::proportional(48.0),
                ui.visuals().text_color(),
            );
        }

        ui.painter().text(
            egui::pos2(rect.center().x, rect.max.y - 12.0),
            egui::Align2::CENTER_CENTER,
            truncate_name(&item.name, 20),
            egui::FontId::proportional(12.0),
            ui.visuals().text_color(),
        );
    }

    fn paint_thumb(&mut self, ui: &mut egui::Ui, rect: egui::Rect, item: &ItemSummary) {
        let Some(href) = item.thumb_url.as_ref() else {
            return;
        };
        let texture = match self.thumbs.get_mut(href) {
            Some(ThumbState::Ready { image, texture }) => {
                if texture.is_none() {
                    let color = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width, image.height],
                        &image.rgba,
                    );
                    *texture = Some(ui.ctx().load_texture(
                        format!("thumb:{href}"),
                        color,
                        egui::TextureOptions::LINEAR,
                    ));
                }
                texture.clone()
            }
            Some(ThumbState::Failed) => {
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "⚠",
                    egui::FontId::proportional(24.0),
                    ui.visuals().warn_fg_color,
                );
                return;
            }
            Some(ThumbState::Loading) | None => None,
        };

        match texture {
            Some(texture) => {
                let fitted = fit_rect(rect, texture.aspect_ratio());
                egui::Image::new(&texture).paint_at(ui, fitted);
            }
            None => {
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "…",
                    egui::FontId::proportional(24.0),
                    ui.visuals().weak_text_color(),
                );
            }
        }
    }

    fn sweep_reveal(&mut self, items: &[ItemSummary], viewport_height: f32) {
        for index in self.reveal.sweep(viewport_height) {
            if let Some(thumb_url) = items.get(index).and_then(|item| item.thumb_url.clone()) {
                self.request_thumb(thumb_url);
            }
        }
    }

    fn show_content(&mut self, ui: &mut egui::Ui) {
        if let ContentState::Ready {
            href,
            image,
            texture,
        } = &mut self.content
        {
            if texture.is_none() {
                let color =
                    egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
                *texture = Some(ui.ctx().load_texture(
                    format!("content:{href}"),
                    color,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }

        match &self.content {
            ContentState::Ready {
                texture: Some(texture),
                ..
            } => {
                ui.centered_and_justified(|ui| {
                    ui.add(
                        egui::Image::new(texture)
                            .max_size(ui.available_size())
                            .shrink_to_fit(),
                    );
                });
            }
            ContentState::Ready { texture: None, .. }
            | ContentState::Loading { .. }
            | ContentState::Idle => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            }
            ContentState::Unsupported { kind, raw_url } => {
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() * 0.3);
                    ui.label(egui::RichText::new(icon_for_kind(*kind)).size(64.0));
                    ui.label("No in-app playback for this content");
                    ui.monospace(raw_url);
                });
            }
            ContentState::Failed(reason) => {
                let reason = reason.clone();
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() * 0.3);
                    ui.colored_label(ui.visuals().error_fg_color, "Failed to load content");
                    ui.weak(reason);
                });
            }
        }
    }

    fn show_dialogs(&mut self, ctx: &egui::Context) {
        if self.show_new_folder {
            let mut open = true;
            egui::Window::new("New folder")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.text_edit_singleline(&mut self.new_folder_name);
                    ui.horizontal(|ui| {
                        if ui.button("Create").clicked() && !self.new_folder_name.trim().is_empty()
                        {
                            let name = self.new_folder_name.trim().to_string();
                            dispatch_backend_command(
                                &self.cmd_tx,
                                BackendCommand::CreateFolder {
                                    path: self.current_path.clone(),
                                    name,
                                },
                                &mut self.status,
                            );
                            self.new_folder_name.clear();
                            self.show_new_folder = false;
                        }
                        if ui.button("Cancel").clicked() {
                            self.new_folder_name.clear();
                            self.show_new_folder = false;
                        }
                    });
                });
            if !open {
                self.show_new_folder = false;
            }
        }

        if self.show_delete_confirm {
            let (parent, name) = split_parent_name(&self.current_path);
            let mut open = true;
            egui::Window::new("Delete item")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(format!("Delete '{name}'? This cannot be undone."));
                    ui.horizontal(|ui| {
                        if ui.button("Delete").clicked() {
                            self.delete_redirect = Some(parent.clone());
                            dispatch_backend_command(
                                &self.cmd_tx,
                                BackendCommand::DeleteItem {
                                    path: parent.clone(),
                                    name: name.clone(),
                                },
                                &mut self.status,
                            );
                            self.show_delete_confirm = false;
                        }
                        if ui.button("Cancel").clicked() {
                            self.show_delete_confirm = false;
                        }
                    });
                });
            if !open {
                self.show_delete_confirm = false;
            }
        }
    }

    fn show_upload_overlay(&mut self, ctx: &egui::Context) {
        let upload_available = self
            .page
            .as_ref()
            .map(|page| page.upload_url.is_some())
            .unwrap_or(false);
        if self.hovering_files && upload_available {
            egui::Area::new(egui::Id::new("drop_overlay"))
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(egui::RichText::new("Drop files to upload").size(22.0));
                    });
                });
        }

        if self.upload.active {
            egui::Window::new("upload_progress")
                .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
                .collapsible(false)
                .resizable(false)
                .title_bar(false)
                .show(ctx, |ui| {
                    let fraction = if self.upload.submitted == 0 {
                        0.0
                    } else {
                        self.upload.completed as f32 / self.upload.submitted as f32
                    };
                    let percent = if self.upload.submitted == 0 {
                        0
                    } else {
                        100 * self.upload.completed / self.upload.submitted
                    };
                    ui.add(egui::ProgressBar::new(fraction).text(format!(
                        "{percent}% ({}/{})",
                        self.upload.completed, self.upload.submitted
                    )));
                    if self.upload.done {
                        ui.label("Upload complete, reloading");
                    }
                    if let Some(failure) = &self.upload.last_failure {
                        ui.colored_label(ui.visuals().error_fg_color, failure);
                    }
                });
        }
    }
}

impl eframe::App for GalleryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_backend_events();
        self.handle_global_input(ctx);
        self.handle_file_drops(ctx);
        self.process_upload_reload(ctx);

        self.show_top_bar(ctx);
        self.show_status_bar(ctx);
        if self.show_tree_panel {
            self.show_tree(ctx);
        }
        self.show_central(ctx);
        self.show_dialogs(ctx);
        self.show_upload_overlay(ctx);

        // Backend events arrive from another thread; keep polling while work
        // is in flight.
        let busy = self.page.is_none()
            || self.upload.active
            || matches!(self.content, ContentState::Loading { .. })
            || self
                .thumbs
                .values()
                .any(|state| matches!(state, ThumbState::Loading));
        if busy {
            ctx.request_repaint_after(Duration::from_millis(150));
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "home"
    } else {
        path
    }
}

fn node_key(node: &TreeNode) -> String {
    node.href
        .clone()
        .unwrap_or_else(|| format!("#{}", node.name))
}

fn collect_selected_keys(nodes: &[TreeNode], expanded: &mut HashSet<String>) {
    for node in nodes {
        if node.selected && node.has_children() {
            expanded.insert(node_key(node));
        }
        collect_selected_keys(&node.children, expanded);
    }
}

fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let prefix: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{prefix}…")
}

fn icon_for_kind(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Dir => "📁",
        ItemKind::Image => "🖼",
        ItemKind::Video => "🎞",
        ItemKind::Unknown => "❓",
    }
}

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Dir => "folder",
        ItemKind::Image => "image",
        ItemKind::Video => "video",
        ItemKind::Unknown => "file",
    }
}

fn fit_rect(bounds: egui::Rect, aspect: f32) -> egui::Rect {
    let mut size = bounds.size();
    if size.x / size.y > aspect {
        size.x = size.y * aspect;
    } else {
        size.y = size.x / aspect;
    }
    egui::Rect::from_center_size(bounds.center(), size)
}

fn split_parent_name(path: &str) -> (String, String) {
    match path.rsplit_once('/') {
        Some((parent, name)) => (parent.to_string(), name.to_string()),
        None => (String::new(), path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_parent_and_name() {
        assert_eq!(
            split_parent_name("holiday/beach.jpg"),
            ("holiday".to_string(), "beach.jpg".to_string())
        );
        assert_eq!(
            split_parent_name("beach.jpg"),
            (String::new(), "beach.jpg".to_string())
        );
    }

    #[test]
    fn truncates_long_names() {
        assert_eq!(truncate_name("short.png", 20), "short.png");
        let long = "a_very_long_file_name_indeed.png";
        let shown = truncate_name(long, 10);
        assert!(shown.chars().count() <= 10);
        assert!(shown.ends_with('…'));
    }

    #[test]
    fn empty_path_displays_as_home() {
        assert_eq!(display_path(""), "home");
        assert_eq!(display_path("holiday"), "holiday");
    }
}
