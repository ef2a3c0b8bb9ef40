//! Movie Finder
//! Desktop movie discovery client for The Movie Database (TMDB)

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

mod api;
mod config;
mod controller;
mod favorites;
mod models;
mod widgets;

use api::TmdbClient;
use config::*;
use controller::{NoticeKind, TaskResult, ThreadDispatcher, ViewController};
use favorites::{FavoritesStore, FileStorage};
use models::ActiveView;
use widgets::Intent;

/// Application icon: film frame with a play button
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let nx = x as f32 / size as f32;
            let ny = y as f32 / size as f32;

            // Film strip body with perforated borders
            let in_strip = (0.08..=0.92).contains(&nx) && (0.12..=0.88).contains(&ny);
            let in_border = in_strip && (nx < 0.2 || nx > 0.8);
            let in_hole = in_border && {
                let hx = if nx < 0.2 { 0.14 } else { 0.86 };
                let cell = ((ny - 0.12) / 0.152).fract();
                (nx - hx).abs() < 0.03 && (0.3..0.7).contains(&cell)
            };

            // Play triangle in the frame
            let px = nx - 0.4;
            let py = ny - 0.5;
            let in_play = (0.0..=0.24).contains(&px) && py.abs() <= (0.24 - px) * 0.7;

            let color: [u8; 4] = if !in_strip || in_hole {
                [0, 0, 0, 0]
            } else if in_border {
                [30, 30, 40, 255]
            } else if in_play {
                [255, 255, 255, 255]
            } else {
                // Amber to red gradient
                let t = nx * 0.5 + ny * 0.5;
                [
                    (245.0 - 25.0 * t) as u8,
                    (166.0 - 110.0 * t) as u8,
                    (35.0 + 20.0 * t) as u8,
                    255,
                ]
            };
            rgba[idx..idx + 4].copy_from_slice(&color);
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load();
    log::info!("Movie Finder {} starting", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([720.0, 480.0])
            .with_icon(load_icon()),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "Movie Finder",
        options,
        Box::new(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            cc.egui_ctx.set_visuals(if config.dark_mode {
                egui::Visuals::dark()
            } else {
                egui::Visuals::light()
            });
            Ok(Box::new(MovieApp::new(config)))
        }),
    )
}

struct MovieApp {
    config: AppConfig,
    controller: ViewController<ThreadDispatcher, FileStorage>,

    // Background task channel
    task_receiver: Receiver<TaskResult>,

    search_input: String,
    toasts: widgets::Toasts,

    // Settings dialog
    show_settings: bool,
    settings_draft: SettingsDraft,
}

impl MovieApp {
    fn new(config: AppConfig) -> Self {
        let (task_sender, task_receiver) = channel();
        let catalog = Arc::new(TmdbClient::from_config(&config));
        let dispatcher = ThreadDispatcher::new(catalog, task_sender);

        let storage = FileStorage::new(FileStorage::default_path());
        log::info!("Favorites file: {}", storage.path().display());
        let mut controller = ViewController::new(dispatcher, FavoritesStore::new(storage));

        let has_key = config.has_api_key();
        if has_key {
            controller.refresh();
        } else {
            log::warn!("No TMDB API key; set one in the settings or via {}", API_KEY_ENV);
        }

        Self {
            settings_draft: SettingsDraft::from_config(&config),
            config,
            controller,
            task_receiver,
            search_input: String::new(),
            toasts: widgets::Toasts::default(),
            show_settings: !has_key,
        }
    }

    fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Search(term) => self.controller.set_search_term(&term),
            Intent::SwitchView(view) => self.controller.switch_view(view),
            Intent::ChangePage(page) => {
                self.controller.set_page(page);
            }
            Intent::ViewDetails(movie_id) => self.controller.open_details(movie_id),
            Intent::CloseDetails => self.controller.close_details(),
            Intent::ToggleFavorite(movie) => self.controller.toggle_favorite(&movie),
            Intent::ToggleFavoriteDetail(detail) => self.controller.toggle_favorite_detail(&detail),
            Intent::WatchTrailer(movie_id) => self.controller.request_trailer(movie_id),
            Intent::CloseTrailer => self.controller.close_trailer(),
        }
    }

    fn apply_settings(&mut self) {
        self.settings_draft.apply_to(&mut self.config);
        self.config.save();

        let catalog = Arc::new(TmdbClient::from_config(&self.config));
        self.controller.dispatcher_mut().set_catalog(catalog);
        log::info!("Settings saved, catalog client rebuilt");

        if self.config.has_api_key() {
            self.controller.refresh();
        }
    }

    fn export_favorites(&mut self) {
        let file_name = format!("favorites-{}.json", chrono::Local::now().format("%Y-%m-%d"));
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name(&file_name)
            .save_file()
        else {
            return;
        };

        match favorites::export_to(&path, self.controller.favorites()) {
            Ok(()) => {
                log::info!("Exported favorites to {}", path.display());
                self.controller.push_notice(
                    NoticeKind::Info,
                    format!("Exported {} favorites", self.controller.favorites().len()),
                );
            }
            Err(e) => {
                log::error!("Export to {} failed: {}", path.display(), e);
                self.controller.push_notice(NoticeKind::Warning, format!("Export failed: {}", e));
            }
        }
    }

    fn import_favorites(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        else {
            return;
        };

        match favorites::import_from(&path) {
            Ok(items) => {
                self.controller.import_favorites(items);
            }
            Err(e) => {
                log::error!("Import from {} failed: {}", path.display(), e);
                self.controller.push_notice(NoticeKind::Warning, format!("Import failed: {}", e));
            }
        }
    }

    fn status_line(&self) -> String {
        let state = self.controller.state();
        if !self.config.has_api_key() {
            return "No TMDB API key configured".to_string();
        }
        if state.loading {
            return "Loading movies...".to_string();
        }
        if let Some(error) = &state.error {
            return error.clone();
        }
        match state.active_view {
            ActiveView::Favorites => format!("{} favorites", self.controller.favorites().len()),
            ActiveView::Search if state.search_term.trim().is_empty() => {
                format!("Popular movies - page {} of {}", state.page, state.total_pages)
            }
            ActiveView::Search => format!(
                "Results for '{}' - page {} of {}",
                state.search_term.trim(),
                state.page,
                state.total_pages
            ),
        }
    }
}

impl eframe::App for MovieApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background task results (non-blocking)
        while let Ok(result) = self.task_receiver.try_recv() {
            self.controller.apply(result);
        }
        for notice in self.controller.take_notices() {
            self.toasts.push(notice);
        }

        let mut intents: Vec<Intent> = Vec::new();
        let mut export_clicked = false;
        let mut import_clicked = false;

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.heading("🎬 Movie Finder");
                ui.separator();

                let view = self.controller.state().active_view;
                if ui.selectable_label(view == ActiveView::Search, "🔍 Search / Popular").clicked() {
                    intents.push(Intent::SwitchView(ActiveView::Search));
                }
                let fav_label = format!("★ Favorites ({})", self.controller.favorites().len());
                if ui.selectable_label(view == ActiveView::Favorites, fav_label).clicked() {
                    intents.push(Intent::SwitchView(ActiveView::Favorites));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.settings_draft = SettingsDraft::from_config(&self.config);
                        self.show_settings = true;
                    }
                    if ui.checkbox(&mut self.config.dark_mode, "🌙 Dark").changed() {
                        ctx.set_visuals(if self.config.dark_mode {
                            egui::Visuals::dark()
                        } else {
                            egui::Visuals::light()
                        });
                        self.config.save();
                    }
                    ui.separator();
                    if ui.button("📥 Import").on_hover_text("Merge favorites from a JSON file").clicked() {
                        import_clicked = true;
                    }
                    if ui.button("📤 Export").on_hover_text("Save favorites to a JSON file").clicked() {
                        export_clicked = true;
                    }
                });
            });
            ui.add_space(5.0);
        });

        // Bottom panel - Status
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.controller.is_busy() {
                    ui.spinner();
                }
                ui.label(self.status_line());
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let state = self.controller.state();

            if state.active_view == ActiveView::Search {
                ui.horizontal(|ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.search_input)
                            .hint_text("Search movies...")
                            .desired_width(320.0),
                    );
                    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if ui.button("🔍 Search").clicked() || submitted {
                        intents.push(Intent::Search(self.search_input.clone()));
                    }
                });
                ui.add_space(8.0);
            }

            if state.loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.spinner();
                });
                return;
            }
            if let Some(error) = &state.error {
                ui.label(egui::RichText::new(error).color(egui::Color32::from_rgb(220, 80, 80)));
                return;
            }

            let movies = self.controller.displayed_movies();
            if movies.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.label(widgets::empty_message(state.active_view));
                });
                return;
            }

            let show_pagination = state.active_view == ActiveView::Search && state.total_pages > 1;
            if show_pagination {
                egui::TopBottomPanel::bottom("pagination_panel")
                    .show_separator_line(false)
                    .show_inside(ui, |ui| {
                        ui.add_space(6.0);
                        widgets::pagination(ui, state.page, state.total_pages, &mut intents);
                    });
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    widgets::movie_grid(
                        ui,
                        movies,
                        |id| self.controller.is_favorite(id),
                        &self.config.poster_size,
                        &mut intents,
                    );
                });
        });

        if let Some(detail) = &self.controller.state().selected_detail {
            let is_favorite = self.controller.is_favorite(detail.id);
            widgets::details_window(ctx, detail, is_favorite, &self.config.poster_size, &mut intents);
        }

        if let Some(url) = &self.controller.state().trailer_url {
            widgets::trailer_window(ctx, url, &mut intents);
        }

        if self.show_settings {
            let mut open = true;
            let mut save_clicked = false;
            egui::Window::new("⚙ Settings")
                .open(&mut open)
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    egui::Grid::new("settings_grid").num_columns(2).show(ui, |ui| {
                        ui.label("TMDB API key");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.settings_draft.api_key)
                                .password(true)
                                .desired_width(280.0),
                        );
                        ui.end_row();

                        ui.label("Language");
                        ui.add(egui::TextEdit::singleline(&mut self.settings_draft.language).desired_width(80.0));
                        ui.end_row();

                        ui.label("Adult titles");
                        ui.checkbox(&mut self.settings_draft.include_adult, "Include in search");
                        ui.end_row();
                    });
                    ui.add_space(4.0);
                    ui.label(
                        egui::RichText::new(format!("The {} environment variable overrides the stored key.", API_KEY_ENV))
                            .weak(),
                    );
                    ui.hyperlink_to("Get an API key", "https://www.themoviedb.org/settings/api");
                    ui.add_space(8.0);
                    if ui.button("💾 Save").clicked() {
                        save_clicked = true;
                    }
                });

            if save_clicked {
                self.apply_settings();
                open = false;
            }
            self.show_settings = open;
        }

        self.toasts.show(ctx);

        for intent in intents {
            self.handle_intent(intent);
        }
        if export_clicked {
            self.export_favorites();
        }
        if import_clicked {
            self.import_favorites();
        }

        // Keep polling the task channel while requests are out
        if self.controller.is_busy() {
            ctx.request_repaint();
        }
    }
}
