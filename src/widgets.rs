//! egui widgets for the movie grid, overlays and notices
//!
//! Widgets never touch the controller. They push [`Intent`]s that the app
//! applies once the frame's closures have returned.

use std::time::{Duration, Instant};

use eframe::egui;

use crate::controller::{Notice, NoticeKind};
use crate::models::{format_rating, poster_url, ActiveView, MovieDetail, MovieSummary};

const CARD_WIDTH: f32 = 230.0;
const DETAIL_POSTER_WIDTH: f32 = 180.0;
const OVERVIEW_CHARS: usize = 160;
const TOAST_LIFETIME: Duration = Duration::from_secs(4);

/// User actions raised by widgets
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Search(String),
    SwitchView(ActiveView),
    ChangePage(u32),
    ViewDetails(u64),
    CloseDetails,
    ToggleFavorite(MovieSummary),
    ToggleFavoriteDetail(MovieDetail),
    WatchTrailer(u64),
    CloseTrailer,
}

pub fn empty_message(view: ActiveView) -> &'static str {
    match view {
        ActiveView::Favorites => "No movies found. Add some to your favorites!",
        ActiveView::Search => "No movies found. Try a different search.",
    }
}

/// Shorten `text` to at most `max_chars` characters on a word boundary
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    let at_boundary = text.chars().nth(max_chars).is_some_and(char::is_whitespace);
    let trimmed = match cut.rfind(' ') {
        Some(pos) if pos > 0 && !at_boundary => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end())
}

/// Page numbers to offer around `current`, at most `span` of them
pub fn page_window(current: u32, total: u32, span: u32) -> Vec<u32> {
    if total == 0 || span == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total);
    let span = span.min(total);
    let half = span / 2;

    let mut start = current.saturating_sub(half).max(1);
    if start + span - 1 > total {
        start = total - span + 1;
    }
    (start..start + span).collect()
}

fn favorite_label(is_favorite: bool) -> egui::RichText {
    if is_favorite {
        egui::RichText::new("★ Remove").color(egui::Color32::GOLD)
    } else {
        egui::RichText::new("☆ Favorite")
    }
}

/// TMDB posters are 2:3
pub fn poster_size_for_width(width: f32) -> egui::Vec2 {
    egui::vec2(width, width * 1.5)
}

/// Poster image, or a placeholder of the same size when there is none
fn poster(ui: &mut egui::Ui, url: Option<String>, width: f32) {
    let size = poster_size_for_width(width);
    match url {
        Some(url) => {
            ui.add(egui::Image::new(url).fit_to_exact_size(size).corner_radius(4.0));
        }
        None => {
            egui::Frame::new()
                .fill(ui.visuals().extreme_bg_color)
                .corner_radius(4.0)
                .show(ui, |ui| {
                    ui.set_min_size(size);
                    ui.centered_and_justified(|ui| {
                        ui.label(egui::RichText::new("🎬 No poster").weak());
                    });
                });
        }
    }
}

pub fn movie_card(
    ui: &mut egui::Ui,
    movie: &MovieSummary,
    is_favorite: bool,
    poster_size: &str,
    intents: &mut Vec<Intent>,
) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(CARD_WIDTH - 20.0);
        ui.vertical(|ui| {
            poster(ui, poster_url(movie.poster_path.as_deref(), poster_size), CARD_WIDTH - 20.0);
            ui.add_space(4.0);
            ui.label(egui::RichText::new(&movie.title).strong().size(16.0));
            ui.label(
                egui::RichText::new(format!(
                    "{}  •  ⭐ {}",
                    movie.year_label(),
                    format_rating(movie.vote_average)
                ))
                .weak(),
            );
            if !movie.overview.is_empty() {
                ui.label(excerpt(&movie.overview, OVERVIEW_CHARS));
            }
            ui.add_space(4.0);
            ui.horizontal_wrapped(|ui| {
                if ui.button("ℹ Details").clicked() {
                    intents.push(Intent::ViewDetails(movie.id));
                }
                if ui.button(favorite_label(is_favorite)).clicked() {
                    intents.push(Intent::ToggleFavorite(movie.clone()));
                }
                if ui.button("▶ Trailer").clicked() {
                    intents.push(Intent::WatchTrailer(movie.id));
                }
            });
        });
    });
}

pub fn movie_grid(
    ui: &mut egui::Ui,
    movies: &[MovieSummary],
    is_favorite: impl Fn(u64) -> bool,
    poster_size: &str,
    intents: &mut Vec<Intent>,
) {
    let columns = ((ui.available_width() / CARD_WIDTH) as usize).max(1);

    egui::Grid::new("movie_grid")
        .num_columns(columns)
        .spacing([10.0, 10.0])
        .show(ui, |ui| {
            for row in movies.chunks(columns) {
                for movie in row {
                    movie_card(ui, movie, is_favorite(movie.id), poster_size, intents);
                }
                ui.end_row();
            }
        });
}

pub fn pagination(ui: &mut egui::Ui, current: u32, total: u32, intents: &mut Vec<Intent>) {
    ui.horizontal(|ui| {
        if ui.add_enabled(current > 1, egui::Button::new("⏮")).clicked() {
            intents.push(Intent::ChangePage(1));
        }
        if ui.add_enabled(current > 1, egui::Button::new("◀ Prev")).clicked() {
            intents.push(Intent::ChangePage(current - 1));
        }

        for page in page_window(current, total, 7) {
            if ui.selectable_label(page == current, page.to_string()).clicked() && page != current {
                intents.push(Intent::ChangePage(page));
            }
        }

        if ui.add_enabled(current < total, egui::Button::new("Next ▶")).clicked() {
            intents.push(Intent::ChangePage(current + 1));
        }
        if ui.add_enabled(current < total, egui::Button::new("⏭")).clicked() {
            intents.push(Intent::ChangePage(total));
        }
        ui.label(egui::RichText::new(format!("Page {} of {}", current, total)).weak());
    });
}

pub fn details_window(
    ctx: &egui::Context,
    detail: &MovieDetail,
    is_favorite: bool,
    poster_size: &str,
    intents: &mut Vec<Intent>,
) {
    let mut open = true;

    egui::Window::new(format!("🎬 {}", detail.title))
        .id(egui::Id::new("movie_details"))
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .default_width(620.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.horizontal_top(|ui| {
                poster(ui, poster_url(detail.poster_path.as_deref(), poster_size), DETAIL_POSTER_WIDTH);
                ui.vertical(|ui| {
                    if let Some(tagline) = &detail.tagline {
                        ui.label(egui::RichText::new(tagline).italics().weak());
                        ui.add_space(6.0);
                    }
                    egui::ScrollArea::vertical().max_height(260.0).show(ui, |ui| {
                        ui.label(&detail.overview);
                    });
                });
            });
            ui.separator();

            egui::Grid::new("details_grid").num_columns(2).show(ui, |ui| {
                ui.label(egui::RichText::new("Release Date").strong());
                ui.label(detail.release_date.as_deref().unwrap_or("N/A"));
                ui.end_row();

                ui.label(egui::RichText::new("Rating").strong());
                let rating = match detail.vote_count {
                    Some(votes) if detail.vote_average.is_some() => {
                        format!("{} ({} votes)", format_rating(detail.vote_average), votes)
                    }
                    _ => format_rating(detail.vote_average),
                };
                ui.label(rating);
                ui.end_row();

                ui.label(egui::RichText::new("Genres").strong());
                ui.label(detail.genre_names());
                ui.end_row();

                if let Some(runtime) = detail.runtime.filter(|r| *r > 0) {
                    ui.label(egui::RichText::new("Runtime").strong());
                    ui.label(format!("{}h {:02}m", runtime / 60, runtime % 60));
                    ui.end_row();
                }
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let label = if is_favorite {
                    egui::RichText::new("★ Remove from Favorites").color(egui::Color32::GOLD)
                } else {
                    egui::RichText::new("☆ Add to Favorites")
                };
                if ui.button(label).clicked() {
                    intents.push(Intent::ToggleFavoriteDetail(detail.clone()));
                }
                if ui.button("▶ Trailer").clicked() {
                    intents.push(Intent::WatchTrailer(detail.id));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Close").clicked() {
                        intents.push(Intent::CloseDetails);
                    }
                });
            });
        });

    if !open {
        intents.push(Intent::CloseDetails);
    }
}

pub fn trailer_window(ctx: &egui::Context, url: &str, intents: &mut Vec<Intent>) {
    let mut open = true;

    egui::Window::new("▶ Movie Trailer")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("The trailer plays in your browser.");
            ui.add_space(6.0);
            ui.hyperlink(url);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("▶ Play").clicked() {
                    ctx.open_url(egui::OpenUrl::new_tab(url));
                }
                if ui.button("📋 Copy link").clicked() {
                    ctx.copy_text(url.to_string());
                }
                if ui.button("Close").clicked() {
                    intents.push(Intent::CloseTrailer);
                }
            });
        });

    if !open {
        intents.push(Intent::CloseTrailer);
    }
}

/// Timed popups for transient notices
#[derive(Default)]
pub struct Toasts {
    active: Vec<(Notice, Instant)>,
}

impl Toasts {
    pub fn push(&mut self, notice: Notice) {
        self.active.push((notice, Instant::now() + TOAST_LIFETIME));
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        self.active.retain(|(_, expires)| *expires > now);
        if self.active.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -40.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for (notice, _) in &self.active {
                    let color = match notice.kind {
                        NoticeKind::Info => egui::Color32::from_rgb(100, 200, 100),
                        NoticeKind::Warning => egui::Color32::from_rgb(230, 160, 60),
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(egui::RichText::new(&notice.message).color(color));
                    });
                }
            });

        // Keep frames coming so expired toasts disappear
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}
