//! View controller
//!
//! Owns the view state and the favorites list. Every user intent is an
//! explicit method; remote work goes out through a [`Dispatch`] and comes
//! back as a [`TaskResult`] fed to [`ViewController::apply`] on the UI
//! thread, in completion order.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use crate::api::{find_trailer, youtube_embed_url, MovieCatalog};
use crate::favorites::{self, FavoritesList, FavoritesStorage, FavoritesStore};
use crate::models::{ActiveView, MovieDetail, MoviePage, MovieSummary, Video};

/// TMDB refuses pages past this
pub const MAX_TOTAL_PAGES: u32 = 500;

pub const MOVIES_ERROR: &str = "Failed to fetch movies.";
pub const DETAILS_ERROR: &str = "Failed to fetch movie details.";
pub const TRAILER_MISSING: &str = "Trailer not available";
pub const TRAILER_FAILED: &str = "Failed to fetch trailer";

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogQuery {
    Popular { page: u32 },
    Search { term: String, page: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Catalog { generation: u64, query: CatalogQuery },
    Details { movie_id: u64 },
    Videos { movie_id: u64 },
}

/// Background task messages
#[derive(Debug)]
pub enum TaskResult {
    MoviesLoaded { generation: u64, page: MoviePage },
    MoviesFailed { generation: u64, error: String },
    DetailsLoaded(MovieDetail),
    DetailsFailed { movie_id: u64, error: String },
    VideosLoaded { movie_id: u64, videos: Vec<Video> },
    VideosFailed { movie_id: u64, error: String },
}

/// Sends a request somewhere that will eventually answer with a `TaskResult`
pub trait Dispatch {
    fn dispatch(&mut self, request: FetchRequest);
}

/// Execute one request against the catalog
pub fn run_request(catalog: &dyn MovieCatalog, request: FetchRequest) -> TaskResult {
    match request {
        FetchRequest::Catalog { generation, query } => {
            let result = match &query {
                CatalogQuery::Popular { page } => catalog.popular_movies(*page),
                CatalogQuery::Search { term, page } => catalog.search_movies(term, *page),
            };
            match result {
                Ok(page) => TaskResult::MoviesLoaded { generation, page },
                Err(e) => TaskResult::MoviesFailed { generation, error: e.to_string() },
            }
        }
        FetchRequest::Details { movie_id } => match catalog.movie_details(movie_id) {
            Ok(detail) => TaskResult::DetailsLoaded(detail),
            Err(e) => TaskResult::DetailsFailed { movie_id, error: e.to_string() },
        },
        FetchRequest::Videos { movie_id } => match catalog.movie_videos(movie_id) {
            Ok(videos) => TaskResult::VideosLoaded { movie_id, videos },
            Err(e) => TaskResult::VideosFailed { movie_id, error: e.to_string() },
        },
    }
}

/// Failure result for `request`, used when the worker could not finish it
pub fn failed_result(request: &FetchRequest, error: String) -> TaskResult {
    match request {
        FetchRequest::Catalog { generation, .. } => TaskResult::MoviesFailed { generation: *generation, error },
        FetchRequest::Details { movie_id } => TaskResult::DetailsFailed { movie_id: *movie_id, error },
        FetchRequest::Videos { movie_id } => TaskResult::VideosFailed { movie_id: *movie_id, error },
    }
}

/// Runs each request on its own worker thread and reports over a channel
pub struct ThreadDispatcher {
    catalog: Arc<dyn MovieCatalog>,
    sender: Sender<TaskResult>,
}

impl ThreadDispatcher {
    pub fn new(catalog: Arc<dyn MovieCatalog>, sender: Sender<TaskResult>) -> Self {
        Self { catalog, sender }
    }

    pub fn set_catalog(&mut self, catalog: Arc<dyn MovieCatalog>) {
        self.catalog = catalog;
    }
}

impl Dispatch for ThreadDispatcher {
    fn dispatch(&mut self, request: FetchRequest) {
        let catalog = Arc::clone(&self.catalog);
        let sender = self.sender.clone();

        thread::spawn(move || {
            // Panics still report a failure
            let fallback = failed_result(&request, "worker panicked".to_string());
            let result = panic::catch_unwind(AssertUnwindSafe(|| run_request(catalog.as_ref(), request)))
                .unwrap_or_else(|_| {
                    log::error!("Worker panicked");
                    fallback
                });
            // Receiver gone means the app is shutting down
            let _ = sender.send(result);
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
}

/// One-shot message for the user, never part of the view state
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub active_view: ActiveView,
    pub search_term: String,
    pub page: u32,
    pub total_pages: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub selected_detail: Option<MovieDetail>,
    pub trailer_url: Option<String>,
    pub movies: Vec<MovieSummary>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            active_view: ActiveView::Search,
            search_term: String::new(),
            page: 1,
            total_pages: 0,
            loading: false,
            error: None,
            selected_detail: None,
            trailer_url: None,
            movies: Vec::new(),
        }
    }
}

pub struct ViewController<D: Dispatch, S: FavoritesStorage> {
    state: ViewState,
    favorites: FavoritesList,
    store: FavoritesStore<S>,
    dispatcher: D,
    generation: u64,
    in_flight: usize,
    notices: VecDeque<Notice>,
}

impl<D: Dispatch, S: FavoritesStorage> ViewController<D, S> {
    /// Load favorites from the store and set up the initial state.
    /// No request is issued until [`refresh`](Self::refresh).
    pub fn new(dispatcher: D, mut store: FavoritesStore<S>) -> Self {
        let favorites = store.load();
        Self {
            state: ViewState::default(),
            favorites,
            store,
            dispatcher,
            generation: 0,
            in_flight: 0,
            notices: VecDeque::new(),
        }
    }

    /// Re-issue the query for the current term and page. Used at startup
    /// and after the catalog client changes.
    pub fn refresh(&mut self) {
        if self.state.active_view == ActiveView::Search {
            self.issue_catalog_query();
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn favorites(&self) -> &FavoritesList {
        &self.favorites
    }

    pub fn is_favorite(&self, movie_id: u64) -> bool {
        self.favorites.contains(movie_id)
    }

    /// The list the grid should show for the active view
    pub fn displayed_movies(&self) -> &[MovieSummary] {
        match self.state.active_view {
            ActiveView::Search => &self.state.movies,
            ActiveView::Favorites => self.favorites.items(),
        }
    }

    /// True while any request has not reported back
    pub fn is_busy(&self) -> bool {
        self.state.loading || self.in_flight > 0
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notices.push_back(Notice { kind, message: message.into() });
    }

    fn send(&mut self, request: FetchRequest) {
        self.in_flight += 1;
        self.dispatcher.dispatch(request);
    }

    fn current_query(&self) -> CatalogQuery {
        let term = self.state.search_term.trim();
        if term.is_empty() {
            CatalogQuery::Popular { page: self.state.page }
        } else {
            CatalogQuery::Search { term: term.to_string(), page: self.state.page }
        }
    }

    fn issue_catalog_query(&mut self) {
        self.generation += 1;
        self.state.loading = true;
        self.state.error = None;

        let query = self.current_query();
        log::debug!("Catalog query #{}: {:?}", self.generation, query);
        self.send(FetchRequest::Catalog { generation: self.generation, query });
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.state.search_term = term.to_string();
        self.state.page = 1;
        if self.state.active_view == ActiveView::Search {
            self.issue_catalog_query();
        }
    }

    /// Move to page `page`. Returns false when the page is out of range
    /// or already current.
    pub fn set_page(&mut self, page: u32) -> bool {
        if page < 1 || page > self.state.total_pages {
            log::debug!("Rejected page {} (total {})", page, self.state.total_pages);
            return false;
        }
        if page == self.state.page {
            return false;
        }

        self.state.page = page;
        if self.state.active_view == ActiveView::Search {
            self.issue_catalog_query();
        }
        true
    }

    pub fn switch_view(&mut self, view: ActiveView) {
        if self.state.active_view == view {
            return;
        }
        self.state.active_view = view;

        match view {
            ActiveView::Favorites => {
                // Results still in flight belong to the search view
                self.generation += 1;
                self.state.movies.clear();
                self.state.loading = false;
                self.state.error = None;
            }
            ActiveView::Search => self.issue_catalog_query(),
        }
    }

    pub fn open_details(&mut self, movie_id: u64) {
        self.state.error = None;
        self.send(FetchRequest::Details { movie_id });
    }

    pub fn close_details(&mut self) {
        self.state.selected_detail = None;
    }

    pub fn request_trailer(&mut self, movie_id: u64) {
        self.send(FetchRequest::Videos { movie_id });
    }

    pub fn close_trailer(&mut self) {
        self.state.trailer_url = None;
    }

    pub fn toggle_favorite(&mut self, movie: &MovieSummary) {
        let updated = favorites::toggle(&self.favorites, movie);
        if updated.len() > self.favorites.len() {
            log::info!("Added favorite {} ({})", movie.title, movie.id);
            self.notify(NoticeKind::Info, format!("Added '{}' to favorites", movie.title));
        } else {
            log::info!("Removed favorite {} ({})", movie.title, movie.id);
            self.notify(NoticeKind::Info, format!("Removed '{}' from favorites", movie.title));
        }
        self.favorites = updated;
        self.store.persist(&self.favorites);
    }

    pub fn toggle_favorite_detail(&mut self, detail: &MovieDetail) {
        self.toggle_favorite(&detail.summary());
    }

    /// Merge imported movies into favorites; returns how many were new
    pub fn import_favorites(&mut self, items: Vec<MovieSummary>) -> usize {
        let offered = items.len();
        let added = self.favorites.merge(items);
        if added > 0 {
            self.store.persist(&self.favorites);
        }
        log::info!("Imported {} of {} favorites", added, offered);
        self.notify(
            NoticeKind::Info,
            format!("Imported {} new favorites ({} skipped)", added, offered - added),
        );
        added
    }

    /// Surface an outcome that happened outside the controller
    pub fn push_notice(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notify(kind, message);
    }

    pub fn apply(&mut self, result: TaskResult) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match result {
            TaskResult::MoviesLoaded { generation, page } => {
                if generation != self.generation {
                    log::debug!("Dropping stale results #{} (current #{})", generation, self.generation);
                    return;
                }
                log::info!(
                    "Loaded {} movies (page {} of {})",
                    page.results.len(),
                    page.page,
                    page.total_pages
                );
                self.state.movies = page.results;
                self.state.total_pages = page.total_pages.min(MAX_TOTAL_PAGES);
                self.state.loading = false;

                // The listing shrank under the current page
                let total = self.state.total_pages;
                if total > 0 && self.state.page > total {
                    log::debug!("Page {} past the last page {}, moving back", self.state.page, total);
                    self.state.page = total;
                    self.issue_catalog_query();
                }
            }
            TaskResult::MoviesFailed { generation, error } => {
                if generation != self.generation {
                    log::debug!("Dropping stale failure #{}: {}", generation, error);
                    return;
                }
                log::warn!("Catalog query failed: {}", error);
                self.state.movies.clear();
                self.state.error = Some(MOVIES_ERROR.to_string());
                self.state.loading = false;
            }
            TaskResult::DetailsLoaded(detail) => {
                log::info!("Loaded details for {} ({})", detail.title, detail.id);
                self.state.selected_detail = Some(detail);
            }
            TaskResult::DetailsFailed { movie_id, error } => {
                log::warn!("Details for {} failed: {}", movie_id, error);
                self.state.error = Some(DETAILS_ERROR.to_string());
            }
            TaskResult::VideosLoaded { movie_id, videos } => match find_trailer(&videos) {
                Some(trailer) => {
                    log::info!("Trailer for {}: {}", movie_id, trailer.key);
                    self.state.trailer_url = Some(youtube_embed_url(&trailer.key));
                }
                None => {
                    log::info!("No trailer among {} videos for {}", videos.len(), movie_id);
                    self.notify(NoticeKind::Warning, TRAILER_MISSING);
                }
            },
            TaskResult::VideosFailed { movie_id, error } => {
                log::warn!("Videos for {} failed: {}", movie_id, error);
                self.notify(NoticeKind::Warning, TRAILER_FAILED);
            }
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
