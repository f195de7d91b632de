//! Application state for the Funil Digital dashboard.
//!
//! `App` owns the session and the state of every view. Each view activation
//! spawns a fetch on a cloned `ApiClient`; results come back over an mpsc
//! channel and are applied on the UI task by `check_background_tasks`.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use funil_core::api::{ApiClient, ApiError};
use funil_core::auth::{Session, TokenStore};
use funil_core::config::Config;
use funil_core::models::{
    CheckoutConfig, CloneFunnelRequest, Credential, CredentialInput, DashboardStats, Funnel,
    Payment, RevenueStats, TrackingPixel, User, Visitor, VisitorEvent,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the view result channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input (RFC 5321 path limit).
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of rows to move on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Sidebar views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Funnels,
    Credentials,
    Checkout,
    Monitoring,
    Tracking,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Dashboard,
        Tab::Funnels,
        Tab::Credentials,
        Tab::Checkout,
        Tab::Monitoring,
        Tab::Tracking,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Funnels => "Funis",
            Tab::Credentials => "Credenciais",
            Tab::Checkout => "Checkout",
            Tab::Monitoring => "Monitoramento",
            Tab::Tracking => "Tracking",
        }
    }

    /// Tab bound to a number key ('1' is the first tab)
    pub fn from_digit(c: char) -> Option<Self> {
        let n = c.to_digit(10)? as usize;
        Self::ALL.get(n.checked_sub(1)?).copied()
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Funnels,
            Tab::Funnels => Tab::Credentials,
            Tab::Credentials => Tab::Checkout,
            Tab::Checkout => Tab::Monitoring,
            Tab::Monitoring => Tab::Tracking,
            Tab::Tracking => Tab::Dashboard,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Tracking,
            Tab::Funnels => Tab::Dashboard,
            Tab::Credentials => Tab::Funnels,
            Tab::Checkout => Tab::Credentials,
            Tab::Monitoring => Tab::Checkout,
            Tab::Tracking => Tab::Monitoring,
        }
    }

    /// Views with a list on the left and a detail pane on the right
    pub fn has_detail_focus(&self) -> bool {
        matches!(self, Tab::Checkout | Tab::Monitoring | Tab::Tracking)
    }
}

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Session restore still running
    Loading,
    Normal,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    ConfirmingDelete,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

/// A destructive action waiting for confirmation
#[derive(Debug, Clone, PartialEq)]
pub enum PendingDelete {
    Funnel { id: i64, name: String },
    Credential { id: i64, name: String },
}

impl PendingDelete {
    pub fn prompt(&self) -> String {
        match self {
            PendingDelete::Funnel { name, .. } => format!("Excluir o funil \"{}\"?", name),
            PendingDelete::Credential { name, .. } => {
                format!("Excluir a credencial \"{}\"?", name)
            }
        }
    }
}

/// Checkout view for one funnel: its config plus revenue
#[derive(Debug, Clone, Default)]
pub struct CheckoutView {
    pub funnel_id: i64,
    /// `None` when the funnel has no checkout configured
    pub config: Option<CheckoutConfig>,
    pub revenue: RevenueStats,
    pub payments: Vec<Payment>,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned fetch tasks back to the UI task.
enum ViewResult {
    /// Outcome of checking the stored token at startup
    Restored(Result<User, ApiError>),
    Stats(DashboardStats),
    Funnels(Vec<Funnel>),
    Credentials(Vec<Credential>),
    Checkout(CheckoutView),
    Visitors(Vec<Visitor>),
    /// Events for one visitor (visitor_id, events)
    VisitorEvents(i64, Vec<VisitorEvent>),
    /// Pixels for one funnel (funnel_id, pixels)
    Pixels(i64, Vec<TrackingPixel>),
    /// A mutation succeeded; the message goes to the status bar
    Done(String),
    Error(String),
    /// The task has sent everything it will send
    Finished,
}

/// Channel handle for a spawned task, stamped with the session generation
/// it was started under.
#[derive(Clone)]
struct ViewSender {
    tx: mpsc::Sender<(u64, ViewResult)>,
    generation: u64,
}

impl ViewSender {
    async fn send(&self, result: ViewResult) {
        if let Err(e) = self.tx.send((self.generation, result)).await {
            error!(error = %e, "Failed to send view result - channel closed");
        }
    }

    /// Report a failed fetch: log it, then show it in the status bar
    async fn fail(&self, what: &str, e: &ApiError) {
        warn!(error = %e, "{} failed", what);
        self.send(ViewResult::Error(format!("{}: {}", what, e))).await;
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub session: Session,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    pub pending_delete: Option<PendingDelete>,

    // View data, replaced on every fetch
    pub stats: DashboardStats,
    pub funnels: Vec<Funnel>,
    pub credentials: Vec<Credential>,
    pub checkout: Option<CheckoutView>,
    pub visitors: Vec<Visitor>,
    pub visitor_events: Option<(i64, Vec<VisitorEvent>)>,
    pub pixels: Option<(i64, Vec<TrackingPixel>)>,

    // Selection indices
    pub funnel_selection: usize,
    pub credential_selection: usize,
    pub visitor_selection: usize,
    pub pixel_selection: usize,

    // Background task channel
    view_rx: mpsc::Receiver<(u64, ViewResult)>,
    view_tx: mpsc::Sender<(u64, ViewResult)>,
    /// Bumped on logout so results from the previous session are dropped
    view_generation: u64,
    pending_fetches: usize,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Build the API client and session from configuration. The session is
    /// not restored yet; call `begin_restore` from inside the runtime.
    pub fn new(config: Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        debug!(base_url = config.api_base_url(), "App::new() starting");
        let api = ApiClient::new(config.api_base_url(), store, config.request_timeout())?;
        let session = Session::new(api);

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = config.last_email.clone().unwrap_or_default();
        let login_password = config.prefill_password.clone().unwrap_or_default();

        Ok(Self {
            config,
            session,

            state: AppState::Loading,
            current_tab: Tab::Dashboard,
            focus: Focus::List,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,

            pending_delete: None,

            stats: DashboardStats::default(),
            funnels: Vec::new(),
            credentials: Vec::new(),
            checkout: None,
            visitors: Vec::new(),
            visitor_events: None,
            pixels: None,

            funnel_selection: 0,
            credential_selection: 0,
            visitor_selection: 0,
            pixel_selection: 0,

            view_rx: rx,
            view_tx: tx,
            view_generation: 0,
            pending_fetches: 0,

            status_message: None,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Check the stored token in the background. The loading screen stays
    /// up, and keeps taking input, until `Restored` comes back.
    pub fn begin_restore(&mut self) {
        if !self.session.api().has_token() {
            self.finish_restore(None);
            return;
        }
        let api = self.session.api().clone();
        let tx = self.sender();
        tokio::spawn(async move {
            let lookup = api.current_user().await;
            tx.send(ViewResult::Restored(lookup)).await;
        });
    }

    /// Resume the stored session, or show the login form
    fn finish_restore(&mut self, lookup: Option<Result<User, ApiError>>) {
        if self.state != AppState::Loading {
            return;
        }
        if self.session.finish_restore(lookup) {
            self.state = AppState::Normal;
            self.activate_tab(self.current_tab);
        } else {
            self.start_login();
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Header greeting for the signed-in operator
    pub fn greeting(&self) -> Option<String> {
        self.session.current_user().map(|u| u.greeting())
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let email = self.login_email.trim().to_string();
        self.login_error = None;

        match self.session.login(&email, &self.login_password).await {
            Ok(()) => {
                if let Err(e) = Config::remember_email(&email) {
                    warn!(error = %e, "Failed to save config");
                }
                self.config.last_email = Some(email);

                self.login_password.clear();
                self.state = AppState::Normal;
                self.status_message = None;
                self.activate_tab(Tab::Dashboard);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// End the session and go back to the login form with empty views.
    /// The server is told in a detached task; the local token is already
    /// gone when this returns.
    pub fn logout(&mut self) {
        tokio::spawn(self.session.sign_out());
        self.reset_views();
        self.start_login();
    }

    fn reset_views(&mut self) {
        self.view_generation += 1;
        self.pending_fetches = 0;
        self.stats = DashboardStats::default();
        self.funnels.clear();
        self.credentials.clear();
        self.checkout = None;
        self.visitors.clear();
        self.visitor_events = None;
        self.pixels = None;
        self.funnel_selection = 0;
        self.credential_selection = 0;
        self.visitor_selection = 0;
        self.pixel_selection = 0;
        self.pending_delete = None;
        self.status_message = None;
        self.current_tab = Tab::Dashboard;
        self.focus = Focus::List;
    }

    // =========================================================================
    // View Fetching
    // =========================================================================

    fn sender(&self) -> ViewSender {
        ViewSender {
            tx: self.view_tx.clone(),
            generation: self.view_generation,
        }
    }

    /// Whether a spawned fetch has not reported back yet
    pub fn is_fetching(&self) -> bool {
        self.pending_fetches > 0
    }

    /// Spawn a task with a cloned client. Does nothing when signed out.
    fn spawn_view_task<F, Fut>(&mut self, task: F)
    where
        F: FnOnce(ApiClient, ViewSender) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        if !self.is_authenticated() {
            return;
        }
        let api = self.session.api().clone();
        let tx = self.sender();
        self.pending_fetches += 1;

        tokio::spawn(async move {
            task(api, tx.clone()).await;
            tx.send(ViewResult::Finished).await;
        });
    }

    /// Switch to `tab` and fetch its data
    pub fn activate_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.focus = Focus::List;
        self.refresh_current_tab();
    }

    /// Re-fetch everything the current view shows
    pub fn refresh_current_tab(&mut self) {
        let tab = self.current_tab;
        let selected_funnel = self.selected_funnel().map(|f| f.id);
        let selected_visitor = self.visitor_events.as_ref().map(|(id, _)| *id);

        self.spawn_view_task(move |api, tx| async move {
            match tab {
                Tab::Dashboard => {
                    let (stats, funnels) = futures::join!(api.dashboard_stats(), api.funnels());
                    match stats {
                        Ok(stats) => tx.send(ViewResult::Stats(stats)).await,
                        Err(e) => {
                            tx.send(ViewResult::Stats(DashboardStats::default())).await;
                            tx.fail("Erro ao carregar estatísticas", &e).await;
                        }
                    }
                    match funnels {
                        Ok(funnels) => tx.send(ViewResult::Funnels(funnels)).await,
                        Err(e) => tx.fail("Erro ao carregar funis", &e).await,
                    }
                }
                Tab::Funnels => {
                    Self::fetch_funnels(&api, &tx).await;
                }
                Tab::Credentials => {
                    Self::fetch_credentials(&api, &tx).await;
                }
                Tab::Checkout | Tab::Tracking => {
                    if let Some(funnels) = Self::fetch_funnels(&api, &tx).await {
                        let funnel_id = selected_funnel
                            .filter(|id| funnels.iter().any(|f| f.id == *id))
                            .or_else(|| funnels.first().map(|f| f.id));
                        if let Some(funnel_id) = funnel_id {
                            if tab == Tab::Checkout {
                                Self::fetch_checkout(&api, &tx, funnel_id).await;
                            } else {
                                Self::fetch_pixels(&api, &tx, funnel_id).await;
                            }
                        }
                    }
                }
                Tab::Monitoring => match api.visitors().await {
                    Ok(visitors) => {
                        tx.send(ViewResult::Visitors(visitors)).await;
                        if let Some(visitor_id) = selected_visitor {
                            Self::fetch_visitor_events(&api, &tx, visitor_id).await;
                        }
                    }
                    Err(e) => {
                        tx.send(ViewResult::Visitors(Vec::new())).await;
                        tx.fail("Erro ao carregar visitantes", &e).await;
                    }
                },
            }
        });

        if self.is_fetching() {
            self.status_message = None;
        }
    }

    /// Fetch the funnel list, sending it (or an empty list on failure)
    async fn fetch_funnels(api: &ApiClient, tx: &ViewSender) -> Option<Vec<Funnel>> {
        match api.funnels().await {
            Ok(funnels) => {
                tx.send(ViewResult::Funnels(funnels.clone())).await;
                Some(funnels)
            }
            Err(e) => {
                tx.send(ViewResult::Funnels(Vec::new())).await;
                tx.fail("Erro ao carregar funis", &e).await;
                None
            }
        }
    }

    async fn fetch_credentials(api: &ApiClient, tx: &ViewSender) {
        match api.credentials().await {
            Ok(credentials) => tx.send(ViewResult::Credentials(credentials)).await,
            Err(e) => {
                tx.send(ViewResult::Credentials(Vec::new())).await;
                tx.fail("Erro ao carregar credenciais", &e).await;
            }
        }
    }

    async fn fetch_checkout(api: &ApiClient, tx: &ViewSender, funnel_id: i64) {
        let (config, stats, payments) = futures::join!(
            api.checkout_config(funnel_id),
            api.payment_stats(funnel_id),
            api.payments(funnel_id)
        );

        let config = match config {
            Ok(config) => Some(config),
            Err(e) if e.status().map(|s| s.as_u16()) == Some(404) => None,
            Err(e) => {
                tx.fail("Erro ao carregar checkout", &e).await;
                None
            }
        };
        let revenue = match stats {
            Ok(stats) => stats.summary().clone(),
            Err(e) => {
                tx.fail("Erro ao carregar receita", &e).await;
                RevenueStats::default()
            }
        };
        let payments = payments.unwrap_or_else(|e| {
            warn!(error = %e, funnel_id, "Failed to load payments");
            Vec::new()
        });

        tx.send(ViewResult::Checkout(CheckoutView {
            funnel_id,
            config,
            revenue,
            payments,
        }))
        .await;
    }

    async fn fetch_pixels(api: &ApiClient, tx: &ViewSender, funnel_id: i64) {
        match api.pixels(funnel_id).await {
            Ok(pixels) => tx.send(ViewResult::Pixels(funnel_id, pixels)).await,
            Err(e) => {
                tx.send(ViewResult::Pixels(funnel_id, Vec::new())).await;
                tx.fail("Erro ao carregar pixels", &e).await;
            }
        }
    }

    async fn fetch_visitor_events(api: &ApiClient, tx: &ViewSender, visitor_id: i64) {
        match api.visitor_events(visitor_id).await {
            Ok(events) => tx.send(ViewResult::VisitorEvents(visitor_id, events)).await,
            Err(e) => {
                tx.send(ViewResult::VisitorEvents(visitor_id, Vec::new())).await;
                tx.fail("Erro ao carregar eventos", &e).await;
            }
        }
    }

    /// Load checkout or pixels for the funnel under the cursor
    pub fn load_selected_funnel(&mut self) {
        let Some(funnel_id) = self.selected_funnel().map(|f| f.id) else {
            return;
        };
        match self.current_tab {
            Tab::Checkout => self.spawn_view_task(move |api, tx| async move {
                Self::fetch_checkout(&api, &tx, funnel_id).await;
            }),
            Tab::Tracking => {
                self.pixel_selection = 0;
                self.spawn_view_task(move |api, tx| async move {
                    Self::fetch_pixels(&api, &tx, funnel_id).await;
                });
            }
            _ => {}
        }
    }

    /// Load the event trail of the visitor under the cursor
    pub fn load_selected_visitor_events(&mut self) {
        let Some(visitor_id) = self.selected_visitor().map(|v| v.id) else {
            return;
        };
        self.spawn_view_task(move |api, tx| async move {
            Self::fetch_visitor_events(&api, &tx, visitor_id).await;
        });
    }

    /// Check for completed background tasks and apply their results
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.view_rx.try_recv() {
            results.push(result);
        }

        for (generation, result) in results {
            self.process_view_result(generation, result);
        }
    }

    fn process_view_result(&mut self, generation: u64, result: ViewResult) {
        if generation != self.view_generation {
            debug!(generation, "Dropping result from a previous session");
            return;
        }

        match result {
            ViewResult::Restored(lookup) => self.finish_restore(Some(lookup)),
            ViewResult::Stats(stats) => self.stats = stats,
            ViewResult::Funnels(funnels) => {
                self.funnel_selection = clamp_selection(self.funnel_selection, funnels.len());
                self.funnels = funnels;
            }
            ViewResult::Credentials(credentials) => {
                self.credential_selection =
                    clamp_selection(self.credential_selection, credentials.len());
                self.credentials = credentials;
            }
            ViewResult::Checkout(view) => self.checkout = Some(view),
            ViewResult::Visitors(visitors) => {
                self.visitor_selection = clamp_selection(self.visitor_selection, visitors.len());
                self.visitors = visitors;
            }
            ViewResult::VisitorEvents(visitor_id, events) => {
                self.visitor_events = Some((visitor_id, events));
            }
            ViewResult::Pixels(funnel_id, pixels) => {
                self.pixel_selection = clamp_selection(self.pixel_selection, pixels.len());
                self.pixels = Some((funnel_id, pixels));
            }
            ViewResult::Done(message) => {
                info!(%message, "Action completed");
                self.status_message = Some(message);
            }
            ViewResult::Error(message) => self.status_message = Some(message),
            ViewResult::Finished => {
                self.pending_fetches = self.pending_fetches.saturating_sub(1);
            }
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// `t`: flip the active flag of the item under the cursor, then re-fetch
    pub fn toggle_selected(&mut self) {
        match self.current_tab {
            Tab::Funnels => {
                let Some(funnel) = self.selected_funnel() else {
                    return;
                };
                let (id, name) = (funnel.id, funnel.name.clone());
                self.spawn_view_task(move |api, tx| async move {
                    match api.toggle_funnel(id).await {
                        Ok(_) => {
                            tx.send(ViewResult::Done(format!("Status do funil \"{}\" alterado", name)))
                                .await;
                        }
                        Err(e) => tx.fail("Erro ao alterar status do funil", &e).await,
                    }
                    Self::fetch_funnels(&api, &tx).await;
                });
            }
            Tab::Credentials => {
                let Some(credential) = self.selected_credential() else {
                    return;
                };
                let (id, name, active) = (credential.id, credential.name.clone(), credential.is_active);
                self.spawn_view_task(move |api, tx| async move {
                    let input = CredentialInput {
                        is_active: Some(!active),
                        ..Default::default()
                    };
                    match api.update_credential(id, &input).await {
                        Ok(_) => {
                            let label = if active { "desativada" } else { "ativada" };
                            tx.send(ViewResult::Done(format!("Credencial \"{}\" {}", name, label)))
                                .await;
                        }
                        Err(e) => tx.fail("Erro ao alterar credencial", &e).await,
                    }
                    Self::fetch_credentials(&api, &tx).await;
                });
            }
            Tab::Tracking if self.focus == Focus::Detail => {
                let Some(funnel_id) = self.pixels.as_ref().map(|(id, _)| *id) else {
                    return;
                };
                let Some(pixel_id) = self.selected_pixel().map(|p| p.id) else {
                    return;
                };
                self.spawn_view_task(move |api, tx| async move {
                    match api.toggle_pixel(funnel_id, pixel_id).await {
                        Ok(_) => tx.send(ViewResult::Done("Status do pixel alterado".to_string())).await,
                        Err(e) => tx.fail("Erro ao alterar pixel", &e).await,
                    }
                    Self::fetch_pixels(&api, &tx, funnel_id).await;
                });
            }
            _ => {}
        }
    }

    /// `c`: duplicate the funnel under the cursor, then re-fetch
    pub fn clone_selected_funnel(&mut self) {
        if self.current_tab != Tab::Funnels {
            return;
        }
        let Some(funnel) = self.selected_funnel() else {
            return;
        };
        let id = funnel.id;
        let request = CloneFunnelRequest::copy_of(funnel, &Utc::now().timestamp().to_string());

        self.spawn_view_task(move |api, tx| async move {
            match api.clone_funnel(id, Some(&request)).await {
                Ok(_) => {
                    tx.send(ViewResult::Done(format!("Funil clonado como \"{}\"", request.new_name)))
                        .await;
                }
                Err(e) => tx.fail("Erro ao clonar funil", &e).await,
            }
            Self::fetch_funnels(&api, &tx).await;
        });
    }

    /// `x`: ask before deleting the item under the cursor
    pub fn request_delete(&mut self) {
        let pending = match self.current_tab {
            Tab::Funnels => self.selected_funnel().map(|f| PendingDelete::Funnel {
                id: f.id,
                name: f.name.clone(),
            }),
            Tab::Credentials => self.selected_credential().map(|c| PendingDelete::Credential {
                id: c.id,
                name: c.name.clone(),
            }),
            _ => None,
        };
        if let Some(pending) = pending {
            self.pending_delete = Some(pending);
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(pending) = self.pending_delete.take() else {
            return;
        };

        self.spawn_view_task(move |api, tx| async move {
            match pending {
                PendingDelete::Funnel { id, name } => {
                    match api.delete_funnel(id).await {
                        Ok(()) => tx.send(ViewResult::Done(format!("Funil \"{}\" excluído", name))).await,
                        Err(e) => tx.fail("Erro ao excluir funil", &e).await,
                    }
                    Self::fetch_funnels(&api, &tx).await;
                }
                PendingDelete::Credential { id, name } => {
                    match api.delete_credential(id).await {
                        Ok(()) => {
                            tx.send(ViewResult::Done(format!("Credencial \"{}\" excluída", name)))
                                .await
                        }
                        Err(e) => tx.fail("Erro ao excluir credencial", &e).await,
                    }
                    Self::fetch_credentials(&api, &tx).await;
                }
            }
        });
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selected_funnel(&self) -> Option<&Funnel> {
        self.funnels.get(self.funnel_selection)
    }

    pub fn selected_credential(&self) -> Option<&Credential> {
        self.credentials.get(self.credential_selection)
    }

    pub fn selected_visitor(&self) -> Option<&Visitor> {
        self.visitors.get(self.visitor_selection)
    }

    pub fn selected_pixel(&self) -> Option<&TrackingPixel> {
        self.pixels
            .as_ref()
            .and_then(|(_, pixels)| pixels.get(self.pixel_selection))
    }

    /// The cursor the arrow keys move in the current view, with its list length
    fn active_selection(&mut self) -> Option<(&mut usize, usize)> {
        match (self.current_tab, self.focus) {
            (Tab::Dashboard, _) => None,
            (Tab::Funnels, _) | (Tab::Checkout, _) | (Tab::Tracking, Focus::List) => {
                Some((&mut self.funnel_selection, self.funnels.len()))
            }
            (Tab::Credentials, _) => Some((&mut self.credential_selection, self.credentials.len())),
            (Tab::Monitoring, _) => Some((&mut self.visitor_selection, self.visitors.len())),
            (Tab::Tracking, Focus::Detail) => {
                let len = self.pixels.as_ref().map(|(_, p)| p.len()).unwrap_or(0);
                Some((&mut self.pixel_selection, len))
            }
        }
    }

    pub fn select_next(&mut self, step: usize) {
        if let Some((selection, len)) = self.active_selection() {
            *selection = (*selection + step).min(len.saturating_sub(1));
        }
    }

    pub fn select_prev(&mut self, step: usize) {
        if let Some((selection, _)) = self.active_selection() {
            *selection = selection.saturating_sub(step);
        }
    }

    pub fn select_first(&mut self) {
        if let Some((selection, _)) = self.active_selection() {
            *selection = 0;
        }
    }

    pub fn select_last(&mut self) {
        if let Some((selection, len)) = self.active_selection() {
            *selection = len.saturating_sub(1);
        }
    }

    /// Toggle focus between list and detail panels
    pub fn toggle_focus(&mut self) {
        if self.current_tab.has_detail_focus() {
            self.focus = match self.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
        }
    }
}

fn clamp_selection(selection: usize, len: usize) -> usize {
    selection.min(len.saturating_sub(1))
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email character should be accepted
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use funil_core::auth::MemoryTokenStore;

    fn test_app() -> App {
        let config = Config {
            api_base_url: Some("http://127.0.0.1:9/api".to_string()),
            ..Default::default()
        };
        App::new(config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    fn funnel(id: i64, name: &str, active: bool) -> Funnel {
        serde_json::from_value(serde_json::json!({
            "id": id, "name": name, "slug": name.to_lowercase(), "is_active": active,
        }))
        .unwrap()
    }

    // -------------------------------------------------------------------------
    // Tab Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tab_next() {
        assert_eq!(Tab::Dashboard.next(), Tab::Funnels);
        assert_eq!(Tab::Funnels.next(), Tab::Credentials);
        assert_eq!(Tab::Credentials.next(), Tab::Checkout);
        assert_eq!(Tab::Checkout.next(), Tab::Monitoring);
        assert_eq!(Tab::Monitoring.next(), Tab::Tracking);
        assert_eq!(Tab::Tracking.next(), Tab::Dashboard);
    }

    #[test]
    fn test_tab_prev() {
        for tab in Tab::ALL {
            assert_eq!(tab.next().prev(), tab);
        }
        assert_eq!(Tab::Dashboard.prev(), Tab::Tracking);
    }

    #[test]
    fn test_tab_from_digit() {
        assert_eq!(Tab::from_digit('1'), Some(Tab::Dashboard));
        assert_eq!(Tab::from_digit('6'), Some(Tab::Tracking));
        assert_eq!(Tab::from_digit('0'), None);
        assert_eq!(Tab::from_digit('7'), None);
        assert_eq!(Tab::from_digit('x'), None);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_email_char() {
        assert!(can_add_email_char(0, 'a'));
        assert!(can_add_email_char(0, '@'));
        assert!(can_add_email_char(253, 'z'));
        assert!(!can_add_email_char(254, 'a'));
        assert!(!can_add_email_char(0, ' '));
        assert!(!can_add_email_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(0, ' '));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\x00'));
    }

    // -------------------------------------------------------------------------
    // State Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_new_app_starts_loading_with_prefill() {
        let config = Config {
            last_email: Some("admin@funil.com".to_string()),
            ..Default::default()
        };
        let mut app = App::new(config, Arc::new(MemoryTokenStore::new())).unwrap();
        assert_eq!(app.state, AppState::Loading);
        assert!(app.session.is_loading());
        assert_eq!(app.login_email, "admin@funil.com");

        app.start_login();
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_focus, LoginFocus::Password);
    }

    #[test]
    fn test_funnel_results_clamp_selection() {
        let mut app = test_app();
        app.funnel_selection = 5;
        app.process_view_result(
            0,
            ViewResult::Funnels(vec![funnel(1, "A", true), funnel(2, "B", false)]),
        );
        assert_eq!(app.funnel_selection, 1);
        assert_eq!(app.selected_funnel().unwrap().id, 2);

        app.process_view_result(0, ViewResult::Funnels(Vec::new()));
        assert_eq!(app.funnel_selection, 0);
        assert!(app.selected_funnel().is_none());
    }

    #[test]
    fn test_toggle_result_replaces_badge() {
        let mut app = test_app();
        app.process_view_result(0, ViewResult::Funnels(vec![funnel(42, "Funil", true)]));
        assert_eq!(app.funnels[0].status_label(), "Ativo");

        app.process_view_result(0, ViewResult::Done("Status do funil \"Funil\" alterado".into()));
        app.process_view_result(0, ViewResult::Funnels(vec![funnel(42, "Funil", false)]));
        assert_eq!(app.funnels[0].status_label(), "Pausado");
        assert_eq!(
            app.status_message.as_deref(),
            Some("Status do funil \"Funil\" alterado")
        );
    }

    #[tokio::test]
    async fn test_logout_discards_state_and_stale_results() {
        let mut app = test_app();
        app.state = AppState::Normal;
        app.process_view_result(0, ViewResult::Funnels(vec![funnel(1, "A", true)]));
        app.stats.visitors = 10;

        app.logout();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.funnels.is_empty());
        assert_eq!(app.stats, DashboardStats::default());

        // A fetch started before logout reports back late
        app.process_view_result(0, ViewResult::Funnels(vec![funnel(1, "A", true)]));
        assert!(app.funnels.is_empty());
    }

    #[test]
    fn test_selection_moves_within_bounds() {
        let mut app = test_app();
        app.current_tab = Tab::Funnels;
        app.funnels = (1..=3).map(|i| funnel(i, "F", true)).collect();

        app.select_next(1);
        assert_eq!(app.funnel_selection, 1);
        app.select_next(PAGE_SCROLL_SIZE);
        assert_eq!(app.funnel_selection, 2);
        app.select_prev(PAGE_SCROLL_SIZE);
        assert_eq!(app.funnel_selection, 0);
        app.select_last();
        assert_eq!(app.funnel_selection, 2);

        app.current_tab = Tab::Dashboard;
        app.select_first();
        assert_eq!(app.funnel_selection, 2);
    }

    #[test]
    fn test_tracking_focus_moves_pixel_cursor() {
        let mut app = test_app();
        app.current_tab = Tab::Tracking;
        app.funnels = vec![funnel(1, "F", true)];
        let pixel: TrackingPixel = serde_json::from_value(serde_json::json!({
            "id": 9, "funnel_id": 1, "pixel_type": "facebook", "pixel_id": "123"
        }))
        .unwrap();
        app.pixels = Some((1, vec![pixel.clone(), pixel]));

        app.toggle_focus();
        assert_eq!(app.focus, Focus::Detail);
        app.select_next(1);
        assert_eq!(app.pixel_selection, 1);
        assert_eq!(app.funnel_selection, 0);

        app.current_tab = Tab::Funnels;
        app.focus = Focus::List;
        app.toggle_focus();
        assert_eq!(app.focus, Focus::List);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = test_app();
        app.state = AppState::Normal;
        app.current_tab = Tab::Funnels;
        app.funnels = vec![funnel(7, "Funil Cartão", false)];

        app.request_delete();
        assert_eq!(app.state, AppState::ConfirmingDelete);
        assert_eq!(
            app.pending_delete.as_ref().map(|p| p.prompt()).as_deref(),
            Some("Excluir o funil \"Funil Cartão\"?")
        );

        app.cancel_delete();
        assert_eq!(app.state, AppState::Normal);
        assert!(app.pending_delete.is_none());
    }

    #[test]
    fn test_delete_on_dashboard_is_ignored() {
        let mut app = test_app();
        app.state = AppState::Normal;
        app.funnels = vec![funnel(7, "F", true)];
        app.request_delete();
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_signed_out_actions_spawn_nothing() {
        let mut app = test_app();
        app.current_tab = Tab::Funnels;
        app.funnels = vec![funnel(7, "F", true)];
        app.toggle_selected();
        app.clone_selected_funnel();
        app.refresh_current_tab();
        assert!(!app.is_fetching());
    }

    #[test]
    fn test_finished_counts_down() {
        let mut app = test_app();
        app.pending_fetches = 1;
        app.process_view_result(0, ViewResult::Finished);
        assert!(!app.is_fetching());
        app.process_view_result(0, ViewResult::Finished);
        assert!(!app.is_fetching());
    }

    fn admin() -> User {
        User {
            id: 1,
            email: "admin@funil.com".to_string(),
            name: None,
            role: Some("admin".to_string()),
        }
    }

    #[test]
    fn test_restore_without_token_goes_to_login() {
        let mut app = test_app();
        app.begin_restore();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.session.is_loading());
    }

    #[tokio::test]
    async fn test_restored_user_opens_dashboard() {
        let store = Arc::new(MemoryTokenStore::with_token("abc"));
        let config = Config {
            api_base_url: Some("http://127.0.0.1:9/api".to_string()),
            ..Default::default()
        };
        let mut app = App::new(config, store.clone()).unwrap();

        app.process_view_result(0, ViewResult::Restored(Ok(admin())));
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.current_tab, Tab::Dashboard);
        assert_eq!(app.greeting().as_deref(), Some("Olá, admin@funil.com"));
        assert!(app.is_fetching());

        // A second answer after startup changes nothing
        let late = ApiError::InvalidResponse("late".to_string());
        app.process_view_result(0, ViewResult::Restored(Err(late)));
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_rejected_token_shows_login_and_clears_store() {
        let store = Arc::new(MemoryTokenStore::with_token("expired"));
        let mut app = App::new(Config::default(), store.clone()).unwrap();

        let rejected = ApiError::InvalidResponse("Token has expired".to_string());
        app.process_view_result(0, ViewResult::Restored(Err(rejected)));
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_does_not_wait_for_unresponsive_server() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = Config {
            api_base_url: Some(format!("http://{}/api", listener.local_addr().unwrap())),
            ..Default::default()
        };
        let store = Arc::new(MemoryTokenStore::with_token("abc"));
        let mut app = App::new(config, store.clone()).unwrap();
        // Signed in without a dashboard fetch, so the only connection is the logout
        assert!(app.session.finish_restore(Some(Ok(admin()))));
        app.state = AppState::Normal;

        app.logout();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.is_authenticated());
        assert_eq!(store.load().unwrap(), None);

        // The server call is still made, in the background
        let accepted =
            tokio::time::timeout(std::time::Duration::from_secs(5), listener.accept()).await;
        assert!(matches!(accepted, Ok(Ok(_))));
        assert_eq!(store.load().unwrap(), None);
    }
}
