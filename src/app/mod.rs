mod import;
pub mod routes;
mod state;
pub mod theme;
mod ui;

use crate::config::Config;
use crate::notify::toast::Toaster;
use crate::notify::{NotificationBus, Severity};
use crate::query::{QueryClient, QueryPolicy};
use crate::upload::{StoredToken, UploadClient, UploadFlow};
use eframe::{egui, App};
pub use import::FileImport;
use reqwest::Url;
use routes::{Route, Router};
pub use state::{ImportState, UploadTicket};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

/// Everything `main` prepares before the window opens.
pub struct Bootstrap {
    pub config: Config,
    pub api_base_url: Url,
    pub http: reqwest::Client,
    pub runtime: Handle,
    pub start_route: Route,
}

pub struct AdminApp {
    router: Router,
    toaster: Toaster,
    import: FileImport,
    query: QueryClient,
    window_focused: bool,
}

impl AdminApp {
    pub fn new(cc: &eframe::CreationContext<'_>, bootstrap: Bootstrap) -> Self {
        log::info!("Initializing product import admin");
        let Bootstrap {
            config,
            api_base_url,
            http,
            runtime,
            start_route,
        } = bootstrap;

        theme::apply(&cc.egui_ctx, &config.theme);

        let bus = NotificationBus::new();
        let toaster = Toaster::new(
            &bus,
            Duration::from_millis(config.notifications.auto_hide_ms),
            Some(cc.egui_ctx.clone()),
        );

        let hook_bus = bus.clone();
        let query = QueryClient::new(QueryPolicy::default())
            .with_mutation_error_hook(move |message| hook_bus.publish(message, Severity::Error));

        let credentials = Arc::new(StoredToken::from_storage(cc.storage));
        let client = UploadClient::from_parts(http, Some(api_base_url), credentials);
        let flow = UploadFlow::new(client, bus.clone(), query.clone())
            .with_transfer_notifications(config.notifications.notify_transfer_errors);

        let import = FileImport::new(
            config.import.title.clone(),
            config.import.resource_path.clone(),
            flow,
            bus,
            runtime,
        );

        Self {
            router: Router::new(start_route),
            toaster,
            import,
            query,
            window_focused: true,
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        let focused = ctx.input(|i| i.focused);
        if focused && !self.window_focused {
            self.query.on_window_focus();
        }
        self.window_focused = focused;

        self.import.poll();
        self.toaster.update(Instant::now());
    }
}

impl App for AdminApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
