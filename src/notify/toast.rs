use super::{Notification, NotificationBus, Subscription};
use crate::app::theme;
use eframe::egui::{self, Align2, Color32, RichText};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_AUTO_HIDE: Duration = Duration::from_millis(3000);

/// What the notification surface currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToastState {
    #[default]
    Hidden,
    Visible {
        notification: Notification,
        shown_at: Instant,
    },
}

impl ToastState {
    /// Displays `notification`, replacing whatever was shown and restarting the timer.
    pub fn show(&mut self, notification: Notification, now: Instant) {
        *self = ToastState::Visible {
            notification,
            shown_at: now,
        };
    }

    pub fn dismiss(&mut self) {
        *self = ToastState::Hidden;
    }

    /// Hides the toast once `auto_hide` has elapsed. Returns true if it was hidden by this call.
    pub fn tick(&mut self, now: Instant, auto_hide: Duration) -> bool {
        let expired = matches!(
            self,
            ToastState::Visible { shown_at, .. } if now.saturating_duration_since(*shown_at) >= auto_hide
        );
        if expired {
            self.dismiss();
        }
        expired
    }

    /// Time left before auto-hide, `None` while hidden.
    pub fn remaining(&self, now: Instant, auto_hide: Duration) -> Option<Duration> {
        match self {
            ToastState::Hidden => None,
            ToastState::Visible { shown_at, .. } => {
                Some(auto_hide.saturating_sub(now.saturating_duration_since(*shown_at)))
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, ToastState::Visible { .. })
    }

    pub fn current(&self) -> Option<&Notification> {
        match self {
            ToastState::Hidden => None,
            ToastState::Visible { notification, .. } => Some(notification),
        }
    }
}

/// The notification surface: subscribes to the bus and renders one toast at a time.
pub struct Toaster {
    state: ToastState,
    auto_hide: Duration,
    receiver: Receiver<Notification>,
    _subscription: Subscription,
}

impl Toaster {
    pub fn new(bus: &NotificationBus, auto_hide: Duration, repaint: Option<egui::Context>) -> Self {
        let (sender, receiver): (Sender<Notification>, Receiver<Notification>) = channel();
        let sender = Mutex::new(sender);

        let subscription = bus.subscribe(move |notification| {
            if let Ok(sender) = sender.lock() {
                sender.send(notification.clone()).unwrap_or_default();
            }
            if let Some(ctx) = &repaint {
                ctx.request_repaint();
            }
        });

        Self {
            state: ToastState::Hidden,
            auto_hide,
            receiver,
            _subscription: subscription,
        }
    }

    /// Applies events received since the last frame (latest wins) and the auto-hide timer.
    pub fn update(&mut self, now: Instant) {
        while let Ok(notification) = self.receiver.try_recv() {
            self.state.show(notification, now);
        }
        self.state.tick(now, self.auto_hide);
    }

    pub fn dismiss(&mut self) {
        self.state.dismiss();
    }

    pub fn state(&self) -> &ToastState {
        &self.state
    }

    pub fn render(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let Some(remaining) = self.state.remaining(now, self.auto_hide) else {
            return;
        };
        let Some(notification) = self.state.current().cloned() else {
            return;
        };

        let fill = theme::severity_color(notification.severity);
        let mut close_clicked = false;

        egui::Area::new(egui::Id::new("toast"))
            .anchor(Align2::RIGHT_BOTTOM, [-16.0, -16.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(fill)
                    .stroke(egui::Stroke::NONE)
                    .show(ui, |ui| {
                        ui.set_min_width(260.0);
                        ui.horizontal(|ui| {
                            ui.label(
                                RichText::new(&notification.message)
                                    .color(Color32::WHITE)
                                    .strong(),
                            );
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui
                                    .add(egui::Button::new(RichText::new("✖").color(Color32::WHITE)).frame(false))
                                    .clicked()
                                {
                                    close_clicked = true;
                                }
                            });
                        });
                    });
            });

        if close_clicked {
            self.dismiss();
        } else {
            ctx.request_repaint_after(remaining);
        }
    }
}
