use crm_kanban_core::Notifier;
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Loading,
}

impl ToastKind {
    fn class(self) -> &'static str {
        match self {
            ToastKind::Success => "toast toast-success",
            ToastKind::Error => "toast toast-error",
            ToastKind::Loading => "toast toast-loading",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

/// Visible toasts, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    const MAX_VISIBLE: usize = 5;

    pub fn push(&mut self, kind: ToastKind, message: &str) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        if self.toasts.len() == Self::MAX_VISIBLE {
            self.toasts.remove(0);
        }
        self.toasts.push(Toast {
            id,
            kind,
            message: message.to_string(),
        });
        id
    }

    pub fn remove(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    /// Drops loading toasts; finished ones expire on their own.
    pub fn dismiss_loading(&mut self) {
        self.toasts.retain(|t| t.kind != ToastKind::Loading);
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }
}

/// Reactive toast surface, provided through context.
#[derive(Debug, Clone, Copy)]
pub struct Toaster {
    queue: RwSignal<ToastQueue>,
    duration_ms: u32,
}

impl Toaster {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            queue: RwSignal::new(ToastQueue::default()),
            duration_ms,
        }
    }

    pub fn remove(&self, id: u64) {
        self.queue.update(|q| q.remove(id));
    }

    fn push_expiring(&self, kind: ToastKind, message: &str) {
        let mut id = 0;
        self.queue.update(|q| id = q.push(kind, message));
        let toaster = *self;
        let duration = self.duration_ms;
        spawn_local(async move {
            TimeoutFuture::new(duration).await;
            toaster.remove(id);
        });
    }
}

impl Notifier for Toaster {
    fn success(&self, message: &str) {
        self.push_expiring(ToastKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.push_expiring(ToastKind::Error, message);
    }

    fn loading(&self, message: &str) {
        self.queue.update(|q| {
            q.push(ToastKind::Loading, message);
        });
    }

    fn dismiss(&self) {
        self.queue.update(ToastQueue::dismiss_loading);
    }
}

#[component]
pub fn ToastHost() -> impl IntoView {
    let toaster = expect_context::<Toaster>();

    view! {
        <div class="toast-host" role="status" aria-live="polite">
            {move || {
                toaster.queue.with(|q| {
                    q.toasts()
                        .iter()
                        .cloned()
                        .map(|toast| {
                            let id = toast.id;
                            view! {
                                <div class=toast.kind.class()>
                                    <span class="toast-message">{toast.message}</span>
                                    <button class="toast-close" on:click=move |_| toaster.remove(id)>"×"</button>
                                </div>
                            }
                        })
                        .collect_view()
                })
            }}
        </div>
    }
}
