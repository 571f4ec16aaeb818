//! TUI runtime - owns terminal, runs event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here. The
//! reducer stays pure and produces effects; this module executes them.
//!
//! Async results come back through an inbox channel: spawned tasks send
//! `UiEvent`s to `inbox_tx`, and the loop drains `inbox_rx` each frame. A
//! separate forwarder task watches the auth session and turns identity
//! changes into `AuthStateChanged` events, so the UI reacts uniformly whether
//! the change came from a keypress or from a dispatcher side effect.

use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use authdeck_core::actions::CredentialMethod;
use authdeck_core::auth::{AuthBackend, AuthSession, Credential};
use authdeck_core::dispatch::{self, ExecuteRequest};
use authdeck_core::google::GoogleFlow;
use authdeck_core::photo;

use crate::effects::{ExecutePlan, UiEffect};
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Target frame rate while something is animating (~60fps).
pub const FRAME_DURATION: std::time::Duration = std::time::Duration::from_millis(16);

/// Poll duration when idle. Longer timeout reduces CPU usage.
pub const IDLE_POLL_DURATION: std::time::Duration = std::time::Duration::from_millis(100);

/// Everything the effect executors need: the backend seam, the shared
/// session, the interactive Google flow, and a plain HTTP client for photos.
pub struct RuntimeDeps {
    pub backend: Arc<dyn AuthBackend>,
    pub session: AuthSession,
    pub google: Arc<GoogleFlow>,
    pub http: reqwest::Client,
}

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Runs the event loop and executes effects.
/// Terminal state is restored on drop, panic, or error exit.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    deps: Arc<RuntimeDeps>,
    inbox_tx: mpsc::UnboundedSender<UiEvent>,
    inbox_rx: mpsc::UnboundedReceiver<UiEvent>,
    last_tick: std::time::Instant,
    last_terminal_event: std::time::Instant,
}

impl TuiRuntime {
    /// Creates a new TUI runtime and starts the session watcher.
    pub fn new(deps: RuntimeDeps) -> Result<Self> {
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        spawn_session_watcher(&deps.session, inbox_tx.clone());

        let now = std::time::Instant::now();
        Ok(Self {
            terminal,
            state: AppState::new(),
            deps: Arc::new(deps),
            inbox_tx,
            inbox_rx,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the main event loop until the user quits.
    pub fn run(&mut self) -> Result<()> {
        let result = self.event_loop();
        let restore = terminal::restore_terminal();
        result.and(restore)
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let events = self.collect_events()?;

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = std::time::Instant::now();
                }
                // Ticks cap the render rate; other events batch to the next one.
                if matches!(&event, UiEvent::Tick) {
                    dirty = true;
                }

                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    /// Collects events from the terminal and the inbox.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        // Fast poll while tasks run or during recent interaction; slow
        // otherwise to save CPU.
        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let tick_interval = if self.state.tasks.is_any_running() || recent_terminal_activity {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let time_until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());
        let poll_duration = if events.is_empty() {
            time_until_tick
        } else {
            std::time::Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(std::time::Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = std::time::Instant::now();
        }

        Ok(events)
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns an async effect; the result event lands in the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce(Arc<RuntimeDeps>) -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let deps = Arc::clone(&self.deps);
        tokio::spawn(async move {
            let _ = tx.send(f(deps).await);
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::Execute { task, plan } => {
                self.spawn_effect(move |deps| async move {
                    let result = run_execute(&deps, plan).await;
                    UiEvent::ExecuteFinished {
                        id: task,
                        result: result.map_err(|e| format!("{e:#}")),
                    }
                });
            }
            UiEffect::FetchPhoto { task, url } => {
                self.spawn_effect(move |deps| async move {
                    let result = photo::fetch_photo(&deps.http, &url).await;
                    UiEvent::PhotoFetched {
                        id: task,
                        url,
                        result: result.map_err(|e| format!("{e:#}")),
                    }
                });
            }
        }
    }
}

/// Forwards session identity changes into the inbox as `AuthStateChanged`.
///
/// The task ends when the UI side drops the inbox receiver or the session
/// sender goes away.
fn spawn_session_watcher(session: &AuthSession, tx: mpsc::UnboundedSender<UiEvent>) {
    let mut rx = session.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let user = rx.borrow_and_update().as_ref().map(|s| s.user.clone());
            if tx.send(UiEvent::AuthStateChanged(user)).is_err() {
                break;
            }
        }
    });
}

/// Resolves the credential (if the action needs one) and dispatches.
///
/// Email/password credentials come straight from the plan's field snapshot;
/// the Google method runs the interactive browser flow, which can take as
/// long as the operator needs.
async fn run_execute(deps: &RuntimeDeps, plan: ExecutePlan) -> Result<String> {
    let credential = if plan.action.requires_credential() {
        Some(match plan.method {
            CredentialMethod::EmailPassword => {
                Credential::email_password(&plan.email, &plan.password)
            }
            CredentialMethod::Google => deps.google.sign_in().await?,
        })
    } else {
        None
    };

    let request = ExecuteRequest {
        action: plan.action,
        email: plan.email,
        password: plan.password,
        credential,
    };
    dispatch::execute(deps.backend.as_ref(), &deps.session, &request).await
}
