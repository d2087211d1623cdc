//! # Widget
//!
//! An interactive control loop bound to one rendered message.
//!
//! ```text
//!            deploy                      timeout
//!   Idle ─────────────▶ Running ───────────────────▶ TimedOut
//!    ▲                   │  │  ╲     cancel()
//!    │ send failed       │  │   ╲─────────────────▶ Cancelled
//!    └───────────────────┘  │      complete()
//!                           └──────────────────────▶ Completed
//! ```
//!
//! While running, every button press on the bound message is matched to a
//! handler by action id. Handlers run on their own tasks, so a slow or
//! failing handler never stalls the loop. Presses from users outside the
//! whitelist and presses without a handler are ignored.
//!
//! On any terminal transition the interactive controls are stripped from the
//! rendered message exactly once.

use std::{collections::HashSet, future::Future, sync::Arc, time::Duration};

use dashmap::{mapref::entry::Entry, DashMap};
use futures::{future::BoxFuture, FutureExt};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, instrument, trace, warn};

use super::component::{default_controls, ActionRow, MessageContent};
use crate::{
    config::WidgetConfig,
    event::{ChannelId, EventType, EventWaiter, Interaction, Message, MessageId, Payload, UserId, WaitError},
    platform::{Platform, PlatformError},
};

pub type HandlerFuture = BoxFuture<'static, WidgetResult<()>>;

/// Action handler. Receives the widget and the interaction that triggered it.
pub type WidgetHandler = Arc<dyn Fn(Arc<Widget>, Interaction) -> HandlerFuture + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum WidgetPhase {
    Idle,
    Running,
    Completed,
    TimedOut,
    Cancelled,
}

impl WidgetPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WidgetPhase::Completed | WidgetPhase::TimedOut | WidgetPhase::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopSignal {
    Completed,
    Cancelled,
}

impl From<StopSignal> for WidgetPhase {
    fn from(signal: StopSignal) -> Self {
        match signal {
            StopSignal::Completed => WidgetPhase::Completed,
            StopSignal::Cancelled => WidgetPhase::Cancelled,
        }
    }
}

#[derive(Debug)]
struct WidgetState {
    phase: WidgetPhase,
    view: Option<MessageContent>,
    message_id: Option<MessageId>,
    controls: Vec<ActionRow>,
    default_controls: bool,
    total_pages: usize,
    timeout: Option<Duration>,
    query_timeout: Duration,
    user_whitelist: HashSet<UserId>,
}

pub struct Widget {
    platform: Arc<dyn Platform>,
    waiter: Arc<EventWaiter>,
    channel_id: ChannelId,
    handlers: DashMap<String, WidgetHandler>,
    state: Mutex<WidgetState>,
    stop: watch::Sender<Option<StopSignal>>,
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("channel_id", &self.channel_id)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl Widget {
    pub fn new(
        platform: Arc<dyn Platform>,
        waiter: Arc<EventWaiter>,
        channel_id: &str,
        view: Option<MessageContent>,
    ) -> Self {
        let (stop, _) = watch::channel(None);
        Self {
            platform,
            waiter,
            channel_id: channel_id.to_string(),
            handlers: DashMap::new(),
            state: Mutex::new(WidgetState {
                phase: WidgetPhase::Idle,
                view,
                message_id: None,
                controls: Vec::new(),
                default_controls: false,
                total_pages: 0,
                timeout: None,
                query_timeout: WidgetConfig::default().query_timeout,
                user_whitelist: HashSet::new(),
            }),
            stop,
        }
    }

    pub fn with_config(
        platform: Arc<dyn Platform>,
        waiter: Arc<EventWaiter>,
        channel_id: &str,
        view: Option<MessageContent>,
        config: &WidgetConfig,
    ) -> Self {
        let mut widget = Self::new(platform, waiter, channel_id, view);
        let state = widget.state.get_mut();
        state.timeout = config.timeout.filter(|t| !t.is_zero());
        state.query_timeout = config.query_timeout;
        state.user_whitelist = config.user_whitelist.iter().cloned().collect();
        widget
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn waiter(&self) -> &Arc<EventWaiter> {
        &self.waiter
    }

    /// Registers `handler` for `action`. The first registration for an
    /// action wins; later ones are ignored and `false` is returned.
    pub fn add_handler<F, Fut>(&self, action: &str, handler: F) -> bool
    where
        F: Fn(Arc<Widget>, Interaction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WidgetResult<()>> + Send + 'static,
    {
        match self.handlers.entry(action.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                let handler: WidgetHandler =
                    Arc::new(move |widget, interaction| handler(widget, interaction).boxed());
                entry.insert(handler);
                true
            }
        }
    }

    pub fn has_handler(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    pub async fn phase(&self) -> WidgetPhase {
        self.state.lock().await.phase
    }

    pub async fn is_running(&self) -> bool {
        self.phase().await == WidgetPhase::Running
    }

    /// Id of the rendered message; `None` until the first render.
    pub async fn message_id(&self) -> Option<MessageId> {
        self.state.lock().await.message_id.clone()
    }

    pub async fn timeout(&self) -> Option<Duration> {
        self.state.lock().await.timeout
    }

    /// Sets the idle timeout. `None` or a zero duration disables it.
    pub async fn set_timeout(&self, timeout: Option<Duration>) {
        self.state.lock().await.timeout = timeout.filter(|t| !t.is_zero());
    }

    pub async fn set_view(&self, view: MessageContent) {
        self.state.lock().await.view = Some(view);
    }

    pub async fn set_controls(&self, controls: Vec<ActionRow>) {
        let mut state = self.state.lock().await;
        state.controls = controls;
        state.default_controls = false;
    }

    pub async fn set_total_pages(&self, total_pages: usize) {
        self.state.lock().await.total_pages = total_pages;
    }

    /// Switches to the standard navigation row, rendered for the 1-based `page`.
    pub async fn initialize_default_controls(&self, page: usize) {
        let mut state = self.state.lock().await;
        state.controls = default_controls(page, state.total_pages);
        state.default_controls = true;
    }

    pub async fn set_user_whitelist(&self, users: impl IntoIterator<Item = UserId>) {
        self.state.lock().await.user_whitelist = users.into_iter().collect();
    }

    /// True if the whitelist is empty or contains `user_id`.
    pub async fn is_user_allowed(&self, user_id: &str) -> bool {
        let state = self.state.lock().await;
        state.user_whitelist.is_empty() || state.user_whitelist.contains(user_id)
    }

    /// Ends a running deployment as [`WidgetPhase::Cancelled`].
    pub async fn cancel(&self) -> WidgetResult<()> {
        self.signal(StopSignal::Cancelled).await
    }

    /// Ends a running deployment as [`WidgetPhase::Completed`]; meant to be
    /// called from a handler once the interaction is done.
    pub async fn complete(&self) -> WidgetResult<()> {
        self.signal(StopSignal::Completed).await
    }

    async fn signal(&self, signal: StopSignal) -> WidgetResult<()> {
        let state = self.state.lock().await;
        if state.phase != WidgetPhase::Running {
            return Err(WidgetError::NotRunning);
        }
        self.stop.send_replace(Some(signal));
        Ok(())
    }

    /// Renders the widget in its channel and runs the control loop until a
    /// terminal transition. Returns the terminal phase.
    #[instrument(skip(self), fields(channel_id = %self.channel_id))]
    pub async fn deploy(self: &Arc<Self>) -> WidgetResult<WidgetPhase> {
        let (initial, timeout, mut stop_rx) = {
            let mut state = self.state.lock().await;
            if state.phase == WidgetPhase::Running {
                return Err(WidgetError::AlreadyRunning);
            }
            let view = state.view.clone().ok_or(WidgetError::NilPage)?;
            let initial = if state.controls.is_empty() || view.has_controls() {
                view
            } else {
                view.with_components(state.controls.clone())
            };
            state.phase = WidgetPhase::Running;
            state.message_id = None;
            // Reset under the lock so a stop aimed at a previous run cannot leak in.
            self.stop.send_replace(None);
            (initial, state.timeout, self.stop.subscribe())
        };

        let mut guard = DeployGuard::new(self);

        let message_id = match self.platform.send(&self.channel_id, &initial).await {
            Ok(id) => id,
            Err(e) => {
                self.state.lock().await.phase = WidgetPhase::Idle;
                guard.disarm();
                return Err(e.into());
            }
        };
        self.state.lock().await.message_id = Some(message_id.clone());
        guard.message_id = Some(message_id.clone());
        debug!(message_id = %message_id, ?timeout, "widget deployed");

        let outcome = self.run(&message_id, timeout, &mut stop_rx).await;
        let phase = match &outcome {
            Ok(phase) => *phase,
            Err(_) => WidgetPhase::Idle,
        };
        guard.phase = phase;

        let cleared = self
            .platform
            .clear_controls(&self.channel_id, &message_id)
            .await;

        self.state.lock().await.phase = phase;
        guard.disarm();
        debug!(message_id = %message_id, %phase, "widget stopped");

        let phase = outcome?;
        cleared?;
        Ok(phase)
    }

    async fn run(
        self: &Arc<Self>,
        message_id: &str,
        timeout: Option<Duration>,
        stop_rx: &mut watch::Receiver<Option<StopSignal>>,
    ) -> WidgetResult<WidgetPhase> {
        loop {
            let target = message_id.to_string();
            let mut next = self
                .waiter
                .subscribe(EventType::InteractionCreate, move |event| {
                    event
                        .as_interaction()
                        .is_some_and(|interaction| interaction.is_button_on(&target))
                })
                .await?;

            let delivered = tokio::select! {
                delivered = &mut next => delivered,
                signal = stopped(stop_rx) => return Ok(signal.into()),
                _ = idle(timeout) => return Ok(WidgetPhase::TimedOut),
            };

            if let Some(Payload::Interaction(interaction)) = delivered.map(|event| event.payload) {
                self.dispatch(interaction).await;
            }
        }
    }

    async fn dispatch(self: &Arc<Self>, interaction: Interaction) {
        let handler = match self.handlers.get(&interaction.action_id) {
            Some(handler) => handler.value().clone(),
            None => {
                trace!(action = %interaction.action_id, "no handler for action");
                return;
            }
        };
        if !self.is_user_allowed(&interaction.user_id).await {
            debug!(user_id = %interaction.user_id, "user not in whitelist, ignoring");
            return;
        }
        self.spawn_handler(handler, interaction);
    }

    /// Runs `handler` on its own task. Errors and panics stay inside that
    /// task and are only logged.
    fn spawn_handler(self: &Arc<Self>, handler: WidgetHandler, interaction: Interaction) {
        let action = interaction.action_id.clone();
        let widget = Arc::clone(self);
        let task = tokio::spawn(async move { handler(widget, interaction).await });
        tokio::spawn(async move {
            match task.await {
                Ok(Ok(())) => trace!(%action, "handler finished"),
                Ok(Err(e)) => warn!(%action, error = %e, "handler failed"),
                Err(e) if e.is_panic() => error!(%action, "handler panicked"),
                Err(_) => debug!(%action, "handler cancelled"),
            }
        });
    }

    /// Re-renders the bound message with `view` in response to `interaction`.
    ///
    /// With default controls the page indicator is regenerated for the
    /// 0-based `index`.
    pub async fn update(
        &self,
        view: MessageContent,
        interaction: &Interaction,
        index: usize,
    ) -> WidgetResult<()> {
        let (message_id, content) = {
            let state = self.state.lock().await;
            let message_id = state.message_id.clone().ok_or(WidgetError::NilMessage)?;
            if state.phase != WidgetPhase::Running {
                return Err(WidgetError::NotRunning);
            }
            let content = if state.default_controls {
                view.with_components(default_controls(index + 1, state.total_pages))
            } else if view.has_controls() {
                view
            } else {
                view.with_components(state.controls.clone())
            };
            (message_id, content)
        };
        self.platform
            .update(&message_id, &content, interaction)
            .await?;
        Ok(())
    }

    /// [`query_input`](Self::query_input) with the configured query timeout.
    pub async fn ask(&self, prompt: &str, user_id: &str) -> WidgetResult<Message> {
        let timeout = self.state.lock().await.query_timeout;
        self.query_input(prompt, user_id, timeout).await
    }

    /// Asks `user_id` for input in the widget's channel and returns their
    /// next message there. The prompt and the reply are deleted afterwards.
    #[instrument(skip(self, prompt), fields(channel_id = %self.channel_id))]
    pub async fn query_input(
        &self,
        prompt: &str,
        user_id: &str,
        timeout: Duration,
    ) -> WidgetResult<Message> {
        let prompt_id = self
            .platform
            .send(
                &self.channel_id,
                &MessageContent::text(format!("<@{}>,  {}", user_id, prompt)),
            )
            .await?;

        let channel_id = self.channel_id.clone();
        let author_id = user_id.to_string();
        let result = self
            .waiter
            .wait_for(EventType::MessageCreate, timeout, move |event| {
                event
                    .as_message()
                    .is_some_and(|m| m.author_id == author_id && m.channel_id == channel_id)
            })
            .await;

        if let Err(e) = self.platform.delete(&self.channel_id, &prompt_id).await {
            warn!(error = %e, "failed to delete input prompt");
        }

        let event = match result {
            Ok(event) => event,
            Err(WaitError::Timeout { .. }) => return Err(WidgetError::Timeout),
            Err(e) => return Err(e.into()),
        };
        let Payload::Message(reply) = event.payload else {
            return Err(WidgetError::NilMessage);
        };
        if let Err(e) = self.platform.delete(&reply.channel_id, &reply.id).await {
            warn!(error = %e, "failed to delete input reply");
        }
        Ok(reply)
    }
}

/// Finishes a deployment whose future was dropped before it stopped: stores
/// the phase and strips the controls on a detached task.
struct DeployGuard<'a> {
    widget: &'a Arc<Widget>,
    message_id: Option<MessageId>,
    phase: WidgetPhase,
    armed: bool,
}

impl<'a> DeployGuard<'a> {
    fn new(widget: &'a Arc<Widget>) -> Self {
        Self {
            widget,
            message_id: None,
            phase: WidgetPhase::Cancelled,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for DeployGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let widget = Arc::clone(self.widget);
        let message_id = self.message_id.take();
        let phase = if message_id.is_some() {
            self.phase
        } else {
            WidgetPhase::Idle
        };
        warn!(channel_id = %widget.channel_id, %phase, "deploy dropped before the widget stopped");

        let phase_stored = match widget.state.try_lock() {
            Ok(mut state) => {
                state.phase = phase;
                true
            }
            Err(_) => false,
        };
        if phase_stored && message_id.is_none() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!(channel_id = %widget.channel_id, "no runtime to finish the dropped deploy");
            return;
        };
        runtime.spawn(async move {
            if let Some(message_id) = message_id {
                if let Err(e) = widget
                    .platform
                    .clear_controls(&widget.channel_id, &message_id)
                    .await
                {
                    warn!(error = %e, "failed to clear controls of a dropped deploy");
                }
            }
            if !phase_stored {
                widget.state.lock().await.phase = phase;
            }
        });
    }
}

async fn stopped(stop_rx: &mut watch::Receiver<Option<StopSignal>>) -> StopSignal {
    let signal = match stop_rx.wait_for(Option::is_some).await {
        Ok(signal) => *signal,
        Err(_) => None,
    };
    match signal {
        Some(signal) => signal,
        // The widget owns the sender, so this only happens while it is being dropped.
        None => std::future::pending().await,
    }
}

async fn idle(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WidgetError {
    #[error("Widget already running")]
    AlreadyRunning,
    #[error("Widget not running")]
    NotRunning,
    #[error("Index {index} is out of bounds for {len} pages")]
    IndexOutOfBounds { index: isize, len: usize },
    #[error("Message is nil")]
    NilMessage,
    #[error("Page is nil")]
    NilPage,
    #[error("No pages")]
    PagesEmpty,
    #[error("Timed out waiting for input")]
    Timeout,
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
    #[error("Wait error: {0}")]
    Wait(#[from] WaitError),
}

pub type WidgetResult<T> = Result<T, WidgetError>;
