//! Page navigation on top of [`Widget`].
//!
//! The paginator owns its widget and binds the four navigation actions of
//! [`default_controls`](super::component::default_controls) to index moves.
//! Every successful move re-renders the message in place, acknowledging the
//! interaction that caused it.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak,
};
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{
    component::{MessageContent, ACTION_FIRST, ACTION_LAST, ACTION_NEXT, ACTION_PREV},
    widget::{Widget, WidgetError, WidgetPhase, WidgetResult},
};
use crate::{
    config::HeraldConfig,
    event::{EventWaiter, Interaction},
    platform::Platform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Navigation {
    First,
    Previous,
    Next,
    Last,
}

#[derive(Debug)]
struct PaginatorState {
    pages: Vec<MessageContent>,
    index: usize,
    loop_pages: bool,
}

#[derive(Debug)]
pub struct Paginator {
    widget: Arc<Widget>,
    state: RwLock<PaginatorState>,
    running: AtomicBool,
}

impl Paginator {
    pub fn new(platform: Arc<dyn Platform>, waiter: Arc<EventWaiter>, channel_id: &str) -> Arc<Self> {
        Self::build(Widget::new(platform, waiter, channel_id, None), true)
    }

    pub fn with_config(
        platform: Arc<dyn Platform>,
        waiter: Arc<EventWaiter>,
        channel_id: &str,
        config: &HeraldConfig,
    ) -> Arc<Self> {
        Self::build(
            Widget::with_config(platform, waiter, channel_id, None, &config.widget),
            config.paginator.loop_pages,
        )
    }

    fn build(widget: Widget, loop_pages: bool) -> Arc<Self> {
        Arc::new_cyclic(|weak| {
            bind(&widget, weak, ACTION_FIRST, Navigation::First);
            bind(&widget, weak, ACTION_PREV, Navigation::Previous);
            bind(&widget, weak, ACTION_NEXT, Navigation::Next);
            bind(&widget, weak, ACTION_LAST, Navigation::Last);
            Self {
                widget: Arc::new(widget),
                state: RwLock::new(PaginatorState {
                    pages: Vec::new(),
                    index: 0,
                    loop_pages,
                }),
                running: AtomicBool::new(false),
            }
        })
    }

    pub fn widget(&self) -> &Arc<Widget> {
        &self.widget
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Appends pages. Not allowed while a deployment is in progress.
    pub async fn add(&self, pages: impl IntoIterator<Item = MessageContent>) -> WidgetResult<()> {
        let mut state = self.state.write().await;
        if self.is_running() {
            return Err(WidgetError::AlreadyRunning);
        }
        state.pages.extend(pages);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.pages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn index(&self) -> usize {
        self.state.read().await.index
    }

    pub async fn set_loop(&self, loop_pages: bool) {
        self.state.write().await.loop_pages = loop_pages;
    }

    pub async fn set_timeout(&self, timeout: Option<Duration>) {
        self.widget.set_timeout(timeout).await;
    }

    /// The page at the current index.
    pub async fn page(&self) -> WidgetResult<MessageContent> {
        let state = self.state.read().await;
        state
            .pages
            .get(state.index)
            .cloned()
            .ok_or(WidgetError::IndexOutOfBounds {
                index: state.index as isize,
                len: state.pages.len(),
            })
    }

    pub async fn next_page(&self) -> WidgetResult<usize> {
        self.navigate(Navigation::Next).await
    }

    pub async fn previous_page(&self) -> WidgetResult<usize> {
        self.navigate(Navigation::Previous).await
    }

    /// Jumps to `index`; out of range leaves the current index untouched.
    pub async fn goto(&self, index: usize) -> WidgetResult<()> {
        let mut state = self.state.write().await;
        let len = state.pages.len();
        if index >= len {
            return Err(WidgetError::IndexOutOfBounds {
                index: index as isize,
                len,
            });
        }
        state.index = index;
        Ok(())
    }

    async fn navigate(&self, navigation: Navigation) -> WidgetResult<usize> {
        let mut state = self.state.write().await;
        let len = state.pages.len();
        let out_of_bounds = |index: usize, step: isize| WidgetError::IndexOutOfBounds {
            index: index as isize + step,
            len,
        };
        if len == 0 {
            return Err(out_of_bounds(0, 0));
        }
        let target = match navigation {
            Navigation::First => 0,
            Navigation::Last => len - 1,
            Navigation::Next if state.index + 1 < len => state.index + 1,
            Navigation::Next if state.loop_pages => 0,
            Navigation::Next => return Err(out_of_bounds(state.index, 1)),
            Navigation::Previous if state.index > 0 => state.index - 1,
            Navigation::Previous if state.loop_pages => len - 1,
            Navigation::Previous => return Err(out_of_bounds(state.index, -1)),
        };
        state.index = target;
        Ok(target)
    }

    /// Re-renders the current page in response to `interaction`.
    pub async fn update(&self, interaction: &Interaction) -> WidgetResult<()> {
        if self.widget.message_id().await.is_none() {
            return Err(WidgetError::NilMessage);
        }
        let (page, index) = {
            let state = self.state.read().await;
            let page = state
                .pages
                .get(state.index)
                .cloned()
                .ok_or(WidgetError::IndexOutOfBounds {
                    index: state.index as isize,
                    len: state.pages.len(),
                })?;
            (page, state.index)
        };
        self.widget.update(page, interaction, index).await
    }

    /// Renders the current page with navigation controls and runs the
    /// widget's control loop until it stops.
    #[instrument(skip(self), fields(channel_id = %self.widget.channel_id()))]
    pub async fn deploy(&self) -> WidgetResult<WidgetPhase> {
        // `add` checks `running` under the write lock, so the page count
        // cannot change between this snapshot and the flag being set.
        let (first, index, total, _running) = {
            let state = self.state.read().await;
            if state.pages.is_empty() {
                return Err(WidgetError::PagesEmpty);
            }
            let running = RunningGuard::acquire(&self.running)?;
            let index = state.index.min(state.pages.len() - 1);
            (state.pages[index].clone(), index, state.pages.len(), running)
        };

        self.widget.set_total_pages(total).await;
        self.widget.initialize_default_controls(index + 1).await;
        self.widget.set_view(first).await;

        self.widget.deploy().await
    }
}

/// Holds the paginator's `running` flag; released on drop, including when
/// the deploy future is abandoned.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> WidgetResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| WidgetError::AlreadyRunning)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn bind(widget: &Widget, paginator: &Weak<Paginator>, action: &str, navigation: Navigation) {
    let paginator = paginator.clone();
    widget.add_handler(action, move |_widget, interaction: Interaction| {
        let paginator = paginator.clone();
        async move {
            let Some(paginator) = paginator.upgrade() else {
                return Ok(());
            };
            match paginator.navigate(navigation).await {
                Ok(_) => paginator.update(&interaction).await,
                Err(e @ WidgetError::IndexOutOfBounds { .. }) => {
                    debug!(?navigation, error = %e, "navigation ignored");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{event::EventType, platform::memory::InMemoryPlatform};

    async fn paginator(pages: usize) -> Arc<Paginator> {
        let platform = Arc::new(InMemoryPlatform::new());
        let waiter = Arc::new(EventWaiter::with_kinds([EventType::InteractionCreate]));
        let paginator = Paginator::new(platform, waiter, "c1");
        paginator
            .add((0..pages).map(|i| MessageContent::text(format!("page {}", i))))
            .await
            .unwrap();
        paginator
    }

    #[tokio::test]
    async fn test_looping_navigation_wraps() {
        let paginator = paginator(3).await;
        assert_eq!(paginator.previous_page().await, Ok(2));
        assert_eq!(paginator.index().await, 2);
        assert_eq!(paginator.next_page().await, Ok(0));
        assert_eq!(paginator.index().await, 0);
    }

    #[tokio::test]
    async fn test_bounded_navigation_fails_at_edges() {
        let paginator = paginator(3).await;
        paginator.set_loop(false).await;

        paginator.goto(2).await.unwrap();
        assert!(matches!(
            paginator.next_page().await,
            Err(WidgetError::IndexOutOfBounds { .. })
        ));
        assert_eq!(paginator.index().await, 2);

        paginator.goto(0).await.unwrap();
        assert_eq!(
            paginator.previous_page().await,
            Err(WidgetError::IndexOutOfBounds { index: -1, len: 3 })
        );
        assert_eq!(paginator.index().await, 0);
    }

    #[tokio::test]
    async fn test_goto() {
        let paginator = paginator(3).await;
        assert_eq!(
            paginator.goto(5).await,
            Err(WidgetError::IndexOutOfBounds { index: 5, len: 3 })
        );
        assert_eq!(paginator.index().await, 0);

        paginator.goto(1).await.unwrap();
        assert_eq!(paginator.page().await.unwrap().content, "page 1");
    }

    #[tokio::test]
    async fn test_empty_paginator() {
        let paginator = paginator(0).await;
        assert!(paginator.is_empty().await);
        assert!(matches!(
            paginator.page().await,
            Err(WidgetError::IndexOutOfBounds { .. })
        ));
        assert!(matches!(
            paginator.next_page().await,
            Err(WidgetError::IndexOutOfBounds { .. })
        ));
        assert_eq!(paginator.deploy().await, Err(WidgetError::PagesEmpty));
        assert!(!paginator.is_running());
    }

    #[tokio::test]
    async fn test_update_before_render_is_nil_message() {
        let paginator = paginator(2).await;
        assert_eq!(
            paginator.update(&Interaction::default()).await,
            Err(WidgetError::NilMessage)
        );
    }

    #[tokio::test]
    async fn test_update_on_empty_unrendered_paginator_is_nil_message() {
        let paginator = paginator(0).await;
        assert_eq!(
            paginator.update(&Interaction::default()).await,
            Err(WidgetError::NilMessage)
        );
    }

    #[tokio::test]
    async fn test_add_rejected_while_running_flag_held() {
        let paginator = paginator(2).await;
        let guard = RunningGuard::acquire(&paginator.running).unwrap();
        assert_eq!(
            RunningGuard::acquire(&paginator.running).err(),
            Some(WidgetError::AlreadyRunning)
        );
        assert_eq!(
            paginator.add([MessageContent::text("late")]).await,
            Err(WidgetError::AlreadyRunning)
        );
        drop(guard);
        assert!(!paginator.is_running());
        paginator.add([MessageContent::text("late")]).await.unwrap();
        assert_eq!(paginator.len().await, 3);
    }

    #[tokio::test]
    async fn test_navigation_handlers_are_bound() {
        let paginator = paginator(1).await;
        for action in [ACTION_FIRST, ACTION_PREV, ACTION_NEXT, ACTION_LAST] {
            assert!(paginator.widget().has_handler(action));
        }
    }
}
