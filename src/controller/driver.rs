//! Real-time driver for a [`ListingController`].
//!
//! Page events arrive on a channel; between events the driver sleeps until
//! the controller's next timer deadline. Once the channel closes, pending
//! timers are still run so no hide transition is left half-done.

use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;

use super::{ListingController, ListingView, UiEvent};

/// Drive `controller` from `events` until the channel closes and every
/// pending timer has fired
pub async fn run<V: ListingView>(
    controller: &mut ListingController<V>,
    mut events: UnboundedReceiver<UiEvent>,
) {
    loop {
        let deadline = controller.next_deadline();
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    tracing::trace!(?event, "Page event");
                    controller.handle(event, now());
                }
                None => break,
            },
            _ = sleep_until(deadline) => controller.tick(now()),
        }
    }

    while let Some(deadline) = controller.next_deadline() {
        sleep_until(Some(deadline)).await;
        controller.tick(now());
    }
    tracing::debug!(generation = controller.generation(), "Listing driver stopped");
}

/// Current time on tokio's clock, so paused-time tests stay consistent
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListingConfig;
    use crate::controller::{MemoryView, PageHooks};
    use crate::models::{ItemBuilder, ItemId};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn controller() -> ListingController<MemoryView> {
        let items = vec![
            ItemBuilder::new("1", "Estudos do Discurso").category("LIVRO").year(2021).build(),
            ItemBuilder::new("2", "Análise Crítica").category("REVISTA").year(2023).build(),
        ];
        let view = MemoryView::from_items(&items);
        ListingController::mount(items, Some(view), PageHooks::all(), &ListingConfig::default())
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_recomputes_once() {
        let mut controller = controller();
        let (tx, rx) = mpsc::unbounded_channel();

        let typing = async move {
            for partial in ["e", "es", "est", "estu"] {
                tx.send(UiEvent::SearchInput(partial.to_string())).unwrap();
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        tokio::join!(run(&mut controller, rx), typing);

        assert_eq!(controller.generation(), 1);
        assert_eq!(controller.criteria().search_term, "estu");
        assert_eq!(controller.visible(), &[ItemId::from("1")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_completes_after_channel_closes() {
        let mut controller = controller();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(UiEvent::CategoryChanged("LIVRO".to_string())).unwrap();
        drop(tx);

        let started = tokio::time::Instant::now();
        run(&mut controller, rx).await;

        assert!(started.elapsed() >= Duration::from_millis(300));
        let card = controller.view().card(&ItemId::from("2")).unwrap();
        assert!(!card.in_flow);
        assert!(controller.next_deadline().is_none());
    }
}
