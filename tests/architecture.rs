//! Architecture Verification Suite
//!
//! The console is shared across tasks: the poller loop, background
//! dispatches and the front end all hold the same handles.

#[cfg(test)]
mod architecture_tests {
    use std::sync::Arc;

    use healflow::console::HealConsole;
    use healflow::repository::{HttpSignalRepository, InMemorySignalRepository, SignalRepository};
    use healflow::sync::{ActionDispatcher, EventBus, Poller, SignalStore};
    use healflow::SyncConfig;

    fn assert_send_sync<T: Send + Sync>() {}

    // Repositories sit behind Arc<dyn SignalRepository> in spawned tasks.
    #[test]
    fn test_repositories_are_thread_safe() {
        assert_send_sync::<HttpSignalRepository>();
        assert_send_sync::<InMemorySignalRepository>();
        assert_send_sync::<Arc<dyn SignalRepository>>();
    }

    #[test]
    fn test_sync_core_is_thread_safe() {
        assert_send_sync::<SignalStore>();
        assert_send_sync::<Poller>();
        assert_send_sync::<ActionDispatcher>();
        assert_send_sync::<EventBus>();
        assert_send_sync::<HealConsole>();
    }

    // Compile-time check: dispatch futures must be spawnable.
    #[test]
    fn test_dispatch_future_is_send() {
        #[allow(dead_code)]
        fn check(console: Arc<HealConsole>) {
            tokio::spawn(async move {
                let _ = console.dispatch_selected(healflow::SignalAction::Heal).await;
                let _ = console.refresh().await;
            });
        }
    }

    #[test]
    fn test_console_builds_over_any_repository() {
        let repo: Arc<dyn SignalRepository> = Arc::new(InMemorySignalRepository::seeded());
        let console = HealConsole::new(repo, &SyncConfig::default());
        assert!(console.snapshot().is_empty());
        assert!(console.store().selected_id().is_none());
    }
}
