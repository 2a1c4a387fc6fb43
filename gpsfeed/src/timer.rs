//! Deadline helpers shared by the feed and client event loops.

use tokio::time::Instant;

/// Sleep until `deadline`, or forever when there is none.
///
/// Used as a `tokio::select!` branch so an event loop with nothing scheduled
/// only wakes for commands or shutdown.
pub(crate) async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_until_deadline() {
        let start = Instant::now();
        sleep_until_opt(Some(start + Duration::from_secs(3))).await;
        assert_eq!(Instant::now() - start, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_none_never_completes() {
        let result =
            tokio::time::timeout(Duration::from_secs(3600), sleep_until_opt(None)).await;
        assert!(result.is_err());
    }
}
