//! # Transport Limits
//!
//! Pending-slot bound and request timeouts with a slow device directory.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        register, sensor, transport_config, Cluster, SlowDirectory, StalledDirectory, REPLY_TOPIC,
    };
    use shared_types::DeviceCredentials;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn replies_published<D>(cluster: &Cluster<D>) -> u64 {
        (0..cluster.broker.partitions(REPLY_TOPIC))
            .map(|p| cluster.broker.end_offset(REPLY_TOPIC, p))
            .sum()
    }

    #[tokio::test(start_paused = true)]
    async fn test_extra_request_waits_for_free_slot() {
        let directory = Arc::new(SlowDirectory::new(Duration::from_secs(1)));
        let cluster = Arc::new(Cluster::start(
            Arc::clone(&directory),
            transport_config(2, Duration::from_secs(5)),
        ));
        for token in ["t0", "t1", "t2"] {
            register(&cluster.credentials, &directory.inner, &sensor(), token);
        }

        let mut calls = Vec::new();
        for token in ["t0", "t1", "t2"] {
            let cluster = Arc::clone(&cluster);
            calls.push(tokio::spawn(async move { cluster.validate(token).await }));
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(directory.calls(), 2);
        assert_eq!(cluster.server.pending_count(), 2);
        assert_eq!(cluster.server.available_slots(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(directory.calls(), 3);

        for call in calls {
            assert!(call.await.unwrap().device_info().is_some());
        }
        assert_eq!(cluster.server.stats().completed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_answers_once_with_empty() {
        let timeout = Duration::from_secs(1);
        let directory = Arc::new(SlowDirectory::new(Duration::from_secs(3)));
        let cluster = Cluster::start(Arc::clone(&directory), transport_config(4, timeout));
        register(&cluster.credentials, &directory.inner, &sensor(), "abc123");

        let started = Instant::now();
        let response = cluster.validate("abc123").await;

        assert!(response.is_empty());
        assert!(started.elapsed() >= timeout);
        assert_eq!(cluster.server.stats().timed_out, 1);
        assert_eq!(cluster.server.available_slots(), 4);

        // The directory would have answered at 3s; nothing follows.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(replies_published(&cluster), 1);
        assert_eq!(cluster.server.stats().completed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_slots_are_reused() {
        let cluster = Cluster::start(
            Arc::new(StalledDirectory),
            transport_config(1, Duration::from_millis(500)),
        );
        let device = sensor();
        cluster
            .credentials
            .insert(DeviceCredentials::access_token(device.id, "abc123"));

        for _ in 0..3 {
            assert!(cluster.validate("abc123").await.is_empty());
        }
        assert_eq!(cluster.server.stats().timed_out, 3);
        assert_eq!(cluster.server.available_slots(), 1);
        assert_eq!(replies_published(&cluster), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_misses_skip_the_directory() {
        let directory = Arc::new(SlowDirectory::new(Duration::from_secs(1)));
        let cluster = Cluster::start(
            Arc::clone(&directory),
            transport_config(4, Duration::from_secs(5)),
        );

        let started = Instant::now();
        assert!(cluster.validate("unknown").await.is_empty());
        assert_eq!(directory.calls(), 0);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
