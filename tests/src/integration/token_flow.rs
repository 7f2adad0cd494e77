//! # Token Validation Flow
//!
//! Validation outcomes as seen by a caller on the other side of the bus.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        register, sensor, transport_config, Cluster, REQUESTS_TOPIC, RESPONSES_TOPIC,
    };
    use da_01_token_validation::InMemoryDeviceStore;
    use shared_bus::{RecordConsumer, RecordPublisher};
    use shared_types::{
        codec, CredentialsId, CredentialsType, DeviceCredentials, Envelope, TransportApiRequest,
        TransportApiResponse,
    };
    use std::sync::Arc;
    use std::time::Duration;

    fn cluster() -> Cluster<InMemoryDeviceStore> {
        Cluster::start(
            Arc::new(InMemoryDeviceStore::new()),
            transport_config(64, Duration::from_secs(5)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_reference_example_resolves_sensor() {
        let cluster = cluster();
        let device = sensor();
        register(&cluster.credentials, &cluster.devices, &device, "abc123");

        let response = cluster.validate("abc123").await;

        let info = response.device_info().expect("device found");
        assert_eq!(info.tenant_id(), device.tenant_id.halves());
        assert_eq!(info.device_id(), device.id.halves());
        assert_eq!(info.device_name, "sensor-1");
        assert_eq!(info.device_type, "thermostat");
        assert_eq!(info.additional_info, r#"{"fw":"1.2"}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_token_is_empty() {
        let cluster = cluster();
        register(&cluster.credentials, &cluster.devices, &sensor(), "abc123");

        assert!(cluster.validate("nope").await.is_empty());
        assert!(cluster.validate("").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_access_token_credentials_are_empty() {
        let cluster = cluster();
        let device = sensor();
        cluster.devices.insert(device.clone());
        cluster.credentials.insert(DeviceCredentials {
            id: CredentialsId::random(),
            device_id: device.id,
            credentials_type: CredentialsType::X509Certificate,
            credentials_id: "cert-hash".into(),
            credentials_value: Some("-----BEGIN CERTIFICATE-----".into()),
        });

        assert!(cluster.validate("cert-hash").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_device_is_empty() {
        let cluster = cluster();
        let device = sensor();
        register(&cluster.credentials, &cluster.devices, &device, "abc123");
        cluster.devices.remove(device.id);

        assert!(cluster.validate("abc123").await.is_empty());
        assert_eq!(cluster.server.stats().completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_request_is_empty() {
        let cluster = cluster();
        let response = cluster
            .client
            .send(
                "validate_x509_certificate",
                TransportApiRequest::ValidateX509Certificate(
                    shared_types::ValidateX509CertificateRequest {
                        hash: "cert-hash".into(),
                    },
                ),
            )
            .await
            .unwrap();
        assert!(response.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_validation_is_stable() {
        let cluster = cluster();
        register(&cluster.credentials, &cluster.devices, &sensor(), "abc123");

        let first = cluster.validate("abc123").await;
        let second = cluster.validate("abc123").await;
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_request_type_answered_on_default_topic() {
        let cluster = cluster();

        // A request from a newer peer with a type this node does not know,
        // and no reply topic.
        let envelope = Envelope {
            response_topic: None,
            ..Envelope::request(
                serde_json::json!({"type": "PROVISION_DEVICE", "key": "k"}),
                "",
            )
        };
        cluster
            .broker
            .send(REQUESTS_TOPIC, None, codec::encode(&envelope).unwrap())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;

        let mut records = Vec::new();
        for mut consumer in cluster.broker.consumers("inspect", RESPONSES_TOPIC).unwrap() {
            records.extend(consumer.poll(16, Duration::from_millis(1)).await.unwrap());
        }
        assert_eq!(records.len(), 1);
        let response: Envelope<TransportApiResponse> = codec::decode(&records[0].value).unwrap();
        assert_eq!(response.request_id, envelope.request_id);
        assert!(response.payload.is_empty());
    }
}
