//! Admin Module Tests
//!
//! ## Test Scopes
//! - **Parsing**: Accepted and rejected command shapes.
//! - **Dispatch**: Replies for known, unknown and malformed commands.
//! - **Socket**: A real Unix-socket round trip, stale socket replacement and cleanup.

#[cfg(test)]
mod tests {
    use crate::admin::protocol::{AdminCommand, AdminReply};
    use crate::admin::server::{AdminChannel, dispatch};
    use crate::config::types::ServiceConfig;
    use crate::registry::registry::ServiceRegistry;
    use crate::registry::types::ServiceStatus;
    use crate::stats::NoopHitCounter;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;
    use tokio::sync::watch;

    fn registry(dir: &Path) -> Arc<ServiceRegistry> {
        let file = dir.join("stops.json");
        let doc = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "id": "a",
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
                "properties": {}
            }]
        });
        std::fs::write(&file, serde_json::to_vec(&doc).unwrap()).unwrap();

        ServiceRegistry::new(
            vec![ServiceConfig {
                name: "stops".to_string(),
                file,
                max_radius: 500.0,
                max_results: 10,
            }],
            dir.join("stores"),
            Arc::new(NoopHitCounter),
        )
    }

    async fn wait_ready(registry: &ServiceRegistry, service: &str) {
        for _ in 0..200 {
            if registry.snapshot().get(service) == Some(&ServiceStatus::Ready) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("service {} never became ready", service);
    }

    // ============================================================
    // PARSING TESTS
    // ============================================================

    #[test]
    fn test_parse_update_service() {
        assert_eq!(
            AdminCommand::parse("updateService stops"),
            Some(AdminCommand::UpdateService("stops".to_string()))
        );
    }

    #[test]
    fn test_parse_ignores_trailing_line_ending() {
        assert_eq!(
            AdminCommand::parse("updateService stops\r\n"),
            Some(AdminCommand::UpdateService("stops".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_wrong_shapes() {
        assert_eq!(AdminCommand::parse("updateService"), None);
        assert_eq!(AdminCommand::parse("updateService a b"), None);
        assert_eq!(AdminCommand::parse("updateService  stops"), None);
        assert_eq!(AdminCommand::parse("reload stops"), None);
        assert_eq!(AdminCommand::parse(""), None);
    }

    #[test]
    fn test_reply_wire_format() {
        assert_eq!(AdminReply::Updating.to_wire(), "updating service\r\n");
        assert_eq!(AdminReply::ServiceNotFound.to_wire(), "service not found\r\n");
        assert_eq!(
            AdminReply::UnrecognizedCommand.to_wire(),
            "unrecognized command\r\n"
        );
    }

    // ============================================================
    // DISPATCH TESTS
    // ============================================================

    #[tokio::test]
    async fn test_dispatch_known_service_triggers_reload() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        let reply = dispatch(&registry, "updateService stops");

        assert_eq!(reply, AdminReply::Updating);
        wait_ready(&registry, "stops").await;
        registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_dispatch_unknown_service_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        assert_eq!(
            dispatch(&registry, "updateService nope"),
            AdminReply::ServiceNotFound
        );
        assert_eq!(dispatch(&registry, "hello"), AdminReply::UnrecognizedCommand);
        assert_eq!(
            registry.snapshot().get("stops"),
            Some(&ServiceStatus::Starting)
        );
    }

    // ============================================================
    // SOCKET TESTS
    // ============================================================

    #[tokio::test]
    async fn test_socket_round_trip_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        let socket = dir.path().join("admin.sock");
        std::fs::write(&socket, b"stale").unwrap();

        let channel = AdminChannel::bind(&socket, registry.clone()).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = tokio::spawn(channel.serve(shutdown_rx));

        let mut client = UnixStream::connect(&socket).await.unwrap();
        client.write_all(b"updateService stops").await.unwrap();
        let mut buf = [0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"updating service\r\n");

        client.write_all(b"updateService nope").await.unwrap();
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"service not found\r\n");
        drop(client);

        wait_ready(&registry, "stops").await;
        shutdown_tx.send(true).unwrap();
        server.await.unwrap();

        assert!(!socket.exists());
        registry.shutdown().await;
    }
}
