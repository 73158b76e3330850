#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rcgen::CertifiedKey;

use poem::{
    handler,
    http::{HeaderMap, StatusCode},
    listener::{Acceptor, Listener, RustlsCertificate, RustlsConfig, TcpListener},
    post,
    web::Data,
    EndpointExt, Route, Server,
};

#[derive(Debug, Clone)]
pub struct Received {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct Ingest {
    status: StatusCode,
    received: Arc<Mutex<Vec<Received>>>,
}

#[handler]
fn ingest(headers: &HeaderMap, body: String, ingest: Data<&Ingest>) -> StatusCode {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let body = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    ingest.received.lock().unwrap().push(Received {
        authorization: header("authorization"),
        content_type: header("content-type"),
        body,
    });
    ingest.status
}

/// Metrics endpoint answering every POST with `status`.
pub async fn serve(status: StatusCode) -> (String, Arc<Mutex<Vec<Received>>>) {
    serve_on(TcpListener::bind("127.0.0.1:0"), "http", status).await
}

/// Same endpoint behind TLS with a freshly generated self-signed certificate.
pub async fn serve_tls(status: StatusCode) -> (String, Arc<Mutex<Vec<Received>>>) {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["127.0.0.1".to_owned(), "localhost".to_owned()])
            .unwrap();
    let certificate = RustlsCertificate::new()
        .key(key_pair.serialize_pem())
        .cert(cert.pem());
    let listener =
        TcpListener::bind("127.0.0.1:0").rustls(RustlsConfig::new().fallback(certificate));
    serve_on(listener, "https", status).await
}

async fn serve_on(
    listener: impl Listener + 'static,
    scheme: &str,
    status: StatusCode,
) -> (String, Arc<Mutex<Vec<Received>>>) {
    let received = Arc::new(Mutex::new(vec![]));
    let app = Route::new().at("/v1/metrics", post(ingest)).data(Ingest {
        status,
        received: received.clone(),
    });
    let acceptor = listener.into_acceptor().await.unwrap();
    let addr = *acceptor.local_addr()[0].0.as_socket_addr().unwrap();
    tokio::spawn(Server::new_with_acceptor(acceptor).run(app));
    (format!("{scheme}://{addr}/v1/metrics"), received)
}
