use std::sync::Arc;

use rustls::{
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::{self, CryptoProvider},
    pki_types::{CertificateDer, ServerName, UnixTime},
    DigitallySignedStruct, SignatureScheme,
};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::Config,
    payload::{Identity, Payload},
    DataPoint,
};

/// Delivers one batch. No retries; the next export cycle is the retry.
pub trait Transport: Send {
    fn send(&self, points: &[DataPoint]) -> Result<(), TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("serialize payload; err={0}")]
    Serialize(#[from] serde_json::Error),
    #[error("received a non-2xx status code: {0}")]
    Status(u16),
    #[error("request failed; err={0}")]
    Request(#[source] Box<ureq::Transport>),
}
impl From<ureq::Error> for TransportError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(status, _) => Self::Status(status),
            ureq::Error::Transport(transport) => Self::Request(Box::new(transport)),
        }
    }
}

#[derive(Debug)]
pub struct HttpTransport {
    client: ureq::Agent,
    url: String,
    token: String,
    identity: Identity,
}
impl HttpTransport {
    pub fn new(client: ureq::Agent, config: &Config) -> Self {
        Self {
            client,
            url: config.url.clone(),
            token: config.token.clone(),
            identity: config.identity.clone(),
        }
    }

    /// Agent honouring the configured TLS verification policy.
    pub fn from_config(config: &Config) -> Result<Self, rustls::Error> {
        let client = if config.skip_tls_verification {
            ureq::AgentBuilder::new()
                .tls_config(Arc::new(insecure_tls_config()?))
                .build()
        } else {
            ureq::Agent::new()
        };
        Ok(Self::new(client, config))
    }
}
impl Transport for HttpTransport {
    /// Blocking I/O
    fn send(&self, points: &[DataPoint]) -> Result<(), TransportError> {
        let body = Payload::new(points, &self.identity).to_json()?;
        let resp = self
            .client
            .post(&self.url)
            .set("Authorization", &self.token)
            .set("Content-Type", "application/json")
            .send_bytes(&body)?;
        let status = resp.status();
        if !(200..=299).contains(&status) {
            return Err(TransportError::Status(status));
        }
        debug!(url = %self.url, points = points.len(), status, "metrics delivered");
        Ok(())
    }
}

fn insecure_tls_config() -> Result<rustls::ClientConfig, rustls::Error> {
    let provider = Arc::new(crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
        .with_no_client_auth();
    Ok(config)
}

/// Accepts every server certificate; handshake signatures are still checked.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);
impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insecure_config_builds() {
        insecure_tls_config().unwrap();
    }

    #[test]
    fn status_errors_carry_the_code() {
        let err = TransportError::Status(500);
        assert_eq!(err.to_string(), "received a non-2xx status code: 500");
    }
}
