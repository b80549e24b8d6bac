//! QUIC endpoint setup.
//!
//! QUIC mandates TLS 1.3, which is plumbing here, not a security
//! boundary: spec's Non-goals explicitly exclude transport encryption as
//! a property this system promises, and admission is the capability
//! token's job (§4.2), not the channel's. Each server generates an
//! ephemeral self-signed certificate (`rcgen`, the same approach the
//! pack's `maidsafe` QUIC endpoints use) and the client disables
//! certificate-chain verification rather than pin or distribute one.

use std::net::SocketAddr;
use std::sync::Arc;

use quinn::{ClientConfig, Endpoint, ServerConfig};

use crate::error::StreamingError;

/// Binds a QUIC server endpoint at `bind_addr` behind a freshly
/// generated self-signed certificate.
pub fn server_endpoint(bind_addr: SocketAddr) -> Result<Endpoint, StreamingError> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .map_err(|e| StreamingError::Config(format!("certificate generation failed: {e}")))?;
    let cert_der = rustls::Certificate(
        cert.serialize_der()
            .map_err(|e| StreamingError::Config(format!("certificate serialization failed: {e}")))?,
    );
    let key_der = rustls::PrivateKey(cert.serialize_private_key_der());

    let server_config = ServerConfig::with_single_cert(vec![cert_der], key_der)
        .map_err(|e| StreamingError::Config(format!("server config rejected certificate: {e}")))?;

    Endpoint::server(server_config, bind_addr).map_err(|e| StreamingError::Config(e.to_string()))
}

/// Binds an outbound-only QUIC endpoint that accepts any server
/// certificate (no CA to pin one against — see module docs).
pub fn client_endpoint() -> Result<Endpoint, StreamingError> {
    let unspecified: SocketAddr = "0.0.0.0:0".parse().expect("static address always parses");
    let mut endpoint =
        Endpoint::client(unspecified).map_err(|e| StreamingError::Config(e.to_string()))?;
    endpoint.set_default_client_config(insecure_client_config());
    Ok(endpoint)
}

fn insecure_client_config() -> ClientConfig {
    let crypto = rustls::ClientConfig::builder()
        .with_safe_defaults()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
        .with_no_client_auth();
    ClientConfig::new(Arc::new(crypto))
}

/// No certificate authority is distributed out of band, so there is
/// nothing to verify a peer's self-signed certificate against; QUIC's
/// handshake still runs (it's mandatory), it just never fails a peer
/// for presenting an unrecognized certificate.
struct AcceptAnyServerCert;

impl rustls::client::ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &rustls::ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<rustls::client::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::ServerCertVerified::assertion())
    }
}
