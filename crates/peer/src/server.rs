//! Accept loop: one `tokio::task` per accepted QUIC connection, one more
//! per bidirectional stream within it (spec §5: "every inbound call
//! executes on an independent task").

use quinn::{Connection, RecvStream, SendStream};
use streaming::{Request, StreamReceiver, StreamSender, StreamingError};

use crate::node::PeerNode;
use crate::service::PeerService;

/// Runs forever, accepting connections on `node`'s server endpoint until
/// it is closed.
pub async fn serve(node: &PeerNode) {
    let endpoint = node.server_endpoint.clone();
    let service = node.service.clone();

    while let Some(connecting) = endpoint.accept().await {
        let service = service.clone();
        tokio::spawn(async move {
            match connecting.await {
                Ok(connection) => accept_connection(connection, service).await,
                Err(e) => tracing::warn!(error = %e, "incoming quic connection failed handshake"),
            }
        });
    }
}

async fn accept_connection(connection: Connection, service: PeerService) {
    loop {
        match connection.accept_bi().await {
            Ok((send, recv)) => {
                let service = service.clone();
                tokio::spawn(async move { handle_stream(service, send, recv).await });
            }
            Err(e) => {
                tracing::debug!(error = %e, "quic connection closed");
                break;
            }
        }
    }
}

/// One RPC per stream: reads the opening `Request`, dispatches it to the
/// `PeerService`, and lets the handler drive whatever follow-on messages
/// that RPC kind needs.
async fn handle_stream(service: PeerService, send: SendStream, recv: RecvStream) {
    let mut sender = StreamSender::new(send);
    let mut receiver = StreamReceiver::new(recv);

    let request: Request = match receiver.recv().await {
        Ok(r) => r,
        Err(StreamingError::UnexpectedEof) => return,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read rpc request header");
            return;
        }
    };

    let rpc_name = request.message_type().as_str();
    metrics::counter!("peer_rpc_total", "rpc" => rpc_name).increment(1);
    tracing::debug!(rpc = rpc_name, "handling rpc");

    service.handle(request, &mut sender, &mut receiver).await;
}
