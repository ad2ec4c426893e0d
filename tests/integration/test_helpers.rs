// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests: spinning up a real
//! `BoundCerver` on an ephemeral port and connecting to it with the same
//! `PacketCodec` the server itself uses, so tests exercise the actual wire
//! framing rather than a mocked transport.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cerver::config::Config;
use cerver::connection::{Connection, Socket};
use cerver::core::protocol::PacketCodec;
use cerver::{BoundCerver, CerverBuilder, CerverState, HandlerContext};
use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

/// A `Config` bound to an OS-assigned loopback port, so tests never collide
/// over a fixed port number.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config
}

/// A running cerver plus everything a test needs to talk to it and tear it
/// down again.
pub struct TestCerver {
    pub addr: SocketAddr,
    pub admin_addr: Option<SocketAddr>,
    pub cerver: Arc<CerverState>,
    handle: JoinHandle<()>,
}

impl TestCerver {
    /// Binds and starts serving in a background task.
    pub async fn start(builder: CerverBuilder) -> Self {
        let bound: BoundCerver = builder.bind().await.expect("bind failed");
        let addr = bound.local_addr;
        let admin_addr = bound.admin_local_addr;
        let cerver = bound.cerver.clone();
        let handle = tokio::spawn(bound.serve());
        Self {
            addr,
            admin_addr,
            cerver,
            handle,
        }
    }

    /// Connects to the client plane, framed with the real wire codec.
    pub async fn connect(&self) -> Framed<TcpStream, PacketCodec> {
        self.connect_to(self.addr).await
    }

    /// Connects to the admin plane.
    pub async fn connect_admin(&self) -> Framed<TcpStream, PacketCodec> {
        self.connect_to(self.admin_addr.expect("admin plane not enabled")).await
    }

    async fn connect_to(&self, addr: SocketAddr) -> Framed<TcpStream, PacketCodec> {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let _ = stream.set_nodelay(true);
        Framed::new(stream, PacketCodec::default())
    }

    /// Tears the cerver down and waits (bounded) for its accept loop to
    /// finish, matching the spec's "teardown returns within poll_timeout +
    /// a small bound" scenario.
    pub async fn shutdown(self) {
        self.cerver.teardown();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Builds a `HandlerContext` over a registered `Connection` backed by a real
/// loopback TCP pair, without going through the accept loop. Used by unit
/// tests that exercise `JobQueue`/`Connection` mechanics directly rather
/// than through a full client round trip. Returns the peer socket alongside
/// so the caller can keep it alive for the test's duration (dropping it
/// would otherwise close the connection out from under the dummy
/// `Connection`).
pub async fn dummy_handler_context(cerver: Arc<CerverState>) -> (HandlerContext, Arc<Connection>, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (our_side, (peer_side, _)) = tokio::join!(TcpStream::connect(addr), async { listener.accept().await.unwrap() });
    let our_side = our_side.unwrap();

    let framed = Framed::new(our_side, PacketCodec::default());
    let (sink, _read_half) = framed.split();
    let socket = Socket::new(sink);

    let conn_id = cerver.next_connection_id();
    let client = cerver.clients.register_new(conn_id);
    let (connection, _drop_rx) = Connection::new(conn_id, addr, socket, client, false);

    let ctx = HandlerContext {
        cerver: cerver.clone(),
        connection: connection.clone(),
    };
    (ctx, connection, peer_side)
}
