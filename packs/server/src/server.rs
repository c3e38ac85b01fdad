use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::Receiver;
use tokio::sync::mpsc;
use tokio::time;

use crate::connection::Connection;
use crate::limiter::RateLimiter;
use crate::processor::OrderProcessor;
use crate::protocol::{Command, Outcome};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Server listener state. Created in the `run` call. It includes a `run` method
/// which performs the TCP listening and initialization of per-connection state.
struct Listener {
    listener: TcpListener,

    processor: Arc<OrderProcessor>,

    limiter: Arc<RateLimiter>,

    /// Broadcasts a shutdown signal to all active connections.
    ///
    /// When a graceful shutdown is initiated, a `()` value is sent via the
    /// broadcast::Sender (or the sender is dropped). Each active connection
    /// receives it, reaches a safe terminal state, and completes the task.
    notify_shutdown: broadcast::Sender<()>,

    /// Used to wait for client connections to complete processing.
    ///
    /// Every connection handler holds a clone of this sender. Once the
    /// listener drops its own copy and all handlers finish, the paired
    /// receiver yields `None` and the server can exit.
    shutdown_complete_tx: mpsc::Sender<()>,
}

impl Listener {
    pub async fn run(&mut self) -> std::io::Result<()> {
        info!("accepting inbound connections");
        loop {
            let (socket, peer) = self.accept().await?;
            let mut handler = Handler {
                con: Connection::new(socket),
                peer,
                processor: self.processor.clone(),
                limiter: self.limiter.clone(),
                shutdown: self.notify_shutdown.subscribe(),
                _shutdown_complete: self.shutdown_complete_tx.clone(),
            };
            tokio::spawn(async move {
                if let Err(err) = handler.run().await {
                    error!("connection error from {}: {:?}", handler.peer, err);
                }
            });
        }
    }

    /// Accept an inbound connection.
    ///
    /// Errors are handled by backing off and retrying. After the first failure
    /// the task waits for 1 second, and each subsequent failure doubles the
    /// wait. If accepting fails again after waiting 64 seconds the error is
    /// returned.
    async fn accept(&mut self) -> std::io::Result<(TcpStream, SocketAddr)> {
        let mut backoff = 1;

        loop {
            match self.listener.accept().await {
                Ok(accepted) => return Ok(accepted),
                Err(err) => {
                    if backoff > 64 {
                        return Err(err);
                    }
                    warn!("accept failed, retrying in {}s: {}", backoff, err);
                }
            }

            time::sleep(Duration::from_secs(backoff)).await;

            backoff *= 2;
        }
    }
}

struct Handler {
    con: Connection,
    peer: SocketAddr,
    processor: Arc<OrderProcessor>,
    limiter: Arc<RateLimiter>,
    shutdown: Receiver<()>,
    /// Not used directly. Instead, when `Handler` is dropped the sender is
    /// released, signalling that this connection is done.
    _shutdown_complete: mpsc::Sender<()>,
}

impl Handler {
    async fn run(&mut self) -> std::io::Result<()> {
        loop {
            let read = tokio::select! {
                read = self.con.read_command() => read,
                _ = self.shutdown.recv() => {
                    return Ok(());
                }
            };

            let start = Instant::now();
            let command = match read {
                Ok(Some(command)) => command,
                Ok(None) => return Ok(()),
                Err(err)
                    if matches!(err.kind(), ErrorKind::InvalidData | ErrorKind::InvalidInput) =>
                {
                    // malformed lines count against the limit like any request
                    let outcome = if self.admit().await {
                        Outcome::ClientError(err.to_string())
                    } else {
                        rate_limited()
                    };
                    self.reply_error(&outcome).await?;
                    self.log_request("-", &outcome, start.elapsed());
                    // an oversized line leaves the stream mid-request
                    if err.kind() == ErrorKind::InvalidInput {
                        return Ok(());
                    }
                    continue;
                }
                Err(err) => return Err(err),
            };

            if command == Command::Quit {
                return Ok(());
            }

            let name = command.name();
            let outcome = if self.admit().await {
                self.execute(command).await?
            } else {
                rate_limited()
            };
            self.reply_error(&outcome).await?;
            self.log_request(name, &outcome, start.elapsed());
        }
    }

    async fn admit(&self) -> bool {
        self.limiter.check(self.peer.ip()).await
    }

    /// Runs one command, writing its reply on success.
    async fn execute(&mut self, command: Command) -> std::io::Result<Outcome> {
        match command {
            Command::GetPacks => {
                match self.processor.active_packs().await {
                    Some(config) => self.con.write_packs(&config).await?,
                    None => self.con.write_response(b"NOT_CONFIGURED").await?,
                }
                Ok(Outcome::Success)
            }
            Command::SetPacks { sizes } => match self.processor.set_packs(&sizes).await {
                Ok(config) => {
                    let reply = format!("STORED {}", config.signature);
                    self.con.write_response(reply.as_bytes()).await?;
                    Ok(Outcome::Success)
                }
                Err(err) => Ok(Outcome::from(&err)),
            },
            Command::Calculate { order } => match self.processor.calculate(order).await {
                Ok(calc) => {
                    self.con.write_plan(&calc).await?;
                    Ok(Outcome::Success)
                }
                Err(err) => Ok(Outcome::from(&err)),
            },
            Command::Quit => Ok(Outcome::Success),
        }
    }

    async fn reply_error(&mut self, outcome: &Outcome) -> std::io::Result<()> {
        if let Some(line) = outcome.to_line() {
            self.con.write_response(line.as_bytes()).await?;
        }
        Ok(())
    }

    fn log_request(&self, command: &str, outcome: &Outcome, elapsed: Duration) {
        match outcome {
            Outcome::Success => {
                info!("{} {} completed in {:?}", self.peer, command, elapsed)
            }
            Outcome::ClientError(msg) => {
                warn!("{} {} client error in {:?}: {}", self.peer, command, elapsed, msg)
            }
            Outcome::ServerError(msg) => {
                error!("{} {} server error in {:?}: {}", self.peer, command, elapsed, msg)
            }
        }
    }
}

fn rate_limited() -> Outcome {
    Outcome::ClientError("rate limit exceeded".to_string())
}

/// Serves requests on `listener` until `shutdown` completes, then waits for
/// open connections to finish.
pub async fn run(
    listener: TcpListener,
    processor: Arc<OrderProcessor>,
    limiter: Arc<RateLimiter>,
    shutdown: impl Future,
) {
    // When the provided `shutdown` future completes, dropping `notify_shutdown`
    // tells every subscriber to stop. Receivers are created on demand with
    // `subscribe()`.
    let (notify_shutdown, _) = broadcast::channel(1);
    let (shutdown_complete_tx, mut shutdown_complete_rx) = mpsc::channel(1);

    let sweeper = {
        let limiter = limiter.clone();
        let mut shutdown = notify_shutdown.subscribe();
        let shutdown_complete = shutdown_complete_tx.clone();
        async move {
            let mut interval = time::interval(SWEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => limiter.sweep().await,
                    _ = shutdown.recv() => break,
                }
            }
            drop(shutdown_complete);
        }
    };
    tokio::spawn(sweeper);

    let mut server = Listener {
        listener,
        processor,
        limiter,
        notify_shutdown,
        shutdown_complete_tx,
    };

    tokio::select! {
        res = server.run() => {
            // Accepting failed repeatedly; errors from individual connections
            // never reach this point.
            if let Err(err) = res {
                error!("failed to accept: {}", err);
            }
        }
        _ = shutdown => {
            info!("shutting down");
        }
    }

    let Listener {
        notify_shutdown,
        shutdown_complete_tx,
        ..
    } = server;

    // Dropping the sender wakes every subscriber.
    drop(notify_shutdown);
    // Drop final `Sender` so the `Receiver` below can complete
    drop(shutdown_complete_tx);

    // Wait for every handler (and the sweeper) to release its sender.
    shutdown_complete_rx.recv().await;
}
