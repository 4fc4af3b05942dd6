//! The uplink connection.
//!
//! One TCP link carrying newline-framed TS6. Inbound lines are handed to the
//! Matrix one at a time; anything the Matrix queued on its outbound channel
//! is written out between reads. The Matrix itself never awaits.

use crate::config::UplinkConfig;
use crate::error::SyncError;
use crate::state::Matrix;
use crate::wire::{Command, Message};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{error, info, warn};

/// Longest line we accept from the uplink.
const MAX_LINE_LENGTH: usize = 8192;

#[derive(Debug, Error)]
pub enum UplinkError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line codec error: {0}")]
    Codec(#[from] LinesCodecError),
    #[error("uplink sent a wrong link password")]
    BadPassword,
    #[error("uplink closed the link: {0}")]
    Remote(String),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Run one link session until it closes.
///
/// Returns `Ok(())` when the uplink closes the connection cleanly.
pub async fn run_session(
    matrix: &mut Matrix,
    config: &UplinkConfig,
    outbound: &mut mpsc::UnboundedReceiver<Message>,
) -> Result<(), UplinkError> {
    let addr = config.address();
    info!(addr = %addr, "Connecting to uplink");
    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| UplinkError::Connect { addr: addr.clone(), source })?;
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    // Anything queued while we were down belongs to the old link.
    while outbound.try_recv().is_ok() {}

    matrix.on_connect(&config.password)?;
    flush(&mut framed, outbound).await?;

    loop {
        tokio::select! {
            result = framed.next() => {
                let line = match result {
                    Some(Ok(line)) => line,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!(addr = %addr, "Uplink closed the connection");
                        return Ok(());
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let msg = match line.parse::<Message>() {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(line = %line, error = %e, "Dropping malformed line");
                        continue;
                    }
                };
                if let Command::Pass { password, .. } = &msg.command
                    && *password != config.password
                {
                    error!(addr = %addr, "Uplink sent a wrong link password");
                    return Err(UplinkError::BadPassword);
                }
                let closing = match &msg.command {
                    Command::Error { message } => Some(message.clone()),
                    _ => None,
                };
                matrix.handle_message(msg);
                if let Some(message) = closing {
                    return Err(UplinkError::Remote(message));
                }
            }
            Some(msg) = outbound.recv() => {
                framed.send(msg.to_string()).await?;
            }
        }
        flush(&mut framed, outbound).await?;
    }
}

/// Write out everything the Matrix has queued.
async fn flush(
    framed: &mut Framed<TcpStream, LinesCodec>,
    outbound: &mut mpsc::UnboundedReceiver<Message>,
) -> Result<(), UplinkError> {
    while let Ok(msg) = outbound.try_recv() {
        framed.feed(msg.to_string()).await?;
    }
    SinkExt::<String>::flush(framed).await?;
    Ok(())
}

/// Run one link to completion and forget the network afterwards.
///
/// There is no reconnect: the process makes a single attempt and the
/// session's outcome is returned to the caller.
pub async fn run(
    matrix: &mut Matrix,
    config: &UplinkConfig,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) -> Result<(), UplinkError> {
    let result = run_session(matrix, config, &mut outbound).await;
    match &result {
        Ok(()) => info!(uplink = %config.address(), "Uplink closed the link"),
        Err(e) => error!(error = %e, "Uplink session ended"),
    }
    matrix.on_disconnect();
    result
}
