use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::state::AppState;
use crate::ws::{ConnectionSender, LiveConnection};

/// Run one live subscription until the client goes away.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from the connection's queue
/// - Ping task: probes the peer and closes the socket when pongs stop arriving
/// - Reader loop (this task): only watches for disconnection; client payloads
///   are not interpreted
///
/// Whichever way the connection ends, it is removed from the registry before
/// this returns.
pub async fn run_connection(socket: WebSocket, state: AppState, user_id: i64) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    let connection = LiveConnection::new(tx.clone());
    let connection_id = connection.id;
    state.subscriptions.subscribe(user_id, &connection);

    tracing::info!(
        user_id,
        connection_id = %connection_id,
        "Live connection started"
    );

    let mut writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    let (pong_tx, pong_rx) = mpsc::unbounded_channel::<()>();
    let ping_handle = tokio::spawn(ping_task(
        tx.clone(),
        pong_rx,
        state.live.ping_interval(),
        state.live.pong_timeout(),
    ));

    loop {
        tokio::select! {
            inbound = ws_receiver.next() => match inbound {
                Some(Ok(Message::Pong(_))) => {
                    let _ = pong_tx.send(());
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = tx.send(Message::Pong(data));
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(
                        user_id,
                        reason = ?frame,
                        "Client initiated close"
                    );
                    break;
                }
                Some(Ok(_)) => {
                    // Inbound text/binary carries no meaning on this endpoint
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        user_id,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
                None => {
                    tracing::info!(user_id, "WebSocket stream ended");
                    break;
                }
            },
            _ = &mut writer_handle => {
                tracing::info!(user_id, "WebSocket writer stopped");
                break;
            }
        }
    }

    writer_handle.abort();
    ping_handle.abort();

    state.subscriptions.unsubscribe(user_id, connection_id);

    tracing::info!(
        user_id,
        connection_id = %connection_id,
        remaining = state.subscriptions.connection_count(user_id),
        "Live connection stopped"
    );
}

/// Writer task: receives messages from the connection queue and forwards them to the sink.
/// Stops on the first send failure or after forwarding a Close frame.
async fn writer_task(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        let closing = matches!(msg, Message::Close(_));
        if ws_sender.send(msg).await.is_err() || closing {
            break;
        }
    }
}

/// Ping task: sends a ping every `every` and closes the socket if no pong
/// arrives within `grace`.
async fn ping_task(
    tx: ConnectionSender,
    mut pong_rx: mpsc::UnboundedReceiver<()>,
    every: Duration,
    grace: Duration,
) {
    let mut ping_timer = interval(every);
    // Skip the first immediate tick
    ping_timer.tick().await;

    loop {
        ping_timer.tick().await;

        // Only a pong that answers this ping counts; unsolicited ones are dropped
        while pong_rx.try_recv().is_ok() {}

        if tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
            break;
        }

        match timeout(grace, pong_rx.recv()).await {
            Ok(Some(())) => {}
            _ => {
                tracing::warn!("Pong timeout, closing live connection");
                let _ = tx.send(Message::Close(Some(CloseFrame {
                    code: 1001,
                    reason: "Pong timeout".into(),
                })));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(50);

    async fn next_frame(rx: &mut mpsc::UnboundedReceiver<Message>) -> Message {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("ping task went quiet")
            .expect("queue closed")
    }

    #[tokio::test]
    async fn stale_pongs_do_not_answer_a_later_ping() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (pong_tx, pong_rx) = mpsc::unbounded_channel();
        for _ in 0..10 {
            pong_tx.send(()).unwrap();
        }

        let handle = tokio::spawn(ping_task(tx, pong_rx, STEP, STEP));

        assert!(matches!(next_frame(&mut rx).await, Message::Ping(_)));
        match next_frame(&mut rx).await {
            Message::Close(Some(frame)) => assert_eq!(frame.code, 1001),
            other => panic!("expected close, got {other:?}"),
        }
        timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn answered_pings_keep_the_connection() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (pong_tx, pong_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(ping_task(tx, pong_rx, STEP, STEP * 4));

        for _ in 0..3 {
            assert!(matches!(next_frame(&mut rx).await, Message::Ping(_)));
            pong_tx.send(()).unwrap();
        }

        handle.abort();
    }
}
