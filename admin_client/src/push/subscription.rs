use futures_util::{SinkExt, StreamExt};
use log::*;
use order_index::events::{update_feed, FeedProducer, PushEvent, UpdateFeed};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::{
    config::{PushConfig, PushProtocol},
    push::stomp::Frame,
    FeedError,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens the push channel and returns the feed of decoded order updates.
///
/// The connection and, for STOMP, the CONNECT/SUBSCRIBE handshake happen before this returns, so a broker that is
/// down or refuses the subscription is reported here. After that a background task forwards every order it can
/// decode. The feed ends when the socket closes; it is not reopened.
pub async fn subscribe(config: &PushConfig) -> Result<UpdateFeed, FeedError> {
    let url = Url::parse(config.url.trim())
        .map_err(|e| FeedError::Connect(format!("Invalid push URL {}. {e}", config.url)))?;
    debug!("📬️ Connecting to push channel at {url}");
    let (mut socket, response) =
        connect_async(url.as_str()).await.map_err(|e| FeedError::Connect(format!("{url}: {e}")))?;
    trace!("📬️ WebSocket handshake complete. {}", response.status());
    if config.protocol == PushProtocol::Stomp {
        let host = url.host_str().unwrap_or("localhost");
        stomp_handshake(&mut socket, host, &config.topic).await?;
        info!("📬️ Subscribed to {} on {url}", config.topic);
    } else {
        info!("📬️ Listening for order events on {url}");
    }
    let (producer, feed) = update_feed(config.buffer_size);
    tokio::spawn(forward_events(socket, config.protocol, producer));
    Ok(feed)
}

async fn stomp_handshake(socket: &mut Socket, host: &str, topic: &str) -> Result<(), FeedError> {
    send_frame(socket, Frame::connect(host)).await?;
    loop {
        let msg = socket.next().await.ok_or(FeedError::Closed)?.map_err(|e| FeedError::Connect(e.to_string()))?;
        let text = match msg {
            Message::Text(text) => text,
            Message::Binary(data) => String::from_utf8_lossy(&data).into_owned(),
            Message::Close(_) => return Err(FeedError::Closed),
            _ => continue,
        };
        for frame in Frame::decode_all(&text)? {
            if frame.is("CONNECTED") {
                debug!("📬️ STOMP session open. Version {}", frame.header("version").unwrap_or("unknown"));
                return send_frame(socket, Frame::subscribe(topic)).await;
            }
            if frame.is("ERROR") {
                return Err(FeedError::Refused(error_text(&frame)));
            }
            trace!("📬️ Ignoring {} frame while connecting", frame.command);
        }
    }
}

async fn send_frame(socket: &mut Socket, frame: Frame) -> Result<(), FeedError> {
    socket.send(Message::Text(frame.encode())).await.map_err(|e| FeedError::Protocol(e.to_string()))
}

fn error_text(frame: &Frame) -> String {
    match (frame.header("message"), frame.body.trim()) {
        (Some(m), "") => m.to_string(),
        (Some(m), body) => format!("{m}. {body}"),
        (None, "") => "The broker sent an ERROR frame".to_string(),
        (None, body) => body.to_string(),
    }
}

enum Step {
    Continue,
    Stop,
}

async fn forward_events(mut socket: Socket, protocol: PushProtocol, producer: FeedProducer) {
    loop {
        let msg = tokio::select! {
            _ = producer.cancelled() => {
                debug!("📬️ Update feed closed. Disconnecting from the push channel");
                if protocol == PushProtocol::Stomp {
                    let _ = send_frame(&mut socket, Frame::disconnect()).await;
                }
                let _ = socket.close(None).await;
                break;
            },
            msg = socket.next() => msg,
        };
        let text = match msg {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Binary(data))) => String::from_utf8_lossy(&data).into_owned(),
            Some(Ok(Message::Close(frame))) => {
                info!("📬️ Push channel closed by the server. {frame:?}");
                break;
            },
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                warn!("📬️ Push channel failed. {e}");
                break;
            },
            None => {
                info!("📬️ Push channel ended");
                break;
            },
        };
        let step = match protocol {
            PushProtocol::Stomp => handle_stomp_message(&text, &producer).await,
            PushProtocol::Json => publish(&text, &producer).await,
        };
        if let Step::Stop = step {
            break;
        }
    }
    debug!("📬️ Push channel task finished");
}

async fn handle_stomp_message(text: &str, producer: &FeedProducer) -> Step {
    let frames = match Frame::decode_all(text) {
        Ok(frames) => frames,
        Err(e) => {
            warn!("📬️ Discarding undecodable message. {e}");
            return Step::Continue;
        },
    };
    for frame in frames {
        if let Step::Stop = handle_frame(frame, producer).await {
            return Step::Stop;
        }
    }
    Step::Continue
}

async fn handle_frame(frame: Frame, producer: &FeedProducer) -> Step {
    match frame.command.as_str() {
        "MESSAGE" => publish(&frame.body, producer).await,
        "ERROR" => {
            error!("📬️ The broker reported an error and the subscription has ended. {}", error_text(&frame));
            Step::Stop
        },
        "RECEIPT" => {
            debug!("📬️ Receipt {}", frame.header("receipt-id").unwrap_or_default());
            Step::Continue
        },
        other => {
            trace!("📬️ Ignoring {other} frame");
            Step::Continue
        },
    }
}

async fn publish(body: &str, producer: &FeedProducer) -> Step {
    let Some(order) = PushEvent::decode_order(body) else {
        return Step::Continue;
    };
    trace!("📬️ Order {} is now {}", order.id, order.status);
    if producer.publish(order).await {
        Step::Continue
    } else {
        Step::Stop
    }
}
