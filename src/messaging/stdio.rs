//! JSON-lines bridge between the messenger and an external UI process
//!
//! Scraper envelopes are written one per line; UI commands are read one per
//! line. Malformed lines are logged and skipped.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::bus::Messenger;
use super::errors::MessengerError;
use super::types::{Envelope, MessageSource};

/// Write every scraper envelope to `writer` until the messenger shuts down
pub async fn forward_to_writer<W>(messenger: &Messenger, mut writer: W) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut rx = messenger.subscribe_from(MessageSource::Scraper);
    let mut written = 0;
    loop {
        match rx.recv().await {
            Ok(envelope) => {
                let Ok(line) = envelope.to_json() else {
                    continue;
                };
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
                written += 1;
            }
            Err(MessengerError::ReceiverLagged(n)) => warn!("UI bridge lagged, {n} messages lost"),
            Err(_) => break,
        }
    }
    Ok(written)
}

/// Publish UI commands read from `reader`; returns how many were accepted
pub async fn forward_from_reader<R>(reader: R, messenger: &Messenger) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut accepted = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match Envelope::from_json(line) {
            Ok(envelope) if envelope.source == MessageSource::ScraperUi && envelope.kind.is_command() => {
                debug!(command = ?envelope.kind, "UI command received");
                messenger.emit(envelope);
                accepted += 1;
            }
            Ok(envelope) => debug!(kind = ?envelope.kind, "Ignoring non-command envelope"),
            Err(e) => warn!("Malformed envelope on input: {e}"),
        }
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::LeadKind;
    use crate::messaging::MessageType;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn publishes_only_ui_commands() {
        let messenger = Messenger::default();
        let mut rx = messenger.subscribe_from(MessageSource::ScraperUi);
        let input = format!(
            "{}\nnot json\n\n{}\n",
            r#"{"source":"scraper-ui","type":"SCRAPE_PAUSE","payload":{"type":"reactions"}}"#,
            r#"{"source":"scraper","type":"SCRAPE_DONE","payload":{"type":"reactions"}}"#,
        );
        let accepted = forward_from_reader(BufReader::new(input.as_bytes()), &messenger)
            .await
            .expect("read");
        assert_eq!(accepted, 1);
        let env = rx.try_recv().expect("open").expect("command");
        assert_eq!(env.kind, MessageType::ScrapePause);
        assert_eq!(env.payload.lead_kind(), Some(LeadKind::Reaction));
    }
}
