//! What the board publishes to the broker over a session.

use log::{info, warn};

use crate::command::state_word;
use crate::relay::RelayState;
use crate::state::render_state;
use crate::topic::{Topics, AVAILABILITY_OFFLINE, AVAILABILITY_ONLINE};

/// Outgoing half of a broker session.
pub trait Publisher {
    type Error;

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), Self::Error>;

    async fn disconnect(&mut self);
}

#[derive(Debug, PartialEq, Eq)]
pub enum PublishError<E> {
    Publish(E),
    Topic,
    Format,
}

impl<E> From<E> for PublishError<E> {
    fn from(error: E) -> Self {
        PublishError::Publish(error)
    }
}

/// Retained `online`/`offline` on `<base>/availability`.
pub async fn publish_availability<P: Publisher>(
    publisher: &mut P,
    topics: &Topics,
    online: bool,
) -> Result<(), P::Error> {
    let word = if online {
        AVAILABILITY_ONLINE
    } else {
        AVAILABILITY_OFFLINE
    };
    publisher
        .publish(topics.availability(), word.as_bytes(), true)
        .await
}

/// Retained `ON`/`OFF` per relay, then the JSON snapshot on `<base>/state`.
pub async fn publish_state<P: Publisher>(
    publisher: &mut P,
    topics: &Topics,
    hostname: &str,
    state: RelayState,
) -> Result<(), PublishError<P::Error>> {
    for (index, on) in state.iter().enumerate() {
        let topic = topics
            .relay_state(index as u8)
            .map_err(|_| PublishError::Topic)?;
        publisher
            .publish(&topic, state_word(on).as_bytes(), true)
            .await?;
    }

    let payload = render_state(hostname, &state).map_err(|_| PublishError::Format)?;
    publisher
        .publish(topics.state(), payload.as_bytes(), false)
        .await?;

    info!("Relay state published: {:#010b}", state.mask());
    Ok(())
}

/// Closes a session. A clean disconnect discards the last will, so the
/// retained `offline` goes out first.
pub async fn end_session<P: Publisher>(publisher: &mut P, topics: &Topics)
where
    P::Error: core::fmt::Debug,
{
    if let Err(e) = publish_availability(publisher, topics, false).await {
        warn!("Failed to publish offline availability: {:?}", e);
    }
    publisher.disconnect().await;
}
