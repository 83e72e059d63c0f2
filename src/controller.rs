use embassy_futures::select::{select, Either};
use embassy_net::Stack;
use embassy_time::{Duration, Instant, Timer};
use embedded_io_async::{Read, Write};
use log::{error, info, warn};

use relayboard_core::publish::{end_session, publish_availability, publish_state, PublishError};
use relayboard_core::relay::RelayBoard;
use relayboard_core::topic::Topics;

use crate::config::CONFIG;
use crate::constants::*;
use crate::mqtt::{self, Mqtt};
use crate::transport;
use crate::I2cBus;

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    Transport(transport::Error),
    #[allow(dead_code)]
    Mqtt(mqtt::Error),
    Topic,
    Format,
}

impl From<transport::Error> for Error {
    fn from(error: transport::Error) -> Self {
        Error::Transport(error)
    }
}

impl From<mqtt::Error> for Error {
    fn from(error: mqtt::Error) -> Self {
        Error::Mqtt(error)
    }
}

impl From<PublishError<mqtt::Error>> for Error {
    fn from(error: PublishError<mqtt::Error>) -> Self {
        match error {
            PublishError::Publish(e) => Error::Mqtt(e),
            PublishError::Topic => Error::Topic,
            PublishError::Format => Error::Format,
        }
    }
}

pub struct Buffers {
    pub rx: [u8; RX_BUFFER_SIZE],
    pub tx: [u8; TX_BUFFER_SIZE],
    pub mqtt_rx: [u8; MQTT_RX_BUFFER_SIZE],
    pub mqtt_tx: [u8; MQTT_TX_BUFFER_SIZE],
}

impl Buffers {
    pub const fn new() -> Self {
        Self {
            rx: [0; RX_BUFFER_SIZE],
            tx: [0; TX_BUFFER_SIZE],
            mqtt_rx: [0; MQTT_RX_BUFFER_SIZE],
            mqtt_tx: [0; MQTT_TX_BUFFER_SIZE],
        }
    }
}

/// Drives the relays from MQTT and keeps the broker informed of their state.
pub struct Controller {
    stack: Stack<'static>,
    relays: RelayBoard<I2cBus>,
    buffers: &'static mut Buffers,
    topics: Topics,
}

impl Controller {
    pub fn new(
        stack: Stack<'static>,
        relays: RelayBoard<I2cBus>,
        buffers: &'static mut Buffers,
    ) -> Result<Self, Error> {
        let topics = Topics::new(CONFIG.mqtt_base_topic).map_err(|_| Error::Topic)?;
        Ok(Self {
            stack,
            relays,
            buffers,
            topics,
        })
    }

    /// Runs broker sessions forever, waiting the reconnect interval after
    /// each failure.
    pub async fn run(&mut self) -> ! {
        loop {
            if let Err(e) = self.session().await {
                error!("MQTT session error: {:?}", e);
            }

            info!(
                "Reconnecting to MQTT broker in {} ms",
                CONFIG.mqtt_reconnect_interval_ms
            );
            Timer::after(Duration::from_millis(
                CONFIG.mqtt_reconnect_interval_ms.into(),
            ))
            .await;
        }
    }

    async fn session(&mut self) -> Result<(), Error> {
        let Self {
            stack,
            relays,
            buffers,
            topics,
        } = self;
        let topics: &Topics = topics;

        let socket = transport::connect(
            *stack,
            &mut buffers.rx,
            &mut buffers.tx,
            CONFIG.mqtt_hostname,
            CONFIG.mqtt_port,
        )
        .await?;

        let mut mqtt =
            Mqtt::new(socket, &mut buffers.mqtt_tx, &mut buffers.mqtt_rx, topics).await?;

        let result = serve(&mut mqtt, relays, topics).await;

        // Reached on errors only, the broker would otherwise keep `online`
        end_session(&mut mqtt, topics).await;
        result
    }
}

async fn serve<T: Read + Write>(
    mqtt: &mut Mqtt<'_, T>,
    relays: &mut RelayBoard<I2cBus>,
    topics: &Topics,
) -> Result<(), Error> {
    mqtt.subscribe(topics.relay_command_filter()).await?;
    mqtt.subscribe(topics.all_command()).await?;
    publish_availability(mqtt, topics, true).await?;

    // Pick up whatever the latch holds, a previous session may have left
    // the bus in an unknown state
    if let Err(e) = relays.sync().await {
        warn!("Failed to read back relay state: {:?}", e);
    }
    publish_state(mqtt, topics, CONFIG.hostname, relays.state()).await?;

    let interval = Duration::from_millis(CONFIG.mqtt_state_interval_ms.into());
    let mut next_report = Instant::now() + interval;

    loop {
        match select(
            mqtt.receive(topics, relays.count()),
            Timer::at(next_report),
        )
        .await
        {
            Either::First(Ok(Some(command))) => match relays.apply(command).await {
                Ok(state) => publish_state(mqtt, topics, CONFIG.hostname, state).await?,
                Err(e) => error!("Failed to switch relays: {:?}", e),
            },
            Either::First(Ok(None)) => {}
            Either::First(Err(e)) => return Err(Error::Mqtt(e)),
            Either::Second(()) => {
                publish_state(mqtt, topics, CONFIG.hostname, relays.state()).await?;
                next_report += interval;
                // Skip reports missed while blocked
                if next_report < Instant::now() {
                    next_report = Instant::now() + interval;
                }
            }
        }
    }
}
