use embedded_io_async::{Read, Write};
use rust_mqtt::{
    client::{
        client::MqttClient,
        client_config::{ClientConfig, MqttVersion},
    },
    packet::v5::{publish_packet::QualityOfService, reason_codes::ReasonCode},
    utils::rng_generator::CountingRng,
};

use relayboard_core::command::{Command, CommandError};
use relayboard_core::publish::Publisher;
use relayboard_core::topic::{Topics, AVAILABILITY_OFFLINE};
use relayboard_core::MQTT_KEEP_ALIVE_SECS;

use crate::config::CONFIG;
use crate::constants::MQTT_MAX_PROPERTIES;

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    ConnectionFailed(ReasonCode),
    #[allow(dead_code)]
    SubscribeFailed(ReasonCode),
    #[allow(dead_code)]
    PublishMessageFailed(ReasonCode),
    #[allow(dead_code)]
    ReceiveFailed(ReasonCode),
}

pub struct Mqtt<'a, T>
where
    T: Read + Write,
{
    client: MqttClient<'a, T, MQTT_MAX_PROPERTIES, CountingRng>,
}

impl<'a, T> Mqtt<'a, T>
where
    T: Read + Write,
{
    /// Connects to the broker with the board's availability topic as last
    /// will, so the broker flags the board `offline` when the session dies.
    pub async fn new(
        transport: T,
        tx_buffer: &'a mut [u8],
        rx_buffer: &'a mut [u8],
        topics: &'a Topics,
    ) -> Result<Self, Error> {
        let mut config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        config.add_max_subscribe_qos(QualityOfService::QoS0);
        config.add_client_id(CONFIG.mqtt_client_id);
        if !CONFIG.mqtt_username.is_empty() {
            config.add_username(CONFIG.mqtt_username);
            config.add_password(CONFIG.mqtt_password);
        }
        config.add_will(
            topics.availability(),
            AVAILABILITY_OFFLINE.as_bytes(),
            true,
        );
        config.keep_alive = MQTT_KEEP_ALIVE_SECS;
        config.max_packet_size = rx_buffer.len() as u32;

        let tx_len = tx_buffer.len();
        let rx_len = rx_buffer.len();
        let mut client = MqttClient::<_, MQTT_MAX_PROPERTIES, _>::new(
            transport, tx_buffer, tx_len, rx_buffer, rx_len, config,
        );

        match client.connect_to_broker().await {
            Ok(()) => {
                log::info!(
                    "MQTT connected to {}:{} as {}",
                    CONFIG.mqtt_hostname,
                    CONFIG.mqtt_port,
                    CONFIG.mqtt_client_id
                );
            }
            Err(e) => {
                log::error!("MQTT connect_to_broker failed: {:?}", e);
                return Err(Error::ConnectionFailed(e));
            }
        }

        Ok(Self { client })
    }

    pub async fn subscribe(&mut self, topic: &str) -> Result<(), Error> {
        self.client
            .subscribe_to_topic(topic)
            .await
            .map_err(Error::SubscribeFailed)?;
        log::info!("MQTT subscribed to {}", topic);
        Ok(())
    }

    pub async fn send_message(
        &mut self,
        topic: &str,
        message: &[u8],
        retain: bool,
    ) -> Result<(), Error> {
        match self
            .client
            .send_message(topic, message, QualityOfService::QoS0, retain)
            .await
        {
            Ok(()) => {
                log::debug!("Published {} bytes to {}", message.len(), topic);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to publish message to {}: {:?}", topic, e);
                Err(Error::PublishMessageFailed(e))
            }
        }
    }

    /// Waits for the next publication on a subscribed topic.
    ///
    /// Returns `Ok(None)` for publications that are not a valid command.
    pub async fn receive(
        &mut self,
        topics: &Topics,
        relay_count: u8,
    ) -> Result<Option<Command>, Error> {
        let (topic, payload) = self
            .client
            .receive_message()
            .await
            .map_err(Error::ReceiveFailed)?;

        match topics.parse_command(topic, payload, relay_count) {
            Ok(command) => {
                log::info!("Command on {}: {:?}", topic, command);
                Ok(Some(command))
            }
            Err(CommandError::UnknownTopic) => {
                log::debug!("Ignoring message on {}", topic);
                Ok(None)
            }
            Err(e) => {
                log::warn!("Rejected message on {}: {:?}", topic, e);
                Ok(None)
            }
        }
    }
}

impl<T> Publisher for Mqtt<'_, T>
where
    T: Read + Write,
{
    type Error = Error;

    async fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Error> {
        self.send_message(topic, payload, retain).await
    }

    async fn disconnect(&mut self) {
        let _ = self.client.disconnect().await;
    }
}
