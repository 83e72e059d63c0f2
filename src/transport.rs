use core::net::Ipv4Addr;
use core::str::FromStr;

use embassy_net::{
    dns::{DnsQueryType, Error as DNSError},
    tcp::{ConnectError, TcpSocket},
    IpAddress, Stack,
};
use embassy_time::Duration;

use crate::constants::SOCKET_TIMEOUT_SECS;

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    DNSQueryFailed(DNSError),
    DNSLookupFailed,
    #[allow(dead_code)]
    SocketConnectionError(ConnectError),
}

/// Opens a plain TCP connection to `hostname:port`.
pub async fn connect<'a>(
    stack: Stack<'static>,
    rx_buffer: &'a mut [u8],
    tx_buffer: &'a mut [u8],
    hostname: &str,
    port: u16,
) -> Result<TcpSocket<'a>, Error> {
    let addr = resolve(stack, hostname).await?;

    let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));

    log::info!("Connecting TCP socket to {}:{}", addr, port);
    if let Err(e) = socket.connect((addr, port)).await {
        socket.abort();
        return Err(Error::SocketConnectionError(e));
    }
    log::info!("TCP connected");

    Ok(socket)
}

// Brokers are usually configured by IP, skip DNS for literals
async fn resolve(stack: Stack<'static>, hostname: &str) -> Result<IpAddress, Error> {
    if let Ok(ip) = Ipv4Addr::from_str(hostname) {
        return Ok(IpAddress::Ipv4(ip));
    }

    stack
        .dns_query(hostname, DnsQueryType::A)
        .await
        .map_err(Error::DNSQueryFailed)?
        .first()
        .copied()
        .ok_or(Error::DNSLookupFailed)
}
