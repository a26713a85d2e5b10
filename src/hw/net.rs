//! WiFi station link driver and per-command TCP transport.
//!
//! The WiFi task owns the esp-radio controller; the facade talks to it
//! through latched enable/disable signals and the link monitor through
//! the associate signal, so nothing here is shared mutably. Link-layer
//! and DHCP progress is reported to the core as [`LinkEvent`]s.

use embassy_futures::select::{select, Either};
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, IpEndpoint, Runner, Stack, StackResources};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use embedded_io_async::Write;
use esp_hal::rng::Rng;
use esp_radio::wifi::{
    ClientConfig, Config as WifiRuntimeConfig, ModeConfig, WifiController, WifiDevice, WifiEvent,
};
use log::{info, warn};
use static_cell::StaticCell;

use core::net::SocketAddrV4;

use crate::config::{GATEWAY_PORT, WIFI_PASSWORD, WIFI_SSID};
use crate::error::{Error, TransportError};
use crate::link::{Associate, LinkDriver, LinkEvent};
use crate::switch::SwitchContext;
use crate::transmitter::{Connection, Transport};

/// Per-connection socket buffer size. One 3-byte record per session;
/// this is already generous.
const SOCKET_BUF: usize = 512;

/// Delay before retrying after a failed association attempt.
const CONNECT_RETRY_SECS: u64 = 3;

static ENABLE: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static DISABLE: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static ASSOCIATE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Radio, network stack and their runners, created once at boot.
pub struct NetRuntime {
    pub controller: WifiController<'static>,
    pub runner: Runner<'static, WifiDevice<'static>>,
    pub stack: Stack<'static>,
}

/// Bring up esp-radio and the embassy-net stack (DHCP client).
pub fn setup(wifi: esp_hal::peripherals::WIFI<'static>) -> Result<NetRuntime, Error> {
    static RADIO_CTRL: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

    let radio_ctrl = esp_radio::init().map_err(|_| Error::LinkUp)?;
    let radio_ctrl = RADIO_CTRL.init(radio_ctrl);
    let (controller, ifaces) =
        esp_radio::wifi::new(radio_ctrl, wifi, WifiRuntimeConfig::default())
            .map_err(|_| Error::LinkUp)?;

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    let (stack, runner) = embassy_net::new(
        ifaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::<3>::new()),
        seed,
    );

    Ok(NetRuntime {
        controller,
        runner,
        stack,
    })
}

/// Link driver handle for the facade. Latches signals the WiFi task
/// consumes; both calls are fire-and-forget on this side.
pub struct WifiLink;

impl LinkDriver for WifiLink {
    async fn bring_up(&mut self) -> Result<(), Error> {
        ENABLE.signal(());
        Ok(())
    }

    async fn tear_down(&mut self) -> Result<(), Error> {
        DISABLE.signal(());
        Ok(())
    }
}

/// Association-request handle for the link monitor.
pub struct WifiAssociate;

impl Associate for WifiAssociate {
    fn request_associate(&self) {
        ASSOCIATE.signal(());
    }
}

/// WiFi controller task: station bring-up, association attempts and
/// link-loss reporting.
#[embassy_executor::task]
pub async fn wifi_task(mut controller: WifiController<'static>, ctx: &'static SwitchContext) {
    loop {
        ENABLE.wait().await;

        let mode = ModeConfig::Client(
            ClientConfig::default()
                .with_ssid(WIFI_SSID.into())
                .with_password(WIFI_PASSWORD.into()),
        );
        if let Err(err) = controller.set_config(&mode) {
            warn!("wifi: station config failed: {:?}", err);
            continue;
        }
        if let Err(err) = controller.start_async().await {
            warn!("wifi: start failed: {:?}", err);
            continue;
        }
        ctx.post_link_event(LinkEvent::Started);

        'up: loop {
            match select(DISABLE.wait(), ASSOCIATE.wait()).await {
                Either::First(()) => {
                    let _ = controller.stop_async().await;
                    info!("wifi: stopped");
                    break 'up;
                }
                Either::Second(()) => match controller.connect_async().await {
                    Ok(()) => {
                        info!("wifi: associated");
                        match select(
                            DISABLE.wait(),
                            controller.wait_for_event(WifiEvent::StaDisconnected),
                        )
                        .await
                        {
                            Either::First(()) => {
                                let _ = controller.disconnect_async().await;
                                let _ = controller.stop_async().await;
                                info!("wifi: stopped");
                                break 'up;
                            }
                            Either::Second(_) => {
                                warn!("wifi: link lost");
                                ctx.post_link_event(LinkEvent::Lost);
                            }
                        }
                    }
                    Err(err) => {
                        warn!("wifi: associate failed: {:?}", err);
                        Timer::after(Duration::from_secs(CONNECT_RETRY_SECS)).await;
                        // Lost re-arms the monitor's associate request.
                        ctx.post_link_event(LinkEvent::Lost);
                    }
                },
            }
        }
    }
}

/// DHCP watcher: reports address assignment and loss to the core.
#[embassy_executor::task]
pub async fn dhcp_task(stack: Stack<'static>, ctx: &'static SwitchContext) {
    loop {
        stack.wait_config_up().await;
        if let Some(cfg) = stack.config_v4() {
            info!("net: got address {}", cfg.address.address());
        }
        ctx.post_link_event(LinkEvent::AddressAssigned);
        stack.wait_config_down().await;
    }
}

/// embassy-net stack runner.
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

/// Connection-per-record TCP transport toward the LAN gateway.
pub struct TcpTransport {
    stack: Stack<'static>,
    rx_buf: [u8; SOCKET_BUF],
    tx_buf: [u8; SOCKET_BUF],
}

impl TcpTransport {
    pub fn new(stack: Stack<'static>) -> Self {
        Self {
            stack,
            rx_buf: [0; SOCKET_BUF],
            tx_buf: [0; SOCKET_BUF],
        }
    }
}

impl Transport for TcpTransport {
    type Connection<'a> = TcpConnection<'a>;

    async fn gateway(&mut self) -> Result<SocketAddrV4, TransportError> {
        // The gateway learned from DHCP is the command sink.
        let config = self.stack.config_v4().ok_or(TransportError::NoGateway)?;
        let gateway = config.gateway.ok_or(TransportError::NoGateway)?;
        Ok(SocketAddrV4::new(gateway, GATEWAY_PORT))
    }

    async fn connect(
        &mut self,
        gateway: SocketAddrV4,
    ) -> Result<Self::Connection<'_>, TransportError> {
        let mut socket = TcpSocket::new(self.stack, &mut self.rx_buf, &mut self.tx_buf);
        socket.set_timeout(Some(Duration::from_secs(5)));

        let endpoint = IpEndpoint::new(IpAddress::Ipv4(*gateway.ip()), gateway.port());
        socket
            .connect(endpoint)
            .await
            .map_err(|_| TransportError::ConnectFailed)?;

        Ok(TcpConnection { socket })
    }
}

/// A single-record TCP session.
pub struct TcpConnection<'a> {
    socket: TcpSocket<'a>,
}

impl embedded_io_async::ErrorType for TcpConnection<'_> {
    type Error = embassy_net::tcp::Error;
}

impl Write for TcpConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket.write(buf).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket.flush().await
    }
}

impl Connection for TcpConnection<'_> {
    async fn close(mut self) {
        let _ = self.socket.flush().await;
        self.socket.close();
    }
}
