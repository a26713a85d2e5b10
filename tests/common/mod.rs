//! Test doubles for the pipeline's hardware-facing collaborators.
#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use core::net::{Ipv4Addr, SocketAddrV4};

use btn2net::capture::Capture;
use btn2net::command::ButtonId;
use btn2net::link::{Associate, LinkDriver, LinkEvent};
use btn2net::transmitter::{Connection, Transport};
use btn2net::{Error, SwitchContext, TransportError};

pub const GATEWAY: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 1), 3333);

/// Capture double: records init/deinit calls, can be told to fail.
pub struct FakeCapture {
    pub fail_init: bool,
    pub inited: RefCell<Vec<ButtonId>>,
    pub deinited: RefCell<Vec<ButtonId>>,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self {
            fail_init: false,
            inited: RefCell::new(Vec::new()),
            deinited: RefCell::new(Vec::new()),
        }
    }
}

impl Capture for FakeCapture {
    fn init(&self, button: ButtonId) -> Result<(), Error> {
        if self.fail_init {
            return Err(Error::Init);
        }
        self.inited.borrow_mut().push(button);
        Ok(())
    }

    fn deinit(&self, button: ButtonId) -> Result<(), Error> {
        self.deinited.borrow_mut().push(button);
        Ok(())
    }
}

/// Link driver double: posts a scripted event sequence on `bring_up`,
/// the way a real driver reports progress through its event dispatch.
pub struct FakeLink<'a> {
    ctx: &'a SwitchContext,
    pub on_bring_up: Vec<LinkEvent>,
    pub brought_up: RefCell<u32>,
    pub torn_down: RefCell<u32>,
}

impl<'a> FakeLink<'a> {
    pub fn new(ctx: &'a SwitchContext, on_bring_up: Vec<LinkEvent>) -> Self {
        Self {
            ctx,
            on_bring_up,
            brought_up: RefCell::new(0),
            torn_down: RefCell::new(0),
        }
    }
}

impl LinkDriver for FakeLink<'_> {
    async fn bring_up(&mut self) -> Result<(), Error> {
        *self.brought_up.borrow_mut() += 1;
        for event in &self.on_bring_up {
            self.ctx.post_link_event(*event);
        }
        Ok(())
    }

    async fn tear_down(&mut self) -> Result<(), Error> {
        *self.torn_down.borrow_mut() += 1;
        Ok(())
    }
}

/// Associate double: counts requests.
#[derive(Default)]
pub struct FakeAssociate {
    pub requests: RefCell<u32>,
}

impl Associate for FakeAssociate {
    fn request_associate(&self) {
        *self.requests.borrow_mut() += 1;
    }
}

/// Shared knobs and observations for [`FakeTransport`]. Lives outside
/// the transport so the test script can poke it while the transmitter
/// holds the transport mutably.
pub struct TransportCtrl {
    pub fail_gateway: Cell<bool>,
    pub fail_connect: Cell<bool>,
    pub gateway_calls: Cell<u32>,
    pub connects: Cell<u32>,
    /// Every completed connection's bytes, in order.
    pub wire: RefCell<Vec<Vec<u8>>>,
}

impl TransportCtrl {
    pub fn new() -> Self {
        Self {
            fail_gateway: Cell::new(false),
            fail_connect: Cell::new(false),
            gateway_calls: Cell::new(0),
            connects: Cell::new(0),
            wire: RefCell::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<Vec<u8>> {
        self.wire.borrow().clone()
    }
}

/// Transport double. Connections accumulate written bytes and push
/// them onto the control block's wire on close.
pub struct FakeTransport<'w> {
    ctrl: &'w TransportCtrl,
}

impl<'w> FakeTransport<'w> {
    pub fn new(ctrl: &'w TransportCtrl) -> Self {
        Self { ctrl }
    }
}

impl Transport for FakeTransport<'_> {
    type Connection<'a>
        = FakeConnection<'a>
    where
        Self: 'a;

    async fn gateway(&mut self) -> Result<SocketAddrV4, TransportError> {
        self.ctrl.gateway_calls.set(self.ctrl.gateway_calls.get() + 1);
        if self.ctrl.fail_gateway.get() {
            return Err(TransportError::NoGateway);
        }
        Ok(GATEWAY)
    }

    async fn connect(
        &mut self,
        _gateway: SocketAddrV4,
    ) -> Result<Self::Connection<'_>, TransportError> {
        self.ctrl.connects.set(self.ctrl.connects.get() + 1);
        if self.ctrl.fail_connect.get() {
            return Err(TransportError::ConnectFailed);
        }
        Ok(FakeConnection {
            ctrl: self.ctrl,
            buf: Vec::new(),
        })
    }
}

pub struct FakeConnection<'w> {
    ctrl: &'w TransportCtrl,
    buf: Vec<u8>,
}

#[derive(Debug)]
pub struct NoError;

impl core::fmt::Display for NoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("no error")
    }
}

impl core::error::Error for NoError {}

impl embedded_io_async::Error for NoError {
    fn kind(&self) -> embedded_io_async::ErrorKind {
        embedded_io_async::ErrorKind::Other
    }
}

impl embedded_io_async::ErrorType for FakeConnection<'_> {
    type Error = NoError;
}

impl embedded_io_async::Write for FakeConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for FakeConnection<'_> {
    async fn close(self) {
        self.ctrl.wire.borrow_mut().push(self.buf);
    }
}
