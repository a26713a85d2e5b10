#![no_std]
#![no_main]

use esp_backtrace as _;

use embassy_time::Duration;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::timer::timg::TimerGroup;
use log::error;
use static_cell::StaticCell;

use btn2net::hw::buttons::{self, GpioCapture};
use btn2net::hw::net::{self, TcpTransport, WifiAssociate, WifiLink};
use btn2net::{
    builder, capture, command::ButtonRoles, link, transmitter, ButtonId, RemoteSwitch,
    SwitchContext,
};

static CTX: SwitchContext = SwitchContext::new();

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());
    esp_alloc::heap_allocator!(size: 96 * 1024);
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let runtime = match net::setup(peripherals.WIFI) {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("net setup failed: {:?}", err);
            halt_forever();
        }
    };
    let transport = TcpTransport::new(runtime.stack);

    // Active-high buttons with external pull-downs.
    let button0 = Input::new(
        peripherals.GPIO4,
        InputConfig::default().with_pull(Pull::Down),
    );
    let button1 = Input::new(
        peripherals.GPIO5,
        InputConfig::default().with_pull(Pull::Down),
    );

    static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(move |spawner| {
        spawner.must_spawn(net::net_task(runtime.runner));
        spawner.must_spawn(net::wifi_task(runtime.controller, &CTX));
        spawner.must_spawn(net::dhcp_task(runtime.stack, &CTX));

        spawner.must_spawn(buttons::capture_task(
            button0,
            ButtonId::Button0,
            &CTX,
            capture::default_callback,
        ));
        spawner.must_spawn(buttons::capture_task(
            button1,
            ButtonId::Button1,
            &CTX,
            capture::default_callback,
        ));

        spawner.must_spawn(builder_task());
        spawner.must_spawn(monitor_task());
        spawner.must_spawn(transmitter_task(transport));
        spawner.must_spawn(orchestrate());
    })
}

#[embassy_executor::task]
async fn builder_task() {
    builder::command_builder(&CTX, ButtonRoles::default()).await;
}

#[embassy_executor::task]
async fn monitor_task() {
    link::link_monitor(&CTX, &WifiAssociate).await
}

#[embassy_executor::task]
async fn transmitter_task(mut transport: TcpTransport) {
    transmitter::transmitter(&CTX, &mut transport).await
}

/// Bring the module up. Failures are logged and the firmware keeps
/// running; the link monitor retries association on its own.
#[embassy_executor::task]
async fn orchestrate() {
    let mut switch = RemoteSwitch::new(&CTX, GpioCapture, WifiLink);

    if switch.init(ButtonId::Button0).is_err() || switch.init(ButtonId::Button1).is_err() {
        return;
    }

    if let Err(err) = switch.start_transport().await {
        error!("transport not up yet: {:?}", err);
    }

    // Nothing left to do here; the workers carry the pipeline.
    loop {
        embassy_time::Timer::after(Duration::from_secs(3600)).await;
    }
}

fn halt_forever() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
