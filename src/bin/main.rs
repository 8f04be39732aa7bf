// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::spi::Mode;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use ethlamp::clock::WallClock;
use ethlamp::config::{Config, TCP_RX_BUFFER_LEN, TCP_TX_BUFFER_LEN, TIME_REPLY_BUFFER_LEN};
use ethlamp::http::Server;
use ethlamp::led::Led;
use ethlamp::net::link::LinkMonitor;
use ethlamp::net::sntp::TimeClient;
use ethlamp::net::stack::TcpListener;

extern crate esp_backtrace;

macro_rules! mk_static {
    ($t:ty,$val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> =
            static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

const UDP_RX_BUFFER_LEN: usize = TIME_REPLY_BUFFER_LEN + 512;
const UDP_TX_BUFFER_LEN: usize = 128;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) {
    rtt_target::rtt_init_defmt!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // the status page is the only heap user
    esp_alloc::heap_allocator!(size: 32 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let settings = Config::default();

    // D4, the blue LED
    let led = Led::new(Output::new(
        peripherals.GPIO4,
        Level::High,
        OutputConfig::default(),
    ));

    let spi = Spi::new(
        peripherals.SPI2,
        SpiConfig::default()
            .with_frequency(Rate::from_mhz(20))
            .with_mode(Mode::_0),
    )
    .expect("Failed to configure SPI2")
    .with_sck(peripherals.GPIO12)
    .with_mosi(peripherals.GPIO11)
    .with_miso(peripherals.GPIO13)
    .into_async();
    let cs = Output::new(peripherals.GPIO10, Level::High, OutputConfig::default());
    let int = Input::new(
        peripherals.GPIO14,
        InputConfig::default().with_pull(Pull::Up),
    );
    let reset = Output::new(peripherals.GPIO9, Level::High, OutputConfig::default());

    let stack = ethlamp::net::ethernet::new(
        spawner,
        spi,
        cs,
        int,
        reset,
        settings.mac_address,
    )
    .await;

    // a missing link isn't fatal, the network calls below just fail
    match LinkMonitor::new(settings.link_poll_interval)
        .await_link(&stack, settings.link_timeout)
        .await
    {
        Ok(()) => info!("Connection to network established"),
        Err(e) => warn!("{}", e),
    }
    ethlamp::net::ethernet::wait_for_address(stack, settings.address_timeout).await;

    let mut socket = UdpSocket::new(
        stack,
        mk_static!([PacketMetadata; 4], [PacketMetadata::EMPTY; 4]),
        mk_static!([u8; UDP_RX_BUFFER_LEN], [0; UDP_RX_BUFFER_LEN]),
        mk_static!([PacketMetadata; 4], [PacketMetadata::EMPTY; 4]),
        mk_static!([u8; UDP_TX_BUFFER_LEN], [0; UDP_TX_BUFFER_LEN]),
    );
    let clock = match socket.bind(0) {
        Err(e) => {
            warn!("time socket bind failed: {:?}", e);
            WallClock::unsynchronized()
        }
        Ok(()) => {
            match TimeClient::new(settings.time_server, settings.time_timeout)
                .fetch_time(&stack, &mut socket)
                .await
            {
                Ok(unix) => WallClock::synchronized(unix),
                Err(e) => {
                    warn!("{}", e);
                    WallClock::unsynchronized()
                }
            }
        }
    };
    drop(socket);

    let listener = TcpListener::new(
        stack,
        settings.server.port,
        mk_static!([u8; TCP_RX_BUFFER_LEN], [0; TCP_RX_BUFFER_LEN]),
        mk_static!([u8; TCP_TX_BUFFER_LEN], [0; TCP_TX_BUFFER_LEN]),
    )
    .with_socket_timeout(settings.server.socket_timeout);

    Server::new(listener, led, clock, settings.server).run().await
}
