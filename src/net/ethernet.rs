// SPDX-FileCopyrightText: 2026 Sam Hanes <sam@maltera.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};
use embassy_net_wiznet::chip::W5500;
use embassy_net_wiznet::{Device, State};
use embassy_time::{Delay, Duration, with_timeout};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::Async;
use esp_hal::gpio::{Input, Output};
use esp_hal::rng::Rng;
use esp_hal::spi::master::Spi;

macro_rules! mk_static {
    ($t:ty,$val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

type W5500Spi = ExclusiveDevice<Spi<'static, Async>, Output<'static>, Delay>;
type W5500Runner = embassy_net_wiznet::Runner<'static, W5500, W5500Spi, Input<'static>, Output<'static>>;

/// Resets the W5500, starts its driver and a DHCP-configured IP stack on top.
pub async fn new(
    spawner: Spawner,
    spi: Spi<'static, Async>,
    cs: Output<'static>,
    int: Input<'static>,
    reset: Output<'static>,
    mac_address: [u8; 6],
) -> Stack<'static> {
    let spi_device =
        ExclusiveDevice::new(spi, cs, Delay).expect("Failed to claim W5500 chip select");

    let (device, ethernet_runner) = embassy_net_wiznet::new(
        mac_address,
        mk_static!(State<8, 8>, State::<8, 8>::new()),
        spi_device,
        int,
        reset,
    )
    .await
    .expect("Failed to initialize W5500");
    info!("W5500 initialized, MAC {:?}", mac_address);

    let dhcp_config = embassy_net::Config::dhcpv4(Default::default());

    let rng = Rng::new();

    let (stack, net_runner) = embassy_net::new(
        device,
        dhcp_config,
        mk_static!(StackResources<4>, StackResources::<4>::new()),
        (rng.random() as u64) << 32 | rng.random() as u64,
    );

    spawner.spawn(ethernet_task(ethernet_runner)).ok();
    spawner.spawn(net_task(net_runner)).ok();

    stack
}

/// Waits a bounded time for DHCP and logs the address it handed out.
pub async fn wait_for_address(stack: Stack<'_>, timeout: Duration) {
    if with_timeout(timeout, stack.wait_config_up()).await.is_err() {
        warn!("no IPv4 address after {} ms", timeout.as_millis());
        return;
    }
    if let Some(config) = stack.config_v4() {
        info!("IP address: {:?}", config.address);
    }
}

#[embassy_executor::task]
async fn ethernet_task(runner: W5500Runner) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, Device<'static>>) -> ! {
    runner.run().await
}
