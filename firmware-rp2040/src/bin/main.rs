#![no_std]
#![no_main]

use defmt::{debug, info, trace, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Flex, Level, Output};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::UART1;
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Delay, Ticker};
use psx_adapter_rp2040::config::{BUS_CORE_STACK_SIZE, HOST_LINK_BAUD, STATUS_TICK};
use psx_adapter_rp2040::{
    BusEvent, HidAdapter, PsxBus, RpBusLines, SharedControllerState, StatusIndicator, StatusLed,
    UartHostLink, UartReportRequester,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
});

/// Controller registers shared by both cores.
static SHARED: SharedControllerState<CriticalSectionRawMutex> = SharedControllerState::new();

static BUS_CORE_STACK: StaticCell<Stack<BUS_CORE_STACK_SIZE>> = StaticCell::new();

type Adapter = HidAdapter<'static, CriticalSectionRawMutex, UartReportRequester<'static>>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("PSX adapter starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Console bus on core 1 ---
    let lines = RpBusLines::new(
        Flex::new(p.PIN_7),  // Attention
        Flex::new(p.PIN_10), // Clock
        Flex::new(p.PIN_14), // Command
        Flex::new(p.PIN_11), // Data
        Flex::new(p.PIN_15), // Acknowledge
    );
    let stack = BUS_CORE_STACK.init(Stack::new());
    spawn_core1(p.CORE1, stack, move || bus_loop(lines));

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = HOST_LINK_BAUD;

    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (tx, rx) = uart.split();
    let link = UartHostLink::new(rx);
    let adapter = HidAdapter::new(&SHARED, UartReportRequester::new(tx));

    let led = StatusLed::new(Output::new(p.PIN_25, Level::Low));

    spawner.spawn(host_task(link, adapter).unwrap());
    spawner.spawn(status_task(led).unwrap());

    info!("PSX adapter initialized, waiting for devices...");
}

/// Answer console polls forever.
fn bus_loop(mut lines: RpBusLines<'static>) -> ! {
    let mut bus = PsxBus::new();
    let mut delay = Delay;
    bus.reset(&mut lines);

    loop {
        match bus.poll(&mut lines, &mut delay, &SHARED) {
            Some(BusEvent::Completed(protocol)) => trace!("Poll answered as {:?}", protocol),
            Some(BusEvent::Aborted(reason)) => debug!("Transaction aborted: {:?}", reason),
            None => {}
        }
    }
}

/// Host task - decodes link lines and feeds them to the HID adapter.
#[embassy_executor::task]
async fn host_task(mut link: UartHostLink<'static>, mut adapter: Adapter) {
    loop {
        match link.next_event().await {
            Ok(event) => match event.dispatch(&mut adapter) {
                Ok(()) => debug!("Host event: {:?}", event),
                Err(e) => warn!("Host event {:?} rejected: {:?}", event, e),
            },
            Err(e) => warn!("Host link error: {:?}", e),
        }
    }
}

/// Status task - refreshes the LED from the shared registers.
#[embassy_executor::task]
async fn status_task(mut led: StatusLed<'static>) {
    let mut ticker = Ticker::every(STATUS_TICK);
    let mut shown = StatusIndicator::Off;

    loop {
        let indicator = StatusIndicator::from_snapshot(&SHARED.peek());
        if indicator != shown {
            info!("Status: {:?}", indicator);
            shown = indicator;
        }
        led.update(indicator);
        ticker.next().await;
    }
}
