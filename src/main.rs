#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
mod firmware {
    use avr_device::interrupt::{self, Mutex};
    use core::cell::RefCell;
    use panic_halt as _;
    use weather_sensor_firmware::config::{BUS_ADDRESS, WINDOW_TIMING};
    use weather_sensor_firmware::hal::{
        board, clock, listen_sensor_edges, Adc, Power, SensorLines, TwiSlave, WindowTimer1,
    };
    use weather_sensor_firmware::WeatherStation;

    #[cfg(feature = "debug")]
    use weather_sensor_firmware::{drivers::SerialConsole, hal::Uart, protocol::BusStats, trace};

    type Station = WeatherStation<Adc, WindowTimer1, board::HostReady>;

    /// Everything the interrupt handlers share with the foreground loop
    struct Firmware {
        station: Station,
        twi: TwiSlave,
        lines: SensorLines,
    }

    static FIRMWARE: Mutex<RefCell<Option<Firmware>>> = Mutex::new(RefCell::new(None));

    fn with_firmware<R>(f: impl FnOnce(&mut Firmware) -> R) -> Option<R> {
        interrupt::free(|cs| FIRMWARE.borrow(cs).borrow_mut().as_mut().map(f))
    }

    #[avr_device::entry]
    fn main() -> ! {
        interrupt::disable();

        clock::init();
        // Safety: first and only claim of PORTC/PORTE
        let pins = unsafe { board::Pins::take() };
        let lines = SensorLines::new(pins.rtc_tick, pins.rain_gauge, pins.anemometer);
        // Sample before edge interrupts exist so the first edge is diffed
        // against the real line state
        let port = lines.snapshot();
        let twi = TwiSlave::new(BUS_ADDRESS);
        let adc = Adc::new();
        let timer = WindowTimer1::new(WINDOW_TIMING);
        let station = WeatherStation::new(adc, timer, pins.host_ready, port);

        listen_sensor_edges(&lines);
        interrupt::free(|cs| {
            FIRMWARE
                .borrow(cs)
                .replace(Some(Firmware { station, twi, lines }));
        });
        let mut power = Power::new();

        #[cfg(feature = "debug")]
        let mut console = SerialConsole::new(Uart::new());
        #[cfg(feature = "debug")]
        let mut last_stats = BusStats::default();
        #[cfg(feature = "debug")]
        trace::banner(&mut console, BUS_ADDRESS).ok();

        unsafe { interrupt::enable() };

        loop {
            let Some((outcome, activity, stats)) = with_firmware(|fw| {
                let outcome = fw.station.run_pending_command();
                (outcome, fw.station.take_activity(), fw.station.bus_stats())
            }) else {
                continue;
            };

            #[cfg(feature = "debug")]
            {
                if let Some(outcome) = &outcome {
                    trace::command(&mut console, outcome).ok();
                }
                trace::activity(&mut console, &activity).ok();
                trace::bus_stats(&mut console, &last_stats, &stats).ok();
                last_stats = stats;
            }
            #[cfg(not(feature = "debug"))]
            let _ = (outcome, activity, stats);

            // Re-check with interrupts masked: a command posted after this
            // point wakes the core from sleep
            interrupt::disable();
            let pending = interrupt::free(|cs| {
                FIRMWARE
                    .borrow(cs)
                    .borrow()
                    .as_ref()
                    .map_or(false, |fw| fw.station.command_pending())
            });
            if pending {
                unsafe { interrupt::enable() };
            } else {
                power.sleep_until_interrupt();
            }
        }
    }

    fn on_port_edge() {
        with_firmware(|fw| {
            let port = fw.lines.snapshot();
            fw.station.on_port_change(port)
        });
    }

    #[avr_device::interrupt(atmega128a)]
    fn INT4() {
        on_port_edge();
    }

    #[avr_device::interrupt(atmega128a)]
    fn INT5() {
        on_port_edge();
    }

    #[avr_device::interrupt(atmega128a)]
    fn INT6() {
        on_port_edge();
    }

    #[avr_device::interrupt(atmega128a)]
    fn ADC() {
        with_firmware(|fw| fw.station.on_adc_complete());
    }

    #[avr_device::interrupt(atmega128a)]
    fn TIMER1_COMPA() {
        with_firmware(|fw| fw.station.on_window_expired());
    }

    #[avr_device::interrupt(atmega128a)]
    fn TWI() {
        with_firmware(|fw| {
            let Firmware { station, twi, .. } = fw;
            twi.service(|event| station.on_bus_event(event));
        });
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {}
