//! The weather station: all acquisition and bus state in one place
//!
//! Field ownership, by writer:
//! - port-edge handler: `demux`, rain count, wind count (through the window)
//! - ADC handler: chain state and the two analog registers
//! - window expiry: committed wind count, `data_ready`, host-ready line
//! - bus handler: the slave's buffers and the pending command slot
//! - foreground executor: response buffer, reset code, rain reset
//!
//! On the target the station lives behind an interrupt mutex. Handlers are
//! not nested, and the foreground loop masks interrupts while it runs a
//! command, so a reader never observes a half-written multi-byte field.

use crate::acquisition::{
    AcquisitionState, AcquisitionWindow, AdcChain, AdcDevice, EventDemux, PortEventSink,
    PortEvents, PortSnapshot, PulseCounter, Reading, SensorChannel, WindowTimer,
};
use crate::error::Result;
use crate::protocol::{execute, BusEvent, BusReply, BusSlave, BusStats, Command, CommandTarget};
use crate::registers::{ResetCode, SensorSnapshot, SharedRegisterSet, SNAPSHOT_LEN};
use embedded_hal::digital::v2::OutputPin;
use ufmt::derive::uDebug;

/// Interrupt-side activity accumulated for the foreground trace
#[derive(Debug, uDebug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    pub cycles_started: u8,
    pub rain_tips: u8,
    pub wind_pulses: u8,
    pub wind_discarded: u8,
    pub readings: u8,
    pub windows_closed: u8,
}

impl Activity {
    fn merge(&mut self, events: PortEvents) {
        self.cycles_started = self.cycles_started.saturating_add(events.cycle_started as u8);
        self.rain_tips = self.rain_tips.saturating_add(events.rain_tips);
        self.wind_pulses = self.wind_pulses.saturating_add(events.wind_pulses);
        self.wind_discarded = self.wind_discarded.saturating_add(events.wind_discarded);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Acquisition-side state: what the port, ADC and timer handlers touch
struct Sensors<A, T, P> {
    adc: A,
    chain: AdcChain,
    window: AcquisitionWindow<T>,
    host_ready: P,
    state: AcquisitionState,
    registers: SharedRegisterSet,
    reset_code: ResetCode,
}

impl<A, T, P> Sensors<A, T, P>
where
    A: AdcDevice,
    T: WindowTimer,
    P: OutputPin,
{
    fn begin_cycle(&mut self) {
        self.chain.start(&mut self.adc);
        self.window.begin();
        self.state.rearm();
        self.host_ready.set_low().ok();
    }
}

impl<A, T, P> PortEventSink for Sensors<A, T, P>
where
    A: AdcDevice,
    T: WindowTimer,
    P: OutputPin,
{
    fn rtc_tick(&mut self) {
        self.begin_cycle();
    }

    fn rain_tip(&mut self) {
        let total = self.state.count_rain();
        self.registers.commit_rain(total);
    }

    fn wind_pulse(&mut self) -> bool {
        self.window.pulse()
    }
}

impl<A, T, P> CommandTarget for Sensors<A, T, P>
where
    A: AdcDevice,
    T: WindowTimer,
    P: OutputPin,
{
    fn take_reset_code(&mut self) -> u8 {
        self.reset_code.take()
    }

    fn data_ready(&self) -> bool {
        self.state.data_ready
    }

    fn sensor_response(&self) -> [u8; SNAPSHOT_LEN] {
        self.registers.response(self.state.data_ready)
    }

    fn start_cycle(&mut self) {
        self.begin_cycle();
    }

    fn reset_rainfall(&mut self) {
        self.state.rain_pulses = 0;
        self.registers.commit_rain(0);
    }
}

pub struct WeatherStation<A, T, P> {
    demux: EventDemux,
    bus: BusSlave,
    activity: Activity,
    sensors: Sensors<A, T, P>,
}

impl<A, T, P> WeatherStation<A, T, P>
where
    A: AdcDevice,
    T: WindowTimer,
    P: OutputPin,
{
    /// `port` is the sensor pin state sampled before edge interrupts are
    /// enabled. The host-ready line starts deasserted.
    pub fn new(adc: A, timer: T, mut host_ready: P, port: PortSnapshot) -> Self {
        host_ready.set_low().ok();
        Self {
            demux: EventDemux::new(port),
            bus: BusSlave::new(),
            activity: Activity::default(),
            sensors: Sensors {
                adc,
                chain: AdcChain::new(),
                window: AcquisitionWindow::new(timer),
                host_ready,
                state: AcquisitionState::new(),
                registers: SharedRegisterSet::new(),
                reset_code: ResetCode::power_on(),
            },
        }
    }

    /// Shared-port edge handler
    pub fn on_port_change(&mut self, port: PortSnapshot) -> PortEvents {
        let events = self.demux.on_port_change(port, &mut self.sensors);
        self.activity.merge(events);
        events
    }

    /// ADC conversion-complete handler
    pub fn on_adc_complete(&mut self) -> Option<Reading> {
        let sensors = &mut self.sensors;
        let reading = sensors.chain.on_conversion_complete(&mut sensors.adc)?;
        match reading.channel {
            SensorChannel::Uv => sensors.registers.commit_uv(reading.raw),
            SensorChannel::WindDirection => sensors.registers.commit_wind_direction(reading.raw),
        }
        sensors.state.last_reading = Some(reading);
        self.activity.readings = self.activity.readings.saturating_add(1);
        Some(reading)
    }

    /// Window timer expiry handler: commit the wind count and tell the host.
    ///
    /// A compare match with no window open completes nothing; returns
    /// whether a cycle was completed.
    pub fn on_window_expired(&mut self) -> bool {
        let sensors = &mut self.sensors;
        if !sensors.window.is_open() {
            sensors.window.timer_mut().clear_expired();
            return false;
        }
        let pulses = sensors.window.end();
        sensors.registers.commit_wind(pulses);
        sensors.state.data_ready = true;
        sensors.host_ready.set_high().ok();
        self.activity.windows_closed = self.activity.windows_closed.saturating_add(1);
        true
    }

    /// Bus interrupt handler
    pub fn on_bus_event(&mut self, event: BusEvent) -> BusReply {
        self.bus.on_event(event)
    }

    /// Start an acquisition cycle outside the RTC schedule
    pub fn start_cycle(&mut self) {
        self.sensors.begin_cycle();
    }

    pub fn command_pending(&self) -> bool {
        self.bus.has_pending()
    }

    /// Foreground executor. `None` when no command is waiting.
    pub fn run_pending_command(&mut self) -> Option<Result<Command>> {
        let frame = self.bus.take_pending()?;
        Some(execute(&frame, &mut self.sensors, &mut self.bus))
    }

    /// Drain what the handlers did since the last call
    pub fn take_activity(&mut self) -> Activity {
        core::mem::take(&mut self.activity)
    }

    pub fn data_ready(&self) -> bool {
        self.sensors.state.data_ready
    }

    pub fn window_open(&self) -> bool {
        self.sensors.window.is_open()
    }

    pub fn rain_pulses(&self) -> u16 {
        self.sensors.state.rain_pulses
    }

    /// Wind pulses counted so far in the current window
    pub fn wind_pulses(&self) -> u16 {
        self.sensors.window.count()
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        self.sensors.registers.snapshot()
    }

    pub fn last_reading(&self) -> Option<Reading> {
        self.sensors.state.last_reading
    }

    pub fn bus_stats(&self) -> BusStats {
        self.bus.stats()
    }

    pub fn adc(&self) -> &A {
        &self.sensors.adc
    }

    pub fn timer(&self) -> &T {
        self.sensors.window.timer()
    }

    /// Give the peripherals back
    pub fn release(self) -> (A, AcquisitionWindow<T>, P) {
        (self.sensors.adc, self.sensors.window, self.sensors.host_ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::adc_chain::mock::MockAdc;
    use crate::acquisition::window::mock::MockTimer;
    use crate::config::port::{ANEMOMETER_MASK, RAIN_GAUGE_MASK, RTC_TICK_MASK};
    use crate::registers::layout;
    use core::convert::Infallible;

    #[derive(Debug, Default)]
    struct Line {
        high: bool,
    }

    impl OutputPin for Line {
        type Error = Infallible;

        fn set_low(&mut self) -> core::result::Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> core::result::Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    type Station = WeatherStation<MockAdc, MockTimer, Line>;

    const IDLE: u8 = RTC_TICK_MASK;

    fn station() -> Station {
        WeatherStation::new(
            MockAdc::with_results(0x0155, 0x02AA),
            MockTimer::default(),
            Line { high: true },
            PortSnapshot(IDLE),
        )
    }

    fn tick(station: &mut Station) {
        station.on_port_change(PortSnapshot(0));
        station.on_port_change(PortSnapshot(IDLE));
    }

    fn rain(station: &mut Station) {
        station.on_port_change(PortSnapshot(IDLE | RAIN_GAUGE_MASK));
        station.on_port_change(PortSnapshot(IDLE));
    }

    fn wind(station: &mut Station) -> PortEvents {
        let events = station.on_port_change(PortSnapshot(IDLE | ANEMOMETER_MASK));
        station.on_port_change(PortSnapshot(IDLE));
        events
    }

    fn command(station: &mut Station, byte: u8) -> Vec<u8> {
        station.on_bus_event(BusEvent::AddressMatched { read: false });
        station.on_bus_event(BusEvent::ByteReceived(byte));
        station.on_bus_event(BusEvent::Stop);
        station.run_pending_command().unwrap().unwrap();

        station.on_bus_event(BusEvent::AddressMatched { read: true });
        let mut out = Vec::new();
        while let BusReply::Transmit(b) = station.on_bus_event(BusEvent::ByteRequested) {
            out.push(b);
        }
        station.on_bus_event(BusEvent::AckFailure);
        out
    }

    #[test]
    fn boot_state_is_not_ready() {
        let mut station = station();
        assert!(!station.sensors.host_ready.high);

        assert!(!station.data_ready());
        assert_eq!(command(&mut station, 0x02), [0xAA; 8]);
        assert_eq!(command(&mut station, 0x03), [0]);
    }

    #[test]
    fn full_cycle() {
        let mut station = station();
        tick(&mut station);
        assert!(station.window_open());
        assert!(!station.sensors.host_ready.high);

        assert_eq!(station.on_adc_complete().unwrap().channel, SensorChannel::Uv);
        assert_eq!(
            station.on_adc_complete().unwrap().channel,
            SensorChannel::WindDirection
        );

        for _ in 0..3 {
            rain(&mut station);
        }
        for _ in 0..5 {
            wind(&mut station);
        }
        station.on_window_expired();

        assert!(station.data_ready());
        assert!(station.sensors.host_ready.high);
        assert!(!station.window_open());
        assert_eq!(command(&mut station, 0x03), [1]);

        let bytes = command(&mut station, 0x02);
        assert_eq!(bytes[layout::RAIN_LSB], 3);
        assert_eq!(bytes[layout::WIND_SPEED_LSB], 5);
        assert_eq!(bytes[layout::WIND_DIRECTION_MSB..=layout::WIND_DIRECTION_LSB], [0x02, 0xAA]);
        assert_eq!(bytes[layout::UV_MSB..=layout::UV_LSB], [0x01, 0x55]);

        let activity = station.take_activity();
        assert_eq!(activity.cycles_started, 1);
        assert_eq!(activity.rain_tips, 3);
        assert_eq!(activity.wind_pulses, 5);
        assert_eq!(activity.readings, 2);
        assert_eq!(activity.windows_closed, 1);
        assert!(station.take_activity().is_empty());
    }

    #[test]
    fn expiry_without_open_window_completes_nothing() {
        let mut station = station();
        assert!(!station.on_window_expired());
        assert!(!station.data_ready());
        assert!(!station.sensors.host_ready.high);
        assert_eq!(command(&mut station, 0x02), [0xAA; 8]);

        tick(&mut station);
        assert!(station.on_window_expired());
        assert!(!station.on_window_expired());
        assert_eq!(station.take_activity().windows_closed, 1);
    }

    #[test]
    fn wind_after_expiry_is_not_counted() {
        let mut station = station();
        tick(&mut station);
        wind(&mut station);
        station.on_window_expired();

        let events = wind(&mut station);
        assert_eq!(events.wind_discarded, 1);
        assert_eq!(station.snapshot().wind_pulses, 1);
        assert_eq!(station.wind_pulses(), 1);
    }

    #[test]
    fn rain_counts_outside_the_window_and_across_cycles() {
        let mut station = station();
        rain(&mut station);
        tick(&mut station);
        rain(&mut station);
        station.on_window_expired();
        tick(&mut station);
        station.on_window_expired();
        assert_eq!(station.snapshot().rain_pulses, 2);
    }

    #[test]
    fn new_tick_clears_ready_and_restarts_window() {
        let mut station = station();
        tick(&mut station);
        wind(&mut station);
        station.on_window_expired();

        tick(&mut station);
        assert!(!station.data_ready());
        assert!(!station.sensors.host_ready.high);
        assert_eq!(station.wind_pulses(), 0);
        assert_eq!(station.timer().reloads, 2);
        assert_eq!(command(&mut station, 0x02), [0xAA; 8]);
    }

    #[test]
    fn reset_rainfall_is_reflected_in_sensor_data() {
        let mut station = station();
        tick(&mut station);
        rain(&mut station);
        rain(&mut station);
        station.on_window_expired();

        assert!(command(&mut station, 0x04).is_empty());
        assert_eq!(station.rain_pulses(), 0);
        assert_eq!(command(&mut station, 0x02)[..2], [0, 0]);

        rain(&mut station);
        assert_eq!(command(&mut station, 0x02)[..2], [0, 1]);
    }

    #[test]
    fn read_sensors_command_mirrors_rtc_tick() {
        let mut station = station();
        assert!(command(&mut station, 0x01).is_empty());
        assert!(station.window_open());
        assert_eq!(station.timer().reloads, 1);
        assert!(station.adc().ops.len() >= 4);
        assert!(!station.data_ready());
    }

    #[test]
    fn reset_state_once_per_boot() {
        let mut station = station();
        assert_eq!(command(&mut station, 0x00), [1]);
        assert_eq!(command(&mut station, 0x00), [0]);
        assert_eq!(command(&mut station, 0x00), [0]);
    }

    #[test]
    fn command_waits_for_the_foreground() {
        let mut station = station();
        station.on_bus_event(BusEvent::AddressMatched { read: false });
        station.on_bus_event(BusEvent::ByteReceived(0x01));
        assert!(!station.command_pending());
        station.on_bus_event(BusEvent::Stop);
        assert!(station.command_pending());
        assert!(!station.window_open());

        assert_eq!(station.run_pending_command(), Some(Ok(Command::ReadSensors)));
        assert!(station.run_pending_command().is_none());
    }
}
