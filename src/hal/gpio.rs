use avr_device::atmega128a::{EXINT, PORTC, PORTE};
use crate::acquisition::PortSnapshot;
use crate::config::port::SENSOR_MASK;
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::v2::OutputPin;

pub trait PinMode {}
pub struct Input;
pub struct Output;
impl PinMode for Input {}
impl PinMode for Output {}

/// Register access shared by every pin of one port
pub trait PortRegisters {
    fn modify_ddr(set: u8, clear: u8);
    fn modify_port(set: u8, clear: u8);
    fn read_pin() -> u8;
}

macro_rules! impl_port {
    ($PORT:ident, $pin:ident, $ddr:ident, $port:ident) => {
        impl PortRegisters for $PORT {
            #[inline]
            fn modify_ddr(set: u8, clear: u8) {
                unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits((r.bits() & !clear) | set));
                }
            }

            #[inline]
            fn modify_port(set: u8, clear: u8) {
                unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits((r.bits() & !clear) | set));
                }
            }

            #[inline]
            fn read_pin() -> u8 {
                unsafe { (*$PORT::ptr()).$pin.read().bits() }
            }
        }
    };
}

impl_port!(PORTC, pinc, ddrc, portc);
impl_port!(PORTE, pine, ddre, porte);

#[derive(Debug)]
pub struct Pin<PORT, const N: u8, MODE> {
    _port: PhantomData<PORT>,
    _mode: PhantomData<MODE>,
}

impl<PORT: PortRegisters, const N: u8> Pin<PORT, N, Input> {
    /// Claim a pin. Every pin comes out of reset as a floating input.
    ///
    /// # Safety
    /// Only one handle per physical pin may exist.
    pub unsafe fn steal() -> Self {
        Pin {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }
}

impl<PORT: PortRegisters, const N: u8, MODE: PinMode> Pin<PORT, N, MODE> {
    /// Output, driven low
    pub fn into_output(self) -> Pin<PORT, N, Output> {
        PORT::modify_port(0, 1 << N);
        PORT::modify_ddr(1 << N, 0);
        Pin {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }

    /// Input without pull-up; the sensor boards drive the lines
    pub fn into_floating_input(self) -> Pin<PORT, N, Input> {
        PORT::modify_ddr(0, 1 << N);
        PORT::modify_port(0, 1 << N);
        Pin {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }
}

impl<PORT: PortRegisters, const N: u8> OutputPin for Pin<PORT, N, Output> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Infallible> {
        PORT::modify_port(1 << N, 0);
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Infallible> {
        PORT::modify_port(0, 1 << N);
        Ok(())
    }
}

/// The three sensor inputs sharing PORTE
pub struct SensorLines {
    _rtc_tick: board::RtcTick,
    _rain_gauge: board::RainGauge,
    _anemometer: board::Anemometer,
}

impl SensorLines {
    pub fn new(
        rtc_tick: board::RtcTick,
        rain_gauge: board::RainGauge,
        anemometer: board::Anemometer,
    ) -> Self {
        Self {
            _rtc_tick: rtc_tick,
            _rain_gauge: rain_gauge,
            _anemometer: anemometer,
        }
    }

    /// All three lines from a single port read
    #[inline]
    pub fn snapshot(&self) -> PortSnapshot {
        PortSnapshot(PORTE::read_pin() & SENSOR_MASK)
    }
}

/// Trigger INT4..INT6 on any logical change of the sensor lines; the
/// handler works out the direction from the port snapshot. Stale flags are
/// dropped so nothing from before boot is reported.
pub fn listen_sensor_edges(_lines: &SensorLines) {
    unsafe {
        let p = EXINT::ptr();
        // ISCn1:ISCn0 = 01 for n = 4, 5, 6
        (*p).eicrb.modify(|r, w| w.bits((r.bits() & !0x3F) | 0x15));
        (*p).eifr.write(|w| w.bits(SENSOR_MASK));
        (*p).eimsk.modify(|r, w| w.bits(r.bits() | SENSOR_MASK));
    }
}

pub mod board {
    use super::*;
    use crate::config::port::{ANEMOMETER_BIT, HOST_READY_BIT, RAIN_GAUGE_BIT, RTC_TICK_BIT};

    pub type RtcTick = Pin<PORTE, { RTC_TICK_BIT }, Input>;
    pub type RainGauge = Pin<PORTE, { RAIN_GAUGE_BIT }, Input>;
    pub type Anemometer = Pin<PORTE, { ANEMOMETER_BIT }, Input>;
    pub type HostReady = Pin<PORTC, { HOST_READY_BIT }, Output>;

    /// Sensor inputs and the host-ready output, configured
    pub struct Pins {
        pub rtc_tick: RtcTick,
        pub rain_gauge: RainGauge,
        pub anemometer: Anemometer,
        pub host_ready: HostReady,
    }

    impl Pins {
        /// # Safety
        /// Call once, before anything else touches PORTC or PORTE.
        pub unsafe fn take() -> Self {
            Self {
                rtc_tick: RtcTick::steal().into_floating_input(),
                rain_gauge: RainGauge::steal().into_floating_input(),
                anemometer: Anemometer::steal().into_floating_input(),
                host_ready: Pin::<PORTC, { HOST_READY_BIT }, Input>::steal().into_output(),
            }
        }
    }
}
