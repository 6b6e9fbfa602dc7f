//! ATmega128 peripherals used by the sensor front-end

pub mod adc;
pub mod clock;
pub mod gpio;
pub mod power;
pub mod timer;
pub mod twi;
pub mod uart;

pub use adc::Adc;
pub use gpio::{board, listen_sensor_edges, Input, Output, Pin, SensorLines};
pub use power::Power;
pub use timer::WindowTimer1;
pub use twi::TwiSlave;
pub use uart::Uart;
