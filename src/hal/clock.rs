use avr_device::atmega128a::CPU;

/// Run the core at the full crystal frequency.
///
/// XDIV may only be changed while the divider is disabled, so clear it
/// rather than writing a new ratio.
pub fn init() {
    unsafe {
        let p = CPU::ptr();
        (*p).xdiv.write(|w| w.bits(0));
    }
}
