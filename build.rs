use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let target = env::var("TARGET").unwrap();

    // Pass CPU frequency for timing calculations
    let freq = env::var("MCU_FREQ_HZ").unwrap_or_else(|_| "16000000".into());
    println!("cargo:rustc-env=MCU_FREQ_HZ={}", freq);
    println!("cargo:rerun-if-env-changed=MCU_FREQ_HZ");

    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-mmcu=atmega128");

        // Debug builds trace acquisition and bus activity on USART0
        if env::var("PROFILE").unwrap() == "debug" {
            println!("cargo:rustc-cfg=feature=\"debug\"");
        }

        println!("cargo:warning=Building for ATmega128 at {}Hz", freq);
        println!("cargo:warning=Output directory: {}", out_dir.display());
    }
}
