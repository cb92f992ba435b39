use std::env;

const DEFAULT_MCU_FREQ_HZ: &str = "16000000";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=MCU_FREQ_HZ");

    // Clock is baked into config::CPU_FREQ_HZ, host builds included
    let freq = env::var("MCU_FREQ_HZ").unwrap_or_else(|_| DEFAULT_MCU_FREQ_HZ.to_string());
    if freq.is_empty() || !freq.bytes().all(|b| b.is_ascii_digit()) {
        panic!("MCU_FREQ_HZ must be a frequency in Hz, got {freq:?}");
    }
    println!("cargo:rustc-env=MCU_FREQ_HZ={freq}");

    // Host builds only run the library tests
    let target = env::var("TARGET").unwrap_or_default();
    if !target.contains("avr") {
        return;
    }

    // Configure for ATmega328PB
    println!("cargo:rustc-link-arg=-mmcu=atmega328pb");
    println!("cargo:warning=Building for ATmega328PB at {freq} Hz");
}
