//! ATmega328PB firmware: serial-commanded fan PWM and timer-paced LSM6DSO
//! accelerometer reporting over I2C.
//!
//! The drivers only touch hardware through [`hal::Registers`], so everything
//! except the two `src/bin` entry points runs on a host under `cargo test`.
#![cfg_attr(not(test), no_std)]

pub mod application;
pub mod config;
pub mod drivers;
pub mod hal;
pub mod os;
pub mod sim;
