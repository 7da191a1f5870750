#![cfg_attr(not(test), no_std)]
//! Chip families for the [spi_nor] driver.
//!
//! Each family is a zero sized type implementing [spi_nor::SpiNor] and
//! [spi_nor::cmd_blocking::SpiNorBlocking]. Pick the one matching the part when creating
//! the [spi_nor::SpiNorDevice].

pub mod micron;
pub mod winbond;
