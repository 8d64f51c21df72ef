// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Logging macros.
//!
//! - `board` firmware: forwarded to `defmt` over RTT, so the USART stays dedicated to the
//!   configuration protocol.
//! - Host unit tests: printed to stdout/stderr with a level prefix.
//! - Anything else: arguments are type-checked, nothing is emitted.
//!
//! Values passed to these macros must implement both `Debug`/`Display` (host) and
//! `defmt::Format` (firmware).

/// Log an informational message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "board")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "board"), test))]
        println!("[INFO] {}", format!($($arg)*));

        #[cfg(all(not(feature = "board"), not(test)))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Log a warning.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "board")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "board"), test))]
        println!("[WARN] {}", format!($($arg)*));

        #[cfg(all(not(feature = "board"), not(test)))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Log an error.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "board")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "board"), test))]
        eprintln!("[ERROR] {}", format!($($arg)*));

        #[cfg(all(not(feature = "board"), not(test)))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Log a debug message.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "board")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "board"), test))]
        println!("[DEBUG] {}", format!($($arg)*));

        #[cfg(all(not(feature = "board"), not(test)))]
        let _ = ::core::format_args!($($arg)*);
    }};
}
