// Driver diagnostics. On the board they go out through esp-println; host
// builds compile them away.

cfg_if::cfg_if! {
    if #[cfg(feature = "esp32s3")] {
        pub(crate) fn emit(args: core::fmt::Arguments<'_>) {
            esp_println::println!("[panel] {}", args);
        }
    } else {
        #[inline(always)]
        pub(crate) fn emit(_args: core::fmt::Arguments<'_>) {}
    }
}

macro_rules! diag {
    ($($arg:tt)*) => {
        $crate::logging::emit(format_args!($($arg)*))
    };
}

pub(crate) use diag;
