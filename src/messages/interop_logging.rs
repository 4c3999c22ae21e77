// LOADER LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_loader")]
macro_rules! loader_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_loader"))]
macro_rules! loader_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// Import shim logging
#[macro_export]
#[cfg(feature = "show_imports")]
macro_rules! import_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_imports"))]
macro_rules! import_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// TRAMPOLINE LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_trampolines")]
macro_rules! trampoline_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_trampolines"))]
macro_rules! trampoline_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// Allocator bridge logging
#[macro_export]
#[cfg(feature = "show_allocations")]
macro_rules! alloc_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_allocations"))]
macro_rules! alloc_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// Extra timer logging
#[macro_export]
#[cfg(feature = "detailed_timers")]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        saying::say!($msg, Green #$time.elapsed());
    };
}

#[macro_export]
#[cfg(not(feature = "detailed_timers"))]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        // Nothing
    };
}
