#[cfg(windows)]
mod windows;

#[cfg(windows)]
pub use windows::terminated;

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::terminated;
