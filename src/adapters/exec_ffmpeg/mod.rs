//! External transcoder adapter
//!
//! Runs the `ffmpeg` command-line tool as a child process. The tool is
//! treated as opaque: the only things read back are its exit status, its
//! `fps=... time=... bitrate` status lines and the `Duration:` banner line.

pub mod encoder;
pub mod probe;
pub mod progress;
pub mod runner;

pub use encoder::FfmpegEncoder;
pub use probe::FfmpegProbe;
pub use progress::ProgressParser;
pub use runner::FfmpegRunner;
