//! Static codec profiles for each encoder kind

use crate::domain::model::EncoderKind;

/// Codec and quality arguments passed to the transcoder for one encoder kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderProfile {
    pub kind: EncoderKind,
    pub args: &'static [&'static str],
}

const CPU: EncoderProfile = EncoderProfile {
    kind: EncoderKind::Cpu,
    args: &[
        "-c:v", "libx264", "-preset", "veryfast", "-crf", "23", "-pix_fmt", "yuv420p", "-c:a",
        "aac", "-b:a", "160k",
    ],
};

const GPU: EncoderProfile = EncoderProfile {
    kind: EncoderKind::Gpu,
    args: &[
        "-c:v", "h264_nvenc", "-preset", "p4", "-rc", "vbr", "-cq", "33", "-pix_fmt", "yuv420p",
        "-c:a", "aac", "-b:a", "160k",
    ],
};

const COPY: EncoderProfile = EncoderProfile {
    kind: EncoderKind::Copy,
    args: &["-c", "copy"],
};

/// Container arguments shared by every output
pub const CONTAINER_ARGS: [&str; 4] = ["-movflags", "faststart", "-f", "mp4"];

impl EncoderProfile {
    pub fn for_kind(kind: EncoderKind) -> &'static EncoderProfile {
        match kind {
            EncoderKind::Cpu => &CPU,
            EncoderKind::Gpu => &GPU,
            EncoderKind::Copy => &COPY,
        }
    }

    pub fn video_codec(&self) -> Option<&'static str> {
        self.args
            .iter()
            .position(|arg| *arg == "-c:v")
            .and_then(|index| self.args.get(index + 1).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_match_kind() {
        for kind in [EncoderKind::Cpu, EncoderKind::Gpu, EncoderKind::Copy] {
            assert_eq!(EncoderProfile::for_kind(kind).kind, kind);
        }
    }

    #[test]
    fn test_video_codecs() {
        assert_eq!(EncoderProfile::for_kind(EncoderKind::Cpu).video_codec(), Some("libx264"));
        assert_eq!(EncoderProfile::for_kind(EncoderKind::Gpu).video_codec(), Some("h264_nvenc"));
        assert_eq!(EncoderProfile::for_kind(EncoderKind::Copy).video_codec(), None);
    }
}
