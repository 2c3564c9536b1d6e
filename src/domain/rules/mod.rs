// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Range accepted by a single audio tempo stage of the transcoder
pub const TEMPO_STAGE_MIN: f64 = 0.5;
pub const TEMPO_STAGE_MAX: f64 = 2.0;

/// Business rules for encoder selection
pub struct EncoderRules;

impl EncoderRules {
    /// Check that `kind` can be used for a cut of the given timelines.
    ///
    /// A lossless copy is only possible for exactly one timeline holding
    /// exactly one segment, played at normal speed without zoom.
    pub fn validate_cut(kind: EncoderKind, timelines: &[Timeline]) -> Result<(), DomainError> {
        if kind != EncoderKind::Copy {
            return Ok(());
        }
        if timelines.len() != 1 {
            return Err(DomainError::validation(format!(
                "Copy encoding supports a single timeline, got {}",
                timelines.len()
            )));
        }
        let timeline = &timelines[0];
        if timeline.len() != 1 {
            return Err(DomainError::validation(format!(
                "Copy encoding supports a single segment, got {}",
                timeline.len()
            )));
        }
        let segment = &timeline.segments()[0];
        if segment.has_zoom() {
            return Err(DomainError::validation(
                "Copy encoding cannot apply zoom; choose the CPU or GPU encoder",
            ));
        }
        if segment.has_speed_change() {
            return Err(DomainError::validation(
                "Copy encoding cannot change speed; choose the CPU or GPU encoder",
            ));
        }
        Ok(())
    }

    /// Check that `kind` can be used to join whole files
    pub fn validate_join(kind: EncoderKind) -> Result<(), DomainError> {
        if kind == EncoderKind::Copy {
            return Err(DomainError::validation(
                "Copy encoding cannot join separate files; choose the CPU or GPU encoder",
            ));
        }
        Ok(())
    }
}

/// Split a playback speed into chained audio tempo stages.
///
/// Speeds inside `[0.5, 2.0]`, boundaries included, use one stage. Anything
/// outside uses two stages whose product is the requested speed; speeds that
/// would need more than two stages are rejected.
pub fn tempo_stages(speed: f64) -> Result<Vec<f64>, DomainError> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(DomainError::validation(format!(
            "Segment speed must be positive, got {}",
            speed
        )));
    }
    if (TEMPO_STAGE_MIN..=TEMPO_STAGE_MAX).contains(&speed) {
        return Ok(vec![speed]);
    }

    let first = speed.clamp(TEMPO_STAGE_MIN, TEMPO_STAGE_MAX);
    let second = speed / first;
    if !(TEMPO_STAGE_MIN..=TEMPO_STAGE_MAX).contains(&second) {
        return Err(DomainError::validation(format!(
            "Speed {} is out of the supported range {} - {}",
            speed,
            TEMPO_STAGE_MIN * TEMPO_STAGE_MIN,
            TEMPO_STAGE_MAX * TEMPO_STAGE_MAX
        )));
    }
    Ok(vec![first, second])
}

/// Legal state transitions of a clip operation
pub struct ClipStateRules;

impl ClipStateRules {
    pub fn can_transition(from: ClipState, to: ClipState) -> bool {
        use ClipState::*;
        matches!(
            (from, to),
            (Idle, Encoding)
                | (Idle, Error)
                | (Idle, Cancelled)
                | (Encoding, Uploading)
                | (Encoding, MovingToFile)
                | (Encoding, Error)
                | (Encoding, Cancelled)
                | (Uploading, Done)
                | (Uploading, Error)
                | (Uploading, Cancelled)
                | (MovingToFile, Done)
                | (MovingToFile, Error)
        )
    }
}
