//! Filter graph synthesis for cuts and joins

use crate::domain::errors::DomainError;
use crate::domain::model::{Segment, Timeline};
use crate::domain::rules::tempo_stages;
use crate::utils::time::format_seconds;

/// Label of the video stream produced by every filter graph
pub const FINAL_VIDEO: &str = "[final]";
/// Label of the audio stream produced by every filter graph
pub const FINAL_AUDIO: &str = "[finalaudio]";

/// Display aspect ratio forced by the widescreen option
const WIDESCREEN_DAR: &str = "16/9";

/// Build the filter graph for every segment of every timeline, in
/// timeline-then-segment order, joined by a single N-way concat.
pub fn cut_filter_graph(timelines: &[Timeline], force_widescreen: bool) -> Result<String, DomainError> {
    let mut chains = Vec::new();
    let mut pairs = String::new();
    let mut index = 0;

    for segment in timelines.iter().flat_map(Timeline::segments) {
        index += 1;
        chains.extend(segment_chains(index, segment)?);
        pairs.push_str(&format!("[v{index}][a{index}]"));
    }

    if index == 0 {
        return Err(DomainError::validation("Nothing to encode: no segments given"));
    }

    chains.push(concat_chain(pairs, index, force_widescreen));
    Ok(chains.join(";"))
}

/// Build the filter graph joining `inputs` whole files 1:1
pub fn concat_filter_graph(inputs: usize, force_widescreen: bool) -> String {
    let pairs: String = (0..inputs).map(|i| format!("[{i}:v][{i}:a]")).collect();
    concat_chain(pairs, inputs, force_widescreen)
}

/// Trim, zoom and speed chains for one segment. Speed changes go through
/// intermediate `tmp` labels before landing on `[v{i}]`/`[a{i}]`.
fn segment_chains(index: usize, segment: &Segment) -> Result<Vec<String>, DomainError> {
    let start = format_seconds(segment.start());
    let duration = format_seconds(segment.duration());
    let speed_change = segment.has_speed_change();
    let suffix = if speed_change { "tmp" } else { "" };

    let zoom = if segment.has_zoom() {
        let z = segment.zoom();
        format!(",scale=iw*{z}:ih*{z},crop=iw/{z}:ih/{z}")
    } else {
        String::new()
    };

    let mut chains = vec![
        format!("[0:v]trim=start={start}:duration={duration},setpts=PTS-STARTPTS{zoom}[v{index}{suffix}]"),
        format!("[0:a]atrim=start={start}:duration={duration},asetpts=PTS-STARTPTS[a{index}{suffix}]"),
    ];

    if speed_change {
        let speed = format_seconds(segment.speed());
        chains.push(format!("[v{index}tmp]setpts=PTS/{speed}[v{index}]"));

        let stages = tempo_stages(segment.speed())?;
        let last = stages.len() - 1;
        for (stage, tempo) in stages.iter().enumerate() {
            let input = if stage == 0 {
                format!("[a{index}tmp]")
            } else {
                format!("[a{index}tmp{}]", stage + 1)
            };
            let output = if stage == last {
                format!("[a{index}]")
            } else {
                format!("[a{index}tmp{}]", stage + 2)
            };
            chains.push(format!("{input}atempo={}{output}", format_seconds(*tempo)));
        }
    }

    Ok(chains)
}

fn concat_chain(pairs: String, count: usize, force_widescreen: bool) -> String {
    if force_widescreen {
        format!(
            "{pairs}concat=n={count}:v=1:a=1[joined]{FINAL_AUDIO};[joined]setdar={WIDESCREEN_DAR}{FINAL_VIDEO}"
        )
    } else {
        format!("{pairs}concat=n={count}:v=1:a=1{FINAL_VIDEO}{FINAL_AUDIO}")
    }
}
