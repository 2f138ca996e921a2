use super::bco_diff;
use crate::input_manager::FrameWindow;
use crate::util::*;

pub(crate) const HEADER: &str =
    "  Reference BCO   Event seq     Frame BCO     Diff   Hits";

/// One line per time frame drained for the window, or a single line for a window without frames.
pub(crate) fn frame_view(
    out: &mut impl Write,
    window: &FrameWindow,
    styled: bool,
) -> io::Result<()> {
    let event_sequence = window
        .event_sequence
        .map_or_else(|| "-".to_owned(), |seq| seq.to_string());
    let reference = format!("{:#012X}", window.reference_bco);
    if window.frames.is_empty() {
        let line = format!("{reference:>15} {event_sequence:>11} {:>13} {:>8} {:>6}", "-", "-", 0);
        return if styled {
            writeln!(out, "{}", line.dimmed())
        } else {
            writeln!(out, "{line}")
        };
    }
    for (bco, hits) in &window.frames {
        let diff = bco_diff(*bco, window.reference_bco);
        let frame_bco = format!("{bco:#012X}");
        if styled {
            writeln!(
                out,
                "{reference:>15} {event_sequence:>11} {frame_bco:>13} {diff:>8} {hits:>6}",
                reference = reference.bright_blue(),
                frame_bco = frame_bco.cyan(),
                diff = diff.yellow(),
                hits = hits.green(),
            )?;
        } else {
            writeln!(
                out,
                "{reference:>15} {event_sequence:>11} {frame_bco:>13} {diff:>8} {hits:>6}"
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::tests::window;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frame_view_plain() {
        let mut out = Vec::new();
        frame_view(&mut out, &window(), false).unwrap();
        let output = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("0x0000000FF0"));
        assert!(lines[0].trim_end().ends_with("-16      1"));
        assert!(lines[1].contains("0x0000001000"));
    }

    #[test]
    fn test_frame_view_empty_window() {
        let mut out = Vec::new();
        let empty = FrameWindow {
            frames: Vec::new(),
            event_sequence: None,
            ..window()
        };
        frame_view(&mut out, &empty, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
