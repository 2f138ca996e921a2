//! Contains the [ViewGenerator] that prints the decoded data of each reference window, and the views it dispatches to.
pub mod frame_view;
pub mod gtm_view;
pub mod hit_view;

use crate::input_manager::FrameWindow;
use crate::util::*;

/// Writes the selected view of every processed window to `out`.
pub struct ViewGenerator<W: Write> {
    view: ViewCommands,
    styled: bool,
    out: W,
    header_written: bool,
    last_gtm_bco: Option<u64>,
}

impl<W: Write> ViewGenerator<W> {
    /// Create a generator for `view`, plain text if `disable_styled_view` is set.
    pub fn new(view: ViewCommands, disable_styled_view: bool, out: W) -> Self {
        Self {
            view,
            styled: !disable_styled_view,
            out,
            header_written: false,
            last_gtm_bco: None,
        }
    }

    /// Whether the view needs the GTM taggers of the window.
    pub fn needs_gtm_taggers(&self) -> bool {
        self.view == ViewCommands::Gtm
    }

    /// Write the view of one window, `hits` are the hits delivered for it and `gtm_taggers` the taggers within it.
    pub fn write_window(
        &mut self,
        window: &FrameWindow,
        hits: &[RawHit],
        gtm_taggers: &[(i32, u64, GtmPayload)],
    ) -> io::Result<()> {
        if !self.header_written {
            self.write_header()?;
            self.header_written = true;
        }
        match self.view {
            ViewCommands::Hits => hit_view::hit_view(&mut self.out, window, hits, self.styled),
            ViewCommands::Frames => frame_view::frame_view(&mut self.out, window, self.styled),
            ViewCommands::Gtm => {
                // Windows overlap, print every tagger once
                let new_taggers = gtm_taggers
                    .iter()
                    .filter(|(_, bco, _)| self.last_gtm_bco.map_or(true, |last| *bco > last))
                    .copied()
                    .collect_vec();
                if let Some((_, bco, _)) = new_taggers.last() {
                    self.last_gtm_bco = Some(*bco);
                }
                gtm_view::gtm_view(&mut self.out, &new_taggers, self.styled)
            }
        }
    }

    fn write_header(&mut self) -> io::Result<()> {
        let header = match self.view {
            ViewCommands::Hits => hit_view::HEADER,
            ViewCommands::Frames => frame_view::HEADER,
            ViewCommands::Gtm => gtm_view::HEADER,
        };
        if self.styled {
            writeln!(self.out, "{}", header.bold().underline())
        } else {
            writeln!(self.out, "{header}")
        }
    }

    /// Flush the output.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Signed distance of `bco` from `reference`.
pub(crate) fn bco_diff(bco: u64, reference: u64) -> i64 {
    if bco >= reference {
        i64::try_from(bco - reference).unwrap_or(i64::MAX)
    } else {
        i64::try_from(reference - bco).map_or(i64::MIN, |d| -d)
    }
}
