use super::bco_diff;
use crate::input_manager::FrameWindow;
use crate::util::*;

pub(crate) const HEADER: &str =
    "    Frame BCO   Diff  Packet  FEE  Chan  SAMPA  SCh    FEE BCO  Samples  Wavelets  Max ADC";

/// One line per hit delivered for the window.
pub(crate) fn hit_view(
    out: &mut impl Write,
    window: &FrameWindow,
    hits: &[RawHit],
    styled: bool,
) -> io::Result<()> {
    for hit in hits {
        let frame_bco = format!("{:#012X}", hit.gtm_bco);
        let diff = bco_diff(hit.gtm_bco, window.reference_bco);
        let max_adc = hit
            .wavelets()
            .values()
            .flat_map(|adc| adc.iter().copied())
            .max()
            .unwrap_or(0);
        let fee_bco = format!("{:#07X}", hit.bco);
        if styled {
            writeln!(
                out,
                "{frame_bco:>13} {diff:>6} {packet:>7} {fee:>4} {channel:>5} {sampa:>6} {sch:>4} {fee_bco:>10} {samples:>8} {wavelets:>9} {max_adc:>8}",
                frame_bco = frame_bco.bright_blue(),
                diff = diff.yellow(),
                packet = hit.packet_id,
                fee = hit.fee.cyan(),
                channel = hit.channel.cyan(),
                sampa = hit.sampa_address,
                sch = hit.sampa_channel,
                fee_bco = fee_bco.dimmed(),
                samples = hit.samples(),
                wavelets = hit.wavelet_count(),
                max_adc = max_adc.green(),
            )?;
        } else {
            writeln!(
                out,
                "{frame_bco:>13} {diff:>6} {packet:>7} {fee:>4} {channel:>5} {sampa:>6} {sch:>4} {fee_bco:>10} {samples:>8} {wavelets:>9} {max_adc:>8}",
                packet = hit.packet_id,
                fee = hit.fee,
                channel = hit.channel,
                sampa = hit.sampa_address,
                sch = hit.sampa_channel,
                samples = hit.samples(),
                wavelets = hit.wavelet_count(),
            )?;
        }
    }
    Ok(())
}
