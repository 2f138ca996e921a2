use crate::util::*;

pub(crate) const HEADER: &str =
    "  Packet          BCO  Type     Lvl1   EnDat      Last BCO  Mode";

/// One line per GTM tagger.
pub(crate) fn gtm_view(
    out: &mut impl Write,
    gtm_taggers: &[(i32, u64, GtmPayload)],
    styled: bool,
) -> io::Result<()> {
    for (packet_id, bco, gtm) in gtm_taggers {
        let tagger_type = if gtm.is_lvl1() {
            "LVL1"
        } else if gtm.is_endat() {
            "ENDAT"
        } else {
            "?"
        };
        let bco = format!("{bco:#012X}");
        let last_bco = format!("{:#012X}", gtm.last_bco);
        let modebits = format!("{:#04X}", gtm.modebits);
        if styled {
            writeln!(
                out,
                "{packet_id:>8} {bco:>12}  {tagger_type:<5} {lvl1:>7} {endat:>7}  {last_bco:>12}  {modebits}",
                bco = bco.bright_blue(),
                tagger_type = if gtm.is_lvl1() {
                    tagger_type.green().to_string()
                } else {
                    tagger_type.yellow().to_string()
                },
                lvl1 = gtm.lvl1_count,
                endat = gtm.endat_count,
                last_bco = last_bco.dimmed(),
            )?;
        } else {
            writeln!(
                out,
                "{packet_id:>8} {bco:>12}  {tagger_type:<5} {lvl1:>7} {endat:>7}  {last_bco:>12}  {modebits}",
                lvl1 = gtm.lvl1_count,
                endat = gtm.endat_count,
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sphenix_protocol_reader::test_data::{endat_block, lvl1_block};

    #[test]
    fn test_gtm_view_plain() {
        let lvl1 = GtmPayload::from_words(&lvl1_block(0x1000, 3)).unwrap();
        let endat = GtmPayload::from_words(&endat_block(0x1040, 1)).unwrap();
        let mut out = Vec::new();
        gtm_view(&mut out, &[(4001, 0x1000, lvl1), (4001, 0x1040, endat)], false).unwrap();
        let output = String::from_utf8(out).unwrap();
        let lines: Vec<Vec<&str>> = output
            .lines()
            .map(|l| l.split_whitespace().collect())
            .collect();
        assert_eq!(lines[0][..5], ["4001", "0x0000001000", "LVL1", "3", "0"]);
        assert_eq!(lines[1][..5], ["4001", "0x0000001040", "ENDAT", "0", "1"]);
    }
}
