//! Incremental parser turning the words of one [FeeStream] into [RawHit]s.
//!
//! A FEE packet is a header of 5 or 7 words (see [HeaderFormat]), zero suppressed waveform fragments
//! and a trailing CRC word. Each fragment is a `(sample count, start sample)` pair followed by its ADC words.
//!
//! Corrupt data never stops the parser: framing errors drop one word, CRC errors drop the packet,
//! and every loss is counted. A packet that is not fully buffered yet is left for the next call.
use super::demux::FeeStream;
use super::metrics::{DecoderCounter, MetricsRecorder, MetricsSink};
use super::raw_hit::RawHit;
use super::words::crc::crc16;
use super::words::fee_header::{FeeHeader, HeaderFormat, FEE_PACKET_MAGIC_KEY};

/// Parses FEE packets of a fixed [HeaderFormat].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeParser {
    format: HeaderFormat,
}

impl FeeParser {
    /// Create a parser for packets with the given header format.
    pub fn new(format: HeaderFormat) -> Self {
        Self { format }
    }

    /// Header format of the parsed packets.
    pub fn format(&self) -> HeaderFormat {
        self.format
    }

    /// Parse all complete packets buffered in `stream` of board `fee`, appending the hits to `hits`.
    ///
    /// Consumed words are removed from the stream, a trailing incomplete packet stays buffered.
    pub fn parse_stream<M: MetricsSink>(
        &self,
        fee: u16,
        stream: &mut FeeStream,
        hits: &mut Vec<RawHit>,
        metrics: &mut MetricsRecorder<M>,
    ) {
        let header_len = self.format.length();
        while stream.len() > header_len {
            if stream.get(self.format.magic_offset()) != Some(FEE_PACKET_MAGIC_KEY) {
                stream.skip_word();
                metrics.count_fee(DecoderCounter::WordSkipped, fee);
                continue;
            }

            // The loop condition keeps more than a header's worth of words buffered
            let mut head = [0u16; 4];
            head.iter_mut()
                .zip(stream.range(0..4))
                .for_each(|(dst, src)| *dst = src);
            let header = FeeHeader::from_head(head);
            metrics.count_fee(DecoderCounter::ChannelPacket, fee);

            let pkt_length = usize::from(header.pkt_length);
            if pkt_length < header_len {
                log::trace!(
                    "Packet {pid} FEE {fee}: length {pkt_length} shorter than the header",
                    pid = metrics.packet_id()
                );
                stream.skip_word();
                metrics.count_fee(DecoderCounter::WordSkipped, fee);
                metrics.count_fee(DecoderCounter::HitFormatError, fee);
                continue;
            }
            if pkt_length > stream.len() {
                // Rest of the packet arrives with a later raw packet
                break;
            }

            let crc_pos = pkt_length - 1;
            let computed = crc16(stream.range(0..crc_pos));
            let stored = stream.get(crc_pos);
            if stored != Some(computed) {
                log::debug!(
                    "Packet {pid} FEE {fee}: CRC mismatch, stored {stored:#06X?} computed {computed:#06X}, {header}",
                    pid = metrics.packet_id()
                );
                stream.consume(pkt_length);
                metrics.count_fee(DecoderCounter::HitCrcError, fee);
                continue;
            }

            let mut hit = RawHit::new(metrics.packet_id(), fee);
            hit.bco = u64::from(header.bx_timestamp);
            hit.channel = header.channel;
            hit.sampa_address = u16::from(header.sampa_address);
            hit.sampa_channel = u16::from(header.sampa_channel);
            self.decode_wavelets(fee, stream, header_len, crc_pos, &mut hit, metrics);

            stream.consume(pkt_length);
            metrics.add(DecoderCounter::WordValid, Some(fee), pkt_length as u64);
            metrics.count_fee(DecoderCounter::RawHit, fee);
            hits.push(hit);
        }
    }

    // Reads the fragments in words [start, end) of the packet at the head of the stream.
    fn decode_wavelets<M: MetricsSink>(
        &self,
        fee: u16,
        stream: &FeeStream,
        start: usize,
        end: usize,
        hit: &mut RawHit,
        metrics: &mut MetricsRecorder<M>,
    ) {
        let mut pos = start;
        while pos < end {
            if pos + 2 > end {
                metrics.count_fee(DecoderCounter::HitFormatError, fee);
                return;
            }
            let (Some(nsamp), Some(start_sample)) = (stream.get(pos), stream.get(pos + 1)) else {
                return;
            };
            pos += 2;

            let nsamp = usize::from(nsamp);
            let available = end - pos;
            let take = if nsamp <= available {
                nsamp
            } else if nsamp == available + 1 {
                // Firmware drops the very last ADC word of a packet
                metrics.count_fee(DecoderCounter::MissingLastAdc, fee);
                available
            } else {
                log::trace!(
                    "Packet {pid} FEE {fee}: fragment at sample {start_sample} declares {nsamp} samples, {available} available",
                    pid = metrics.packet_id()
                );
                metrics.count_fee(DecoderCounter::HitFormatError, fee);
                available
            };

            let adc: Vec<u16> = stream.range(pos..pos + take).collect();
            if !adc.is_empty() {
                metrics.count_fee(DecoderCounter::Waveform, fee);
            }
            hit.add_wavelet(start_sample, adc);
            pos += take;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CounterSink;
    use crate::raw_hit::ADC_SENTINEL;
    use crate::test_data::FeePacket;
    use pretty_assertions::assert_eq;

    const FEE: u16 = 2;

    fn parse(format: HeaderFormat, stream: &mut FeeStream) -> (Vec<RawHit>, CounterSink) {
        let mut hits = Vec::new();
        let mut metrics = MetricsRecorder::new(4001, CounterSink::default());
        FeeParser::new(format).parse_stream(FEE, stream, &mut hits, &mut metrics);
        (hits, metrics.into_sink())
    }

    fn packet() -> FeePacket {
        FeePacket {
            sampa_address: 7,
            sampa_channel: 21,
            bx_timestamp: 0x5A3C,
            wavelets: vec![(0, vec![10, 11, 12, 13])],
            ..Default::default()
        }
    }

    #[test]
    fn test_header_and_waveform_extracted() {
        for format in [HeaderFormat::V1, HeaderFormat::V2] {
            let mut packet = packet();
            packet.format = format;
            packet.wavelets = vec![(3, vec![100, 101]), (40, vec![7, 8, 9])];
            let mut stream = FeeStream::from(packet.encode());

            let (hits, sink) = parse(format, &mut stream);

            assert_eq!(hits.len(), 1, "{format}");
            let hit = &hits[0];
            assert_eq!(hit.fee, FEE);
            assert_eq!(hit.packet_id, 4001);
            assert_eq!(hit.sampa_address, 7);
            assert_eq!(hit.sampa_channel, 21);
            assert_eq!(hit.channel, (7 << 5) | 21);
            assert_eq!(hit.bco, 0x5A3C);
            assert_eq!(hit.gtm_bco, 0);
            assert_eq!(hit.wavelets().get(&3), Some(&vec![100, 101]));
            assert_eq!(hit.wavelets().get(&40), Some(&vec![7, 8, 9]));
            assert!(stream.is_empty());
            assert_eq!(sink.total(DecoderCounter::Waveform), 2);
            assert_eq!(
                sink.fee_count(DecoderCounter::WordValid, FEE),
                packet.encode().len() as u64
            );
            assert_eq!(sink.data_errors(), 0);
        }
    }

    #[test]
    fn test_flipped_crc_discards_packet() {
        let mut words = packet().encode();
        let crc_idx = words.len() - 1;
        words[crc_idx] ^= 0x0100;
        let mut stream = FeeStream::from(words);

        let (hits, sink) = parse(HeaderFormat::V1, &mut stream);

        assert!(hits.is_empty());
        assert_eq!(sink.total(DecoderCounter::HitCrcError), 1);
        assert_eq!(sink.total(DecoderCounter::RawHit), 0);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_incomplete_packet_waits() {
        let words = packet().encode();
        let mut stream = FeeStream::from(words[..9].to_vec());

        let (hits, sink) = parse(HeaderFormat::V1, &mut stream);
        assert!(hits.is_empty());
        assert_eq!(stream.len(), 9);
        assert_eq!(sink.total(DecoderCounter::WordSkipped), 0);

        stream.extend_from_slice(&words[9..]);
        let (hits, _) = parse(HeaderFormat::V1, &mut stream);
        assert_eq!(hits.len(), 1);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_length_shorter_than_header() {
        let mut words = packet().encode();
        words[0] = 3;
        let mut stream = FeeStream::from(words);

        let (hits, sink) = parse(HeaderFormat::V1, &mut stream);

        assert!(hits.is_empty());
        assert_eq!(sink.total(DecoderCounter::HitFormatError), 1);
        assert!(sink.total(DecoderCounter::WordSkipped) >= 1);
    }

    #[test]
    fn test_missing_last_adc_tolerated() {
        let mut stream = FeeStream::from(packet().encode_missing_last_adc());

        let (hits, sink) = parse(HeaderFormat::V1, &mut stream);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].wavelets().get(&0), Some(&vec![10, 11, 12]));
        assert_eq!(sink.total(DecoderCounter::MissingLastAdc), 1);
        assert_eq!(sink.total(DecoderCounter::HitFormatError), 0);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_fragment_overrun_truncated() {
        let mut packet = packet();
        packet.declared_samples = Some(9);
        let mut stream = FeeStream::from(packet.encode());

        let (hits, sink) = parse(HeaderFormat::V1, &mut stream);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].wavelets().get(&0), Some(&vec![10, 11, 12, 13]));
        assert_eq!(sink.total(DecoderCounter::HitFormatError), 1);
    }

    #[test]
    fn test_waveform_lookup_with_sentinel() {
        let mut packet = packet();
        packet.wavelets = vec![(2, vec![50, 51, 52]), (10, vec![60]), (20, vec![70, 71])];
        let mut stream = FeeStream::from(packet.encode());

        let (hits, _) = parse(HeaderFormat::V1, &mut stream);
        let hit = &hits[0];

        for (start, adc) in &packet.wavelets {
            for (i, value) in adc.iter().enumerate() {
                assert_eq!(hit.adc(start + i as u16), *value);
            }
        }
        for uncovered in [0, 1, 5, 9, 11, 19, 22, 500] {
            assert_eq!(hit.adc(uncovered), ADC_SENTINEL, "sample {uncovered}");
        }
        assert_eq!(hit.samples(), 22);
    }

    /// Packet A valid, packet B with a bad framing marker, packet C with a wrong CRC.
    #[test]
    fn test_three_packet_scenario() {
        let a = packet();
        let encoded_a = a.encode();
        assert_eq!(encoded_a.len(), 12);

        let mut b = packet().encode();
        b[4] = 0x00FD;
        assert_ne!(b[11], FEE_PACKET_MAGIC_KEY);
        let mut c = packet().encode();
        c[11] ^= 0x0001;

        let mut words = encoded_a;
        words.extend(&b);
        words.extend(&c);
        let mut stream = FeeStream::from(words);

        let (hits, sink) = parse(HeaderFormat::V1, &mut stream);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].wavelet_count(), 1);
        assert_eq!(hits[0].wavelets().get(&0), Some(&vec![10, 11, 12, 13]));
        assert_eq!(sink.fee_count(DecoderCounter::WordSkipped, FEE), 12);
        assert_eq!(sink.fee_count(DecoderCounter::HitCrcError, FEE), 1);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_resync_after_garbage() {
        let mut words = vec![0x1111, 0x2222, 0x3333];
        words.extend(packet().encode());
        let mut stream = FeeStream::from(words);

        let (hits, sink) = parse(HeaderFormat::V1, &mut stream);

        assert_eq!(hits.len(), 1);
        assert_eq!(sink.total(DecoderCounter::WordSkipped), 3);
    }
}
