//! Splits the payload of a raw DAM packet into per board [FeeStream]s and GTM taggers.
//!
//! The payload is a sequence of 16 word blocks. The top byte of the first word of a block is the tag:
//! `0xBA` carries 15 data words of one FEE board (board index in the low byte), `0xBB` is a GTM tagger
//! occupying the whole block. Anything else is skipped block by block.
use super::metrics::{DecoderCounter, MetricsRecorder, MetricsSink};
use super::words::gtm::GtmPayload;
use super::words::{
    DAM_DMA_WORD_LENGTH, FEE_MAGIC_KEY, GTM_MAGIC_KEY, MAX_FEECOUNT, STREAM_TAG_MASK,
};
use std::collections::VecDeque;
use std::ops::Range;

/// Word buffer of one FEE board.
///
/// Filled at the tail by the demultiplexer and consumed at the head by the [parser](crate::fee_parser).
/// Words persist across raw packets as a FEE packet can span several of them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeeStream(VecDeque<u16>);

impl FeeStream {
    /// Number of buffered words.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No words buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Word at `index` from the head.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u16> {
        self.0.get(index).copied()
    }

    /// Iterate over the words in `range`, clamped to the buffered words.
    pub fn range(&self, range: Range<usize>) -> impl Iterator<Item = u16> + '_ {
        let end = range.end.min(self.0.len());
        let start = range.start.min(end);
        self.0.range(start..end).copied()
    }

    /// Append words at the tail.
    pub fn extend_from_slice(&mut self, words: &[u16]) {
        self.0.extend(words.iter().copied());
    }

    /// Drop one word from the head.
    #[inline]
    pub fn skip_word(&mut self) {
        let _ = self.0.pop_front();
    }

    /// Drop `count` words from the head, or all of them if fewer are buffered.
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.0.len());
        let _ = self.0.drain(..count);
    }

    /// Drop all buffered words.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<Vec<u16>> for FeeStream {
    fn from(words: Vec<u16>) -> Self {
        Self(words.into())
    }
}

/// The streams of all FEE boards multiplexed into one packet id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeStreams([FeeStream; MAX_FEECOUNT]);

impl Default for FeeStreams {
    fn default() -> Self {
        Self(std::array::from_fn(|_| FeeStream::default()))
    }
}

impl FeeStreams {
    /// Stream of board `fee`.
    pub fn get(&self, fee: usize) -> Option<&FeeStream> {
        self.0.get(fee)
    }

    /// Mutable stream of board `fee`.
    pub fn get_mut(&mut self, fee: usize) -> Option<&mut FeeStream> {
        self.0.get_mut(fee)
    }

    /// Iterate mutably over the streams with their board index.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u16, &mut FeeStream)> {
        (0u16..).zip(self.0.iter_mut())
    }

    /// Total number of words buffered over all boards.
    pub fn buffered_words(&self) -> usize {
        self.0.iter().map(FeeStream::len).sum()
    }

    /// Drop all buffered words of all boards.
    pub fn clear(&mut self) {
        self.0.iter_mut().for_each(FeeStream::clear);
    }
}

/// Demultiplex the `payload` of one raw packet.
///
/// FEE data is appended to `streams`, decoded GTM taggers are appended to `gtm_out`.
/// Everything wrong with the payload is counted through `metrics`, decoding continues with the next block
/// except for a truncated block at the end, which is discarded.
pub fn demultiplex<M: MetricsSink>(
    payload: &[u16],
    streams: &mut FeeStreams,
    gtm_out: &mut Vec<GtmPayload>,
    metrics: &mut MetricsRecorder<M>,
) {
    for (block_idx, block) in payload.chunks(DAM_DMA_WORD_LENGTH).enumerate() {
        if block.len() < DAM_DMA_WORD_LENGTH {
            log::debug!(
                "Packet {pid}: block {block_idx} truncated to {len} words, discarded",
                pid = metrics.packet_id(),
                len = block.len()
            );
            metrics.count(DecoderCounter::TruncatedBlock);
            break;
        }
        let tag_word = block[0];
        match tag_word & STREAM_TAG_MASK {
            FEE_MAGIC_KEY => {
                let fee = tag_word & !STREAM_TAG_MASK;
                match streams.get_mut(usize::from(fee)) {
                    Some(stream) => stream.extend_from_slice(&block[1..]),
                    None => {
                        log::error!(
                            "Packet {pid}: invalid FEE id {fee} in block {block_idx}, expected < {MAX_FEECOUNT}",
                            pid = metrics.packet_id()
                        );
                        metrics.count(DecoderCounter::InvalidFeeId);
                    }
                }
            }
            GTM_MAGIC_KEY => match GtmPayload::from_words(block) {
                Ok(gtm) => {
                    log::trace!("Packet {pid}: {gtm}", pid = metrics.packet_id());
                    if gtm.is_lvl1() {
                        metrics.count(DecoderCounter::Lvl1Tagger);
                    } else {
                        metrics.count(DecoderCounter::EnDatTagger);
                    }
                    gtm_out.push(gtm);
                }
                Err(e) => {
                    log::debug!("Packet {pid}: {e}", pid = metrics.packet_id());
                    metrics.count(DecoderCounter::InvalidGtmPayload);
                }
            },
            _ => {
                log::trace!(
                    "Packet {pid}: unknown stream tag {tag_word:#06X} in block {block_idx}",
                    pid = metrics.packet_id()
                );
                metrics.count(DecoderCounter::UnknownStreamTag);
            }
        }
    }
}
