//! Contains the [RawHit] record produced for every valid FEE packet, and the older dense [RawHitV1] layout.
//!
//! A hit holds zero suppressed waveform fragments ("wavelets") keyed by their first sample.
//! Records of both layouts can be carried in a [VersionedRawHit] and converted explicitly.
use std::collections::BTreeMap;
use std::fmt;

/// Returned by [RawHit::adc] for samples not covered by any fragment.
pub const ADC_SENTINEL: u16 = u16::MAX;

/// Waveform fragments of a hit keyed by their start sample.
pub type Wavelets = BTreeMap<u16, Vec<u16>>;

/// A decoded TPC hit: one FEE channel packet with its waveform fragments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawHit {
    /// Local BX timestamp of the FEE, widened.
    pub bco: u64,
    /// Matched global BCO, 0 until matched.
    pub gtm_bco: u64,
    /// Packet id the hit was read from.
    pub packet_id: i32,
    /// FEE board index within the packet.
    pub fee: u16,
    /// Channel on the board.
    pub channel: u16,
    /// SAMPA chip address.
    pub sampa_address: u16,
    /// Channel on the SAMPA chip.
    pub sampa_channel: u16,
    wavelets: Wavelets,
}

impl RawHit {
    /// Create a hit without any waveform.
    pub fn new(packet_id: i32, fee: u16) -> Self {
        Self {
            packet_id,
            fee,
            ..Default::default()
        }
    }

    /// Add a waveform fragment starting at `start_sample`.
    ///
    /// Empty fragments are ignored.
    pub fn add_wavelet(&mut self, start_sample: u16, adc: Vec<u16>) {
        if adc.is_empty() {
            return;
        }
        let _ = self.wavelets.insert(start_sample, adc);
    }

    /// The waveform fragments of the hit.
    pub fn wavelets(&self) -> &Wavelets {
        &self.wavelets
    }

    /// Number of waveform fragments.
    pub fn wavelet_count(&self) -> usize {
        self.wavelets.len()
    }

    /// Virtual length of the waveform: the last fragment's start sample plus its length.
    pub fn samples(&self) -> u16 {
        self.wavelets
            .last_key_value()
            .map_or(0, |(start, adc)| start.saturating_add(adc.len() as u16))
    }

    /// ADC value at `sample`, or [ADC_SENTINEL] if no fragment covers it.
    pub fn adc(&self, sample: u16) -> u16 {
        self.wavelets
            .range(..=sample)
            .next_back()
            .and_then(|(start, adc)| adc.get(usize::from(sample - start)).copied())
            .unwrap_or(ADC_SENTINEL)
    }
}

impl fmt::Display for RawHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "packet {pid} fee {fee:>2} ch {ch:>3} sampa {addr:>2}/{chan:>2} bco {bco:#07X} gtm_bco {gtm:#012X} samples {samples:>4} wavelets {n}",
            pid = self.packet_id,
            fee = self.fee,
            ch = self.channel,
            addr = self.sampa_address,
            chan = self.sampa_channel,
            bco = self.bco,
            gtm = self.gtm_bco,
            samples = self.samples(),
            n = self.wavelets.len()
        )
    }
}

/// Dense hit layout of the first raw hit version: one waveform starting at sample 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawHitV1 {
    /// Local timestamp.
    pub bco: u64,
    /// Matched global BCO.
    pub gtm_bco: u64,
    /// Packet id.
    pub packet_id: i32,
    /// FEE board.
    pub fee: u16,
    /// Board channel.
    pub channel: u16,
    /// SAMPA address.
    pub sampa_address: u16,
    /// SAMPA channel.
    pub sampa_channel: u16,
    /// Dense ADC samples.
    pub adc: Vec<u16>,
}

impl From<RawHitV1> for RawHit {
    fn from(v1: RawHitV1) -> Self {
        let mut hit = RawHit {
            bco: v1.bco,
            gtm_bco: v1.gtm_bco,
            packet_id: v1.packet_id,
            fee: v1.fee,
            channel: v1.channel,
            sampa_address: v1.sampa_address,
            sampa_channel: v1.sampa_channel,
            wavelets: Wavelets::new(),
        };
        hit.add_wavelet(0, v1.adc);
        hit
    }
}

impl From<&RawHit> for RawHitV1 {
    /// Densify the fragments, samples between fragments become 0.
    fn from(hit: &RawHit) -> Self {
        let dense_len = hit
            .wavelets()
            .iter()
            .map(|(start, fragment)| usize::from(*start) + fragment.len())
            .max()
            .unwrap_or(0);
        let mut adc = vec![0; dense_len];
        for (start, fragment) in hit.wavelets() {
            let start = usize::from(*start);
            adc[start..start + fragment.len()].copy_from_slice(fragment);
        }
        RawHitV1 {
            bco: hit.bco,
            gtm_bco: hit.gtm_bco,
            packet_id: hit.packet_id,
            fee: hit.fee,
            channel: hit.channel,
            sampa_address: hit.sampa_address,
            sampa_channel: hit.sampa_channel,
            adc,
        }
    }
}

/// A raw hit of any known layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedRawHit {
    /// Dense single waveform layout.
    V1(RawHitV1),
    /// Zero suppressed fragment layout.
    V2(RawHit),
}

impl VersionedRawHit {
    /// Layout version number.
    pub fn version(&self) -> u8 {
        match self {
            VersionedRawHit::V1(_) => 1,
            VersionedRawHit::V2(_) => 2,
        }
    }
}

impl From<VersionedRawHit> for RawHit {
    fn from(hit: VersionedRawHit) -> Self {
        match hit {
            VersionedRawHit::V1(v1) => v1.into(),
            VersionedRawHit::V2(v2) => v2,
        }
    }
}
