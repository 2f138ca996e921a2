//! State machine following the pairing of level-1 accept and end-of-data taggers.
#![allow(non_camel_case_types)]

use self::GTM_Sequence::WaitLvl1_;
use sm::sm;

sm! {
    // States have the '_' suffix and events the '_' prefix, generated variants read as `STATE_By_EVENT`
    GTM_Sequence {
        InitialStates { WaitLvl1_ }

        _Lvl1 {
            WaitLvl1_ => Open_,
            Open_ => Open_,
            Closed_ => Open_
        }

        _EnDat {
            WaitLvl1_ => WaitLvl1_,
            Open_ => Closed_,
            Closed_ => Closed_
        }
    }
}

/// Outcome of feeding a tagger to the [GtmSequence].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEvent {
    /// A level-1 accept opened a trigger window.
    Opened,
    /// An end-of-data closed the open window.
    Closed,
    /// End-of-data while no window was open.
    UnpairedEnDat,
    /// End-of-data repeated after the window closed.
    RepeatedEnDat,
}

/// Tracks whether the taggers of a packet id alternate as expected.
#[derive(Debug)]
pub struct GtmSequence {
    state_machine: GTM_Sequence::Variant,
}

impl Default for GtmSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl GtmSequence {
    /// Create a sequence waiting for its first level-1 accept.
    pub fn new() -> Self {
        Self {
            state_machine: GTM_Sequence::Machine::new(WaitLvl1_).as_enum(),
        }
    }

    /// Advance with a level-1 accept.
    pub fn lvl1(&mut self) -> SequenceEvent {
        use GTM_Sequence as event;
        use GTM_Sequence::Variant as state;

        self.state_machine = match self.state_machine.clone() {
            state::InitialWaitLvl1_(m) => m.transition(event::_Lvl1).as_enum(),
            state::WaitLvl1_By_EnDat(m) => m.transition(event::_Lvl1).as_enum(),
            state::Open_By_Lvl1(m) => m.transition(event::_Lvl1).as_enum(),
            state::Closed_By_EnDat(m) => m.transition(event::_Lvl1).as_enum(),
        };
        SequenceEvent::Opened
    }

    /// Advance with an end-of-data.
    pub fn endat(&mut self) -> SequenceEvent {
        use GTM_Sequence as event;
        use GTM_Sequence::Variant as state;

        let (next, outcome) = match self.state_machine.clone() {
            state::InitialWaitLvl1_(m) => (
                m.transition(event::_EnDat).as_enum(),
                SequenceEvent::UnpairedEnDat,
            ),
            state::WaitLvl1_By_EnDat(m) => (
                m.transition(event::_EnDat).as_enum(),
                SequenceEvent::UnpairedEnDat,
            ),
            state::Open_By_Lvl1(m) => (m.transition(event::_EnDat).as_enum(), SequenceEvent::Closed),
            state::Closed_By_EnDat(m) => (
                m.transition(event::_EnDat).as_enum(),
                SequenceEvent::RepeatedEnDat,
            ),
        };
        self.state_machine = next;
        outcome
    }

    /// A level-1 accept opened a window that no end-of-data closed yet.
    pub fn is_open(&self) -> bool {
        matches!(self.state_machine, GTM_Sequence::Variant::Open_By_Lvl1(_))
    }
}
