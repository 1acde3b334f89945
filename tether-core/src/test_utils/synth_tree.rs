//! SynthTree: a small component hierarchy with typed, checked parameters.

use std::sync::Arc;

use crate::component::{Child, Component, Node, SearchFlags};
use crate::parameter::Parameter;
use crate::range::{NominalRange, NumericRange, ParamType};

/// A synthesizer-shaped tree:
///
/// ```text
/// synth
/// ├── gain        f64, checked 0..=1
/// ├── osc
/// │   ├── freq    f64, checked 20..=20000
/// │   └── wave    String, one of sine/saw/square
/// └── voices      list of per-voice nodes, found only with list search
///     └── detune  f64
/// ```
pub struct SynthTree {
    /// Master gain.
    pub gain: Parameter<f64>,
    /// Oscillator frequency.
    pub freq: Parameter<f64>,
    /// Oscillator waveform.
    pub wave: Parameter<String>,
    /// Detune of the first voice.
    pub detune: Parameter<f64>,
    /// The oscillator node.
    pub osc: Arc<Node>,
    search: SearchFlags,
    voice: Arc<Node>,
}

impl SynthTree {
    /// Build the tree with the given search flags on the root.
    pub fn new(search: SearchFlags) -> Self {
        let gain = checked("gain", 0.5, NumericRange::new(0.0, 1.0));
        let freq = checked("freq", 440.0, NumericRange::new(20.0, 20_000.0));
        let wave = Parameter::builder("wave", "sine".to_owned())
            .type_info(ParamType::Str)
            .range(NominalRange::new(
                ["sine", "saw", "square"].map(str::to_owned),
            ))
            .check_range(true)
            .build()
            .expect("wave parameter is statically valid");
        let detune = Parameter::new("detune", 0.0);

        let osc = Arc::new(Node::new("osc").with(&freq).with(&wave));
        let voice = Arc::new(Node::new("voice0").with(&detune));

        Self {
            gain,
            freq,
            wave,
            detune,
            osc,
            search,
            voice,
        }
    }
}

fn checked(name: &str, default: f64, range: NumericRange<f64>) -> Parameter<f64> {
    Parameter::builder(name, default)
        .type_info(ParamType::Float)
        .range(range)
        .check_range(true)
        .build()
        .expect("fixture parameter is statically valid")
}

impl Component for SynthTree {
    fn name(&self) -> &str {
        "synth"
    }

    fn search(&self) -> SearchFlags {
        self.search
    }

    fn children(&self) -> Vec<Child> {
        vec![
            Child::from(&self.gain),
            Child::from(Arc::clone(&self.osc)),
            Child::list([Child::from(Arc::clone(&self.voice))]),
        ]
    }
}
