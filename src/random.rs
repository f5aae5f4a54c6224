use crate::options::Options;
use core::cmp::min;
use rand::RngCore;
use std::{
    fs::File,
    io::{self, Read},
};

#[derive(Debug, Clone, Copy)]
pub enum EvolutionEvent {
    MutateWeight,
    MutateConnection,
    MutateBisection,
    NewWeight,
    KeepDisabled,
    MutateOnly,
    PickLess,
}

pub const fn percent(x: u64) -> u64 {
    x * (u64::MAX / 100)
}

/// Probability `p` in [0, 1] as a threshold comparable against a uniform u64 roll
pub fn chance(p: f64) -> u64 {
    if p >= 1. {
        u64::MAX
    } else if p <= 0. {
        0
    } else {
        (p * u64::MAX as f64) as u64
    }
}

pub trait Probabilities {
    type Update;
    fn probability(&self, evt: EvolutionEvent) -> u64;
    fn update(&mut self, stats: Self::Update);
}

pub trait Happens: RngCore + Probabilities {
    fn happens(&mut self, evt: EvolutionEvent) -> bool;
}

impl<T: RngCore + Probabilities> Happens for T {
    fn happens(&mut self, evt: EvolutionEvent) -> bool {
        self.probability(evt) > self.next_u64()
    }
}

pub struct ProbStatic {
    mutate_weight: u64,
    mutate_connection: u64,
    mutate_bisection: u64,
    new_weight: u64,
    keep_disabled: u64,
    mutate_only: u64,
    pick_less: u64,
}

impl ProbStatic {
    pub fn with_overrides(mut self, updates: &[(EvolutionEvent, u64)]) -> Self {
        for update in updates {
            self.update(*update);
        }
        self
    }
}

impl Default for ProbStatic {
    fn default() -> Self {
        Self::from(&Options::default())
    }
}

impl From<&Options> for ProbStatic {
    fn from(options: &Options) -> Self {
        Self {
            mutate_weight: chance(options.mutate_weight_prob),
            mutate_connection: chance(options.mutate_connection_prob),
            mutate_bisection: chance(options.mutate_bisection_prob),
            new_weight: chance(options.new_weight_prob),
            keep_disabled: chance(options.keep_disabled_prob),
            mutate_only: chance(options.mutate_only_prob),
            pick_less: percent(50),
        }
    }
}

impl Probabilities for ProbStatic {
    type Update = (EvolutionEvent, u64);
    fn probability(&self, evt: EvolutionEvent) -> u64 {
        match evt {
            EvolutionEvent::MutateWeight => self.mutate_weight,
            EvolutionEvent::MutateConnection => self.mutate_connection,
            EvolutionEvent::MutateBisection => self.mutate_bisection,
            EvolutionEvent::NewWeight => self.new_weight,
            EvolutionEvent::KeepDisabled => self.keep_disabled,
            EvolutionEvent::MutateOnly => self.mutate_only,
            EvolutionEvent::PickLess => self.pick_less,
        }
    }

    fn update(&mut self, (evt, v): Self::Update) {
        match evt {
            EvolutionEvent::MutateWeight => self.mutate_weight = v,
            EvolutionEvent::MutateConnection => self.mutate_connection = v,
            EvolutionEvent::MutateBisection => self.mutate_bisection = v,
            EvolutionEvent::NewWeight => self.new_weight = v,
            EvolutionEvent::KeepDisabled => self.keep_disabled = v,
            EvolutionEvent::MutateOnly => self.mutate_only = v,
            EvolutionEvent::PickLess => self.pick_less = v,
        }
    }
}

pub struct WyRng {
    state: u64,
}

impl WyRng {
    pub fn seeded(state: u64) -> Self {
        Self { state }
    }
}

impl RngCore for WyRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        const WY_CONST_0: u64 = 0x2d35_8dcc_aa6c_78a5;
        const WY_CONST_1: u64 = 0x8bb8_4b93_962e_acc9;
        self.state = self.state.wrapping_add(WY_CONST_0);
        let t = u128::from(self.state) * u128::from(self.state ^ WY_CONST_1);
        (t as u64) ^ (t >> 64) as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut idx = 0;
        while idx < dst.len() {
            let lim = min(8, dst.len() - idx);
            dst[idx..idx + lim].copy_from_slice(&self.next_u64().to_ne_bytes()[..lim]);
            idx += lim;
        }
    }
}

/// Binds a set of [Probabilities] to a source of randomness, so that the pair may be handed
/// anywhere that [Happens] is wanted.
pub struct ProbBinding<P: Probabilities, R: RngCore> {
    p: P,
    r: R,
}

impl<P: Probabilities, R: RngCore> ProbBinding<P, R> {
    pub fn new(p: P, r: R) -> Self {
        Self { p, r }
    }
}

impl<P: Probabilities, R: RngCore> Probabilities for ProbBinding<P, R> {
    type Update = P::Update;
    fn probability(&self, evt: EvolutionEvent) -> u64 {
        self.p.probability(evt)
    }

    fn update(&mut self, stats: Self::Update) {
        self.p.update(stats);
    }
}

impl<P: Probabilities, R: RngCore> RngCore for ProbBinding<P, R> {
    fn next_u32(&mut self) -> u32 {
        self.r.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.r.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.r.fill_bytes(dest)
    }
}

pub fn seed_urandom() -> io::Result<u64> {
    let mut file = File::open("/dev/urandom")?;
    let mut buffer = [0u8; 8];
    file.read_exact(&mut buffer)?;
    Ok(u64::from_le_bytes(buffer))
}

/// A [WyRng] seeded from /dev/urandom, or from the thread rng where that isn't available
pub fn default_rng() -> WyRng {
    WyRng::seeded(seed_urandom().unwrap_or_else(|_| rand::random()))
}

/// Event source for one run: the given seed, or a fresh one from [default_rng]
pub fn run_rng(options: &Options, seed: Option<u64>) -> ProbBinding<ProbStatic, WyRng> {
    ProbBinding::new(
        ProbStatic::from(options),
        seed.map(WyRng::seeded).unwrap_or_else(default_rng),
    )
}
