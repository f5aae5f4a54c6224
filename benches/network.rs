#![allow(mixed_script_confusables)]
#![allow(confusable_idents)]

use criterion::Criterion;
use neatxor::{
    genome::{Genome, Recurrent, WConnection, WeightMutation},
    network::{Activation, Phenotype, Synchronous, ToNetwork},
    random::{percent, EvolutionEvent, ProbBinding, ProbStatic, WyRng},
};

type G = Recurrent<WConnection>;

fn grown() -> G {
    let mut rng = ProbBinding::new(
        ProbStatic::default().with_overrides(&[
            (EvolutionEvent::MutateConnection, percent(50)),
            (EvolutionEvent::MutateBisection, percent(50)),
        ]),
        WyRng::seeded(0xBEEF),
    );
    let (mut genome, mut inno) = G::fully_connected(2, 1);
    for _ in 0..100 {
        genome.mutate(&mut rng, &mut inno, WeightMutation::default());
    }
    genome
}

fn bench_network(bench: &mut Criterion) {
    let genome = grown();
    let mut net: Synchronous = genome.network(Activation::SteepSigmoid);
    let depth = net.max_activation_depth(0).unwrap().max(1);

    bench.bench_function("network-build", |b| {
        b.iter(|| -> Synchronous { genome.network(Activation::SteepSigmoid) })
    });

    bench.bench_function("max-activation-depth", |b| {
        b.iter(|| net.max_activation_depth(0))
    });

    bench.bench_function("forward-steps", |b| {
        b.iter(|| {
            net.load_sensors(&[1., 1., 0.]).unwrap();
            let settled = net.forward_steps(depth).unwrap();
            net.flush().unwrap();
            settled
        })
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(1000)
        .significance_level(0.1);
    #[cfg(feature = "smol_bench")]
    let mut criterion: criterion::Criterion<_> = {
        use core::time::Duration;
        Criterion::default()
            .measurement_time(Duration::from_millis(1))
            .sample_size(10)
            .nresamples(1)
            .without_plots()
            .configure_from_args()
    };
    bench_network(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
