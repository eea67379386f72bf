use std::hint::black_box;

use descent::prelude::*;
use descent::{random_point_using, Memory};
use rand::prelude::*;
use tango_bench::{benchmark_fn, tango_benchmarks, tango_main, IntoBenchmarks};

type B = Native<f64>;

pub fn descent_benchmarks() -> impl IntoBenchmarks {
    let len = 100;

    [
        ("bfgs", DirectionConfig::Bfgs),
        (
            "lbfgs",
            DirectionConfig::Lbfgs {
                memory: Memory::new(8).unwrap(),
            },
        ),
        (
            "cg",
            DirectionConfig::ConjugateGradient {
                beta: BetaRule::default(),
                restart: RestartPolicy::default(),
            },
        ),
    ]
    .map(|(name, direction)| {
        benchmark_fn(format!("{name} rosenbrock {len}"), move |b| {
            b.iter(move || {
                run(
                    black_box(direction),
                    black_box(len),
                    black_box(SmallRng::seed_from_u64(0)),
                )
            })
        })
    })
}

fn run<R>(direction: DirectionConfig<f64>, len: usize, mut rng: R) -> f64
where
    R: Rng,
{
    let objective = FnObjective::<B>::new().with_value_and_gradient(rosenbrock);
    let config = MinimizerConfigBuilder::default().direction(direction).build();
    let x0 = random_point_using::<B, _>(std::iter::repeat(-2.0..=2.0).take(len), &mut rng);
    Minimizer::<B>::new(config)
        .minimize(&objective, x0)
        .map_or(f64::NAN, |result| *result.value())
}

fn rosenbrock(x: &Vec<f64>) -> (f64, Vec<f64>) {
    let mut g = vec![0.0; x.len()];
    let mut f = 0.0;
    for i in 0..x.len() - 1 {
        let t = x[i + 1] - x[i].powi(2);
        f += 100.0 * t.powi(2) + (1.0 - x[i]).powi(2);
        g[i] += -400.0 * x[i] * t - 2.0 * (1.0 - x[i]);
        g[i + 1] += 200.0 * t;
    }
    (f, g)
}

tango_benchmarks!(descent_benchmarks());
tango_main!();
